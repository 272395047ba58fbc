//! Bag-level distance functions and the pairwise distance matrix.
//!
//! A [`BagMetric`] computes a scalar distance between two bags. All variants
//! are non-negative and symmetric; the triangle inequality is NOT guaranteed
//! (the mean-min Hausdorff reduction is a pseudo-metric), and no consumer in
//! this crate assumes it.

mod cauchy_schwarz;
mod hausdorff;
mod mahalanobis;
mod matrix;

pub use cauchy_schwarz::CauchySchwarz;
pub use hausdorff::{Hausdorff, HausdorffKind};
pub use mahalanobis::Mahalanobis;
pub use matrix::DistanceMatrix;

use crate::utils::options::{self, Options};
use crate::{Bag, Error, Result};

/// A distance function between two bags.
///
/// Every selectable variant is a statically known member of this enum; the
/// registry entry point is [`BagMetric::from_options`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[must_use]
pub enum BagMetric {
    /// Reductions of the full instance-to-instance distance matrix.
    Hausdorff(Hausdorff),
    /// Quadratic form of the bag mean difference under the pooled covariance.
    Mahalanobis(Mahalanobis),
    /// Gaussian-kernel Cauchy-Schwarz divergence.
    CauchySchwarz(CauchySchwarz),
}

impl BagMetric {
    /// A Hausdorff-family metric with the given reduction policy.
    pub const fn hausdorff(kind: HausdorffKind) -> Self {
        Self::Hausdorff(Hausdorff::new(kind))
    }

    /// The Mahalanobis bag metric.
    pub const fn mahalanobis() -> Self {
        Self::Mahalanobis(Mahalanobis::new())
    }

    /// The Cauchy-Schwarz kernel bag metric.
    pub const fn cauchy_schwarz() -> Self {
        Self::CauchySchwarz(CauchySchwarz::new())
    }

    /// Resolves a metric from its registry name and a flat option list.
    ///
    /// Known names are `"hausdorff"` (option `"hausdorff-type"`: one of
    /// `"max-min"`, `"min-min"`, `"mean-min"`, `"mean"`; default `"max-min"`),
    /// `"mahalanobis"`, and `"cauchy-schwarz"`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownName`] for an unrecognized metric name.
    /// - [`Error::UnknownOption`] for an option the variant does not accept.
    /// - [`Error::InvalidParameter`] for a malformed option value.
    pub fn from_options(name: &str, opts: &Options) -> Result<Self> {
        match name {
            "hausdorff" => {
                options::reject_unknown(opts, &["hausdorff-type"], "hausdorff")?;
                let kind = options::get_parsed::<HausdorffKind>(opts, "hausdorff-type")?.unwrap_or_default();
                Ok(Self::hausdorff(kind))
            }
            "mahalanobis" => {
                options::reject_unknown(opts, &[], "mahalanobis")?;
                Ok(Self::mahalanobis())
            }
            "cauchy-schwarz" => {
                options::reject_unknown(opts, &[], "cauchy-schwarz")?;
                Ok(Self::cauchy_schwarz())
            }
            _ => Err(Error::UnknownName {
                what: "bag metric",
                name: name.to_string(),
            }),
        }
    }

    /// Returns the name of the metric, including its configuration.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Hausdorff(m) => format!("Hausdorff({})", m.kind()),
            Self::Mahalanobis(_) => "Mahalanobis".to_string(),
            Self::CauchySchwarz(_) => "CauchySchwarz".to_string(),
        }
    }

    /// The distance between two bags.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if the bags disagree on the number of
    /// attributes. Mismatched schemas are a configuration error, never
    /// silently truncated.
    pub fn distance(&self, a: &Bag, b: &Bag) -> Result<f64> {
        if a.dimensionality() != b.dimensionality() {
            return Err(Error::DimensionMismatch {
                expected: a.dimensionality(),
                found: b.dimensionality(),
            });
        }
        Ok(self.distance_unchecked(a, b))
    }

    /// The distance between two bags known to share one attribute schema.
    ///
    /// Bags drawn from one validated [`Dataset`](crate::Dataset) always do.
    pub(crate) fn distance_unchecked(&self, a: &Bag, b: &Bag) -> f64 {
        match self {
            Self::Hausdorff(m) => m.distance(a, b),
            Self::Mahalanobis(m) => m.distance(a, b),
            Self::CauchySchwarz(m) => m.distance(a, b),
        }
    }
}

impl core::fmt::Display for BagMetric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureVector;

    fn bag(id: &str, rows: &[&[f64]]) -> Bag {
        Bag::new(id, rows.iter().map(|r| FeatureVector::new(r.to_vec())).collect()).unwrap()
    }

    #[test]
    fn registry_resolves_known_names() {
        let mut opts = Options::new();
        opts.insert("hausdorff-type".to_string(), "mean-min".to_string());
        let metric = BagMetric::from_options("hausdorff", &opts).unwrap();
        assert_eq!(metric.name(), "Hausdorff(mean-min)");

        let opts = Options::new();
        assert!(BagMetric::from_options("mahalanobis", &opts).is_ok());
        assert!(BagMetric::from_options("cauchy-schwarz", &opts).is_ok());
        assert!(matches!(
            BagMetric::from_options("citation-knn", &opts),
            Err(Error::UnknownName { .. })
        ));
    }

    #[test]
    fn registry_rejects_stray_options() {
        let mut opts = Options::new();
        opts.insert("bandwidth".to_string(), "2.0".to_string());
        assert!(matches!(
            BagMetric::from_options("cauchy-schwarz", &opts),
            Err(Error::UnknownOption { .. })
        ));

        let mut opts = Options::new();
        opts.insert("hausdorff-type".to_string(), "median-min".to_string());
        assert!(matches!(
            BagMetric::from_options("hausdorff", &opts),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn mismatched_schemas_are_rejected() {
        let a = bag("a", &[&[0.0, 1.0]]);
        let b = bag("b", &[&[0.0]]);
        for metric in [
            BagMetric::hausdorff(HausdorffKind::MaxMin),
            BagMetric::mahalanobis(),
            BagMetric::cauchy_schwarz(),
        ] {
            assert!(matches!(metric.distance(&a, &b), Err(Error::DimensionMismatch { .. })));
        }
    }
}
