//! Clustering engines over bags, and the assignments they produce.

mod assignment;
mod dbscan;
mod optics;
mod partitional;

pub use assignment::Assignment;
pub use dbscan::{Dbscan, DbscanConfig, DbscanModel};
pub use optics::{Optics, OpticsConfig, OrderingTrace, TraceEntry, UNDEFINED_DISTANCE};
pub use partitional::{Centroid, CentroidPolicy, Kmic, KmicConfig, KmicModel};
pub(crate) use partitional::pooled_mean;

use crate::utils::options::{self, Options};
use crate::{BagMetric, Dataset, DistanceMatrix, Error, Result, RunContext};

/// A clustering algorithm selected by name.
///
/// Every selectable algorithm is a statically known member of this enum; the
/// registry entry point is [`Algorithm::from_options`].
#[must_use]
pub enum Algorithm {
    /// Partitional clustering with mean-of-instances centroids.
    Kmic(Kmic),
    /// Partitional clustering with medoid-of-bags centroids.
    Bamic(Kmic),
    /// Density-connectivity clustering.
    Dbscan(Dbscan),
    /// Density-ordering.
    Optics(Optics),
}

/// What a clustering algorithm hands back: either a flat assignment or, for
/// the density-ordering algorithm, a reachability ordering.
#[must_use]
pub enum ClusteringOutput {
    /// A flat cluster assignment.
    Flat(Assignment),
    /// A reachability ordering trace.
    Ordering(OrderingTrace),
}

impl ClusteringOutput {
    /// The flat assignment, if this output holds one.
    #[must_use]
    pub const fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Flat(assignment) => Some(assignment),
            Self::Ordering(_) => None,
        }
    }

    /// The ordering trace, if this output holds one.
    #[must_use]
    pub const fn trace(&self) -> Option<&OrderingTrace> {
        match self {
            Self::Flat(_) => None,
            Self::Ordering(trace) => Some(trace),
        }
    }
}

impl Algorithm {
    /// Resolves an algorithm from its registry name and a flat option list.
    ///
    /// Known names and their options:
    ///
    /// - `"k-means"`: `k` (required), `max-iterations`, `seed`.
    /// - `"bamic"`: same as `"k-means"`, with medoid-of-bags centroids.
    /// - `"dbscan"`: `epsilon` (required), `min-points` (required).
    /// - `"optics"`: `epsilon` (required), `min-points` (optional; defaults
    ///   to dimensionality + 1 at fit time).
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownName`] for an unrecognized algorithm name.
    /// - [`Error::UnknownOption`] for an option the algorithm does not accept.
    /// - [`Error::InvalidParameter`] for malformed or missing option values.
    pub fn from_options(name: &str, opts: &Options) -> Result<Self> {
        match name {
            "k-means" | "bamic" => {
                options::reject_unknown(opts, &["k", "max-iterations", "seed"], "partitional clustering")?;
                let k = options::get_parsed::<usize>(opts, "k")?.ok_or(Error::InvalidParameter {
                    name: "k",
                    message: "required for partitional clustering".to_string(),
                })?;
                let mut config = KmicConfig::new(k);
                if let Some(max_iterations) = options::get_parsed::<usize>(opts, "max-iterations")? {
                    config = config.with_max_iterations(max_iterations);
                }
                if let Some(seed) = options::get_parsed::<u64>(opts, "seed")? {
                    config = config.with_seed(seed);
                }
                if name == "bamic" {
                    config = config.with_policy(CentroidPolicy::MedoidOfBags);
                    Ok(Self::Bamic(Kmic::new(config)))
                } else {
                    Ok(Self::Kmic(Kmic::new(config)))
                }
            }
            "dbscan" => {
                options::reject_unknown(opts, &["epsilon", "min-points"], "dbscan")?;
                let epsilon = options::get_parsed::<f64>(opts, "epsilon")?.ok_or(Error::InvalidParameter {
                    name: "epsilon",
                    message: "required for dbscan".to_string(),
                })?;
                let min_points = options::get_parsed::<usize>(opts, "min-points")?.ok_or(Error::InvalidParameter {
                    name: "min-points",
                    message: "required for dbscan".to_string(),
                })?;
                Ok(Self::Dbscan(Dbscan::new(DbscanConfig::new(epsilon, min_points)?)))
            }
            "optics" => {
                options::reject_unknown(opts, &["epsilon", "min-points"], "optics")?;
                let epsilon = options::get_parsed::<f64>(opts, "epsilon")?.ok_or(Error::InvalidParameter {
                    name: "epsilon",
                    message: "required for optics".to_string(),
                })?;
                let mut config = OpticsConfig::new(epsilon)?;
                if let Some(min_points) = options::get_parsed::<usize>(opts, "min-points")? {
                    config = config.with_min_points(min_points);
                }
                Ok(Self::Optics(Optics::new(config)))
            }
            _ => Err(Error::UnknownName {
                what: "clustering algorithm",
                name: name.to_string(),
            }),
        }
    }

    /// Returns the name of the algorithm, including its parameters.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Kmic(alg) | Self::Bamic(alg) => alg.name(),
            Self::Dbscan(alg) => alg.name(),
            Self::Optics(alg) => alg.name(),
        }
    }

    /// Runs the algorithm on a dataset.
    ///
    /// The distance matrix must cover the dataset; it backs the density
    /// clusterers' neighborhood queries and the partitional clusterer's
    /// bag-to-medoid distances.
    ///
    /// # Errors
    ///
    /// See the individual algorithms' `fit` methods.
    pub fn fit(&self, data: &Dataset, metric: &BagMetric, matrix: &DistanceMatrix) -> Result<ClusteringOutput> {
        match self {
            Self::Kmic(alg) | Self::Bamic(alg) => alg
                .fit(data, metric, Some(matrix))
                .map(|model| ClusteringOutput::Flat(model.into_assignment())),
            Self::Dbscan(alg) => alg
                .fit(data, matrix)
                .map(|model| ClusteringOutput::Flat(model.into_assignment())),
            Self::Optics(alg) => alg.fit(data, matrix).map(ClusteringOutput::Ordering),
        }
    }

    /// Parallel version of [`Self::fit`], run inside the given context.
    ///
    /// # Errors
    ///
    /// See [`Self::fit`].
    pub fn par_fit(
        &self,
        data: &Dataset,
        metric: &BagMetric,
        matrix: &DistanceMatrix,
        ctx: &RunContext,
    ) -> Result<ClusteringOutput> {
        match self {
            Self::Kmic(alg) | Self::Bamic(alg) => alg
                .par_fit(data, metric, Some(matrix), ctx)
                .map(|model| ClusteringOutput::Flat(model.into_assignment())),
            // The density algorithms are sequential scans over the memoized
            // matrix; their parallel phase is the matrix build itself.
            Self::Dbscan(alg) => alg
                .fit(data, matrix)
                .map(|model| ClusteringOutput::Flat(model.into_assignment())),
            Self::Optics(alg) => alg.fit(data, matrix).map(ClusteringOutput::Ordering),
        }
    }
}
