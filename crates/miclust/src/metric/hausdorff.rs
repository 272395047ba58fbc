//! Hausdorff-family bag distances.
//!
//! All four variants reduce the same cross matrix of instance-to-instance
//! Euclidean distances between the two bags, built in `O(n1 * n2)`.

use serde::{Deserialize, Serialize};

use crate::utils;
use crate::{Bag, Error};

/// The reduction policy applied to the cross distance matrix.
///
/// The policy is a configuration option selected at construction time, not a
/// subtype.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HausdorffKind {
    /// Classic Hausdorff: the larger of the two directed max-of-row-minimums.
    #[default]
    MaxMin,
    /// The global minimum entry of the cross matrix.
    MinMin,
    /// The average of row minimums and column minimums, symmetrized. A
    /// pseudo-metric: the triangle inequality does not hold.
    MeanMin,
    /// The average of all entries of the cross matrix.
    Mean,
}

impl core::fmt::Display for HausdorffKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::MaxMin => "max-min",
            Self::MinMin => "min-min",
            Self::MeanMin => "mean-min",
            Self::Mean => "mean",
        };
        write!(f, "{name}")
    }
}

impl core::str::FromStr for HausdorffKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max-min" => Ok(Self::MaxMin),
            "min-min" => Ok(Self::MinMin),
            "mean-min" => Ok(Self::MeanMin),
            "mean" => Ok(Self::Mean),
            _ => Err(Error::InvalidParameter {
                name: "hausdorff-type",
                message: format!("unknown reduction {s:?}"),
            }),
        }
    }
}

/// A Hausdorff-family bag distance with a fixed reduction policy.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[must_use]
pub struct Hausdorff {
    /// The reduction policy.
    kind: HausdorffKind,
}

impl Hausdorff {
    /// Creates a Hausdorff distance with the given reduction policy.
    pub const fn new(kind: HausdorffKind) -> Self {
        Self { kind }
    }

    /// The reduction policy of this instance.
    #[must_use]
    pub const fn kind(&self) -> HausdorffKind {
        self.kind
    }

    /// The reduced distance between two bags sharing one attribute schema.
    #[expect(clippy::cast_precision_loss)]
    pub(crate) fn distance(&self, a: &Bag, b: &Bag) -> f64 {
        let cross = cross_matrix(a, b);
        let (n_a, n_b) = (a.n_instances(), b.n_instances());

        match self.kind {
            HausdorffKind::MaxMin => {
                let a_to_b = row_minimums(&cross, n_a, n_b).into_iter().fold(0.0, f64::max);
                let b_to_a = col_minimums(&cross, n_a, n_b).into_iter().fold(0.0, f64::max);
                a_to_b.max(b_to_a)
            }
            HausdorffKind::MinMin => cross.iter().copied().fold(f64::INFINITY, f64::min),
            HausdorffKind::MeanMin => {
                // Symmetrized over both directions so that d(a, b) == d(b, a).
                let sum = row_minimums(&cross, n_a, n_b).into_iter().sum::<f64>()
                    + col_minimums(&cross, n_a, n_b).into_iter().sum::<f64>();
                sum / (n_a + n_b) as f64
            }
            HausdorffKind::Mean => cross.iter().sum::<f64>() / (n_a * n_b) as f64,
        }
    }
}

/// The row-major `n_a x n_b` matrix of instance-to-instance Euclidean distances.
fn cross_matrix(a: &Bag, b: &Bag) -> Vec<f64> {
    let mut cross = Vec::with_capacity(a.n_instances() * b.n_instances());
    for i in a.instances() {
        for j in b.instances() {
            cross.push(utils::euclidean(i.values(), j.values()));
        }
    }
    cross
}

/// The minimum of each row of the cross matrix.
fn row_minimums(cross: &[f64], n_a: usize, n_b: usize) -> Vec<f64> {
    (0..n_a)
        .map(|r| cross[r * n_b..(r + 1) * n_b].iter().copied().fold(f64::INFINITY, f64::min))
        .collect()
}

/// The minimum of each column of the cross matrix.
fn col_minimums(cross: &[f64], n_a: usize, n_b: usize) -> Vec<f64> {
    (0..n_b)
        .map(|c| (0..n_a).map(|r| cross[r * n_b + c]).fold(f64::INFINITY, f64::min))
        .collect()
}
