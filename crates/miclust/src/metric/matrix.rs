//! The memoized pairwise bag-distance matrix.
//!
//! Built once per dataset + metric pair, then shared read-only by the
//! partitional assignment step, the density clusterers, and every validity
//! index that needs all-pairs distances.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::MinItem;
use crate::{BagMetric, Dataset, Error, Result};

/// The full symmetric matrix of pairwise bag distances, row-major.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct DistanceMatrix {
    /// The number of bags.
    n: usize,
    /// Row-major `n * n` distances with a zero diagonal.
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Computes the matrix sequentially.
    pub fn compute(data: &Dataset, metric: &BagMetric) -> Self {
        ftlog::info!(
            "Computing {0}x{0} bag-distance matrix with {1}",
            data.cardinality(),
            metric.name()
        );
        let n = data.cardinality();
        let distances = upper_triangle_pairs(n)
            .into_iter()
            .map(|(i, j)| metric.distance_unchecked(&data[i], &data[j]))
            .collect::<Vec<_>>();
        Self::from_upper_triangle(n, &distances)
    }

    /// Parallel version of [`Self::compute`].
    ///
    /// Each upper-triangle entry is an independent work item tagged by its
    /// pair index; the merge into the matrix happens strictly after all items
    /// finish, so the result is identical to the sequential build for any
    /// worker-pool size.
    pub fn par_compute(data: &Dataset, metric: &BagMetric) -> Self {
        ftlog::info!(
            "Computing {0}x{0} bag-distance matrix with {1} in parallel",
            data.cardinality(),
            metric.name()
        );
        let n = data.cardinality();
        let pairs = upper_triangle_pairs(n);
        let distances = pairs
            .par_iter()
            .map(|&(i, j)| metric.distance_unchecked(&data[i], &data[j]))
            .collect::<Vec<_>>();
        Self::from_upper_triangle(n, &distances)
    }

    /// Assembles the symmetric matrix from upper-triangle distances listed in
    /// [`upper_triangle_pairs`] order.
    fn from_upper_triangle(n: usize, distances: &[f64]) -> Self {
        let mut values = vec![0.0; n * n];
        for ((i, j), &d) in upper_triangle_pairs(n).into_iter().zip(distances) {
            values[i * n + j] = d;
            values[j * n + i] = d;
        }
        Self { n, values }
    }

    /// The number of bags the matrix covers.
    #[must_use]
    pub const fn n(&self) -> usize {
        self.n
    }

    /// The distance between bags `i` and `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// The row of distances from bag `i` to every bag.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    /// All other bags ordered by distance from bag `i`, nearest first.
    ///
    /// Ties are broken by bag index so the ordering is deterministic.
    #[must_use]
    pub fn nearest_neighbors(&self, i: usize) -> Vec<(usize, f64)> {
        let mut neighbors = self
            .row(i)
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, &d)| (j, d))
            .collect::<Vec<_>>();
        neighbors.sort_by_key(|&(j, d)| MinItem(j, (d, j)));
        neighbors
    }

    /// Checks that the matrix covers the given dataset.
    ///
    /// # Errors
    ///
    /// [`Error::MatrixMismatch`] if the sizes disagree.
    pub(crate) fn check_covers(&self, data: &Dataset) -> Result<()> {
        if self.n == data.cardinality() {
            Ok(())
        } else {
            Err(Error::MatrixMismatch {
                matrix_n: self.n,
                n_bags: data.cardinality(),
            })
        }
    }
}

/// The `(i, j)` index pairs of the strict upper triangle, in row-major order.
fn upper_triangle_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j))).collect()
}
