//! Mahalanobis distance between bags.
//!
//! Each bag is treated as a sample: the distance is the quadratic form of the
//! difference of the bag means under the inverse of the pooled covariance.
//! A singular pooled covariance falls back to the Moore-Penrose
//! pseudo-inverse; it is an expected degeneracy of real datasets, never an
//! error.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::Bag;

/// Pivots smaller than this are treated as zero during elimination, and
/// eigenvalues below this fraction of the largest are dropped from the
/// pseudo-inverse.
const SINGULARITY_TOLERANCE: f64 = 1e-10;

/// The Mahalanobis bag distance.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[must_use]
pub struct Mahalanobis;

impl Mahalanobis {
    /// Creates the Mahalanobis bag distance.
    pub const fn new() -> Self {
        Self
    }

    /// The distance between two bags sharing one attribute schema.
    pub(crate) fn distance(&self, a: &Bag, b: &Bag) -> f64 {
        let diff = Array1::from(
            a.instance_mean()
                .values()
                .iter()
                .zip(b.instance_mean().values())
                .map(|(x, y)| x - y)
                .collect::<Vec<_>>(),
        );

        // Pooled covariance: the average of the two bag covariances.
        let pooled = (covariance(a) + covariance(b)) * 0.5;

        let product = solve(&pooled, &diff).unwrap_or_else(|| pseudo_inverse(&pooled).dot(&diff));

        // The quadratic form is non-negative for a PSD pooled covariance;
        // clamp away round-off below zero.
        diff.dot(&product).max(0.0)
    }
}

/// The population covariance matrix of the instances in a bag.
///
/// A single-instance bag has the zero matrix.
#[expect(clippy::cast_precision_loss)]
fn covariance(bag: &Bag) -> Array2<f64> {
    let dim = bag.dimensionality();
    let mean = bag.instance_mean();
    let mut cov = Array2::zeros((dim, dim));
    for instance in bag.instances() {
        for r in 0..dim {
            let dr = instance[r] - mean[r];
            for c in 0..dim {
                cov[[r, c]] += dr * (instance[c] - mean[c]);
            }
        }
    }
    cov / bag.n_instances() as f64
}

/// Solves `a * x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` if `a` is singular to working precision.
fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut m = a.clone();
    let mut rhs = b.clone();

    for col in 0..n {
        // Partial pivoting: bring the largest remaining entry into the pivot.
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| {
                m[[r1, col]]
                    .abs()
                    .partial_cmp(&m[[r2, col]].abs())
                    .unwrap_or(core::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if m[[pivot_row, col]].abs() < SINGULARITY_TOLERANCE {
            return None;
        }
        if pivot_row != col {
            for c in 0..n {
                m.swap([pivot_row, c], [col, c]);
            }
            rhs.swap(pivot_row, col);
        }

        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            for c in col..n {
                let delta = factor * m[[col, c]];
                m[[row, c]] -= delta;
            }
            let delta = factor * rhs[col];
            rhs[row] -= delta;
        }
    }

    // Back substitution.
    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail = ((row + 1)..n).map(|c| m[[row, c]] * x[c]).sum::<f64>();
        x[row] = (rhs[row] - tail) / m[[row, row]];
    }
    Some(x)
}

/// The Moore-Penrose pseudo-inverse of a symmetric matrix.
///
/// Computed from the Jacobi eigendecomposition; for a symmetric matrix this
/// coincides with the SVD-based pseudo-inverse. Eigenvalues below tolerance
/// are dropped.
fn pseudo_inverse(a: &Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    let (eigenvalues, eigenvectors) = jacobi_eigen(a);

    let max_abs = eigenvalues.iter().map(|v| v.abs()).fold(0.0, f64::max);
    let cutoff = SINGULARITY_TOLERANCE * max_abs.max(1.0);

    // pinv = V * diag(1 / lambda_i for |lambda_i| > cutoff) * V^T
    let mut pinv = Array2::zeros((n, n));
    for (k, &lambda) in eigenvalues.iter().enumerate() {
        if lambda.abs() > cutoff {
            let inv = 1.0 / lambda;
            for r in 0..n {
                for c in 0..n {
                    pinv[[r, c]] += inv * eigenvectors[[r, k]] * eigenvectors[[c, k]];
                }
            }
        }
    }
    pinv
}

/// The eigendecomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns the eigenvalues and the matrix whose columns are the matching
/// eigenvectors.
fn jacobi_eigen(a: &Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut m = a.clone();
    let mut v = Array2::eye(n);

    // A handful of full sweeps is ample for the small matrices seen here
    // (dimensionality of the attribute schema).
    for _ in 0..64 {
        let off = (0..n)
            .flat_map(|r| ((r + 1)..n).map(move |c| (r, c)))
            .map(|(r, c)| m[[r, c]] * m[[r, c]])
            .sum::<f64>();
        if off < 1e-24 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if m[[p, q]].abs() < 1e-30 {
                    continue;
                }
                let theta = (m[[q, q]] - m[[p, p]]) / (2.0 * m[[p, q]]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let cos = 1.0 / (t * t + 1.0).sqrt();
                let sin = t * cos;

                for k in 0..n {
                    let (mkp, mkq) = (m[[k, p]], m[[k, q]]);
                    m[[k, p]] = cos * mkp - sin * mkq;
                    m[[k, q]] = sin * mkp + cos * mkq;
                }
                for k in 0..n {
                    let (mpk, mqk) = (m[[p, k]], m[[q, k]]);
                    m[[p, k]] = cos * mpk - sin * mqk;
                    m[[q, k]] = sin * mpk + cos * mqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = cos * vkp - sin * vkq;
                    v[[k, q]] = sin * vkp + cos * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| m[[i, i]]).collect();
    (eigenvalues, v)
}
