//! Internal cluster validity indices.
//!
//! These score an assignment from distances alone; no class labels are
//! needed. Indices that need a per-cluster centroid share the partitional
//! clusterer's pooled-mean routine. Indices that are undefined for fewer
//! than two clusters return the `-1.0` sentinel.

use rayon::prelude::*;

use crate::cluster::pooled_mean;
use crate::utils;
use crate::{Assignment, Bag, BagMetric, Dataset, DistanceMatrix};

/// The sentinel returned by indices that are undefined for the assignment,
/// e.g. when fewer than two non-empty clusters exist.
pub(crate) const UNDEFINED_INDEX: f64 = -1.0;

/// Mean silhouette coefficient over all assigned bags.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn silhouette(matrix: &DistanceMatrix, assignment: &Assignment, pooled: bool) -> f64 {
    if assignment.n_clusters() < 2 {
        return UNDEFINED_INDEX;
    }
    let members = assignment.all_members();

    let score_of = |i: usize, own: usize| -> f64 {
        // Mean distance to the rest of the bag's own cluster; zero for a
        // singleton cluster.
        let a = if members[own].len() < 2 {
            0.0
        } else {
            members[own].iter().filter(|&&j| j != i).map(|&j| matrix.get(i, j)).sum::<f64>()
                / (members[own].len() - 1) as f64
        };
        // Minimum over other clusters of the mean distance to that cluster.
        let b = members
            .iter()
            .enumerate()
            .filter(|&(c, m)| c != own && !m.is_empty())
            .map(|(_, m)| m.iter().map(|&j| matrix.get(i, j)).sum::<f64>() / m.len() as f64)
            .fold(f64::INFINITY, f64::min);

        if a < b {
            1.0 - a / b
        } else if a > b {
            b / a - 1.0
        } else {
            0.0
        }
    };

    let assigned = assignment
        .labels()
        .iter()
        .enumerate()
        .filter_map(|(i, &label)| label.map(|c| (i, c)))
        .collect::<Vec<_>>();
    // Per-bag scores are collected by index and reduced sequentially, so the
    // result does not depend on the worker-pool size.
    let scores = if pooled {
        assigned.par_iter().map(|&(i, c)| score_of(i, c)).collect::<Vec<_>>()
    } else {
        assigned.iter().map(|&(i, c)| score_of(i, c)).collect::<Vec<_>>()
    };
    scores.iter().sum::<f64>() / assigned.len() as f64
}

/// S_Dbw: intra-cluster scatter plus inter-cluster density.
///
/// All cluster-count divisors use the actual non-empty cluster count; an
/// [`Assignment`] guarantees its ids are dense, so every cluster here is
/// non-empty.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn s_dbw(data: &Dataset, assignment: &Assignment) -> f64 {
    let k = assignment.n_clusters();
    if k < 2 {
        return UNDEFINED_INDEX;
    }
    let members = assignment.all_members();
    let dim = data.dimensionality();

    // Pooled instances per cluster, as flat attribute rows.
    let pooled_points = members
        .iter()
        .map(|m| {
            m.iter()
                .flat_map(|&i| data[i].instances())
                .map(crate::FeatureVector::values)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let cluster_norms = pooled_points.iter().map(|points| variance_norm(points, dim)).collect::<Vec<_>>();
    let dataset_points = data
        .bags()
        .iter()
        .flat_map(Bag::instances)
        .map(crate::FeatureVector::values)
        .collect::<Vec<_>>();
    let dataset_norm = variance_norm(&dataset_points, dim);

    let scatter = if dataset_norm > 0.0 {
        cluster_norms.iter().sum::<f64>() / (dataset_norm * k as f64)
    } else {
        0.0
    };

    // The "stdev" radius used by the density term is derived from the same
    // per-cluster variance norms as the scatter term.
    let stdev = cluster_norms.iter().sum::<f64>().sqrt() / k as f64;

    let centroids = members.iter().map(|m| pooled_mean(data, m)).collect::<Vec<_>>();

    let mut density_sum = 0.0;
    for i in 0..k {
        for j in 0..k {
            if i == j {
                continue;
            }
            let midpoint = centroids[i]
                .values()
                .iter()
                .zip(centroids[j].values())
                .map(|(a, b)| (a + b) / 2.0)
                .collect::<Vec<_>>();
            let within = pooled_points[i]
                .iter()
                .chain(pooled_points[j].iter())
                .filter(|x| utils::euclidean(x, &midpoint) <= stdev)
                .count();
            let larger = pooled_points[i].len().max(pooled_points[j].len());
            density_sum += within as f64 / larger as f64;
        }
    }
    let density = density_sum / (k * (k - 1)) as f64;

    scatter + density
}

/// Davies-Bouldin index: mean over clusters of the worst intra/inter spread
/// ratio against any other cluster.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn davies_bouldin(data: &Dataset, metric: &BagMetric, assignment: &Assignment) -> f64 {
    let k = assignment.n_clusters();
    if k < 2 {
        return UNDEFINED_INDEX;
    }
    let members = assignment.all_members();
    let centroids = centroid_bags(data, &members);
    let spreads = members
        .iter()
        .zip(centroids.iter())
        .map(|(m, v)| {
            m.iter().map(|&i| metric.distance_unchecked(&data[i], v)).sum::<f64>() / m.len() as f64
        })
        .collect::<Vec<_>>();

    let sum = (0..k)
        .map(|i| {
            (0..k)
                .filter(|&j| j != i)
                .map(|j| {
                    let separation = metric.distance_unchecked(&centroids[i], &centroids[j]);
                    (spreads[i] + spreads[j]) / separation
                })
                .fold(0.0, f64::max)
        })
        .sum::<f64>();
    sum / k as f64
}

/// Xie-Beni index: total squared bag-to-centroid distance over the smallest
/// squared centroid separation, normalized by the assigned bag count.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn xie_beni(data: &Dataset, metric: &BagMetric, assignment: &Assignment) -> f64 {
    let k = assignment.n_clusters();
    if k < 2 {
        return UNDEFINED_INDEX;
    }
    let members = assignment.all_members();
    let centroids = centroid_bags(data, &members);

    let compactness = members
        .iter()
        .zip(centroids.iter())
        .map(|(m, v)| {
            m.iter()
                .map(|&i| {
                    let d = metric.distance_unchecked(&data[i], v);
                    d * d
                })
                .sum::<f64>()
        })
        .sum::<f64>();

    let min_separation = (0..k)
        .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
        .map(|(i, j)| metric.distance_unchecked(&centroids[i], &centroids[j]))
        .fold(f64::INFINITY, f64::min);
    if min_separation <= 0.0 {
        return f64::INFINITY;
    }

    let n_assigned = members.iter().map(Vec::len).sum::<usize>();
    compactness / (n_assigned as f64 * min_separation * min_separation)
}

/// Root-mean-square standard deviation over the pooled instances of all
/// clusters.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn rms_std_dev(data: &Dataset, assignment: &Assignment) -> f64 {
    let members = assignment.all_members();
    let dim = data.dimensionality();

    let mut sum_squares = 0.0;
    let mut degrees = 0_usize;
    for m in &members {
        let centroid = pooled_mean(data, m);
        let mut count = 0_usize;
        for &i in m {
            for instance in data[i].instances() {
                sum_squares += instance
                    .values()
                    .iter()
                    .zip(centroid.values())
                    .map(|(x, c)| (x - c) * (x - c))
                    .sum::<f64>();
                count += 1;
            }
        }
        degrees += count.saturating_sub(1);
    }

    let denominator = dim * degrees;
    if denominator == 0 {
        0.0
    } else {
        (sum_squares / denominator as f64).sqrt()
    }
}

/// Total within-cluster variation: the sum of squared bag-to-centroid
/// distances over all clusters.
pub(crate) fn total_within_cluster_variation(data: &Dataset, metric: &BagMetric, assignment: &Assignment) -> f64 {
    let members = assignment.all_members();
    let centroids = centroid_bags(data, &members);
    members
        .iter()
        .zip(centroids.iter())
        .map(|(m, v)| {
            m.iter()
                .map(|&i| {
                    let d = metric.distance_unchecked(&data[i], v);
                    d * d
                })
                .sum::<f64>()
        })
        .sum::<f64>()
}

/// The virtual centroid bag of every cluster.
fn centroid_bags(data: &Dataset, members: &[Vec<usize>]) -> Vec<Bag> {
    members
        .iter()
        .map(|m| Bag::virtual_from(pooled_mean(data, m)))
        .collect()
}

/// The L2 norm of the per-attribute variance vector of a set of points.
fn variance_norm(points: &[&[f64]], dim: usize) -> f64 {
    (0..dim)
        .map(|a| {
            let column = points.iter().map(|p| p[a]).collect::<Vec<_>>();
            let v = utils::variance(&column);
            v * v
        })
        .sum::<f64>()
        .sqrt()
}
