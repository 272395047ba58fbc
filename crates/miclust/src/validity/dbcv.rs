//! Density-based cluster validation (DBCV).
//!
//! Each cluster is scored by comparing its density sparseness (the heaviest
//! edge of its minimum spanning tree under mutual reachability distances)
//! against its density separation from the nearest other cluster. The overall
//! index is the bag-count-weighted mean of the per-cluster scores and lies in
//! `[-1, 1]`, with well-separated dense clusters near `1`.

use rayon::prelude::*;

use crate::{Assignment, Dataset, DistanceMatrix};

use super::internal::UNDEFINED_INDEX;

/// The DBCV index of an assignment.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn dbcv(data: &Dataset, matrix: &DistanceMatrix, assignment: &Assignment, pooled: bool) -> f64 {
    let k = assignment.n_clusters();
    if k < 2 {
        return UNDEFINED_INDEX;
    }
    let members = assignment.all_members();
    let dim = data.dimensionality() as f64;

    // All-points core distance of every assigned bag, estimated from its
    // same-cluster neighbor distances.
    let mut core = vec![0.0; matrix.n()];
    for m in &members {
        for &i in m {
            core[i] = all_points_core_distance(matrix, m, i, dim);
        }
    }

    let reach = |i: usize, j: usize| -> f64 { matrix.get(i, j).max(core[i]).max(core[j]) };

    // Density sparseness: the heaviest MST edge within each cluster. The MSTs
    // are independent, so they distribute across the pool when pooled.
    let sparseness = if pooled {
        members.par_iter().map(|m| mst_max_edge(m, &reach)).collect::<Vec<_>>()
    } else {
        members.iter().map(|m| mst_max_edge(m, &reach)).collect::<Vec<_>>()
    };

    // Density separation: the smallest mutual reachability distance from each
    // cluster to any other cluster.
    let separation = (0..k)
        .map(|a| {
            let ma = &members[a];
            (0..k)
                .filter(|&b| b != a)
                .flat_map(|b| {
                    let mb = &members[b];
                    ma.iter()
                        .flat_map(move |&i| mb.iter().map(move |&j| reach(i, j)))
                })
                .fold(f64::INFINITY, f64::min)
        })
        .collect::<Vec<_>>();

    let n_assigned = members.iter().map(Vec::len).sum::<usize>();
    (0..k)
        .map(|c| {
            let denominator = separation[c].max(sparseness[c]);
            let validity = if denominator > 0.0 {
                (separation[c] - sparseness[c]) / denominator
            } else {
                0.0
            };
            validity * members[c].len() as f64 / n_assigned as f64
        })
        .sum()
}

/// The all-points core distance of bag `i` within its cluster.
///
/// Inverse same-cluster distances are raised to the dimensionality and
/// averaged; the result is raised to `-1/d`. A zero distance to any neighbor
/// drives the estimate to zero, and a singleton cluster has no neighbors to
/// estimate from, so its core distance is zero as well.
#[expect(clippy::cast_precision_loss)]
fn all_points_core_distance(matrix: &DistanceMatrix, cluster: &[usize], i: usize, dim: f64) -> f64 {
    if cluster.len() < 2 {
        return 0.0;
    }
    let sum = cluster
        .iter()
        .filter(|&&j| j != i)
        .map(|&j| (1.0 / matrix.get(i, j)).powf(dim))
        .sum::<f64>();
    (sum / (cluster.len() - 1) as f64).powf(-1.0 / dim)
}

/// The maximum edge weight of the minimum spanning tree over the cluster's
/// bags, built with Prim's algorithm on the complete mutual-reachability
/// graph. Zero for a singleton cluster.
fn mst_max_edge<R: Fn(usize, usize) -> f64>(cluster: &[usize], reach: &R) -> f64 {
    let n = cluster.len();
    if n < 2 {
        return 0.0;
    }

    let mut in_tree = vec![false; n];
    let mut best_edge = vec![f64::INFINITY; n];
    in_tree[0] = true;
    for (v, edge) in best_edge.iter_mut().enumerate().skip(1) {
        *edge = reach(cluster[0], cluster[v]);
    }

    let mut max_edge = 0.0_f64;
    for _ in 1..n {
        // The cheapest frontier vertex joins the tree; ties break to the
        // lowest position so the result is deterministic.
        let next = (0..n)
            .filter(|&v| !in_tree[v])
            .min_by(|&a, &b| {
                best_edge[a]
                    .partial_cmp(&best_edge[b])
                    .unwrap_or(core::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        in_tree[next] = true;
        max_edge = max_edge.max(best_edge[next]);
        for v in 0..n {
            if !in_tree[v] {
                best_edge[v] = best_edge[v].min(reach(cluster[next], cluster[v]));
            }
        }
    }
    max_edge
}

#[cfg(test)]
mod tests {
    use crate::{Bag, BagMetric, FeatureVector, HausdorffKind};

    use super::*;

    fn dataset_of(points: &[&[f64]]) -> (Dataset, DistanceMatrix) {
        let bags = points
            .iter()
            .enumerate()
            .map(|(i, row)| Bag::new(format!("b{i}"), vec![FeatureVector::new(row.to_vec())]).unwrap())
            .collect();
        let data = Dataset::new(bags).unwrap();
        let matrix = DistanceMatrix::compute(&data, &BagMetric::hausdorff(HausdorffKind::MaxMin));
        (data, matrix)
    }

    #[test]
    fn compact_far_clusters_score_near_one() {
        let (data, matrix) = dataset_of(&[
            &[0.0, 0.0],
            &[0.1, 0.0],
            &[0.0, 0.1],
            &[100.0, 100.0],
            &[100.1, 100.0],
            &[100.0, 100.1],
        ]);
        let assignment =
            Assignment::from_labels(vec![Some(0), Some(0), Some(0), Some(1), Some(1), Some(1)]).unwrap();
        let score = dbcv(&data, &matrix, &assignment, false);
        assert!(score > 0.9, "expected near-perfect DBCV, got {score}");
    }

    #[test]
    fn overlapping_clusters_score_at_or_below_zero() {
        // Two interleaved groups on a line.
        let (data, matrix) = dataset_of(&[&[0.0], &[1.0], &[2.0], &[0.5], &[1.5], &[2.5]]);
        let assignment =
            Assignment::from_labels(vec![Some(0), Some(0), Some(0), Some(1), Some(1), Some(1)]).unwrap();
        let score = dbcv(&data, &matrix, &assignment, false);
        assert!(score <= 0.0, "expected non-positive DBCV for overlap, got {score}");
    }

    #[test]
    fn sequential_and_pooled_agree() {
        let (data, matrix) = dataset_of(&[&[0.0], &[0.2], &[0.4], &[5.0], &[5.2], &[5.4]]);
        let assignment =
            Assignment::from_labels(vec![Some(0), Some(0), Some(0), Some(1), Some(1), Some(1)]).unwrap();
        let a = dbcv(&data, &matrix, &assignment, false);
        let b = dbcv(&data, &matrix, &assignment, true);
        assert!((a - b).abs() < 1e-15);
    }

    #[test]
    fn singleton_clusters_are_handled() {
        let (data, matrix) = dataset_of(&[&[0.0], &[10.0], &[10.1]]);
        let assignment = Assignment::from_labels(vec![Some(0), Some(1), Some(1)]).unwrap();
        let score = dbcv(&data, &matrix, &assignment, false);
        assert!(score.is_finite());
    }
}
