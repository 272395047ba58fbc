//! Density-connectivity clustering over bags.
//!
//! A bag is a core object if its epsilon-neighborhood (itself included) holds
//! at least `min_points` bags. Clusters are the sets of bags reachable
//! through chains of core objects; everything else is noise. Neighborhood
//! queries run against the memoized distance matrix.

use serde::{Deserialize, Serialize};

use crate::{Dataset, DistanceMatrix, Error, Result};

use super::Assignment;

/// Configuration of a density-connectivity run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[must_use]
pub struct DbscanConfig {
    /// The neighborhood radius, inclusive.
    pub epsilon: f64,
    /// The neighborhood size at which a bag counts as a core object.
    pub min_points: usize,
}

impl DbscanConfig {
    /// Creates a configuration, validating the parameters.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `epsilon` is not positive and finite,
    /// or if `min_points` is zero.
    pub fn new(epsilon: f64, min_points: usize) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                message: format!("must be positive and finite, got {epsilon}"),
            });
        }
        if min_points == 0 {
            return Err(Error::InvalidParameter {
                name: "min-points",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self { epsilon, min_points })
    }
}

/// The per-bag state during the scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Label {
    /// Never visited.
    Unclassified,
    /// Visited, but not density-reachable from any core bag so far. May be
    /// promoted into a cluster later.
    Noise,
    /// Member of the cluster with this id.
    Cluster(usize),
}

/// The result of a density-connectivity run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct DbscanModel {
    /// The assignment, with noise bags left unassigned.
    assignment: Assignment,
}

impl DbscanModel {
    /// The assignment, with noise bags left unassigned.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Consumes the model and returns the assignment.
    #[must_use]
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    /// The number of clusters formed.
    #[must_use]
    pub const fn n_clusters(&self) -> usize {
        self.assignment.n_clusters()
    }

    /// The number of bags left as noise.
    #[must_use]
    pub fn n_noise(&self) -> usize {
        self.assignment.n_noise()
    }
}

/// The density-connectivity clusterer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[must_use]
pub struct Dbscan {
    /// The run configuration.
    config: DbscanConfig,
}

impl Dbscan {
    /// Creates a clusterer with the given configuration.
    pub const fn new(config: DbscanConfig) -> Self {
        Self { config }
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &DbscanConfig {
        &self.config
    }

    /// Returns the name of the algorithm, including its parameters.
    #[must_use]
    pub fn name(&self) -> String {
        format!(
            "Dbscan(epsilon={}, min_points={})",
            self.config.epsilon, self.config.min_points
        )
    }

    /// Runs the scan over the dataset.
    ///
    /// # Errors
    ///
    /// [`Error::MatrixMismatch`] if the matrix does not cover the dataset.
    pub fn fit(&self, data: &Dataset, matrix: &DistanceMatrix) -> Result<DbscanModel> {
        matrix.check_covers(data)?;
        ftlog::info!("Running {} on {} bags", self.name(), data.cardinality());

        let n = data.cardinality();
        let mut labels = vec![Label::Unclassified; n];
        let mut next_cluster = 0;

        for i in 0..n {
            if labels[i] != Label::Unclassified {
                continue;
            }
            let neighbors = self.region_query(matrix, i);
            if neighbors.len() < self.config.min_points {
                // Not dense enough to start a cluster; may still be promoted
                // into one reached from a core bag later.
                labels[i] = Label::Noise;
                continue;
            }
            self.expand(matrix, &mut labels, next_cluster, neighbors);
            next_cluster += 1;
        }

        let assignment = Assignment::compacted(
            labels
                .into_iter()
                .map(|label| match label {
                    Label::Cluster(id) => Some(id),
                    Label::Unclassified | Label::Noise => None,
                })
                .collect(),
        );
        ftlog::info!(
            "{} formed {} clusters with {} noise bags",
            self.name(),
            assignment.n_clusters(),
            assignment.n_noise()
        );
        Ok(DbscanModel { assignment })
    }

    /// All bags within `epsilon` of bag `i`, inclusive of `i` itself.
    fn region_query(&self, matrix: &DistanceMatrix, i: usize) -> Vec<usize> {
        matrix
            .row(i)
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d <= self.config.epsilon)
            .map(|(j, _)| j)
            .collect()
    }

    /// Grows a new cluster outward from a core bag's neighborhood.
    fn expand(&self, matrix: &DistanceMatrix, labels: &mut [Label], cluster: usize, neighbors: Vec<usize>) {
        // Every bag in the seed neighborhood joins the cluster immediately;
        // previously visited bags only re-enter the frontier if they were
        // unclassified.
        let mut frontier = Vec::new();
        for j in neighbors {
            if labels[j] == Label::Unclassified {
                frontier.push(j);
            }
            labels[j] = Label::Cluster(cluster);
        }

        while let Some(j) = frontier.pop() {
            let reachable = self.region_query(matrix, j);
            if reachable.len() < self.config.min_points {
                continue;
            }
            // `j` is itself a core bag: everything in its neighborhood is
            // density-reachable, so unclassified and noise bags join the
            // cluster and the unclassified ones keep the expansion going.
            for r in reachable {
                match labels[r] {
                    Label::Unclassified => {
                        labels[r] = Label::Cluster(cluster);
                        frontier.push(r);
                    }
                    Label::Noise => labels[r] = Label::Cluster(cluster),
                    Label::Cluster(_) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bag, BagMetric, FeatureVector, HausdorffKind};

    fn line_dataset(points: &[f64]) -> (Dataset, DistanceMatrix) {
        let bags = points
            .iter()
            .enumerate()
            .map(|(i, &p)| Bag::new(format!("b{i}"), vec![FeatureVector::new(vec![p])]).unwrap())
            .collect();
        let data = Dataset::new(bags).unwrap();
        let matrix = DistanceMatrix::compute(&data, &BagMetric::hausdorff(HausdorffKind::MaxMin));
        (data, matrix)
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(DbscanConfig::new(0.0, 3).is_err());
        assert!(DbscanConfig::new(-1.0, 3).is_err());
        assert!(DbscanConfig::new(f64::NAN, 3).is_err());
        assert!(DbscanConfig::new(1.0, 0).is_err());
    }

    #[test]
    fn separates_dense_groups_and_noise() {
        // Two dense groups and one far outlier.
        let (data, matrix) = line_dataset(&[0.0, 0.4, 0.8, 50.0, 10.0, 10.4, 10.8]);
        let config = DbscanConfig::new(0.5, 2).unwrap();
        let model = Dbscan::new(config).fit(&data, &matrix).unwrap();

        assert_eq!(model.n_clusters(), 2);
        assert_eq!(model.n_noise(), 1);
        let labels = model.assignment().labels();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[4], labels[5]);
        assert!(labels[3].is_none());
        assert_ne!(labels[0], labels[4]);
    }

    #[test]
    fn min_points_of_one_leaves_no_noise() {
        // Every bag is its own core object.
        let (data, matrix) = line_dataset(&[0.0, 10.0, 20.0, 30.0]);
        let config = DbscanConfig::new(0.5, 1).unwrap();
        let model = Dbscan::new(config).fit(&data, &matrix).unwrap();

        assert_eq!(model.n_noise(), 0);
        assert_eq!(model.n_clusters(), 4);
    }

    #[test]
    fn noise_is_promoted_when_reached_from_a_core_bag() {
        // Bag 0 is visited first and provisionally noise; bag 1 is a core bag
        // whose neighborhood pulls bag 0 into the cluster.
        let (data, matrix) = line_dataset(&[0.0, 0.9, 1.8]);
        let config = DbscanConfig::new(1.0, 3).unwrap();
        let model = Dbscan::new(config).fit(&data, &matrix).unwrap();

        assert_eq!(model.n_clusters(), 1);
        assert_eq!(model.n_noise(), 0);
    }

    #[test]
    fn chains_connect_through_core_bags() {
        let points = (0..10).map(|i| f64::from(i) * 0.3).collect::<Vec<_>>();
        let (data, matrix) = line_dataset(&points);
        let config = DbscanConfig::new(0.5, 2).unwrap();
        let model = Dbscan::new(config).fit(&data, &matrix).unwrap();

        assert_eq!(model.n_clusters(), 1);
        assert_eq!(model.n_noise(), 0);
    }
}
