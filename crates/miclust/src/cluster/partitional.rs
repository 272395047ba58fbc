//! Partitional clustering over bags: K-means-style with a pluggable centroid
//! policy.
//!
//! The mean-of-instances policy is the plain variant; the medoid-of-bags
//! policy ("BAMIC") designates a real bag as each cluster's centroid. The
//! policy is a constructor parameter, not a subtype.

use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::{Bag, BagMetric, Dataset, DistanceMatrix, Error, FeatureVector, Result, RunContext};

use super::Assignment;

/// How a cluster's centroid is recomputed in the update step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentroidPolicy {
    /// The per-attribute mean of the pooled instances of the cluster's bags,
    /// as a synthetic single-instance bag.
    #[default]
    MeanOfInstances,
    /// The real bag in the cluster closest to the pooled-instance mean.
    MedoidOfBags,
}

/// A cluster centroid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[must_use]
pub enum Centroid {
    /// A synthetic mean-of-pooled-instances vector.
    Mean(FeatureVector),
    /// The index of a designated medoid bag.
    Medoid(usize),
}

/// Configuration of a partitional clustering run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[must_use]
pub struct KmicConfig {
    /// The number of clusters to form.
    pub k: usize,
    /// The iteration cap.
    pub max_iterations: usize,
    /// The seed for drawing the initial centroids.
    pub seed: u64,
    /// The centroid recomputation policy.
    pub policy: CentroidPolicy,
}

impl KmicConfig {
    /// Creates a configuration for `k` clusters with defaults: 500 iterations,
    /// seed 42, mean-of-instances centroids.
    pub const fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 500,
            seed: 42,
            policy: CentroidPolicy::MeanOfInstances,
        }
    }

    /// Sets the iteration cap.
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the seed for centroid initialization.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the centroid recomputation policy.
    pub const fn with_policy(mut self, policy: CentroidPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// The result of a partitional clustering run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct KmicModel {
    /// The final assignment, with dense cluster ids.
    assignment: Assignment,
    /// The centroid of each cluster, aligned with the assignment's ids.
    centroids: Vec<Centroid>,
    /// The number of update iterations that ran.
    iterations: usize,
    /// Whether the run converged before hitting the iteration cap.
    converged: bool,
}

impl KmicModel {
    /// The final assignment.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Consumes the model and returns the assignment.
    #[must_use]
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    /// The centroid of each cluster, aligned with the assignment's ids.
    #[must_use]
    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    /// The number of update iterations that ran.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the run converged before hitting the iteration cap.
    #[must_use]
    pub const fn converged(&self) -> bool {
        self.converged
    }
}

/// Whether a run's phases execute sequentially or on the run's worker pool.
#[derive(Clone, Copy)]
enum Parallelism {
    /// Single-threaded phases.
    Sequential,
    /// Rayon phases, scheduled on the installed pool.
    Pooled,
}

/// The partitional clusterer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct Kmic {
    /// The run configuration.
    config: KmicConfig,
}

impl Kmic {
    /// Creates a clusterer with the given configuration.
    pub const fn new(config: KmicConfig) -> Self {
        Self { config }
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &KmicConfig {
        &self.config
    }

    /// Returns the name of the algorithm, including its parameters.
    #[must_use]
    pub fn name(&self) -> String {
        match self.config.policy {
            CentroidPolicy::MeanOfInstances => format!("Kmic(k={})", self.config.k),
            CentroidPolicy::MedoidOfBags => format!("Bamic(k={})", self.config.k),
        }
    }

    /// Runs the algorithm to convergence.
    ///
    /// When a distance matrix is supplied, bag-to-medoid distances are read
    /// from it instead of being recomputed; distances to synthetic mean
    /// centroids always go through the metric.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidClusterCount`] if `k == 0` or `k` exceeds the
    ///   dataset size.
    /// - [`Error::InvalidParameter`] if the dataset holds fewer than `k`
    ///   distinct bags.
    /// - [`Error::MatrixMismatch`] if a supplied matrix does not cover the
    ///   dataset.
    pub fn fit(&self, data: &Dataset, metric: &BagMetric, matrix: Option<&DistanceMatrix>) -> Result<KmicModel> {
        self.validate(data, matrix)?;
        self.run(data, metric, matrix, Parallelism::Sequential)
    }

    /// Parallel version of [`Self::fit`], run inside the given context.
    ///
    /// The assignment and update phases distribute over the context's pool;
    /// results are merged by index after each phase, so the output is
    /// identical to [`Self::fit`] for any pool size.
    ///
    /// # Errors
    ///
    /// See [`Self::fit`].
    pub fn par_fit(
        &self,
        data: &Dataset,
        metric: &BagMetric,
        matrix: Option<&DistanceMatrix>,
        ctx: &RunContext,
    ) -> Result<KmicModel> {
        self.validate(data, matrix)?;
        ctx.install(|| self.run(data, metric, matrix, Parallelism::Pooled))
    }

    /// Runs exactly one assignment + update pass from a candidate assignment.
    ///
    /// This is the integration point for evolutionary search: the candidate
    /// assignment supplies the starting centroid set (recomputed under this
    /// clusterer's centroid policy), one assignment pass and one update pass
    /// run, and the resulting state is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::AssignmentMismatch`] if the candidate does not cover the
    ///   dataset.
    /// - [`Error::InvalidParameter`] if the candidate assigns no bags.
    /// - [`Error::MatrixMismatch`] if a supplied matrix does not cover the
    ///   dataset.
    pub fn step(
        &self,
        data: &Dataset,
        metric: &BagMetric,
        matrix: Option<&DistanceMatrix>,
        start: &Assignment,
    ) -> Result<KmicModel> {
        if let Some(matrix) = matrix {
            matrix.check_covers(data)?;
        }
        if start.len() != data.cardinality() {
            return Err(Error::AssignmentMismatch {
                assignment_len: start.len(),
                n_bags: data.cardinality(),
            });
        }
        if start.n_clusters() == 0 {
            return Err(Error::InvalidParameter {
                name: "assignment",
                message: "candidate assignment has no clusters".to_string(),
            });
        }

        // Starting centroids from the candidate's clusters; noise bags do not
        // contribute.
        let members = start.all_members();
        let centroids = members
            .iter()
            .map(|m| self.centroid_of(data, metric, m))
            .collect::<Vec<_>>();

        let labels = self.assign(data, metric, matrix, &centroids, Parallelism::Sequential);
        let (centroids, labels) = self.update(data, metric, &labels, centroids.len(), Parallelism::Sequential);

        Ok(KmicModel {
            assignment: Assignment::compacted(labels.into_iter().map(Some).collect()),
            centroids,
            iterations: 1,
            converged: false,
        })
    }

    /// Fails fast on configuration errors, before any work starts.
    fn validate(&self, data: &Dataset, matrix: Option<&DistanceMatrix>) -> Result<()> {
        if self.config.k == 0 || self.config.k > data.cardinality() {
            return Err(Error::InvalidClusterCount {
                requested: self.config.k,
                n_bags: data.cardinality(),
            });
        }
        if let Some(matrix) = matrix {
            matrix.check_covers(data)?;
        }
        Ok(())
    }

    /// The full convergent loop.
    fn run(
        &self,
        data: &Dataset,
        metric: &BagMetric,
        matrix: Option<&DistanceMatrix>,
        parallelism: Parallelism,
    ) -> Result<KmicModel> {
        ftlog::info!("Running {} on {} bags", self.name(), data.cardinality());

        let seeds = self.seed_bags(data)?;
        let mut centroids = seeds
            .into_iter()
            .map(|i| Centroid::Mean(data[i].instance_mean()))
            .collect::<Vec<_>>();

        let mut labels = self.assign(data, metric, matrix, &centroids, parallelism);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;
            let (new_centroids, remapped) = self.update(data, metric, &labels, centroids.len(), parallelism);
            centroids = new_centroids;

            let new_labels = self.assign(data, metric, matrix, &centroids, parallelism);
            // Convergence is decided by value equality of assignments, with
            // the previous labels renumbered to the surviving clusters.
            converged = new_labels == remapped;
            labels = new_labels;
            if converged {
                break;
            }
        }

        // One final full re-assignment pass so the stored assignment matches
        // the stored centroids exactly.
        let labels = self.assign(data, metric, matrix, &centroids, parallelism);
        let (assignment, centroids) = compact_with_centroids(labels, centroids);

        ftlog::info!(
            "{} finished after {iterations} iterations (converged: {converged}) with {} clusters",
            self.name(),
            assignment.n_clusters()
        );
        Ok(KmicModel {
            assignment,
            centroids,
            iterations,
            converged,
        })
    }

    /// Draws `k` distinct seed bags uniformly at random without replacement.
    ///
    /// Distinctness is decided by exact attribute-value equality, not by
    /// distance.
    fn seed_bags(&self, data: &Dataset) -> Result<Vec<usize>> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut pool = (0..data.cardinality()).collect::<Vec<_>>();
        pool.shuffle(&mut rng);

        let mut seeds: Vec<usize> = Vec::with_capacity(self.config.k);
        for candidate in pool {
            if seeds.iter().all(|&s| !data[s].same_instances(&data[candidate])) {
                seeds.push(candidate);
                if seeds.len() == self.config.k {
                    return Ok(seeds);
                }
            }
        }
        Err(Error::InvalidParameter {
            name: "k",
            message: format!(
                "dataset has only {} distinct bags, but k = {}",
                seeds.len(),
                self.config.k
            ),
        })
    }

    /// Assigns every bag to its nearest live centroid; ties break to the
    /// lowest cluster id.
    fn assign(
        &self,
        data: &Dataset,
        metric: &BagMetric,
        matrix: Option<&DistanceMatrix>,
        centroids: &[Centroid],
        parallelism: Parallelism,
    ) -> Vec<usize> {
        // Materialize synthetic centroid bags once per pass.
        let virtuals = centroids
            .iter()
            .map(|c| match c {
                Centroid::Mean(v) => Some(Bag::virtual_from(v.clone())),
                Centroid::Medoid(_) => None,
            })
            .collect::<Vec<_>>();

        let label_of = |bag_index: usize| -> usize {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (id, centroid) in centroids.iter().enumerate() {
                let d = match centroid {
                    Centroid::Mean(_) => virtuals[id]
                        .as_ref()
                        .map_or(f64::INFINITY, |v| metric.distance_unchecked(&data[bag_index], v)),
                    Centroid::Medoid(m) => matrix.map_or_else(
                        || metric.distance_unchecked(&data[bag_index], &data[*m]),
                        |matrix| matrix.get(bag_index, *m),
                    ),
                };
                if d < best_distance {
                    best_distance = d;
                    best = id;
                }
            }
            best
        };

        match parallelism {
            Parallelism::Sequential => (0..data.cardinality()).map(label_of).collect(),
            Parallelism::Pooled => {
                use rayon::prelude::*;
                (0..data.cardinality()).into_par_iter().map(label_of).collect()
            }
        }
    }

    /// Recomputes centroids for every non-empty cluster and renumbers the
    /// labels so ids stay dense.
    ///
    /// Returns the new centroids and the input labels remapped to the
    /// surviving cluster ids.
    fn update(
        &self,
        data: &Dataset,
        metric: &BagMetric,
        labels: &[usize],
        k: usize,
        parallelism: Parallelism,
    ) -> (Vec<Centroid>, Vec<usize>) {
        let mut members = vec![Vec::new(); k];
        for (i, &label) in labels.iter().enumerate() {
            members[label].push(i);
        }

        // Empty clusters are removed; ids above them shift down.
        let mut remap = vec![usize::MAX; k];
        let survivors = members
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_empty())
            .enumerate()
            .map(|(new_id, (old_id, m))| {
                remap[old_id] = new_id;
                m.as_slice()
            })
            .collect::<Vec<_>>();

        let centroids = match parallelism {
            Parallelism::Sequential => survivors.iter().map(|m| self.centroid_of(data, metric, m)).collect(),
            Parallelism::Pooled => {
                use rayon::prelude::*;
                survivors.par_iter().map(|m| self.centroid_of(data, metric, m)).collect()
            }
        };

        let remapped = labels.iter().map(|&label| remap[label]).collect();
        (centroids, remapped)
    }

    /// The centroid of one cluster under this clusterer's policy.
    fn centroid_of(&self, data: &Dataset, metric: &BagMetric, members: &[usize]) -> Centroid {
        let mean = pooled_mean(data, members);
        match self.config.policy {
            CentroidPolicy::MeanOfInstances => Centroid::Mean(mean),
            CentroidPolicy::MedoidOfBags => {
                // The real bag closest to the virtual mean bag; ties break to
                // the lowest bag index.
                let virtual_bag = Bag::virtual_from(mean);
                let mut best = members[0];
                let mut best_distance = f64::INFINITY;
                for &m in members {
                    let d = metric.distance_unchecked(&data[m], &virtual_bag);
                    if d < best_distance {
                        best_distance = d;
                        best = m;
                    }
                }
                Centroid::Medoid(best)
            }
        }
    }
}

/// The per-attribute mean over the pooled instances of the given bags.
///
/// This is the centroid-computation routine shared by the partitional
/// clusterer and the validity engine's centroid-driven indices.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn pooled_mean(data: &Dataset, members: &[usize]) -> FeatureVector {
    let dim = data.dimensionality();
    let mut sum = vec![0.0; dim];
    let mut count = 0_usize;
    for &m in members {
        for instance in data[m].instances() {
            for (s, &v) in sum.iter_mut().zip(instance.values()) {
                *s += v;
            }
        }
        count += data[m].n_instances();
    }
    if count > 0 {
        for s in &mut sum {
            *s /= count as f64;
        }
    }
    FeatureVector::new(sum)
}

/// Drops centroids of clusters the final re-assignment pass left empty and
/// compacts the assignment to dense ids.
fn compact_with_centroids(labels: Vec<usize>, centroids: Vec<Centroid>) -> (Assignment, Vec<Centroid>) {
    let mut seen = vec![false; centroids.len()];
    for &label in &labels {
        seen[label] = true;
    }
    let centroids = centroids
        .into_iter()
        .zip(seen.iter())
        .filter(|(_, &s)| s)
        .map(|(c, _)| c)
        .collect();
    let assignment = Assignment::compacted(labels.into_iter().map(Some).collect());
    (assignment, centroids)
}
