//! Density-ordering over bags.
//!
//! Instead of flat clusters, this algorithm emits a reachability ordering: a
//! trace of (bag, core distance, reachability distance) triples. Plotted, the
//! trace exposes cluster structure as valleys between reachability peaks.
//! Flat-cluster extraction from the trace is out of scope.

use core::cmp::Reverse;

use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::{Dataset, DistanceMatrix, Error, Result};

/// The sentinel for an undefined core or reachability distance.
pub const UNDEFINED_DISTANCE: f64 = f64::INFINITY;

/// Configuration of a density-ordering run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[must_use]
pub struct OpticsConfig {
    /// The neighborhood radius, inclusive.
    pub epsilon: f64,
    /// The neighborhood size at which a bag counts as a core object. Defaults
    /// to the dataset dimensionality plus one when not supplied.
    pub min_points: Option<usize>,
}

impl OpticsConfig {
    /// Creates a configuration, validating `epsilon`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `epsilon` is not positive and finite.
    pub fn new(epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                message: format!("must be positive and finite, got {epsilon}"),
            });
        }
        Ok(Self {
            epsilon,
            min_points: None,
        })
    }

    /// Sets an explicit core-object threshold.
    pub const fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = Some(min_points);
        self
    }
}

/// One step of the reachability ordering.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TraceEntry {
    /// The index of the bag in the dataset.
    pub bag_index: usize,
    /// The core distance of the bag, [`UNDEFINED_DISTANCE`] if the bag has
    /// fewer than `min_points` neighbors within `epsilon`.
    pub core_distance: f64,
    /// The reachability distance at which the bag was reached,
    /// [`UNDEFINED_DISTANCE`] for bags that started a new traversal.
    pub reachability: f64,
}

/// The reachability ordering produced by a density-ordering run, together
/// with the parameters that produced it.
///
/// The trace is plain data: the visualization collaborator may serialize it
/// in whatever byte format it chooses.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct OrderingTrace {
    /// The ordering, one entry per bag.
    entries: Vec<TraceEntry>,
    /// The neighborhood radius of the run.
    epsilon: f64,
    /// The core-object threshold of the run, after defaulting.
    min_points: usize,
}

impl OrderingTrace {
    /// The ordering, one entry per bag.
    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// The number of entries in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trace is empty. Never true for a completed run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The neighborhood radius of the run.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The core-object threshold of the run, after defaulting.
    #[must_use]
    pub const fn min_points(&self) -> usize {
        self.min_points
    }
}

/// The density-ordering algorithm.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[must_use]
pub struct Optics {
    /// The run configuration.
    config: OpticsConfig,
}

impl Optics {
    /// Creates the algorithm with the given configuration.
    pub const fn new(config: OpticsConfig) -> Self {
        Self { config }
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &OpticsConfig {
        &self.config
    }

    /// Returns the name of the algorithm, including its parameters.
    #[must_use]
    pub fn name(&self) -> String {
        self.config.min_points.map_or_else(
            || format!("Optics(epsilon={}, min_points=auto)", self.config.epsilon),
            |mp| format!("Optics(epsilon={}, min_points={mp})", self.config.epsilon),
        )
    }

    /// Produces the reachability ordering of the dataset.
    ///
    /// # Errors
    ///
    /// - [`Error::MatrixMismatch`] if the matrix does not cover the dataset.
    /// - [`Error::InvalidParameter`] if an explicit `min_points` is zero.
    pub fn fit(&self, data: &Dataset, matrix: &DistanceMatrix) -> Result<OrderingTrace> {
        matrix.check_covers(data)?;
        let min_points = self.config.min_points.unwrap_or(data.dimensionality() + 1);
        if min_points == 0 {
            return Err(Error::InvalidParameter {
                name: "min-points",
                message: "must be at least 1".to_string(),
            });
        }
        ftlog::info!(
            "Running Optics(epsilon={}, min_points={min_points}) on {} bags",
            self.config.epsilon,
            data.cardinality()
        );

        let n = data.cardinality();
        let mut processed = vec![false; n];
        let mut entries = Vec::with_capacity(n);

        // The seed set is keyed by reachability; the minimum reachability is
        // popped next, with ties broken by the lower bag index so the
        // ordering is deterministic.
        let mut seeds: PriorityQueue<usize, Reverse<(OrderedFloat<f64>, usize)>> = PriorityQueue::new();

        for start in 0..n {
            if processed[start] {
                continue;
            }
            processed[start] = true;
            let core = self.core_distance(matrix, start, min_points);
            entries.push(TraceEntry {
                bag_index: start,
                core_distance: core,
                reachability: UNDEFINED_DISTANCE,
            });

            // Bags with undefined core distance never seed an expansion.
            if core == UNDEFINED_DISTANCE {
                continue;
            }
            self.update_seeds(matrix, &mut seeds, &processed, start, core);

            while let Some((next, Reverse((OrderedFloat(reachability), _)))) = seeds.pop() {
                processed[next] = true;
                let core = self.core_distance(matrix, next, min_points);
                entries.push(TraceEntry {
                    bag_index: next,
                    core_distance: core,
                    reachability,
                });
                if core != UNDEFINED_DISTANCE {
                    self.update_seeds(matrix, &mut seeds, &processed, next, core);
                }
            }
        }

        Ok(OrderingTrace {
            entries,
            epsilon: self.config.epsilon,
            min_points,
        })
    }

    /// The distance to the `min_points`-th nearest bag within `epsilon`,
    /// counting the bag itself, or [`UNDEFINED_DISTANCE`] if the
    /// neighborhood is too small.
    fn core_distance(&self, matrix: &DistanceMatrix, i: usize, min_points: usize) -> f64 {
        let mut neighborhood = matrix
            .row(i)
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d <= self.config.epsilon)
            .map(|(j, &d)| (d, j))
            .collect::<Vec<_>>();
        if neighborhood.len() < min_points {
            return UNDEFINED_DISTANCE;
        }
        neighborhood.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
        neighborhood[min_points - 1].0
    }

    /// Offers every unprocessed neighbor of a core bag to the seed set,
    /// keeping the smaller reachability when the neighbor is already queued.
    fn update_seeds(
        &self,
        matrix: &DistanceMatrix,
        seeds: &mut PriorityQueue<usize, Reverse<(OrderedFloat<f64>, usize)>>,
        processed: &[bool],
        from: usize,
        core: f64,
    ) {
        for (j, &d) in matrix.row(from).iter().enumerate() {
            if d > self.config.epsilon || processed[j] {
                continue;
            }
            let reachability = core.max(d);
            // `push_increase` only replaces the priority when the new one is
            // greater; under `Reverse`, that means a smaller reachability.
            seeds.push_increase(j, Reverse((OrderedFloat(reachability), j)));
        }
    }
}
