//! Cluster validity: internal and external quality indices for assignments.
//!
//! The engine borrows a dataset, a metric, and the shared distance matrix,
//! and scores any assignment against them: assignments produced by the
//! clusterers in this crate or supplied externally. The engine never mutates
//! the assignment.

mod dbcv;
mod external;
mod internal;

pub use external::{ClassScores, ConfusionMatrix, ExternalReport};

use serde::{Deserialize, Serialize};

use crate::{Assignment, BagMetric, Dataset, DistanceMatrix, Error, Result, RunContext};

/// The internal (label-free) validity indices of an assignment.
///
/// Indices that are undefined for the assignment (fewer than two non-empty
/// clusters) hold the `-1.0` sentinel.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct InternalReport {
    /// Mean silhouette coefficient over assigned bags.
    pub silhouette: f64,
    /// Scatter-plus-density index; lower is better.
    pub s_dbw: f64,
    /// Davies-Bouldin index; lower is better.
    pub davies_bouldin: f64,
    /// Xie-Beni index; lower is better.
    pub xie_beni: f64,
    /// Root-mean-square standard deviation of the pooled cluster instances.
    pub rms_std_dev: f64,
    /// Sum of squared bag-to-centroid distances.
    pub total_within_cluster_variation: f64,
    /// Density-based cluster validity in `[-1, 1]`; higher is better.
    pub dbcv: f64,
}

/// Everything an experiment driver needs back from one evaluation: cluster
/// and noise counts, the internal indices, and, when the dataset carries
/// class labels, the external indices with their confusion matrix.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct ValidityReport {
    /// The number of clusters in the assignment.
    pub n_clusters: usize,
    /// The number of noise/unassigned bags.
    pub n_noise: usize,
    /// The internal indices.
    pub internal: InternalReport,
    /// The external indices, when the dataset carries class labels.
    pub external: Option<ExternalReport>,
}

/// The concurrent cluster-validity evaluation engine.
#[must_use]
pub struct ValidityEngine<'a> {
    /// The dataset the assignments are scored against.
    data: &'a Dataset,
    /// The bag metric distances were computed with.
    metric: &'a BagMetric,
    /// The shared pairwise distance matrix.
    matrix: &'a DistanceMatrix,
}

impl<'a> ValidityEngine<'a> {
    /// Creates an engine over a dataset, a metric, and its distance matrix.
    ///
    /// # Errors
    ///
    /// [`Error::MatrixMismatch`] if the matrix does not cover the dataset.
    pub fn new(data: &'a Dataset, metric: &'a BagMetric, matrix: &'a DistanceMatrix) -> Result<Self> {
        matrix.check_covers(data)?;
        Ok(Self { data, metric, matrix })
    }

    /// Mean silhouette coefficient; `-1.0` if fewer than two clusters exist.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn silhouette(&self, assignment: &Assignment) -> Result<f64> {
        self.check(assignment)?;
        Ok(internal::silhouette(self.matrix, assignment, false))
    }

    /// S_Dbw index; `-1.0` if fewer than two clusters exist.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn s_dbw(&self, assignment: &Assignment) -> Result<f64> {
        self.check(assignment)?;
        Ok(internal::s_dbw(self.data, assignment))
    }

    /// Davies-Bouldin index; `-1.0` if fewer than two clusters exist.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn davies_bouldin(&self, assignment: &Assignment) -> Result<f64> {
        self.check(assignment)?;
        Ok(internal::davies_bouldin(self.data, self.metric, assignment))
    }

    /// Xie-Beni index; `-1.0` if fewer than two clusters exist.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn xie_beni(&self, assignment: &Assignment) -> Result<f64> {
        self.check(assignment)?;
        Ok(internal::xie_beni(self.data, self.metric, assignment))
    }

    /// Root-mean-square standard deviation of the pooled cluster instances.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn rms_std_dev(&self, assignment: &Assignment) -> Result<f64> {
        self.check(assignment)?;
        Ok(internal::rms_std_dev(self.data, assignment))
    }

    /// Sum of squared bag-to-centroid distances.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn total_within_cluster_variation(&self, assignment: &Assignment) -> Result<f64> {
        self.check(assignment)?;
        Ok(internal::total_within_cluster_variation(self.data, self.metric, assignment))
    }

    /// DBCV index; `-1.0` if fewer than two clusters exist.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn dbcv(&self, assignment: &Assignment) -> Result<f64> {
        self.check(assignment)?;
        Ok(dbcv::dbcv(self.data, self.matrix, assignment, false))
    }

    /// All internal indices.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn internal(&self, assignment: &Assignment) -> Result<InternalReport> {
        self.check(assignment)?;
        Ok(self.internal_inner(assignment, false))
    }

    /// Parallel version of [`Self::internal`], run inside the given context.
    ///
    /// The per-bag silhouette scores and the per-cluster MSTs of DBCV
    /// distribute over the context's pool; results are merged by index, so
    /// the report is identical to [`Self::internal`] for any pool size.
    ///
    /// # Errors
    ///
    /// See [`Self::internal`].
    pub fn par_internal(&self, assignment: &Assignment, ctx: &RunContext) -> Result<InternalReport> {
        self.check(assignment)?;
        Ok(ctx.install(|| self.internal_inner(assignment, true)))
    }

    /// External indices against the dataset's class labels.
    ///
    /// # Errors
    ///
    /// - [`Error::AssignmentMismatch`] if the assignment does not cover the
    ///   dataset.
    /// - [`Error::MissingClassLabels`] if any bag lacks a class label.
    pub fn external(&self, assignment: &Assignment) -> Result<ExternalReport> {
        self.check(assignment)?;
        external::external_report(self.data, assignment)
    }

    /// The full evaluation bundle: cluster counts, internal indices, and
    /// external indices when the dataset carries class labels.
    ///
    /// # Errors
    ///
    /// [`Error::AssignmentMismatch`] if the assignment does not cover the
    /// dataset.
    pub fn evaluate(&self, assignment: &Assignment) -> Result<ValidityReport> {
        self.check(assignment)?;
        Ok(self.bundle(assignment, self.internal_inner(assignment, false)))
    }

    /// Parallel version of [`Self::evaluate`], run inside the given context.
    ///
    /// # Errors
    ///
    /// See [`Self::evaluate`].
    pub fn par_evaluate(&self, assignment: &Assignment, ctx: &RunContext) -> Result<ValidityReport> {
        self.check(assignment)?;
        let internal = ctx.install(|| self.internal_inner(assignment, true));
        Ok(self.bundle(assignment, internal))
    }

    /// Computes every internal index.
    fn internal_inner(&self, assignment: &Assignment, pooled: bool) -> InternalReport {
        ftlog::info!(
            "Computing internal validity indices for {} clusters over {} bags",
            assignment.n_clusters(),
            assignment.len()
        );
        InternalReport {
            silhouette: internal::silhouette(self.matrix, assignment, pooled),
            s_dbw: internal::s_dbw(self.data, assignment),
            davies_bouldin: internal::davies_bouldin(self.data, self.metric, assignment),
            xie_beni: internal::xie_beni(self.data, self.metric, assignment),
            rms_std_dev: internal::rms_std_dev(self.data, assignment),
            total_within_cluster_variation: internal::total_within_cluster_variation(
                self.data,
                self.metric,
                assignment,
            ),
            dbcv: dbcv::dbcv(self.data, self.matrix, assignment, pooled),
        }
    }

    /// Assembles the full report, attaching external indices when labels
    /// exist.
    fn bundle(&self, assignment: &Assignment, internal: InternalReport) -> ValidityReport {
        // `check` has already validated the assignment against the dataset,
        // so the only possible error here is a missing class label.
        let external = external::external_report(self.data, assignment).ok();
        ValidityReport {
            n_clusters: assignment.n_clusters(),
            n_noise: assignment.n_noise(),
            internal,
            external,
        }
    }

    /// Rejects assignments that do not cover the dataset, leaving the engine
    /// unchanged.
    fn check(&self, assignment: &Assignment) -> Result<()> {
        if assignment.len() == self.data.cardinality() {
            Ok(())
        } else {
            Err(Error::AssignmentMismatch {
                assignment_len: assignment.len(),
                n_bags: self.data.cardinality(),
            })
        }
    }
}
