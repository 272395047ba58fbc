//! Error types for multi-instance clustering.

/// Errors returned by the clustering engines and the validity engine.
///
/// Configuration errors are raised before any computation starts. Usage errors
/// are raised at the offending call site and leave engine state unchanged.
/// Numerical degeneracies (singular covariance, empty neighborhoods, zero
/// variance) are NOT errors; they are handled locally with documented
/// fallbacks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dataset has no bags.
    #[error("empty dataset")]
    EmptyDataset,

    /// A bag has no instances.
    #[error("empty bag: {id}")]
    EmptyBag {
        /// Identifier of the offending bag.
        id: String,
    },

    /// Two feature vectors (or two bags) disagree on the attribute schema.
    #[error("dimension mismatch: expected {expected} attributes, found {found}")]
    DimensionMismatch {
        /// Expected number of attributes.
        expected: usize,
        /// Number of attributes found.
        found: usize,
    },

    /// A parameter value is outside its legal range.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// The requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_bags} bags")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of bags in the dataset.
        n_bags: usize,
    },

    /// A name passed to a registry did not match any known variant.
    #[error("unknown {what}: {name:?}")]
    UnknownName {
        /// What kind of name was looked up, e.g. "bag metric".
        what: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// An option key was not recognized by the selected variant.
    #[error("unknown option {key:?} for {target}")]
    UnknownOption {
        /// The unrecognized key.
        key: String,
        /// The metric or algorithm the options were meant for.
        target: &'static str,
    },

    /// A bag index does not refer to a bag in the trained dataset.
    #[error("bag index {index} out of range for dataset of {n_bags} bags")]
    BagIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of bags in the dataset.
        n_bags: usize,
    },

    /// An assignment does not cover the dataset it is being scored against.
    #[error("assignment covers {assignment_len} bags, but dataset has {n_bags}")]
    AssignmentMismatch {
        /// Length of the assignment.
        assignment_len: usize,
        /// Number of bags in the dataset.
        n_bags: usize,
    },

    /// Cluster ids in an externally supplied assignment are not a dense range.
    #[error("cluster ids are not dense: cluster {id} is empty")]
    SparseClusterIds {
        /// An id in `[0, max_id]` with no members.
        id: usize,
    },

    /// A distance matrix does not cover the dataset it is being used with.
    #[error("distance matrix covers {matrix_n} bags, but dataset has {n_bags}")]
    MatrixMismatch {
        /// Size of the matrix.
        matrix_n: usize,
        /// Number of bags in the dataset.
        n_bags: usize,
    },

    /// External validity indices were requested on a dataset without class labels.
    #[error("class labels are required for external validity indices")]
    MissingClassLabels,

    /// The worker pool for a run could not be created.
    ///
    /// Fatal for the current run only; previously built distance matrices are
    /// unaffected.
    #[error("worker pool: {0}")]
    WorkerPool(String),
}

/// Result type used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;
