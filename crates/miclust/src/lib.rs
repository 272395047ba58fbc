//! Multi-instance clustering: clustering collections of bags of feature
//! vectors, and scoring the quality of a clustering.
//!
//! Every inter-item comparison here is a comparison between two *sets* of
//! vectors, resolved through a pluggable bag distance. On top of that
//! abstraction sit three clustering engines with different state machines
//! (partitional, density-connectivity, density-ordering) and a concurrent
//! validity engine that scores any assignment they produce, or one supplied
//! externally.
//!
//! ## Modules
//!
//! - [`dataset`]: Feature vectors, bags, and datasets.
//! - [`metric`]: The bag-distance family and the memoized distance matrix.
//! - [`cluster`]: The three clustering engines and their assignments.
//! - [`validity`]: Internal and external cluster validity indices.
//!
//! All CPU-bound phases run on a per-run worker pool owned by a
//! [`RunContext`]; outputs are deterministic for any pool size.

pub mod cluster;
mod context;
pub mod dataset;
mod error;
pub mod metric;
mod utils;
pub mod validity;

pub use cluster::{
    Algorithm, Assignment, Centroid, CentroidPolicy, ClusteringOutput, Dbscan, DbscanConfig, DbscanModel, Kmic,
    KmicConfig, KmicModel, Optics, OpticsConfig, OrderingTrace, TraceEntry, UNDEFINED_DISTANCE,
};
pub use context::RunContext;
pub use dataset::{Bag, Dataset, FeatureVector};
pub use error::{Error, Result};
pub use metric::{BagMetric, CauchySchwarz, DistanceMatrix, Hausdorff, HausdorffKind, Mahalanobis};
pub use validity::{
    ClassScores, ConfusionMatrix, ExternalReport, InternalReport, ValidityEngine, ValidityReport,
};
