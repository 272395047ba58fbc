//! Cluster assignments: the mapping from bag index to cluster id.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A mapping from bag index to cluster id.
///
/// `None` is the noise/unassigned sentinel. Assigned ids always form the
/// dense range `[0, n_clusters)`: empty clusters are compacted out before an
/// assignment is ever reported, renumbering surviving clusters contiguously.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Assignment {
    /// The cluster label of each bag, `None` for noise.
    labels: Vec<Option<usize>>,
    /// The number of clusters, i.e. one more than the largest label.
    n_clusters: usize,
}

impl Assignment {
    /// Creates an assignment from per-bag labels, validating density.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyDataset`] if `labels` is empty.
    /// - [`Error::SparseClusterIds`] if any id in `[0, max_id]` has no
    ///   members.
    pub fn from_labels(labels: Vec<Option<usize>>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let n_clusters = labels.iter().flatten().max().map_or(0, |&m| m + 1);
        let mut seen = vec![false; n_clusters];
        for &label in labels.iter().flatten() {
            seen[label] = true;
        }
        if let Some(id) = seen.iter().position(|&s| !s) {
            return Err(Error::SparseClusterIds { id });
        }
        Ok(Self { labels, n_clusters })
    }

    /// Creates an assignment from labels that may skip ids, renumbering the
    /// surviving clusters contiguously in order of their old ids.
    pub fn compacted(labels: Vec<Option<usize>>) -> Self {
        let max_id = labels.iter().flatten().max().map_or(0, |&m| m + 1);
        let mut seen = vec![false; max_id];
        for &label in labels.iter().flatten() {
            seen[label] = true;
        }
        // Old id -> new dense id.
        let mut remap = vec![usize::MAX; max_id];
        let mut next = 0;
        for (old, &s) in seen.iter().enumerate() {
            if s {
                remap[old] = next;
                next += 1;
            }
        }
        let labels = labels.into_iter().map(|label| label.map(|old| remap[old])).collect();
        Self {
            labels,
            n_clusters: next,
        }
    }

    /// The per-bag labels, `None` for noise.
    #[must_use]
    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    /// The label of the bag at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::BagIndexOutOfRange`] if `index` does not refer to a bag in
    /// the trained dataset.
    pub fn label_of(&self, index: usize) -> Result<Option<usize>> {
        self.labels.get(index).copied().ok_or(Error::BagIndexOutOfRange {
            index,
            n_bags: self.labels.len(),
        })
    }

    /// The number of bags covered by the assignment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the assignment covers no bags. Never true for a constructed
    /// assignment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The number of clusters.
    #[must_use]
    pub const fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// The number of noise/unassigned bags.
    #[must_use]
    pub fn n_noise(&self) -> usize {
        self.labels.iter().filter(|label| label.is_none()).count()
    }

    /// The number of bags in each cluster, indexed by cluster id.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter().flatten() {
            sizes[label] += 1;
        }
        sizes
    }

    /// The bag indices assigned to the given cluster, in dataset order.
    #[must_use]
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label == Some(cluster))
            .map(|(i, _)| i)
            .collect()
    }

    /// The members of every cluster, indexed by cluster id.
    #[must_use]
    pub fn all_members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.n_clusters];
        for (i, &label) in self.labels.iter().enumerate() {
            if let Some(label) = label {
                members[label].push(i);
            }
        }
        members
    }
}
