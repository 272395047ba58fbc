//! External cluster validity indices.
//!
//! These compare an assignment against known class labels through a confusion
//! matrix and an optimal cluster-to-class mapping found by branch-and-bound.

use serde::{Deserialize, Serialize};

use crate::{Assignment, Dataset, Error, Result};

/// The `clusters x classes` matrix of co-occurrence counts.
///
/// Noise bags belong to no cluster and are not counted here; they still count
/// against purity and agreement, which divide by the full dataset size.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct ConfusionMatrix {
    /// `counts[cluster][class]` co-occurrence counts.
    counts: Vec<Vec<usize>>,
    /// The number of classes.
    n_classes: usize,
}

impl ConfusionMatrix {
    /// Builds the matrix by counting assigned bags.
    pub(crate) fn build(assignment: &Assignment, class_labels: &[usize], n_classes: usize) -> Self {
        let mut counts = vec![vec![0; n_classes]; assignment.n_clusters()];
        for (&label, &class) in assignment.labels().iter().zip(class_labels) {
            if let Some(cluster) = label {
                counts[cluster][class] += 1;
            }
        }
        Self { counts, n_classes }
    }

    /// The co-occurrence count of a cluster and a class.
    #[must_use]
    pub fn get(&self, cluster: usize, class: usize) -> usize {
        self.counts[cluster][class]
    }

    /// The number of clusters (rows).
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.counts.len()
    }

    /// The number of classes (columns).
    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// The number of assigned bags in a cluster.
    #[must_use]
    pub fn cluster_size(&self, cluster: usize) -> usize {
        self.counts[cluster].iter().sum()
    }

    /// The number of assigned bags with a class.
    #[must_use]
    pub fn class_size(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    /// The total number of assigned bags.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().map(|row| row.iter().sum::<usize>()).sum()
    }
}

/// Precision, recall, F1, and specificity of one class under the optimal
/// mapping.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ClassScores {
    /// The class these scores describe.
    pub class: usize,
    /// `TP / (TP + FP)`, zero when the class has no predictions.
    pub precision: f64,
    /// `TP / (TP + FN)`, zero when the class has no bags.
    pub recall: f64,
    /// The harmonic mean of precision and recall.
    pub f1: f64,
    /// `TN / (TN + FP)`.
    pub specificity: f64,
}

/// The external validity scores of an assignment against class labels.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct ExternalReport {
    /// The confusion matrix the scores were computed from.
    pub confusion: ConfusionMatrix,
    /// The optimal cluster-to-class mapping; `None` for clusters mapped to no
    /// class.
    pub mapping: Vec<Option<usize>>,
    /// The total misclassification count under the optimal mapping.
    pub misclassified: usize,
    /// The fraction of bags in their cluster's majority class.
    pub purity: f64,
    /// The fraction of bags in their cluster's mapped class.
    pub agreement: f64,
    /// Per-class precision/recall/F1/specificity under the mapping.
    pub per_class: Vec<ClassScores>,
    /// Macro-averaged precision. Binary datasets report the positive class;
    /// multi-class datasets weight by cluster size.
    pub macro_precision: f64,
    /// Macro-averaged recall, with the same averaging rule.
    pub macro_recall: f64,
    /// Macro-averaged F1, with the same averaging rule.
    pub macro_f1: f64,
    /// Macro-averaged specificity, with the same averaging rule.
    pub macro_specificity: f64,
}

/// Computes the external report for an assignment over a labeled dataset.
///
/// # Errors
///
/// [`Error::MissingClassLabels`] if any bag lacks a class label.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn external_report(data: &Dataset, assignment: &Assignment) -> Result<ExternalReport> {
    let class_labels = data.class_labels().ok_or(Error::MissingClassLabels)?;
    let n_classes = data.n_classes();
    let confusion = ConfusionMatrix::build(assignment, &class_labels, n_classes);

    let (mapping, misclassified) = optimal_mapping(&confusion);

    let n_total = data.cardinality() as f64;
    let purity = (0..confusion.n_clusters())
        .map(|c| (0..n_classes).map(|t| confusion.get(c, t)).max().unwrap_or(0))
        .sum::<usize>() as f64
        / n_total;
    let agreement = mapping
        .iter()
        .enumerate()
        .filter_map(|(c, &t)| t.map(|t| confusion.get(c, t)))
        .sum::<usize>() as f64
        / n_total;

    let per_class = (0..n_classes).map(|t| class_scores(&confusion, &mapping, t)).collect::<Vec<_>>();

    let (macro_precision, macro_recall, macro_f1, macro_specificity) = if n_classes == 2 {
        // Binary datasets macro-average to the positive class only; class 1
        // is the positive class by convention.
        let positive = per_class[1];
        (positive.precision, positive.recall, positive.f1, positive.specificity)
    } else {
        // Multi-class macro-averages weight each mapped class by the size of
        // the cluster mapped to it.
        let mut weight_sum = 0.0;
        let mut sums = (0.0, 0.0, 0.0, 0.0);
        for (c, &t) in mapping.iter().enumerate() {
            if let Some(t) = t {
                let weight = confusion.cluster_size(c) as f64;
                weight_sum += weight;
                sums.0 += weight * per_class[t].precision;
                sums.1 += weight * per_class[t].recall;
                sums.2 += weight * per_class[t].f1;
                sums.3 += weight * per_class[t].specificity;
            }
        }
        if weight_sum > 0.0 {
            (
                sums.0 / weight_sum,
                sums.1 / weight_sum,
                sums.2 / weight_sum,
                sums.3 / weight_sum,
            )
        } else {
            (0.0, 0.0, 0.0, 0.0)
        }
    };

    Ok(ExternalReport {
        confusion,
        mapping,
        misclassified,
        purity,
        agreement,
        per_class,
        macro_precision,
        macro_recall,
        macro_f1,
        macro_specificity,
    })
}

/// Finds the cluster-to-class mapping minimizing total misclassification by
/// branch-and-bound.
///
/// No two clusters may map to the same class; a cluster may map to no class,
/// at the cost of all its bags (zero for an empty cluster). Partial
/// assignments whose accumulated error already reaches the best complete
/// solution are pruned.
pub(crate) fn optimal_mapping(confusion: &ConfusionMatrix) -> (Vec<Option<usize>>, usize) {
    let n_clusters = confusion.n_clusters();
    let n_classes = confusion.n_classes();
    let sizes = (0..n_clusters).map(|c| confusion.cluster_size(c)).collect::<Vec<_>>();

    let mut best_cost = usize::MAX;
    let mut best = vec![None; n_clusters];
    let mut current = vec![None; n_clusters];
    let mut used = vec![false; n_classes];

    /// Depth-first search over cluster-to-class choices, in cluster order.
    #[expect(clippy::too_many_arguments)]
    fn descend(
        confusion: &ConfusionMatrix,
        sizes: &[usize],
        cluster: usize,
        cost: usize,
        used: &mut Vec<bool>,
        current: &mut Vec<Option<usize>>,
        best: &mut Vec<Option<usize>>,
        best_cost: &mut usize,
    ) {
        if cost >= *best_cost {
            return;
        }
        if cluster == confusion.n_clusters() {
            *best_cost = cost;
            best.clone_from(current);
            return;
        }

        // An empty cluster maps to no class at zero cost.
        if sizes[cluster] == 0 {
            current[cluster] = None;
            descend(confusion, sizes, cluster + 1, cost, used, current, best, best_cost);
            return;
        }

        for class in 0..confusion.n_classes() {
            if used[class] {
                continue;
            }
            used[class] = true;
            current[cluster] = Some(class);
            let class_cost = sizes[cluster] - confusion.get(cluster, class);
            descend(
                confusion,
                sizes,
                cluster + 1,
                cost + class_cost,
                used,
                current,
                best,
                best_cost,
            );
            used[class] = false;
        }
        // Leaving the cluster unmapped costs all of its bags.
        current[cluster] = None;
        descend(confusion, sizes, cluster + 1, cost + sizes[cluster], used, current, best, best_cost);
        current[cluster] = None;
    }

    descend(confusion, &sizes, 0, 0, &mut used, &mut current, &mut best, &mut best_cost);
    (best, best_cost)
}

/// The scores of one class under the mapping.
///
/// A class with no mapped cluster has zero true and false positives: its
/// precision, recall, and F1 are zero and its specificity is one.
#[expect(clippy::cast_precision_loss)]
fn class_scores(confusion: &ConfusionMatrix, mapping: &[Option<usize>], class: usize) -> ClassScores {
    let n = confusion.total();
    let cluster = mapping.iter().position(|&t| t == Some(class));

    let (tp, fp) = cluster.map_or((0, 0), |c| {
        let tp = confusion.get(c, class);
        (tp, confusion.cluster_size(c) - tp)
    });
    let fn_ = confusion.class_size(class) - tp;
    let tn = n - tp - fp - fn_;

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    let specificity = ratio(tn, tn + fp);

    ClassScores {
        class,
        precision,
        recall,
        f1,
        specificity,
    }
}

/// `numerator / denominator`, zero when the denominator is zero.
#[expect(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
