//! Integration tests for the validity engine.

use miclust::{
    Algorithm, Assignment, BagMetric, DistanceMatrix, HausdorffKind, Kmic, KmicConfig, RunContext, ValidityEngine,
};

mod common;

#[test]
fn silhouette_is_one_for_perfect_separation() {
    // Two groups with zero intra-group distance and a huge inter-group gap.
    let data = common::data_gen::two_point_groups(5, 2);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);
    let engine = ValidityEngine::new(&data, &metric, &matrix).unwrap();

    let labels = (0..10).map(|i| Some(usize::from(i >= 5))).collect();
    let assignment = Assignment::from_labels(labels).unwrap();

    let s = engine.silhouette(&assignment).unwrap();
    assert!((s - 1.0).abs() < 1e-12, "expected silhouette 1.0, got {s}");
}

#[test]
fn sentinels_for_single_cluster_assignments() {
    let data = common::data_gen::separated_blobs(2, 4, 2, 3);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);
    let engine = ValidityEngine::new(&data, &metric, &matrix).unwrap();

    let one_cluster = Assignment::from_labels(vec![Some(0); data.cardinality()]).unwrap();
    assert!((engine.silhouette(&one_cluster).unwrap() - (-1.0)).abs() < 1e-12);
    assert!((engine.s_dbw(&one_cluster).unwrap() - (-1.0)).abs() < 1e-12);
    assert!((engine.davies_bouldin(&one_cluster).unwrap() - (-1.0)).abs() < 1e-12);
    assert!((engine.xie_beni(&one_cluster).unwrap() - (-1.0)).abs() < 1e-12);
    assert!((engine.dbcv(&one_cluster).unwrap() - (-1.0)).abs() < 1e-12);
}

#[test]
fn dbcv_separates_compact_from_overlapping() {
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);

    let compact = common::data_gen::separated_blobs(2, 5, 2, 7);
    let matrix = DistanceMatrix::compute(&compact, &metric);
    let engine = ValidityEngine::new(&compact, &metric, &matrix).unwrap();
    let labels = (0..10).map(|i| Some(usize::from(i >= 5))).collect();
    let assignment = Assignment::from_labels(labels).unwrap();
    let good = engine.dbcv(&assignment).unwrap();
    assert!(good > 0.8, "well-separated clusters should score near 1, got {good}");

    // The same bags, but group labels shuffled across the groups: the
    // "clusters" now overlap completely.
    let shuffled = (0..10).map(|i| Some(i % 2)).collect();
    let assignment = Assignment::from_labels(shuffled).unwrap();
    let bad = engine.dbcv(&assignment).unwrap();
    assert!(bad < 0.1, "overlapping clusters should score near or below 0, got {bad}");
    assert!(good > bad);
}

#[test]
fn partitional_round_trip_never_fails_for_dense_results() {
    let data = common::data_gen::separated_blobs(3, 5, 2, 13);
    let metric = BagMetric::hausdorff(HausdorffKind::MeanMin);
    let matrix = DistanceMatrix::par_compute(&data, &metric);
    let engine = ValidityEngine::new(&data, &metric, &matrix).unwrap();

    for seed in 0..10 {
        let model = Kmic::new(KmicConfig::new(3).with_seed(seed))
            .fit(&data, &metric, Some(&matrix))
            .unwrap();
        let assignment = model.assignment();
        if assignment.n_clusters() < 2 || assignment.n_noise() > 0 {
            continue;
        }
        // Every internal index must be computable for a non-degenerate
        // partitional result.
        let report = engine.internal(assignment).unwrap();
        assert!(report.silhouette.is_finite());
        assert!(report.s_dbw.is_finite());
        assert!(report.davies_bouldin.is_finite());
        assert!(report.rms_std_dev.is_finite());
        assert!(report.total_within_cluster_variation.is_finite());
        assert!(report.dbcv.is_finite());
    }
}

#[test]
fn evaluate_bundles_counts_and_external_scores() {
    let data = common::data_gen::separated_blobs(2, 6, 2, 43);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);
    let engine = ValidityEngine::new(&data, &metric, &matrix).unwrap();

    // The generated group is the class label, so a perfect clustering scores
    // perfectly on the external indices.
    let labels = (0..12).map(|i| Some(usize::from(i >= 6))).collect();
    let assignment = Assignment::from_labels(labels).unwrap();

    let report = engine.evaluate(&assignment).unwrap();
    assert_eq!(report.n_clusters, 2);
    assert_eq!(report.n_noise, 0);

    let external = report.external.as_ref().expect("dataset is labeled");
    assert!((external.purity - 1.0).abs() < 1e-12);
    assert!((external.agreement - 1.0).abs() < 1e-12);
    assert_eq!(external.misclassified, 0);
    assert_eq!(external.mapping, vec![Some(0), Some(1)]);
    assert!((external.macro_f1 - 1.0).abs() < 1e-12);

    // The report is plain serializable data for the experiment driver.
    assert!(serde_json::to_string(&report).is_ok());
}

#[test]
fn parallel_evaluation_matches_sequential() {
    let data = common::data_gen::separated_blobs(3, 4, 2, 59);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::par_compute(&data, &metric);
    let engine = ValidityEngine::new(&data, &metric, &matrix).unwrap();

    let labels = (0..12).map(|i| Some(i / 4)).collect();
    let assignment = Assignment::from_labels(labels).unwrap();

    let sequential = engine.evaluate(&assignment).unwrap();
    for n_workers in [1, 3] {
        let ctx = RunContext::new(n_workers).unwrap();
        let parallel = engine.par_evaluate(&assignment, &ctx).unwrap();
        assert!((sequential.internal.silhouette - parallel.internal.silhouette).abs() < 1e-15);
        assert!((sequential.internal.dbcv - parallel.internal.dbcv).abs() < 1e-15);
        assert!((sequential.internal.s_dbw - parallel.internal.s_dbw).abs() < 1e-15);
    }
}

#[test]
fn usage_errors_leave_the_engine_reusable() {
    let data = common::data_gen::separated_blobs(2, 4, 2, 67);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);
    let engine = ValidityEngine::new(&data, &metric, &matrix).unwrap();

    // An assignment for a different dataset size is rejected...
    let stray = Assignment::from_labels(vec![Some(0), Some(1)]).unwrap();
    assert!(engine.silhouette(&stray).is_err());

    // ...and the engine keeps serving valid queries afterwards.
    let labels = (0..8).map(|i| Some(usize::from(i >= 4))).collect();
    let assignment = Assignment::from_labels(labels).unwrap();
    assert!(engine.silhouette(&assignment).is_ok());
}

#[test]
fn full_pipeline_through_the_registry() {
    let data = common::data_gen::separated_blobs(2, 6, 2, 73);
    let mut opts = std::collections::HashMap::new();
    opts.insert("k".to_string(), "2".to_string());
    opts.insert("seed".to_string(), "21".to_string());
    let algorithm = Algorithm::from_options("bamic", &opts).unwrap();

    let mut metric_opts = std::collections::HashMap::new();
    metric_opts.insert("hausdorff-type".to_string(), "mean-min".to_string());
    let metric = BagMetric::from_options("hausdorff", &metric_opts).unwrap();

    let matrix = DistanceMatrix::par_compute(&data, &metric);
    let output = algorithm.fit(&data, &metric, &matrix).unwrap();
    let assignment = output.assignment().expect("partitional output is flat");

    let engine = ValidityEngine::new(&data, &metric, &matrix).unwrap();
    let report = engine.evaluate(assignment).unwrap();
    assert_eq!(report.n_clusters, 2);
    assert!(report.external.is_some());
}
