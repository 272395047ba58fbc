//! Integration tests for the density-based algorithms.

use miclust::{
    BagMetric, Dbscan, DbscanConfig, DistanceMatrix, HausdorffKind, Optics, OpticsConfig, UNDEFINED_DISTANCE,
};

mod common;

#[test]
fn dbscan_recovers_separated_groups() {
    let data = common::data_gen::separated_blobs(3, 6, 2, 19);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::par_compute(&data, &metric);

    // Within a group, bags are within ~2 of each other; groups are ~100 apart.
    let config = DbscanConfig::new(5.0, 3).unwrap();
    let model = Dbscan::new(config).fit(&data, &matrix).unwrap();

    assert_eq!(model.n_clusters(), 3);
    assert_eq!(model.n_noise(), 0);
    let labels = model.assignment().labels();
    for group in 0..3 {
        let first = labels[group * 6];
        assert!(first.is_some());
        for b in 0..6 {
            assert_eq!(labels[group * 6 + b], first, "group {group} split apart");
        }
    }
}

#[test]
fn dbscan_with_min_points_one_assigns_every_bag() {
    let data = common::data_gen::separated_blobs(4, 3, 2, 37);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);

    // Every bag is its own core object, so nothing can stay noise.
    let config = DbscanConfig::new(0.001, 1).unwrap();
    let model = Dbscan::new(config).fit(&data, &matrix).unwrap();
    assert_eq!(model.n_noise(), 0);
    assert_eq!(
        model.assignment().labels().iter().filter(|l| l.is_some()).count(),
        data.cardinality()
    );
}

#[test]
fn dbscan_assignment_queries_outside_the_dataset_fail() {
    let data = common::data_gen::separated_blobs(2, 4, 2, 53);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);
    let model = Dbscan::new(DbscanConfig::new(5.0, 2).unwrap()).fit(&data, &matrix).unwrap();

    assert!(model.assignment().label_of(0).is_ok());
    assert!(model.assignment().label_of(data.cardinality()).is_err());
}

#[test]
fn optics_orders_groups_contiguously() {
    let data = common::data_gen::separated_blobs(2, 6, 2, 71);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);

    let config = OpticsConfig::new(200.0).unwrap().with_min_points(3);
    let trace = Optics::new(config).fit(&data, &matrix).unwrap();

    assert_eq!(trace.len(), data.cardinality());

    // Once the traversal enters a group it drains it before jumping to the
    // other group, so the group ids along the trace change exactly once.
    let group_of = |bag_index: usize| bag_index / 6;
    let changes = trace
        .entries()
        .windows(2)
        .filter(|w| group_of(w[0].bag_index) != group_of(w[1].bag_index))
        .count();
    assert_eq!(changes, 1);

    // The jump between groups is the lone large reachability value.
    let jumps = trace.entries()[1..].iter().filter(|e| e.reachability > 50.0).count();
    assert_eq!(jumps, 1);
}

#[test]
fn optics_within_epsilon_only_isolated_bags_are_undefined() {
    let data = common::data_gen::separated_blobs(2, 5, 2, 89);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);

    // Epsilon smaller than the group spacing: cores exist only within groups.
    let config = OpticsConfig::new(5.0).unwrap().with_min_points(3);
    let trace = Optics::new(config).fit(&data, &matrix).unwrap();

    for entry in trace.entries() {
        assert!(
            entry.core_distance != UNDEFINED_DISTANCE,
            "bag {} should be a core bag within its group",
            entry.bag_index
        );
    }

    assert_eq!(trace.epsilon(), 5.0);
    assert_eq!(trace.min_points(), 3);
}

#[test]
fn optics_through_the_registry_yields_an_ordering() {
    let data = common::data_gen::separated_blobs(2, 4, 2, 101);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);

    let mut opts = std::collections::HashMap::new();
    opts.insert("epsilon".to_string(), "5.0".to_string());
    opts.insert("min-points".to_string(), "2".to_string());
    let algorithm = miclust::Algorithm::from_options("optics", &opts).unwrap();

    let output = algorithm.fit(&data, &metric, &matrix).unwrap();
    assert!(output.assignment().is_none());
    let trace = output.trace().expect("optics output is an ordering");
    assert_eq!(trace.len(), data.cardinality());
}

#[test]
fn optics_trace_serializes_as_plain_data() {
    let data = common::data_gen::separated_blobs(2, 3, 2, 97);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);
    let trace = Optics::new(OpticsConfig::new(5.0).unwrap().with_min_points(2))
        .fit(&data, &matrix)
        .unwrap();

    // The visualization collaborator serializes the trace plus parameters in
    // a format of its own choosing; here any serde byte format stands in.
    let bytes = serde_json::to_vec(&trace);
    assert!(bytes.is_ok());
}
