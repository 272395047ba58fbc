//! Integration tests for the partitional clusterer.

use miclust::{
    Assignment, BagMetric, Centroid, CentroidPolicy, DistanceMatrix, HausdorffKind, Kmic, KmicConfig, RunContext,
};

mod common;

#[test]
fn k_of_one_recovers_the_dataset_mean() {
    let data = common::data_gen::separated_blobs(3, 4, 2, 11);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let model = Kmic::new(KmicConfig::new(1)).fit(&data, &metric, None).unwrap();

    // The single cluster holds every bag.
    assert_eq!(model.assignment().n_clusters(), 1);
    assert_eq!(model.assignment().cluster_sizes(), vec![data.cardinality()]);
    assert_eq!(model.assignment().n_noise(), 0);

    // And its centroid is the dataset-wide mean of pooled instances.
    let mut expected = vec![0.0; data.dimensionality()];
    let mut count = 0usize;
    for bag in data.bags() {
        for instance in bag.instances() {
            for (e, &v) in expected.iter_mut().zip(instance.values()) {
                *e += v;
            }
            count += 1;
        }
    }
    for e in &mut expected {
        *e /= count as f64;
    }
    match &model.centroids()[0] {
        Centroid::Mean(v) => {
            for (got, want) in v.values().iter().zip(&expected) {
                assert!((got - want).abs() < 1e-9, "centroid {got} != {want}");
            }
        }
        Centroid::Medoid(_) => panic!("mean policy must produce a mean centroid"),
    }
}

#[test]
fn reruns_with_the_same_seed_are_identical() {
    let data = common::data_gen::separated_blobs(4, 5, 3, 23);
    let metric = BagMetric::hausdorff(HausdorffKind::MeanMin);
    let clusterer = Kmic::new(KmicConfig::new(4).with_seed(99));

    let first = clusterer.fit(&data, &metric, None).unwrap();
    let second = clusterer.fit(&data, &metric, None).unwrap();
    assert_eq!(first.assignment(), second.assignment());
    assert_eq!(first.centroids(), second.centroids());
}

#[test]
fn parallel_run_matches_sequential_run() {
    let data = common::data_gen::separated_blobs(3, 6, 2, 31);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let clusterer = Kmic::new(KmicConfig::new(3).with_seed(5));

    let sequential = clusterer.fit(&data, &metric, None).unwrap();
    for n_workers in [1, 2, 4] {
        let ctx = RunContext::new(n_workers).unwrap();
        let parallel = clusterer.par_fit(&data, &metric, None, &ctx).unwrap();
        assert_eq!(
            sequential.assignment(),
            parallel.assignment(),
            "assignment diverged with {n_workers} workers"
        );
    }
}

#[test]
fn bamic_reads_medoid_distances_from_the_matrix()  {
    let data = common::data_gen::separated_blobs(3, 5, 2, 47);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    let matrix = DistanceMatrix::compute(&data, &metric);
    let config = KmicConfig::new(3).with_policy(CentroidPolicy::MedoidOfBags).with_seed(13);

    let with_matrix = Kmic::new(config).fit(&data, &metric, Some(&matrix)).unwrap();
    let without_matrix = Kmic::new(config).fit(&data, &metric, None).unwrap();

    // The matrix is a cache, not a different algorithm.
    assert_eq!(with_matrix.assignment(), without_matrix.assignment());
    for centroid in with_matrix.centroids() {
        assert!(matches!(centroid, Centroid::Medoid(_)));
    }
}

#[test]
fn two_separated_groups_are_recovered_for_any_seed() {
    let data = common::data_gen::separated_blobs(2, 6, 2, 61);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);
    for seed in [0, 1, 2, 61, 997] {
        let model = Kmic::new(KmicConfig::new(2).with_seed(seed)).fit(&data, &metric, None).unwrap();

        assert!(model.converged(), "seed {seed} did not converge");
        assert_eq!(model.assignment().n_clusters(), 2);
        // Bags of one group always land together: even when both initial
        // centroids fall into the same group, the far group pulls one
        // centroid out within two iterations.
        let labels = model.assignment().labels();
        for group in 0..2 {
            let first = labels[group * 6];
            for b in 0..6 {
                assert_eq!(labels[group * 6 + b], first, "seed {seed}: group {group} split apart");
            }
        }
    }
}

#[test]
fn one_step_from_a_candidate_assignment() {
    let data = common::data_gen::separated_blobs(2, 4, 2, 83);
    let metric = BagMetric::hausdorff(HausdorffKind::MaxMin);

    // A deliberately wrong candidate: groups interleaved across clusters.
    let labels = (0..data.cardinality()).map(|i| Some(i % 2)).collect::<Vec<_>>();
    let start = Assignment::from_labels(labels).unwrap();

    let clusterer = Kmic::new(KmicConfig::new(2));
    let stepped = clusterer.step(&data, &metric, None, &start).unwrap();
    assert_eq!(stepped.iterations(), 1);
    assert_eq!(stepped.assignment().len(), data.cardinality());
    assert_eq!(stepped.assignment().n_noise(), 0);
}
