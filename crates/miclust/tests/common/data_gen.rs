//! Data generation utilities for testing.

use miclust::{Bag, Dataset, FeatureVector};

/// Converts generated raw bags into a labeled dataset.
pub fn dataset_from(raw: Vec<bagsim::RawBag>) -> Dataset {
    let bags = raw
        .into_iter()
        .map(|b| {
            Bag::new(b.id, b.instances.into_iter().map(FeatureVector::new).collect())
                .unwrap()
                .with_class(b.group)
        })
        .collect();
    Dataset::new(bags).unwrap()
}

/// Well-separated groups of bags, labeled by group.
pub fn separated_blobs(n_groups: usize, bags_per_group: usize, dim: usize, seed: u64) -> Dataset {
    let config = bagsim::BlobConfig::new(n_groups, bags_per_group, dim)
        .with_group_spacing(100.0)
        .with_spread(0.5);
    dataset_from(bagsim::bag_blobs(&config, seed))
}

/// Two groups of bags with zero intra-group distance: every bag in a group is
/// an identical single-instance bag.
pub fn two_point_groups(bags_per_group: usize, dim: usize) -> Dataset {
    let bags = (0..2 * bags_per_group)
        .map(|i| {
            let group = usize::from(i >= bags_per_group);
            #[expect(clippy::cast_precision_loss)]
            let value = group as f64 * 1000.0;
            Bag::new(format!("b{i}"), vec![FeatureVector::new(vec![value; dim])])
                .unwrap()
                .with_class(group)
        })
        .collect();
    Dataset::new(bags).unwrap()
}
