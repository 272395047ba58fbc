//! Synthetic multi-instance (bag) dataset generation.
//!
//! Seeded generators for bag-of-vectors datasets, used by clustering tests
//! and benchmarks. Generation is deterministic for a fixed seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

/// A generated bag: an identifier, its instances, and the index of the group
/// it was drawn from (usable as a class label).
#[derive(Clone, Debug)]
pub struct RawBag {
    /// Identifier of the bag, unique within the generated dataset.
    pub id: String,
    /// The instances, as rows of attribute values.
    pub instances: Vec<Vec<f64>>,
    /// The group the bag was drawn from.
    pub group: usize,
}

/// Configuration for [`bag_blobs`].
#[derive(Clone, Copy, Debug)]
#[must_use]
pub struct BlobConfig {
    /// The number of groups to generate.
    pub n_groups: usize,
    /// The number of bags in each group.
    pub bags_per_group: usize,
    /// The inclusive range of instances per bag.
    pub instances_per_bag: (usize, usize),
    /// The number of attributes.
    pub dimensionality: usize,
    /// The distance between the centers of consecutive groups, per attribute.
    pub group_spacing: f64,
    /// The maximum per-attribute offset of an instance from its group center.
    pub spread: f64,
}

impl BlobConfig {
    /// A configuration with the given shape and defaults: 2-4 instances per
    /// bag, group spacing 10, spread 0.5.
    pub const fn new(n_groups: usize, bags_per_group: usize, dimensionality: usize) -> Self {
        Self {
            n_groups,
            bags_per_group,
            instances_per_bag: (2, 4),
            dimensionality,
            group_spacing: 10.0,
            spread: 0.5,
        }
    }

    /// Sets the inclusive range of instances per bag.
    pub const fn with_instances_per_bag(mut self, min: usize, max: usize) -> Self {
        self.instances_per_bag = (min, max);
        self
    }

    /// Sets the distance between the centers of consecutive groups.
    pub const fn with_group_spacing(mut self, spacing: f64) -> Self {
        self.group_spacing = spacing;
        self
    }

    /// Sets the maximum per-attribute offset from the group center.
    pub const fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }
}

/// Generates groups of bags jittered uniformly around well-spaced centers.
///
/// Group `g` is centered at `g * group_spacing` on every attribute; every
/// instance offsets each attribute by at most `spread`. Bags are returned
/// group by group, in generation order.
#[expect(clippy::cast_precision_loss)]
pub fn bag_blobs(config: &BlobConfig, seed: u64) -> Vec<RawBag> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (min_instances, max_instances) = config.instances_per_bag;

    let mut bags = Vec::with_capacity(config.n_groups * config.bags_per_group);
    for group in 0..config.n_groups {
        let center = group as f64 * config.group_spacing;
        for b in 0..config.bags_per_group {
            let n_instances = rng.gen_range(min_instances..=max_instances);
            let instances = (0..n_instances)
                .map(|_| {
                    (0..config.dimensionality)
                        .map(|_| center + rng.gen_range(-config.spread..=config.spread))
                        .collect()
                })
                .collect();
            bags.push(RawBag {
                id: format!("g{group}-b{b}"),
                instances,
                group,
            });
        }
    }
    bags
}

/// Generates a seeded tabular dataset: `car` rows of `dim` attributes drawn
/// uniformly from `[min, max]`.
pub fn random_tabular(car: usize, dim: usize, min: f64, max: f64, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..car)
        .map(|_| (0..dim).map(|_| rng.gen_range(min..=max)).collect())
        .collect()
}

/// Parallel version of [`random_tabular`].
///
/// Each row is generated from its own seed derived from `seed` and the row
/// index, so the output matches for any thread count.
pub fn par_random_tabular(car: usize, dim: usize, min: f64, max: f64, seed: u64) -> Vec<Vec<f64>> {
    (0..car)
        .into_par_iter()
        .map(|row| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(row as u64));
            (0..dim).map(|_| rng.gen_range(min..=max)).collect()
        })
        .collect()
}
