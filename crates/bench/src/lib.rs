use std::time::Duration;

use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, SamplingMode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SAMPLE_SIZE: usize = 10;
const WARM_UP_MS: u64 = 80;
const MEASURE_MS_SMALL: u64 = 120;
const MEASURE_MS_LARGE: u64 = 300;
const MEASURE_MS_XL: u64 = 500;

/// Scales measurement time with input size; large inputs switch to flat sampling.
pub fn apply_size_runtime_config<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, size: usize) {
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(Duration::from_millis(WARM_UP_MS));
    if size <= 16_384 {
        group.sampling_mode(SamplingMode::Auto);
        group.measurement_time(Duration::from_millis(MEASURE_MS_SMALL));
    } else if size <= 262_144 {
        group.sampling_mode(SamplingMode::Flat);
        group.measurement_time(Duration::from_millis(MEASURE_MS_LARGE));
    } else {
        group.sampling_mode(SamplingMode::Flat);
        group.measurement_time(Duration::from_millis(MEASURE_MS_XL));
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Distribution {
    RandomUniform,
    NearlySorted1pctSwaps,
    FewDistinct,
    Reversed,
}

pub const ALL_DISTRIBUTIONS: [Distribution; 4] = [
    Distribution::RandomUniform,
    Distribution::NearlySorted1pctSwaps,
    Distribution::FewDistinct,
    Distribution::Reversed,
];

impl Distribution {
    pub fn label(self) -> &'static str {
        match self {
            Self::RandomUniform => "random_uniform",
            Self::NearlySorted1pctSwaps => "nearly_sorted_1pct_swaps",
            Self::FewDistinct => "few_distinct",
            Self::Reversed => "reversed",
        }
    }
}

pub fn generate_keys(dist: Distribution, size: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(mix_seed(seed ^ size as u64));

    match dist {
        Distribution::RandomUniform => (0..size).map(|_| rng.random::<u64>()).collect(),
        Distribution::NearlySorted1pctSwaps => {
            let mut data = (0..size as u64).collect::<Vec<_>>();
            if size > 0 {
                for _ in 0..(size / 100).max(1) {
                    let a = rng.random_range(0..size);
                    let b = rng.random_range(0..size);
                    data.swap(a, b);
                }
            }
            data
        }
        Distribution::FewDistinct => (0..size).map(|_| rng.random_range(0..16_u64) * 17).collect(),
        Distribution::Reversed => (0..size as u64).rev().collect(),
    }
}

#[inline]
pub fn mix_seed(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
