//! Stable fork-join merge sort.
//!
//! A range is halved at `len / 2`; halves longer than the [`Cutoff`] are
//! handed to a [`ForkJoin`] executor as two tasks and joined before the
//! merge, shorter ones recurse on the current thread. Output never depends
//! on the cutoff or the executor.

mod config;
mod cutoff;
mod engine;
mod error;
mod merge;

pub mod executor;

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use tracing::debug;

pub use config::{CUTOFF_ENV, SortConfig, THREADS_ENV};
pub use cutoff::Cutoff;
pub use engine::SortStats;
pub use error::SortError;
pub use executor::{
    Dispatch, ForkJoin, InlineExecutor, Joined, RayonExecutor, ScopedThreadExecutor,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SortStrategy {
    Sequential,
    Rayon,
    ScopedThreads,
}

pub const ALL_STRATEGIES: [SortStrategy; 3] = [
    SortStrategy::Sequential,
    SortStrategy::Rayon,
    SortStrategy::ScopedThreads,
];

pub fn all_strategies() -> &'static [SortStrategy] {
    &ALL_STRATEGIES
}

pub fn strategy_name(strategy: SortStrategy) -> &'static str {
    match strategy {
        SortStrategy::Sequential => "sequential",
        SortStrategy::Rayon => "rayon",
        SortStrategy::ScopedThreads => "scoped_threads",
    }
}

/// Outcome of one sort call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SortReport {
    pub len: usize,
    pub cutoff: Cutoff,
    pub elapsed: Duration,
    pub stats: SortStats,
}

/// A sort configuration bound to an executor.
#[derive(Debug)]
pub struct Sorter<E> {
    config: SortConfig,
    executor: E,
}

impl Sorter<RayonExecutor> {
    /// Builds an owned worker pool sized by `config.worker_threads`.
    pub fn from_config(config: SortConfig) -> Result<Self, SortError> {
        let executor = RayonExecutor::with_threads(config.resolved_worker_threads())?;
        Ok(Self::new(config, executor))
    }
}

impl<E: ForkJoin> Sorter<E> {
    pub fn new(config: SortConfig, executor: E) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn sort<T>(&self, data: &mut [T]) -> Result<SortReport, SortError>
    where
        T: Ord + Clone + Send,
    {
        self.sort_by(data, T::cmp)
    }

    /// Sorts by `compare`; elements comparing equal keep their input order.
    ///
    /// On [`SortError::Allocation`] the contents of `data` are unspecified.
    pub fn sort_by<T, F>(&self, data: &mut [T], compare: F) -> Result<SortReport, SortError>
    where
        T: Clone + Send,
        F: Fn(&T, &T) -> Ordering + Sync,
    {
        let cutoff = self.config.cutoff;
        let exec = &self.executor;
        let len = data.len();

        let start = Instant::now();
        let stats = exec.install(|| engine::sort_range(data, cutoff, &compare, exec))?;
        let elapsed = start.elapsed();

        debug!(
            len,
            %cutoff,
            executor = exec.name(),
            ?elapsed,
            forked = stats.forked,
            inlined = stats.inlined,
            merges = stats.merges,
            "Sort finished"
        );

        Ok(SortReport {
            len,
            cutoff,
            elapsed,
            stats,
        })
    }
}

/// Sorts on rayon's global pool, forking ranges longer than `cutoff`.
pub fn sort<T>(data: &mut [T], cutoff: impl Into<Cutoff>) -> Result<SortReport, SortError>
where
    T: Ord + Clone + Send,
{
    sort_by(data, cutoff, T::cmp)
}

pub fn sort_by<T, F>(
    data: &mut [T],
    cutoff: impl Into<Cutoff>,
    compare: F,
) -> Result<SortReport, SortError>
where
    T: Clone + Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    let config = SortConfig::default().with_cutoff(cutoff);
    Sorter::new(config, RayonExecutor::global()).sort_by(data, compare)
}

/// Same algorithm with forking disabled; the single-threaded reference.
pub fn sort_sequential<T>(data: &mut [T]) -> Result<SortReport, SortError>
where
    T: Ord + Clone + Send,
{
    let config = SortConfig::default().with_cutoff(Cutoff::SEQUENTIAL);
    Sorter::new(config, InlineExecutor).sort(data)
}

pub fn sort_with_strategy<T>(
    strategy: SortStrategy,
    data: &mut [T],
    cutoff: impl Into<Cutoff>,
) -> Result<SortReport, SortError>
where
    T: Ord + Clone + Send,
{
    let config = SortConfig::default().with_cutoff(cutoff);
    match strategy {
        SortStrategy::Sequential => sort_sequential(data),
        SortStrategy::Rayon => Sorter::new(config, RayonExecutor::global()).sort(data),
        SortStrategy::ScopedThreads => {
            Sorter::new(config, ScopedThreadExecutor::per_core()).sort(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    const CUTOFFS: [usize; 5] = [0, 1, 7, 64, 1000];

    fn assert_sorts_like_std(data: &[u64]) {
        for &strategy in all_strategies() {
            for &cutoff in &CUTOFFS {
                let mut actual = data.to_vec();
                sort_with_strategy(strategy, &mut actual, cutoff).unwrap();

                let mut expected = data.to_vec();
                expected.sort();

                assert_eq!(
                    actual,
                    expected,
                    "strategy={} cutoff={} input_len={}",
                    strategy_name(strategy),
                    cutoff,
                    data.len(),
                );
            }
        }
    }

    #[test]
    fn strategy_names_are_unique() {
        let mut seen = HashSet::new();
        for &strategy in all_strategies() {
            assert!(seen.insert(strategy_name(strategy)));
        }
    }

    #[test]
    fn edge_cases() {
        let cases = [
            vec![],
            vec![42],
            vec![1, 2],
            vec![2, 1],
            vec![1, 2, 3, 4, 5, 6],
            vec![6, 5, 4, 3, 2, 1],
            vec![7; 128],
            vec![u64::MIN, 1, u64::MAX, 0, u64::MAX - 1, 2],
            vec![5, 5, 3, 3, 1, 1, 4, 4, 2, 2, 0, 0],
        ];

        for case in &cases {
            assert_sorts_like_std(case);
        }
    }

    #[test]
    fn nine_element_example_on_both_paths() {
        let input = [5_u64, 2, 9, 1, 7, 6, 8, 3, 4];
        for cutoff in [Cutoff::DEFAULT, Cutoff::FULLY_PARALLEL] {
            let mut data = input;
            let report = sort(&mut data, cutoff).unwrap();
            assert_eq!(data, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
            assert_eq!(report.len, 9);
            assert_eq!(report.cutoff, cutoff);
        }

        let mut data = input;
        sort_sequential(&mut data).unwrap();
        assert_eq!(data, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let mut data = [(3_i32, 'a'), (3, 'b'), (1, ' '), (2, ' ')];
        for cutoff in [Cutoff::FULLY_PARALLEL, Cutoff::SEQUENTIAL] {
            let mut data = data;
            sort_by(&mut data, cutoff, |a, b| a.0.cmp(&b.0)).unwrap();
            assert_eq!(data, [(1, ' '), (2, ' '), (3, 'a'), (3, 'b')]);
        }

        data.reverse();
        sort_by(&mut data, Cutoff::FULLY_PARALLEL, |a: &(i32, char), b| a.0.cmp(&b.0)).unwrap();
        assert_eq!(data, [(1, ' '), (2, ' '), (3, 'b'), (3, 'a')]);
    }

    #[test]
    fn sequential_report_never_forks() {
        let mut data = (0..4096_u64).rev().collect::<Vec<_>>();
        let report = sort_sequential(&mut data).unwrap();
        assert_eq!(report.stats.forked + report.stats.inlined, 0);
        assert_eq!(report.stats.sequential_splits, 4095);
        assert!(report.cutoff.is_sequential());
    }

    #[test]
    fn owned_pool_sorter_is_reusable() {
        let sorter = Sorter::from_config(
            SortConfig::default()
                .with_cutoff(Cutoff::new(32))
                .with_worker_threads(2),
        )
        .unwrap();
        assert_eq!(sorter.executor().num_threads(), 2);

        let mut rng = StdRng::seed_from_u64(0x5EED_2026);
        for _ in 0..3 {
            let mut data = (0..3000).map(|_| rng.random::<u32>()).collect::<Vec<_>>();
            let mut expected = data.clone();
            expected.sort();

            let report = sorter.sort(&mut data).unwrap();
            assert_eq!(data, expected);
            assert!(report.stats.forked > 0);
        }
    }

    #[test]
    fn sorts_owned_non_copy_elements() {
        let mut words = ["pear", "fig", "apple", "kiwi", "date", "fig"]
            .map(String::from)
            .to_vec();
        sort(&mut words, Cutoff::FULLY_PARALLEL).unwrap();
        assert_eq!(words, ["apple", "date", "fig", "fig", "kiwi", "pear"]);
    }

    #[test]
    fn fixed_seed_random_cases() {
        let mut rng = StdRng::seed_from_u64(0x5EED_2026);
        for &size in &[2_usize, 3, 8, 31, 32, 63, 64, 127, 128, 511, 2048] {
            let mut data = Vec::with_capacity(size);
            for _ in 0..size {
                data.push(rng.random::<u64>());
            }
            assert_sorts_like_std(&data);
        }
    }

    #[test]
    fn fixed_seed_many_duplicates() {
        let mut rng = StdRng::seed_from_u64(0xD0D1_2026);
        for &size in &[64_usize, 1024, 4096] {
            let mut data = Vec::with_capacity(size);
            for _ in 0..size {
                data.push((rng.random::<u64>() % 16) * 17);
            }
            assert_sorts_like_std(&data);
        }
    }
}
