use std::env;
use std::thread;

use crate::{Cutoff, SortError};

pub const CUTOFF_ENV: &str = "PAR_MERGE_SORT_CUTOFF";
pub const THREADS_ENV: &str = "PAR_MERGE_SORT_THREADS";

/// Tuning knobs for a [`Sorter`](crate::Sorter).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SortConfig {
    pub cutoff: Cutoff,
    /// Worker count for an owned pool. Zero means one per available core.
    pub worker_threads: usize,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            cutoff: Cutoff::DEFAULT,
            worker_threads: 0,
        }
    }
}

impl SortConfig {
    pub fn with_cutoff(mut self, cutoff: impl Into<Cutoff>) -> Self {
        self.cutoff = cutoff.into();
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }

    /// Defaults overridden by `PAR_MERGE_SORT_CUTOFF` and `PAR_MERGE_SORT_THREADS`.
    pub fn from_env() -> Result<Self, SortError> {
        Self::default().apply_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<L>(mut self, lookup: L) -> Result<Self, SortError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = value(CUTOFF_ENV) {
            self.cutoff = v.parse::<Cutoff>().map_err(|err| match err {
                SortError::InvalidConfig { reason, .. } => SortError::invalid_config(CUTOFF_ENV, reason),
                other => other,
            })?;
        }
        if let Some(v) = value(THREADS_ENV) {
            self.worker_threads = v
                .trim()
                .parse::<usize>()
                .map_err(|err| SortError::invalid_config(THREADS_ENV, format!("`{v}`: {err}")))?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn with_vars(vars: &[(&str, &str)]) -> Result<SortConfig, SortError> {
        let vars = vars
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        SortConfig::default().apply_overrides(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_recommended_cutoff() {
        let config = SortConfig::default();
        assert_eq!(config.cutoff, Cutoff::new(1000));
        assert_eq!(config.worker_threads, 0);
        assert!(config.resolved_worker_threads() >= 1);
    }

    #[test]
    fn builder_setters() {
        let config = SortConfig::default()
            .with_cutoff(Cutoff::new(64))
            .with_worker_threads(3);
        assert_eq!(config.cutoff, Cutoff::new(64));
        assert_eq!(config.resolved_worker_threads(), 3);
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = with_vars(&[(CUTOFF_ENV, "250"), (THREADS_ENV, "2")]).unwrap();
        assert_eq!(config.cutoff, Cutoff::new(250));
        assert_eq!(config.worker_threads, 2);

        let config = with_vars(&[(CUTOFF_ENV, "sequential")]).unwrap();
        assert_eq!(config.cutoff, Cutoff::SEQUENTIAL);
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let config = with_vars(&[(CUTOFF_ENV, ""), (THREADS_ENV, "  ")]).unwrap();
        assert_eq!(config, SortConfig::default());
    }

    // The only test in this binary that touches the process environment.
    #[test]
    fn from_env_reads_process_variables() {
        // SAFETY: no other test in this crate reads or writes these variables.
        unsafe {
            env::set_var(CUTOFF_ENV, "inf");
            env::set_var(THREADS_ENV, "5");
        }
        let config = SortConfig::from_env();

        unsafe {
            env::set_var(THREADS_ENV, "many");
        }
        let err = SortConfig::from_env();

        unsafe {
            env::remove_var(CUTOFF_ENV);
            env::remove_var(THREADS_ENV);
        }

        let config = config.unwrap();
        assert_eq!(config.cutoff, Cutoff::SEQUENTIAL);
        assert_eq!(config.worker_threads, 5);
        assert!(matches!(err, Err(SortError::InvalidConfig { key: THREADS_ENV, .. })));
    }

    #[test]
    fn bad_overrides_name_the_variable() {
        let err = with_vars(&[(CUTOFF_ENV, "huge")]).unwrap_err();
        assert!(matches!(err, SortError::InvalidConfig { key: CUTOFF_ENV, .. }));

        let err = with_vars(&[(THREADS_ENV, "-1")]).unwrap_err();
        assert!(matches!(err, SortError::InvalidConfig { key: THREADS_ENV, .. }));
    }
}
