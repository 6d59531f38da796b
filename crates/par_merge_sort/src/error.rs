use thiserror::Error;

/// Failures a sort call can report.
///
/// Executor exhaustion is not listed here: a fork the executor refuses is
/// run on the calling thread instead and only shows up in
/// [`SortStats::inlined`](crate::SortStats::inlined).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SortError {
    /// Rejected before any element is touched.
    #[error("invalid configuration for `{key}`: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    /// Merge scratch space could not be reserved. The sequence is left
    /// partially merged and must not be reused without sorting it again
    /// from scratch.
    #[error("failed to reserve merge scratch space for {requested} elements")]
    Allocation { requested: usize },
}

impl SortError {
    pub(crate) fn invalid_config(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key,
            reason: reason.into(),
        }
    }
}
