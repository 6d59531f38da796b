use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::SortError;

/// Element-count threshold deciding whether a split forks.
///
/// A range of `len` elements forks iff `len > cutoff`. Zero forks all the
/// way down to single elements; [`Cutoff::SEQUENTIAL`] never forks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Cutoff(usize);

impl Cutoff {
    pub const DEFAULT: Cutoff = Cutoff(1000);
    pub const SEQUENTIAL: Cutoff = Cutoff(usize::MAX);
    pub const FULLY_PARALLEL: Cutoff = Cutoff(0);

    pub const fn new(elements: usize) -> Self {
        Self(elements)
    }

    /// Negative thresholds behave like zero.
    pub const fn from_signed(elements: i64) -> Self {
        if elements <= 0 {
            Self(0)
        } else if elements as u64 >= usize::MAX as u64 {
            Self::SEQUENTIAL
        } else {
            Self(elements as usize)
        }
    }

    pub const fn get(self) -> usize {
        self.0
    }

    pub const fn is_sequential(self) -> bool {
        self.0 == usize::MAX
    }

    #[inline]
    pub const fn should_parallelize(self, len: usize) -> bool {
        len > self.0
    }
}

impl Default for Cutoff {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<usize> for Cutoff {
    fn from(elements: usize) -> Self {
        Self(elements)
    }
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sequential() {
            f.write_str("sequential")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Cutoff {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if ["inf", "infinite", "sequential"]
            .iter()
            .any(|word| trimmed.eq_ignore_ascii_case(word))
        {
            return Ok(Self::SEQUENTIAL);
        }

        let invalid = |err: ParseIntError| {
            SortError::invalid_config("cutoff", format!("`{trimmed}`: {err}"))
        };
        if trimmed.starts_with('-') {
            trimmed.parse::<i64>().map(Self::from_signed).map_err(invalid)
        } else {
            trimmed.parse::<usize>().map(Self::new).map_err(invalid)
        }
    }
}
