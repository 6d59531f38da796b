use std::cmp::Ordering;
use std::ops::AddAssign;

use crate::executor::{Dispatch, ForkJoin};
use crate::merge::merge_halves;
use crate::{Cutoff, SortError};

/// Counters collected bottom-up over one sort's recursion tree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SortStats {
    /// Splits above the cutoff whose halves were submitted as two tasks.
    pub forked: usize,
    /// Splits above the cutoff the executor ran on the calling thread.
    pub inlined: usize,
    /// Splits at or below the cutoff.
    pub sequential_splits: usize,
    /// Merge steps that actually moved elements.
    pub merges: usize,
}

impl SortStats {
    pub fn splits(&self) -> usize {
        self.forked + self.inlined + self.sequential_splits
    }
}

impl AddAssign for SortStats {
    fn add_assign(&mut self, rhs: Self) {
        self.forked += rhs.forked;
        self.inlined += rhs.inlined;
        self.sequential_splits += rhs.sequential_splits;
        self.merges += rhs.merges;
    }
}

/// Sorts `data` by recursive halving, forking halves larger than `cutoff`.
///
/// The left half is `data[..len / 2]`. Sibling calls receive disjoint
/// subslices, so no synchronisation beyond the executor's join is needed.
pub(crate) fn sort_range<T, F, E>(
    data: &mut [T],
    cutoff: Cutoff,
    compare: &F,
    exec: &E,
) -> Result<SortStats, SortError>
where
    T: Clone + Send,
    F: Fn(&T, &T) -> Ordering + Sync,
    E: ForkJoin,
{
    let len = data.len();
    if len <= 1 {
        return Ok(SortStats::default());
    }

    let mid = len / 2;
    let mut stats = if cutoff.should_parallelize(len) {
        let (left, right) = data.split_at_mut(mid);
        let joined = exec.fork_join(
            || sort_range(left, cutoff, compare, exec),
            || sort_range(right, cutoff, compare, exec),
        );

        let mut stats = joined.left?;
        stats += joined.right?;
        match joined.dispatch {
            Dispatch::Forked => stats.forked += 1,
            Dispatch::Inline => stats.inlined += 1,
        }
        stats
    } else {
        let (left, right) = data.split_at_mut(mid);
        let mut stats = sort_range(left, cutoff, compare, exec)?;
        stats += sort_range(right, cutoff, compare, exec)?;
        stats.sequential_splits += 1;
        stats
    };

    if merge_halves(data, mid, compare)? {
        stats.merges += 1;
    }
    Ok(stats)
}
