//! Fork-join backends the sort engine dispatches onto.
//!
//! The engine only ever asks for one thing: run two closures over disjoint
//! halves, wait for both, hand back both results. Whether the pair was
//! submitted as two tasks or run inline is reported through [`Dispatch`].

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use tracing::{info, trace};

use crate::SortError;

/// How a [`ForkJoin::fork_join`] pair was executed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Dispatch {
    /// Both halves were submitted as two tasks. Whether they overlapped in
    /// time is up to the scheduler; rayon may still run both on one worker.
    Forked,
    /// Both halves ran one after the other on the calling thread.
    Inline,
}

/// Results of both halves of a fork, collected after the join barrier.
#[derive(Debug)]
pub struct Joined<RA, RB> {
    pub left: RA,
    pub right: RB,
    pub dispatch: Dispatch,
}

impl<RA, RB> Joined<RA, RB> {
    fn inline<A, B>(left: A, right: B) -> Self
    where
        A: FnOnce() -> RA,
        B: FnOnce() -> RB,
    {
        let left = left();
        let right = right();
        Self {
            left,
            right,
            dispatch: Dispatch::Inline,
        }
    }
}

/// Task scheduler abstraction injected into the sort engine.
///
/// Implementations must run both closures to completion before returning.
/// They may refuse to fork, in which case both closures run on the calling
/// thread and the result is tagged [`Dispatch::Inline`].
pub trait ForkJoin: Sync {
    fn fork_join<A, B, RA, RB>(&self, left: A, right: B) -> Joined<RA, RB>
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send;

    /// Runs a whole sort inside the executor's context.
    fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        op()
    }

    fn name(&self) -> &'static str;
}

impl<E: ForkJoin> ForkJoin for &E {
    fn fork_join<A, B, RA, RB>(&self, left: A, right: B) -> Joined<RA, RB>
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        (**self).fork_join(left, right)
    }

    fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        (**self).install(op)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Runs every fork on the calling thread, left half first.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl ForkJoin for InlineExecutor {
    fn fork_join<A, B, RA, RB>(&self, left: A, right: B) -> Joined<RA, RB>
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        Joined::inline(left, right)
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}

/// Work-stealing backend on top of `rayon::join`.
#[derive(Debug, Default)]
pub struct RayonExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl RayonExecutor {
    /// Uses rayon's global pool.
    pub fn global() -> Self {
        Self { pool: None }
    }

    /// Builds a dedicated pool with `num_threads` workers.
    pub fn with_threads(num_threads: usize) -> Result<Self, SortError> {
        if num_threads == 0 {
            return Err(SortError::invalid_config(
                "worker_threads",
                "a dedicated pool needs at least one worker",
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("par_merge_sort_{i}"))
            .build()
            .map_err(|err| SortError::invalid_config("worker_threads", err.to_string()))?;
        info!("Built sort worker pool with {} threads", num_threads);
        Ok(Self { pool: Some(pool) })
    }

    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl ForkJoin for RayonExecutor {
    fn fork_join<A, B, RA, RB>(&self, left: A, right: B) -> Joined<RA, RB>
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        let (left, right) = rayon::join(left, right);
        Joined {
            left,
            right,
            dispatch: Dispatch::Forked,
        }
    }

    fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn name(&self) -> &'static str {
        "rayon"
    }
}

/// OS-thread backend with a bounded number of live helper threads.
///
/// Each fork spawns one scoped thread for the left half and runs the right
/// half on the caller. Once `max_helpers` helpers are alive, or the OS
/// refuses to spawn, the left half runs on the caller instead.
#[derive(Debug)]
pub struct ScopedThreadExecutor {
    max_helpers: usize,
    live_helpers: AtomicUsize,
}

impl ScopedThreadExecutor {
    pub fn new(max_helpers: usize) -> Self {
        Self {
            max_helpers,
            live_helpers: AtomicUsize::new(0),
        }
    }

    /// One helper per available core, minus the calling thread.
    pub fn per_core() -> Self {
        let cores = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(cores.saturating_sub(1))
    }

    pub fn max_helpers(&self) -> usize {
        self.max_helpers
    }

    fn try_acquire(&self) -> Option<HelperPermit<'_>> {
        self.live_helpers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < self.max_helpers).then_some(live + 1)
            })
            .ok()
            .map(|_| HelperPermit { owner: self })
    }
}

impl Default for ScopedThreadExecutor {
    fn default() -> Self {
        Self::per_core()
    }
}

struct HelperPermit<'a> {
    owner: &'a ScopedThreadExecutor,
}

impl Drop for HelperPermit<'_> {
    fn drop(&mut self) {
        self.owner.live_helpers.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ForkJoin for ScopedThreadExecutor {
    fn fork_join<A, B, RA, RB>(&self, left: A, right: B) -> Joined<RA, RB>
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        let Some(permit) = self.try_acquire() else {
            trace!(
                "Helper budget of {} exhausted, running fork inline",
                self.max_helpers
            );
            return Joined::inline(left, right);
        };

        // Parked here so the closure can be recovered if the spawn fails.
        let pending = Mutex::new(Some(left));

        thread::scope(|scope| {
            let spawned = thread::Builder::new()
                .name("par_merge_sort_helper".to_string())
                .spawn_scoped(scope, || {
                    let _permit = permit;
                    take_pending(&pending).map(|left| left())
                });

            match spawned {
                Ok(handle) => {
                    let right = right();
                    let left = match handle.join() {
                        Ok(Some(left)) => left,
                        Ok(None) => unreachable!("spawned helper always owns the left half"),
                        Err(payload) => panic::resume_unwind(payload),
                    };
                    Joined {
                        left,
                        right,
                        dispatch: Dispatch::Forked,
                    }
                }
                Err(err) => {
                    trace!("Failed to spawn sort helper ({}), running fork inline", err);
                    match take_pending(&pending) {
                        Some(left) => Joined::inline(left, right),
                        None => unreachable!("failed spawn never runs the left half"),
                    }
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "scoped_threads"
    }
}

fn take_pending<A>(pending: &Mutex<Option<A>>) -> Option<A> {
    pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}
