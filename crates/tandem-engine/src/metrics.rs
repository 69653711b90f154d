//! Per-frame counters for the worker loop.
//!
//! [`FrameCounters`] is written by the worker and read from any thread;
//! [`FrameMetrics`] is a plain snapshot of it, used by the shell's
//! status output, by [`RunReport`](crate::RunReport), and by tests that
//! need to see whether the worker is still iterating.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the worker loop counters.
///
/// Cumulative fields count since the coordinator was constructed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Cumulative number of completed iterations (one render each).
    pub frames: u64,
    /// Cumulative number of iterations that stepped physics and agents.
    pub simulation_steps: u64,
    /// Cumulative number of iterations that exceeded the frame period.
    pub overruns: u64,
    /// Wall-clock time of the most recent iteration, in microseconds.
    pub last_frame_us: u64,
    /// Cumulative number of times the worker halted at a poll boundary.
    pub worker_pauses: u64,
}

/// Lock-free counters behind [`FrameMetrics`].
///
/// Written by the worker loop only; any thread may take a snapshot.
#[derive(Debug, Default)]
pub struct FrameCounters {
    frames: AtomicU64,
    simulation_steps: AtomicU64,
    overruns: AtomicU64,
    last_frame_us: AtomicU64,
    worker_pauses: AtomicU64,
}

impl FrameCounters {
    /// Record one completed iteration.
    pub fn record_frame(&self, stepped: bool, elapsed_us: u64, overrun: bool) {
        if stepped {
            self.simulation_steps.fetch_add(1, Ordering::Relaxed);
        }
        if overrun {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
        self.last_frame_us.store(elapsed_us, Ordering::Relaxed);
        // Release last so a reader that sees the new frame count also
        // sees the step and timing it belongs to.
        self.frames.fetch_add(1, Ordering::Release);
    }

    /// Record `count` halts acknowledged at a poll boundary.
    pub fn record_pauses(&self, count: u64) {
        self.worker_pauses.fetch_add(count, Ordering::Relaxed);
    }

    /// Current values of every counter.
    pub fn snapshot(&self) -> FrameMetrics {
        let frames = self.frames.load(Ordering::Acquire);
        FrameMetrics {
            frames,
            simulation_steps: self.simulation_steps.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            last_frame_us: self.last_frame_us.load(Ordering::Relaxed),
            worker_pauses: self.worker_pauses.load(Ordering::Relaxed),
        }
    }
}
