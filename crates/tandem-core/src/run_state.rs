//! Lifecycle state machine for the worker thread.
//!
//! [`RunStateMachine`] answers one question for the worker: may it run
//! another iteration? Controllers (the command thread, external
//! callers) move it between states; the worker only ever observes it
//! through [`poll_and_advance`](RunStateMachine::poll_and_advance) at the
//! top of each iteration.
//!
//! ```text
//!            boot            request_pause          poll (worker)
//! Stopped ─────────▶ Running ─────────────▶ Pausing ─────────────▶ Paused
//!    ▲                 ▲  │                                          │
//!    │                 │  │ request_stop            resume           │
//!    │                 │  ▼                ◀──────────────────────────┘
//!    └───────────── Stopping ◀─────────────────── request_stop ──────┘
//!     finalize_stop
//! ```
//!
//! The pause handshake uses the state value itself as the
//! acknowledgement: a controller that asked for a pause waits on
//! `controller_cv` until the state leaves `Pausing`, and the worker
//! flips `Pausing → Paused` under the same mutex before sleeping on
//! `worker_cv`. There is no separate "acked" flag to get out of sync.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::StateError;

/// Lifecycle state of the worker thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunState {
    /// No worker is running. Initial state; re-entered after each run.
    Stopped = 0,
    /// The worker is iterating.
    Running = 1,
    /// A controller asked the worker to halt; not yet acknowledged.
    Pausing = 2,
    /// The worker is blocked at its poll boundary.
    Paused = 3,
    /// The worker has been told to exit its loop.
    Stopping = 4,
}

impl RunState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Stopped,
            1 => Self::Running,
            2 => Self::Pausing,
            3 => Self::Paused,
            _ => Self::Stopping,
        }
    }

    /// Lower-case name, as used in log records and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Pausing => "pausing",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run/pause/stop controller shared by the worker and its controllers.
///
/// Every transition takes the mutex; waiters are notified while it is
/// still held. The current state is mirrored into an atomic so that
/// [`state`](Self::state) and friends never block.
pub struct RunStateMachine {
    state: Mutex<RunState>,
    /// Lock-free mirror of `state`, written only while `state` is locked.
    observed: AtomicU8,
    /// The worker sleeps here while `Paused`.
    worker_cv: Condvar,
    /// Controllers sleep here while `Pausing`.
    controller_cv: Condvar,
    /// Number of `Pausing → Paused` acknowledgements so far.
    acknowledged: AtomicU64,
}

// Compile-time assertion: RunStateMachine must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<RunStateMachine>();
};

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunStateMachine")
            .field("state", &self.state())
            .finish()
    }
}

impl RunStateMachine {
    /// Create a machine in [`RunState::Stopped`].
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RunState::Stopped),
            observed: AtomicU8::new(RunState::Stopped as u8),
            worker_cv: Condvar::new(),
            controller_cv: Condvar::new(),
            acknowledged: AtomicU64::new(0),
        }
    }

    /// Current state (lock-free read).
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.observed.load(Ordering::Acquire))
    }

    /// Whether the worker is currently halted at its poll boundary.
    pub fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }

    /// Whether the worker is currently iterating.
    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// `Stopped → Running`.
    pub fn boot(&self) -> Result<(), StateError> {
        let mut state = self.lock();
        match *state {
            RunState::Stopped => {
                self.set(&mut state, RunState::Running);
                log::debug!("run state: booted");
                Ok(())
            }
            other => Err(reject("boot", other)),
        }
    }

    /// Ask the worker to leave its loop at the next poll.
    ///
    /// A no-op when already `Stopped`. Wakes a paused worker and any
    /// controller still waiting on a pause.
    pub fn request_stop(&self) -> Result<(), StateError> {
        let mut state = self.lock();
        match *state {
            RunState::Stopped => Ok(()),
            RunState::Running | RunState::Paused => {
                self.set(&mut state, RunState::Stopping);
                self.worker_cv.notify_all();
                self.controller_cv.notify_all();
                log::debug!("run state: stop requested");
                Ok(())
            }
            other => Err(reject("stop", other)),
        }
    }

    /// `Stopping → Stopped`.
    ///
    /// The caller must already have joined every thread that polls this
    /// machine.
    pub fn finalize_stop(&self) -> Result<(), StateError> {
        let mut state = self.lock();
        match *state {
            RunState::Stopping => {
                self.set(&mut state, RunState::Stopped);
                log::debug!("run state: stopped");
                Ok(())
            }
            other => Err(reject("finalize stop of", other)),
        }
    }

    /// `Paused → Running`, waking the worker. A no-op when `Running`.
    pub fn resume(&self) -> Result<(), StateError> {
        let mut state = self.lock();
        match *state {
            RunState::Running => Ok(()),
            RunState::Paused => {
                self.set(&mut state, RunState::Running);
                self.worker_cv.notify_all();
                log::debug!("run state: resumed");
                Ok(())
            }
            other => Err(reject("resume", other)),
        }
    }

    /// Ask the worker to halt at its next poll boundary.
    ///
    /// Returns `true` only if this call moved the machine from
    /// `Running` to `Pausing`, i.e. the caller owns the pause and is
    /// the one expected to [`resume`](Self::resume) later. Calls made
    /// while `Pausing` or `Paused` return `false`.
    ///
    /// With `wait_until_paused`, blocks until the worker acknowledges
    /// (the state leaves `Pausing`). The worker must be polling;
    /// waiting on a machine nobody polls never returns.
    pub fn request_pause(&self, wait_until_paused: bool) -> Result<bool, StateError> {
        let mut state = self.lock();
        let initiated = match *state {
            RunState::Running => {
                self.set(&mut state, RunState::Pausing);
                log::debug!("run state: pause requested");
                true
            }
            RunState::Pausing => false,
            RunState::Paused => return Ok(false),
            other => return Err(reject("pause", other)),
        };

        if wait_until_paused {
            let _acknowledged = self
                .controller_cv
                .wait_while(state, |s| *s == RunState::Pausing)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Ok(initiated)
    }

    /// Poll boundary of the worker loop.
    ///
    /// Acknowledges a pending pause (`Pausing → Paused`, waking the
    /// requesting controllers), then blocks for as long as the machine
    /// stays `Paused`. Returns `true` iff the worker may run another
    /// iteration, `false` once the machine is `Stopping` or `Stopped`.
    ///
    /// Only the worker thread may call this.
    pub fn poll_and_advance(&self) -> bool {
        if self.is_running() {
            return true;
        }

        let mut state = self.lock();
        loop {
            match *state {
                RunState::Running => return true,
                RunState::Stopping | RunState::Stopped => return false,
                RunState::Pausing => self.acknowledge(&mut state),
                RunState::Paused => {
                    state = self
                        .worker_cv
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Fault path: the worker is gone and will never poll again.
    ///
    /// Moves any state other than `Stopped` to `Stopping` and wakes
    /// every waiter so no controller hangs on a dead worker. The
    /// machine still needs [`finalize_stop`](Self::finalize_stop) once
    /// the remaining threads are joined.
    pub fn abandon(&self) {
        let mut state = self.lock();
        if *state != RunState::Stopped {
            self.set(&mut state, RunState::Stopping);
        }
        self.worker_cv.notify_all();
        self.controller_cv.notify_all();
        log::debug!("run state: abandoned");
    }

    /// Total pauses the worker has acknowledged over the machine's
    /// lifetime.
    pub fn pauses_acknowledged(&self) -> u64 {
        self.acknowledged.load(Ordering::Acquire)
    }

    fn acknowledge(&self, state: &mut MutexGuard<'_, RunState>) {
        self.set(state, RunState::Paused);
        self.acknowledged.fetch_add(1, Ordering::Release);
        self.controller_cv.notify_all();
        log::debug!("run state: pause acknowledged");
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: &mut MutexGuard<'_, RunState>, next: RunState) {
        **state = next;
        self.observed.store(next as u8, Ordering::Release);
    }

    /// Non-blocking half of the poll: acknowledge a pending pause only.
    #[cfg(test)]
    fn acknowledge_pending(&self) {
        let mut state = self.lock();
        if *state == RunState::Pausing {
            self.acknowledge(&mut state);
        }
    }
}

fn reject(operation: &'static str, state: RunState) -> StateError {
    StateError::Run { operation, state }
}
