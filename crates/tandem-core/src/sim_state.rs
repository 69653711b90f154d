//! Run/pause state of the simulated world.
//!
//! Independent of [`RunStateMachine`](crate::RunStateMachine): the
//! worker thread keeps iterating (rendering frames, answering the
//! shell) while the simulation is paused; it only skips the physics
//! and agent step. The worker therefore never blocks here.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::StateError;

/// Whether the per-frame simulation advance is happening.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SimulationState {
    /// Physics and agents advance every frame.
    Running = 0,
    /// A pause was requested; the worker has not yet seen it.
    Pausing = 1,
    /// Physics and agents are frozen. Initial state.
    Paused = 2,
}

impl SimulationState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Pausing,
            _ => Self::Paused,
        }
    }

    /// Lower-case name, as used in log records and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Pausing => "pausing",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Freeze/unfreeze controller for the simulated world.
pub struct SimulationStateMachine {
    state: Mutex<SimulationState>,
    observed: AtomicU8,
    /// Callers of `pause(true)` sleep here while `Pausing`.
    paused_cv: Condvar,
}

// Compile-time assertion: SimulationStateMachine must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SimulationStateMachine>();
};

impl Default for SimulationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimulationStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationStateMachine")
            .field("state", &self.state())
            .finish()
    }
}

impl SimulationStateMachine {
    /// Create a machine in [`SimulationState::Paused`].
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulationState::Paused),
            observed: AtomicU8::new(SimulationState::Paused as u8),
            paused_cv: Condvar::new(),
        }
    }

    /// Current state (lock-free read).
    pub fn state(&self) -> SimulationState {
        SimulationState::from_u8(self.observed.load(Ordering::Acquire))
    }

    /// `Paused → Running`. A no-op when already `Running`.
    pub fn resume(&self) -> Result<(), StateError> {
        let mut state = self.lock();
        match *state {
            SimulationState::Running => Ok(()),
            SimulationState::Paused => {
                self.set(&mut state, SimulationState::Running);
                log::debug!("simulation: resumed");
                Ok(())
            }
            other => Err(reject("resume", other)),
        }
    }

    /// `Running → Pausing`. A no-op when already `Paused`.
    ///
    /// Returns `true` if this call started the pause. With
    /// `wait_until_paused`, blocks until the worker observes the request
    /// on its next tick. Never wait from a thread that is itself holding
    /// the worker halted: the worker cannot tick to acknowledge.
    pub fn pause(&self, wait_until_paused: bool) -> Result<bool, StateError> {
        let mut state = self.lock();
        match *state {
            SimulationState::Paused => return Ok(false),
            SimulationState::Running => {
                self.set(&mut state, SimulationState::Pausing);
                log::debug!("simulation: pause requested");
            }
            other => return Err(reject("pause", other)),
        }

        if wait_until_paused {
            let _acknowledged = self
                .paused_cv
                .wait_while(state, |s| *s == SimulationState::Pausing)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Ok(true)
    }

    /// Per-tick check made by the worker.
    ///
    /// Completes a pending pause (`Pausing → Paused`, waking waiters)
    /// and returns `true` iff the simulation should advance this tick.
    pub fn is_running(&self) -> bool {
        match self.state() {
            SimulationState::Running => return true,
            SimulationState::Paused => return false,
            SimulationState::Pausing => {}
        }

        let mut state = self.lock();
        if *state == SimulationState::Pausing {
            self.set(&mut state, SimulationState::Paused);
            self.paused_cv.notify_all();
            log::debug!("simulation: paused");
        }
        *state == SimulationState::Running
    }

    fn lock(&self) -> MutexGuard<'_, SimulationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: &mut MutexGuard<'_, SimulationState>, next: SimulationState) {
        **state = next;
        self.observed.store(next as u8, Ordering::Release);
    }
}

fn reject(operation: &'static str, state: SimulationState) -> StateError {
    StateError::Simulation { operation, state }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const ALL: [SimulationState; 3] = [
        SimulationState::Running,
        SimulationState::Pausing,
        SimulationState::Paused,
    ];

    fn machine_in(target: SimulationState) -> SimulationStateMachine {
        let m = SimulationStateMachine::new();
        match target {
            SimulationState::Paused => {}
            SimulationState::Running => m.resume().unwrap(),
            SimulationState::Pausing => {
                m.resume().unwrap();
                assert_eq!(m.pause(false), Ok(true));
            }
        }
        assert_eq!(m.state(), target);
        m
    }

    #[test]
    fn starts_paused() {
        let m = SimulationStateMachine::new();
        assert_eq!(m.state(), SimulationState::Paused);
        assert!(!m.is_running());
    }

    #[test]
    fn resume_table() {
        for from in ALL {
            let m = machine_in(from);
            let result = m.resume();
            if from == SimulationState::Pausing {
                assert_eq!(
                    result,
                    Err(StateError::Simulation {
                        operation: "resume",
                        state: from
                    })
                );
                assert_eq!(m.state(), from);
            } else {
                assert_eq!(result, Ok(()));
                assert_eq!(m.state(), SimulationState::Running);
            }
        }
    }

    #[test]
    fn pause_table() {
        for from in ALL {
            let m = machine_in(from);
            let result = m.pause(false);
            match from {
                SimulationState::Running => {
                    assert_eq!(result, Ok(true));
                    assert_eq!(m.state(), SimulationState::Pausing);
                }
                SimulationState::Paused => {
                    assert_eq!(result, Ok(false));
                    assert_eq!(m.state(), SimulationState::Paused);
                }
                SimulationState::Pausing => {
                    assert!(result.is_err());
                    assert_eq!(m.state(), SimulationState::Pausing);
                }
            }
        }
    }

    #[test]
    fn is_running_completes_pending_pause() {
        let m = machine_in(SimulationState::Pausing);
        assert!(!m.is_running());
        assert_eq!(m.state(), SimulationState::Paused);
        assert!(!m.is_running());

        m.resume().unwrap();
        assert!(m.is_running());
        assert_eq!(m.state(), SimulationState::Running);
    }

    #[test]
    fn paused_wait_returns_immediately() {
        let m = machine_in(SimulationState::Paused);
        assert_eq!(m.pause(true), Ok(false));
    }

    #[test]
    fn waiting_pause_released_by_tick() {
        let m = Arc::new(machine_in(SimulationState::Running));
        let controller = {
            let m = Arc::clone(&m);
            thread::spawn(move || m.pause(true))
        };

        // Play the worker: tick until the request has been seen.
        while m.state() != SimulationState::Paused {
            m.is_running();
            thread::yield_now();
        }
        assert_eq!(controller.join().unwrap(), Ok(true));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Copy, Debug)]
        enum Op {
            Resume,
            Pause,
            Tick,
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![Just(Op::Resume), Just(Op::Pause), Just(Op::Tick)]
        }

        fn model(state: SimulationState, op: Op) -> Option<SimulationState> {
            use SimulationState::*;
            match (op, state) {
                (Op::Resume, Pausing) => None,
                (Op::Resume, _) => Some(Running),
                (Op::Pause, Running) => Some(Pausing),
                (Op::Pause, Paused) => Some(Paused),
                (Op::Pause, Pausing) => None,
                (Op::Tick, Pausing) => Some(Paused),
                (Op::Tick, _) => Some(state),
            }
        }

        proptest! {
            #[test]
            fn machine_follows_transition_table(ops in prop::collection::vec(arb_op(), 0..64)) {
                let m = SimulationStateMachine::new();
                let mut expected = SimulationState::Paused;
                for op in ops {
                    let ok = match op {
                        Op::Resume => m.resume().is_ok(),
                        Op::Pause => m.pause(false).is_ok(),
                        Op::Tick => {
                            let advanced = m.is_running();
                            let next = model(expected, op).unwrap();
                            prop_assert_eq!(advanced, next == SimulationState::Running);
                            true
                        }
                    };
                    match model(expected, op) {
                        Some(next) => {
                            prop_assert!(ok, "{:?} from {} should succeed", op, expected);
                            expected = next;
                        }
                        None => prop_assert!(!ok, "{:?} from {} should fail", op, expected),
                    }
                    prop_assert_eq!(m.state(), expected);
                }
            }
        }
    }
}
