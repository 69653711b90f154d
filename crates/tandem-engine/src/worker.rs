//! Frame loop of the worker thread.
//!
//! Each iteration starts at the poll boundary: a pending pause or stop
//! takes effect there and never in the middle of a step. The scene lock
//! is held for the body of the iteration only; the command thread takes
//! it while the worker sits in `poll_and_advance()`, so in correct use it
//! is never contended.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tandem_core::{EngineError, RunState, RunStateMachine, Scene, SimulationStateMachine};

use crate::metrics::FrameCounters;

/// Frames slower than this multiple of the period are logged.
const SLOW_FRAME_FACTOR: u32 = 4;

/// State borrowed by the worker loop for the duration of a run.
pub struct WorkerLoop<'a, S: Scene> {
    run_state: &'a RunStateMachine,
    sim_state: &'a SimulationStateMachine,
    scene: &'a Mutex<S>,
    frame_period: Duration,
    counters: &'a FrameCounters,
}

impl<'a, S: Scene> WorkerLoop<'a, S> {
    /// Create a worker loop over shared state.
    pub fn new(
        run_state: &'a RunStateMachine,
        sim_state: &'a SimulationStateMachine,
        scene: &'a Mutex<S>,
        frame_period: Duration,
        counters: &'a FrameCounters,
    ) -> Self {
        Self {
            run_state,
            sim_state,
            scene,
            frame_period,
            counters,
        }
    }

    /// Main frame loop. Runs until the run state leaves the
    /// running/pausing/paused region.
    ///
    /// A scene error ends the loop immediately and is returned as-is;
    /// the loop makes no attempt to recover from engine failures.
    pub fn run(self) -> Result<(), EngineError> {
        log::info!(
            "worker loop started (frame period {} us)",
            self.frame_period.as_micros()
        );

        loop {
            let acknowledged = self.run_state.pauses_acknowledged();
            let proceed = self.run_state.poll_and_advance();
            let halts = self.run_state.pauses_acknowledged() - acknowledged;
            if halts > 0 {
                self.counters.record_pauses(halts);
            }
            if !proceed {
                break;
            }

            let frame_start = Instant::now();

            // 1. Step the world if the simulation is live, then draw.
            let stepped = self.sim_state.is_running();
            self.frame(stepped)?;

            // 2. Record timing.
            let elapsed = frame_start.elapsed();
            let overrun = elapsed > self.frame_period;
            let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
            self.counters.record_frame(stepped, micros, overrun);
            if elapsed > self.frame_period * SLOW_FRAME_FACTOR {
                log::warn!(
                    "frame took {} us against a {} us budget",
                    elapsed.as_micros(),
                    self.frame_period.as_micros()
                );
            }

            // 3. Sleep for remaining budget.
            if let Some(remaining) = self.frame_period.checked_sub(elapsed) {
                self.sleep(remaining);
            }
        }

        log::info!("worker loop stopped");
        Ok(())
    }

    fn frame(&self, stepped: bool) -> Result<(), EngineError> {
        let mut scene = self.scene.lock().unwrap_or_else(PoisonError::into_inner);
        if stepped {
            scene.step_physics(self.frame_period)?;
            scene.step_agents()?;
        }
        scene.render()
    }

    /// Budget sleep. Uses `park_timeout` so that a stop request can cut
    /// it short by unparking this thread.
    fn sleep(&self, remaining: Duration) {
        let deadline = Instant::now() + remaining;
        loop {
            if matches!(
                self.run_state.state(),
                RunState::Stopping | RunState::Stopped
            ) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            thread::park_timeout(deadline - now);
        }
    }
}
