//! User-facing [`Coordinator`] API and run lifecycle.
//!
//! The coordinator owns everything the two threads share: both state
//! machines, the scene, and the frame counters. It is shared with the
//! command thread through an `Arc` for the duration of [`Coordinator::run`];
//! there is no process-wide instance.
//!
//! # Lifecycle
//!
//! ```text
//! run():  boot ─▶ spawn shell thread ─▶ worker loop (inline) ─▶ join shell ─▶ finalize_stop
//!                        │                     ▲
//!                        └── quit() ── request_stop ──┘
//! ```
//!
//! A scene fault ends the worker loop early. The run state is then
//! abandoned (left `Stopping`, every waiter woken) and the shell thread,
//! which may be blocked reading input, is detached rather than joined.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

use tandem_core::{
    EngineError, RunStateMachine, Scene, SimulationStateMachine, StateError,
};

use crate::command::{CommandLoop, Interpreter, ShellStats};
use crate::config::{ConfigError, CoordinatorConfig};
use crate::metrics::{FrameCounters, FrameMetrics};
use crate::source::LineSource;
use crate::worker::WorkerLoop;

// ── Error types ──────────────────────────────────────────────────

/// Error ending a [`Coordinator::run`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The run was started from a state that does not allow it.
    #[error(transparent)]
    State(#[from] StateError),
    /// The scene failed inside the worker loop.
    #[error("engine fault: {0}")]
    Engine(#[from] EngineError),
    /// The shell thread could not be spawned.
    #[error("failed to spawn the shell thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The shell thread panicked; the worker was stopped.
    #[error("shell thread panicked")]
    ShellPanicked,
}

// ── RunReport ────────────────────────────────────────────────────

/// Summary of a completed run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Worker counters at the end of the run.
    pub metrics: FrameMetrics,
    /// Command loop counts.
    pub shell: ShellStats,
    /// Wall-clock time from boot to finalize.
    pub elapsed: Duration,
}

// ── Coordinator ──────────────────────────────────────────────────

/// Owner of the scene and both state machines.
///
/// Construct once, wrap in an `Arc`, then call [`run`](Self::run) from
/// the thread that should become the worker.
pub struct Coordinator<S: Scene> {
    run_state: RunStateMachine,
    sim_state: SimulationStateMachine,
    scene: Mutex<S>,
    config: CoordinatorConfig,
    frame_period: Duration,
    counters: FrameCounters,
    shell_running: AtomicBool,
    /// Set by `pause_worker`; tells the command loop not to lift the
    /// halt it is holding.
    hold_requested: AtomicBool,
    /// Handle of the thread currently running the worker loop, for
    /// cutting its budget sleep short on quit.
    worker: Mutex<Option<Thread>>,
}

impl<S: Scene> Coordinator<S> {
    /// Create a coordinator in `RunState::Stopped` with the simulation
    /// `Paused`.
    pub fn new(scene: S, config: CoordinatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            run_state: RunStateMachine::new(),
            sim_state: SimulationStateMachine::new(),
            scene: Mutex::new(scene),
            frame_period: config.frame_period(),
            config,
            counters: FrameCounters::default(),
            shell_running: AtomicBool::new(false),
            hold_requested: AtomicBool::new(false),
            worker: Mutex::new(None),
        })
    }

    /// Run the whole lifecycle. Blocks until the worker stops.
    ///
    /// The calling thread becomes the worker; the command loop runs on a
    /// new thread named after
    /// [`shell_thread_name`](CoordinatorConfig::shell_thread_name), reading
    /// from `input` and writing to `output`. Returns once `quit()` (from
    /// a command or another thread) has stopped the worker and the shell
    /// thread has been joined.
    pub fn run<I, L>(
        self: &Arc<Self>,
        interpreter: I,
        input: L,
        output: Box<dyn Write + Send>,
    ) -> Result<RunReport, RunError>
    where
        S: 'static,
        I: Interpreter<S> + 'static,
        L: LineSource + 'static,
    {
        let started = Instant::now();

        self.run_state.boot()?;
        if self.config.start_simulation {
            if let Err(e) = self.sim_state.resume() {
                self.run_state.abandon();
                self.run_state.finalize_stop()?;
                return Err(e.into());
            }
        }
        self.shell_running.store(true, Ordering::Release);
        *self.lock_worker() = Some(thread::current());
        log::info!(
            "coordinator booted at {} Hz, simulation {}",
            self.config.frame_rate_hz,
            self.sim_state.state()
        );

        let shell = CommandLoop::new(Arc::clone(self), interpreter, input, output);
        let shell_thread = match thread::Builder::new()
            .name(self.config.shell_thread_name.clone())
            .spawn(move || shell.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("failed to spawn shell thread: {e}");
                self.shell_running.store(false, Ordering::Release);
                self.lock_worker().take();
                self.run_state.abandon();
                self.run_state.finalize_stop()?;
                return Err(RunError::Spawn(e));
            }
        };

        let outcome = WorkerLoop::new(
            &self.run_state,
            &self.sim_state,
            &self.scene,
            self.frame_period,
            &self.counters,
        )
        .run();
        self.lock_worker().take();

        if let Err(fault) = outcome {
            log::error!("worker loop failed: {fault}");
            self.abandon();
            // The shell may be blocked on input that never comes. Returning
            // drops its handle without joining, which detaches it.
            return Err(RunError::Engine(fault));
        }

        let joined = shell_thread.join();
        self.run_state.finalize_stop()?;
        let shell = joined.map_err(|_| {
            log::error!("shell thread panicked");
            RunError::ShellPanicked
        })?;

        let report = RunReport {
            metrics: self.metrics(),
            shell,
            elapsed: started.elapsed(),
        };
        log::info!(
            "coordinator stopped after {} frames ({} simulated) in {:.2?}",
            report.metrics.frames,
            report.metrics.simulation_steps,
            report.elapsed
        );
        Ok(report)
    }

    /// Ask the worker to leave its loop and stop the shell.
    ///
    /// Fails while a worker pause is pending (`Pausing`); the shell keeps
    /// running in that case so the caller can retry.
    pub fn quit(&self) -> Result<(), StateError> {
        self.run_state.request_stop()?;
        self.shell_running.store(false, Ordering::Release);
        self.wake_worker();
        log::info!("quit requested");
        Ok(())
    }

    /// Freeze the simulated world. The worker keeps rendering.
    ///
    /// While the worker is halted (inside [`Interpreter::evaluate`], or
    /// after [`pause_worker`](Self::pause_worker)) it cannot tick, so the
    /// pause is completed here and `wait_until_paused` never blocks.
    pub fn pause(&self, wait_until_paused: bool) -> Result<bool, StateError> {
        if self.run_state.is_paused() {
            let started = self.sim_state.pause(false)?;
            // Worker is parked at its poll boundary; no step can be in flight.
            self.sim_state.is_running();
            return Ok(started);
        }
        self.sim_state.pause(wait_until_paused)
    }

    /// Unfreeze the simulated world.
    pub fn resume(&self) -> Result<(), StateError> {
        self.sim_state.resume()
    }

    /// Halt the whole worker at its next poll boundary.
    ///
    /// Returns `true` if this call is the one that halted it; only then
    /// should the caller [`resume_worker`](Self::resume_worker).
    ///
    /// Called while a shell command is being evaluated (from the command
    /// itself or another thread), the worker stays halted after that
    /// command instead of being resumed by the command loop.
    pub fn pause_worker(&self, wait_until_paused: bool) -> Result<bool, StateError> {
        self.hold_requested.store(true, Ordering::Release);
        self.run_state.request_pause(wait_until_paused)
    }

    /// Let a halted worker continue.
    pub fn resume_worker(&self) -> Result<(), StateError> {
        self.run_state.resume()
    }

    /// Lifecycle state machine of the worker.
    pub fn run_state(&self) -> &RunStateMachine {
        &self.run_state
    }

    /// Freeze state machine of the simulated world.
    pub fn simulation_state(&self) -> &SimulationStateMachine {
        &self.sim_state
    }

    /// Lock the scene.
    ///
    /// Uncontended while the worker is halted (inside an interpreter
    /// call, or outside `run()`); otherwise waits for the current frame
    /// to finish.
    pub fn lock_scene(&self) -> MutexGuard<'_, S> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the worker counters.
    pub fn metrics(&self) -> FrameMetrics {
        self.counters.snapshot()
    }

    /// Target duration of one worker iteration.
    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    /// The configuration this coordinator was built with.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Whether the command loop is still reading input.
    ///
    /// Cleared by [`quit`](Self::quit), by a fault, and when the loop
    /// exits on its own at end of input.
    pub fn shell_running(&self) -> bool {
        self.shell_running.load(Ordering::Acquire)
    }

    /// Clear and return the pending hold request.
    pub(crate) fn take_hold_request(&self) -> bool {
        self.hold_requested.swap(false, Ordering::AcqRel)
    }

    /// Called by the command loop on its way out.
    pub(crate) fn shell_finished(&self) {
        self.shell_running.store(false, Ordering::Release);
    }

    /// Fault path shared by the worker and the shell panic guard.
    pub(crate) fn abandon(&self) {
        self.shell_running.store(false, Ordering::Release);
        self.run_state.abandon();
        self.wake_worker();
    }

    fn wake_worker(&self) {
        if let Some(worker) = self.lock_worker().as_ref() {
            worker.unpark();
        }
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Thread>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
