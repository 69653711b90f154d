//! The command thread: read a line, halt the worker, evaluate, resume.
//!
//! Every evaluation happens with the worker halted at its poll
//! boundary, so interpreters may read and mutate the scene freely. The
//! loop never lifts a pause it did not make: the worker is resumed after
//! a command only when the loop's own request halted it, and nobody
//! (the command itself included) called
//! [`Coordinator::pause_worker`] while the command ran.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use tandem_core::{EvalError, Scene};

use crate::coordinator::Coordinator;
use crate::source::LineSource;

/// The scripting collaborator driven by the command loop.
///
/// Both methods run on the command thread with the worker halted.
pub trait Interpreter<S: Scene>: Send {
    /// Called once before the first line is read.
    fn init(&mut self, _coordinator: &Coordinator<S>) -> Result<(), EvalError> {
        Ok(())
    }

    /// Evaluate one line. `Ok(Some(text))` is echoed to the shell output.
    fn evaluate(
        &mut self,
        line: &str,
        coordinator: &Coordinator<S>,
    ) -> Result<Option<String>, EvalError>;
}

/// Counts reported by a finished command loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShellStats {
    /// Lines handed to the interpreter.
    pub evaluated: u64,
    /// Lines whose evaluation returned an error.
    pub failed: u64,
}

/// Body of the command thread.
pub struct CommandLoop<S: Scene, I, L> {
    coordinator: Arc<Coordinator<S>>,
    interpreter: I,
    input: L,
    output: Box<dyn Write + Send>,
}

impl<S, I, L> CommandLoop<S, I, L>
where
    S: Scene,
    I: Interpreter<S>,
    L: LineSource,
{
    /// Create a command loop. `output` receives results, errors and the
    /// prompt.
    pub fn new(
        coordinator: Arc<Coordinator<S>>,
        interpreter: I,
        input: L,
        output: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            coordinator,
            interpreter,
            input,
            output,
        }
    }

    /// Run until the shell is told to stop, the worker stops, or the
    /// input ends.
    pub fn run(self) -> ShellStats {
        let Self {
            coordinator,
            mut interpreter,
            mut input,
            mut output,
        } = self;
        let coordinator: &Coordinator<S> = &coordinator;
        let _guard = PanicGuard { coordinator };
        let mut stats = ShellStats::default();

        match with_worker_halted(coordinator, || interpreter.init(coordinator)) {
            Some(Ok(())) => {}
            Some(Err(e)) => report(&mut output, &e),
            None => {
                coordinator.shell_finished();
                return stats;
            }
        }

        let mut input_closed = false;
        while coordinator.shell_running() {
            if let Some(prompt) = coordinator.config().prompt.as_deref() {
                let _ = write!(output, "{prompt}");
                let _ = output.flush();
            }

            let line = match input.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    input_closed = true;
                    break;
                }
                Err(e) => {
                    log::warn!("shell input failed: {e}");
                    input_closed = true;
                    break;
                }
            };
            let command = line.trim();
            if command.is_empty() || !coordinator.shell_running() {
                continue;
            }

            let outcome =
                match with_worker_halted(coordinator, || interpreter.evaluate(command, coordinator)) {
                    Some(outcome) => outcome,
                    None => break,
                };
            stats.evaluated += 1;
            match outcome {
                Ok(Some(text)) => {
                    let _ = writeln!(output, "{text}");
                }
                Ok(None) => {}
                Err(e) => {
                    stats.failed += 1;
                    report(&mut output, &e);
                }
            }
        }
        let _ = output.flush();

        if input_closed && coordinator.config().quit_on_eof && coordinator.shell_running() {
            log::info!("shell input closed, quitting");
            if let Err(e) = coordinator.quit() {
                log::warn!("quit after end of input failed: {e}");
            }
        }
        coordinator.shell_finished();
        log::debug!(
            "command loop finished: {} evaluated, {} failed",
            stats.evaluated,
            stats.failed
        );
        stats
    }
}

/// Halt the worker, run `f`, and resume the worker if this call was the
/// one that halted it, nobody asked for it to stay halted meanwhile, and
/// it is still halted.
///
/// Returns `None` when the worker cannot be halted because it is
/// stopping (or not running at all): the shell has nothing left to do.
fn with_worker_halted<S: Scene, R>(
    coordinator: &Coordinator<S>,
    f: impl FnOnce() -> R,
) -> Option<R> {
    let paused_here = match coordinator.run_state().request_pause(true) {
        Ok(paused_here) => paused_here,
        Err(e) => {
            log::debug!("worker unavailable, shell exiting: {e}");
            return None;
        }
    };
    coordinator.take_hold_request();

    let result = f();

    let held = coordinator.take_hold_request();
    if held {
        log::debug!("worker pause requested during command, leaving it halted");
    }
    if paused_here && !held && coordinator.run_state().is_paused() {
        if let Err(e) = coordinator.resume_worker() {
            log::warn!("could not resume worker after command: {e}");
        }
    }
    Some(result)
}

fn report(output: &mut Box<dyn Write + Send>, error: &EvalError) {
    log::warn!("command failed: {error}");
    let _ = writeln!(output, "error: {error}");
}

/// Releases the worker if the interpreter panics mid-command, so the
/// worker thread is not left blocked at its poll boundary forever.
struct PanicGuard<'a, S: Scene> {
    coordinator: &'a Coordinator<S>,
}

impl<S: Scene> Drop for PanicGuard<'_, S> {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("command thread panicked, stopping the worker");
            self.coordinator.abandon();
        }
    }
}
