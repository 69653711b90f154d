//! Tandem: run a simulation on one thread and a command shell on another
//! without the two ever touching the world at the same time.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Tandem sub-crates. For most users, adding `tandem` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tandem::prelude::*;
//!
//! #[derive(Default)]
//! struct Ticker {
//!     elapsed: Duration,
//! }
//!
//! impl Scene for Ticker {
//!     fn step_physics(&mut self, dt: Duration) -> Result<(), EngineError> {
//!         self.elapsed += dt;
//!         Ok(())
//!     }
//!     fn step_agents(&mut self) -> Result<(), EngineError> { Ok(()) }
//!     fn render(&mut self) -> Result<(), EngineError> { Ok(()) }
//! }
//!
//! struct Shell;
//!
//! impl Interpreter<Ticker> for Shell {
//!     fn evaluate(
//!         &mut self,
//!         line: &str,
//!         coordinator: &Coordinator<Ticker>,
//!     ) -> Result<Option<String>, EvalError> {
//!         match line {
//!             "elapsed" => Ok(Some(format!("{:?}", coordinator.lock_scene().elapsed))),
//!             "quit" => coordinator.quit().map(|()| None).map_err(Into::into),
//!             other => Err(EvalError::UnknownCommand(other.into())),
//!         }
//!     }
//! }
//!
//! let coordinator = Arc::new(Coordinator::new(Ticker::default(), CoordinatorConfig::default()).unwrap());
//! let report = coordinator
//!     .run(Shell, ScriptedSource::new(["elapsed", "quit"]), Box::new(std::io::sink()))
//!     .unwrap();
//! assert_eq!(report.shell.evaluated, 2);
//! assert_eq!(coordinator.run_state().state(), RunState::Stopped);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tandem-core` | State machines, errors, `Scene` and `Scriptable` traits |
//! | [`engine`] | `tandem-engine` | Worker loop, command loop, coordinator, configuration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// State machines, errors and collaborator traits (`tandem-core`).
///
/// [`types::RunStateMachine`] and [`types::SimulationStateMachine`] can be
/// used on their own to coordinate any worker/controller pair.
pub use tandem_core as types;

/// Worker loop, command loop and coordinator (`tandem-engine`).
///
/// [`engine::Coordinator`] ties both threads together; the line sources
/// in [`engine::source`] feed its shell.
pub use tandem_engine as engine;

/// Common imports for typical Tandem usage.
///
/// ```rust
/// use tandem::prelude::*;
/// ```
pub mod prelude {
    // State machines
    pub use tandem_core::{RunState, RunStateMachine, SimulationState, SimulationStateMachine};

    // Collaborator traits
    pub use tandem_core::{Scene, Scriptable, Value};

    // Errors
    pub use tandem_core::{EngineError, EvalError, StateError};

    // Engine
    pub use tandem_engine::{
        ChannelSource, Coordinator, CoordinatorConfig, FrameMetrics, Interpreter, LineSource,
        ReaderSource, RunError, RunReport, ScriptedSource,
    };
}
