//! Core types and traits for the Tandem coordination core.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the two state machines shared between the worker thread and the
//! command thread, the error taxonomy, and the traits through which
//! the engine talks to its external collaborators (scene, scripting).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod run_state;
pub mod sim_state;
pub mod traits;

pub use error::{EngineError, EvalError, StateError};
pub use run_state::{RunState, RunStateMachine};
pub use sim_state::{SimulationState, SimulationStateMachine};
pub use traits::{Scene, Scriptable, Value};
