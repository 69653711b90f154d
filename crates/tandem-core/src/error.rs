//! Error types for the Tandem coordination core.
//!
//! Three families, one per failure class:
//!
//! - [`StateError`]: a caller asked a state machine for a transition
//!   its table does not allow. Contract violation, never masked.
//! - [`EngineError`]: the scene failed while stepping or rendering.
//!   Fatal to the worker loop.
//! - [`EvalError`]: a shell command could not be evaluated. Reported
//!   and skipped; never touches either state machine.

use crate::run_state::RunState;
use crate::sim_state::SimulationState;

/// An illegal state-machine transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// The [`RunStateMachine`](crate::RunStateMachine) rejected the operation.
    #[error("cannot {operation} the worker while it is {state}")]
    Run {
        /// Name of the rejected operation.
        operation: &'static str,
        /// State the machine was in when the operation was attempted.
        state: RunState,
    },
    /// The [`SimulationStateMachine`](crate::SimulationStateMachine)
    /// rejected the operation.
    #[error("cannot {operation} the simulation while it is {state}")]
    Simulation {
        /// Name of the rejected operation.
        operation: &'static str,
        /// State the machine was in when the operation was attempted.
        state: SimulationState,
    },
}

/// A failure inside the scene collaborator.
///
/// Returned by [`Scene`](crate::Scene) methods and propagated out of
/// the worker loop unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The physics step failed.
    #[error("physics step failed: {reason}")]
    Physics {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// An agent failed during its tick.
    #[error("agent '{name}' failed: {reason}")]
    Agent {
        /// Name of the failing agent.
        name: String,
        /// Human-readable description of the failure.
        reason: String,
    },
    /// Rendering a frame failed.
    #[error("render failed: {reason}")]
    Render {
        /// Human-readable description of the failure.
        reason: String,
    },
}

/// A shell command that could not be evaluated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The command word is not recognised.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    /// No object with this name exists in the root object graph.
    #[error("no object named '{0}'")]
    UnknownObject(String),
    /// The object exists but has no such field.
    #[error("{object} has no field '{field}'")]
    UnknownField {
        /// Object type name.
        object: String,
        /// Requested field.
        field: String,
    },
    /// The object exists but has no such method.
    #[error("{object} has no method '{method}'")]
    UnknownMethod {
        /// Object type name.
        object: String,
        /// Requested method.
        method: String,
    },
    /// The field exists but cannot be assigned.
    #[error("field '{field}' is read-only")]
    ReadOnly {
        /// The field that was assigned.
        field: String,
    },
    /// An argument was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The command asked for a state transition that is not allowed now.
    #[error(transparent)]
    State(#[from] StateError),
}
