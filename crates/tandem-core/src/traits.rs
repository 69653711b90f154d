//! Collaborator traits: what the engine needs from the world and from
//! the scripting layer.

use std::fmt;
use std::time::Duration;

use crate::error::{EngineError, EvalError};

/// The simulated world as seen by the worker loop.
///
/// Physics, agents and rendering are external engines; the worker only
/// needs to drive them once per frame. Implementations may assume all
/// three methods are called from a single thread at a time and that no
/// other thread touches the scene concurrently.
pub trait Scene: Send {
    /// Advance rigid-body dynamics by `dt`.
    fn step_physics(&mut self, dt: Duration) -> Result<(), EngineError>;

    /// Advance every agent by one tick.
    fn step_agents(&mut self) -> Result<(), EngineError>;

    /// Draw one frame. Called every iteration, paused or not.
    fn render(&mut self) -> Result<(), EngineError>;
}

/// A dynamically typed value passed between the shell and native objects.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// No value (result of a method with nothing to return).
    Unit,
    /// Boolean.
    Bool(bool),
    /// Any number; the shell has a single numeric type.
    Number(f64),
    /// Free text.
    Text(String),
    /// A 3-vector (positions, velocities, forces).
    Vector([f64; 3]),
}

impl Value {
    /// Parse one shell token: `true`/`false`, a number, or text.
    pub fn parse(token: &str) -> Self {
        match token {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => token
                .parse::<f64>()
                .map(Self::Number)
                .unwrap_or_else(|_| Self::Text(token.to_string())),
        }
    }

    /// The numeric payload, or an [`EvalError::InvalidArgument`].
    pub fn as_number(&self) -> Result<f64, EvalError> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(EvalError::InvalidArgument(format!(
                "expected a number, got {other}"
            ))),
        }
    }

    /// The vector payload, or an [`EvalError::InvalidArgument`].
    pub fn as_vector(&self) -> Result<[f64; 3], EvalError> {
        match self {
            Self::Vector(v) => Ok(*v),
            other => Err(EvalError::InvalidArgument(format!(
                "expected a vector, got {other}"
            ))),
        }
    }

    /// The boolean payload, or an [`EvalError::InvalidArgument`].
    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(EvalError::InvalidArgument(format!(
                "expected true or false, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("()"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "\"{s}\""),
            Self::Vector([x, y, z]) => write!(f, "({x}, {y}, {z})"),
        }
    }
}

/// Capability interface through which the shell reaches native objects.
///
/// Objects expose named fields and named methods; the shell never needs
/// to know their concrete type. Read-only fields are listed in
/// [`fields`](Self::fields) but rejected by the default
/// [`set_field`](Self::set_field).
pub trait Scriptable {
    /// Short type name used in listings and error messages.
    fn type_name(&self) -> &str;

    /// Names of all readable fields.
    fn fields(&self) -> &[&'static str];

    /// Read a field.
    fn get_field(&self, name: &str) -> Result<Value, EvalError>;

    /// Assign a field.
    fn set_field(&mut self, name: &str, _value: Value) -> Result<(), EvalError> {
        if self.fields().iter().any(|field| *field == name) {
            Err(EvalError::ReadOnly {
                field: name.to_string(),
            })
        } else {
            Err(self.unknown_field(name))
        }
    }

    /// Names of all callable methods.
    fn methods(&self) -> &[&'static str] {
        &[]
    }

    /// Invoke a method.
    fn call_method(&mut self, name: &str, _args: &[Value]) -> Result<Value, EvalError> {
        Err(EvalError::UnknownMethod {
            object: self.type_name().to_string(),
            method: name.to_string(),
        })
    }

    /// Convenience constructor for [`EvalError::UnknownField`].
    fn unknown_field(&self, name: &str) -> EvalError {
        EvalError::UnknownField {
            object: self.type_name().to_string(),
            field: name.to_string(),
        }
    }
}
