//! Worker loop, command loop and coordinator for Tandem simulations.
//!
//! A [`Coordinator`] owns a scene and the two state machines from
//! `tandem-core`. [`Coordinator::run`] turns the calling thread into the
//! worker (step, render, sleep to the frame period) and spawns a command
//! thread that evaluates one shell line at a time, halting the worker
//! around each line so commands never race the simulation.
//!
//! ```text
//! Command thread                         Worker (calling thread)
//!     |                                       |
//!     | read line                             | poll_and_advance()
//!     |--pause_worker(wait)------------------>| Pausing → Paused, ack
//!     |<------------------------------ack-----| (blocked)
//!     | evaluate(line) against the scene      |
//!     |--resume_worker()--------------------->| Paused → Running
//!     |                                       | step / render / sleep
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod config;
pub mod coordinator;
pub mod metrics;
pub mod source;
pub mod worker;

pub use command::{CommandLoop, Interpreter, ShellStats};
pub use config::{ConfigError, CoordinatorConfig};
pub use coordinator::{Coordinator, RunError, RunReport};
pub use metrics::{FrameCounters, FrameMetrics};
pub use source::{ChannelSource, LineSource, ReaderSource, ScriptedSource};
pub use worker::WorkerLoop;
