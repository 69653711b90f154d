//! Coordinator configuration, validation, and error types.
//!
//! [`CoordinatorConfig`] is the builder-input for constructing a
//! [`Coordinator`](crate::Coordinator). [`validate()`](CoordinatorConfig::validate)
//! checks invariants once at construction so the loops never have to.

use std::time::Duration;

// ── CoordinatorConfig ──────────────────────────────────────────────

/// Configuration for a [`Coordinator`](crate::Coordinator).
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Target frame rate of the worker loop. Default: 60.
    pub frame_rate_hz: f64,
    /// Resume the simulation as soon as `run()` boots. Default: false
    /// (the world starts frozen, the renderer still draws).
    pub start_simulation: bool,
    /// Quit the whole run when the shell input ends. Default: true.
    pub quit_on_eof: bool,
    /// Prompt printed before each shell read. Default: none.
    pub prompt: Option<String>,
    /// Name given to the command thread. Default: `"tandem-shell"`.
    pub shell_thread_name: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 60.0,
            start_simulation: false,
            quit_on_eof: true,
            prompt: None,
            shell_thread_name: "tandem-shell".into(),
        }
    }
}

impl CoordinatorConfig {
    /// Validate all invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_rate_hz.is_finite()
            || self.frame_rate_hz <= 0.0
            || Duration::try_from_secs_f64(self.frame_rate_hz.recip()).is_err()
        {
            return Err(ConfigError::InvalidFrameRate {
                value: self.frame_rate_hz,
            });
        }
        if self.shell_thread_name.trim().is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        Ok(())
    }

    /// Target duration of one worker iteration.
    ///
    /// Only meaningful on a validated config; an invalid rate yields
    /// `Duration::MAX`.
    pub fn frame_period(&self) -> Duration {
        Duration::try_from_secs_f64(self.frame_rate_hz.recip()).unwrap_or(Duration::MAX)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`CoordinatorConfig::validate()`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `frame_rate_hz` is not a positive finite rate with a
    /// representable period.
    #[error("frame_rate_hz must be finite and positive, got {value}")]
    InvalidFrameRate {
        /// The invalid value.
        value: f64,
    },
    /// The shell thread name is empty.
    #[error("shell_thread_name must not be empty")]
    EmptyThreadName,
}
