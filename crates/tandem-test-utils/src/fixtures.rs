//! Reusable scene fixtures.
//!
//! - [`CountingScene`] counts every physics step, agent tick and render.
//! - [`FailingScene`] fails deterministically after N calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tandem_core::{EngineError, Scene};

/// Handle onto the counters of a [`CountingScene`].
///
/// Stays readable from the test thread after the scene has moved into a
/// coordinator.
#[derive(Clone, Debug, Default)]
pub struct SceneCounters {
    physics: Arc<AtomicU64>,
    agents: Arc<AtomicU64>,
    renders: Arc<AtomicU64>,
}

impl SceneCounters {
    pub fn physics_steps(&self) -> u64 {
        self.physics.load(Ordering::Acquire)
    }

    pub fn agent_ticks(&self) -> u64 {
        self.agents.load(Ordering::Acquire)
    }

    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::Acquire)
    }
}

/// A scene that does nothing but count calls.
pub struct CountingScene {
    counters: SceneCounters,
    render_delay: Option<Duration>,
    /// Total simulated time, advanced by each physics step.
    pub clock: Duration,
}

impl CountingScene {
    /// Create a scene and the probe that observes it.
    pub fn new() -> (Self, SceneCounters) {
        let counters = SceneCounters::default();
        let scene = Self {
            counters: counters.clone(),
            render_delay: None,
            clock: Duration::ZERO,
        };
        (scene, counters)
    }

    /// Like [`new`](Self::new), but every render sleeps for `delay`.
    ///
    /// Useful for forcing frame overruns.
    pub fn with_render_delay(delay: Duration) -> (Self, SceneCounters) {
        let (mut scene, counters) = Self::new();
        scene.render_delay = Some(delay);
        (scene, counters)
    }
}

impl Scene for CountingScene {
    fn step_physics(&mut self, dt: Duration) -> Result<(), EngineError> {
        self.clock += dt;
        self.counters.physics.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn step_agents(&mut self) -> Result<(), EngineError> {
        self.counters.agents.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn render(&mut self) -> Result<(), EngineError> {
        if let Some(delay) = self.render_delay {
            thread::sleep(delay);
        }
        self.counters.renders.fetch_add(1, Ordering::Release);
        Ok(())
    }
}

/// Fails deterministically after a configurable number of successful
/// calls to one scene method.
pub struct FailingScene {
    physics_budget: Option<u64>,
    render_budget: Option<u64>,
    physics_calls: u64,
    render_calls: u64,
}

impl FailingScene {
    /// Physics succeeds `count` times, then fails.
    pub fn physics_after(count: u64) -> Self {
        Self {
            physics_budget: Some(count),
            render_budget: None,
            physics_calls: 0,
            render_calls: 0,
        }
    }

    /// Rendering succeeds `count` times, then fails. Fails even while
    /// the simulation is paused.
    pub fn render_after(count: u64) -> Self {
        Self {
            physics_budget: None,
            render_budget: Some(count),
            physics_calls: 0,
            render_calls: 0,
        }
    }
}

impl Scene for FailingScene {
    fn step_physics(&mut self, _dt: Duration) -> Result<(), EngineError> {
        self.physics_calls += 1;
        match self.physics_budget {
            Some(budget) if self.physics_calls > budget => Err(EngineError::Physics {
                reason: format!("deliberate failure after {budget} successful steps"),
            }),
            _ => Ok(()),
        }
    }

    fn step_agents(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn render(&mut self) -> Result<(), EngineError> {
        self.render_calls += 1;
        match self.render_budget {
            Some(budget) if self.render_calls > budget => Err(EngineError::Render {
                reason: format!("deliberate failure after {budget} successful renders"),
            }),
            _ => Ok(()),
        }
    }
}
