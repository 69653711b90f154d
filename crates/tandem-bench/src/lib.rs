//! Benchmark scenes and helpers for the Tandem coordination core.
//!
//! - [`BallisticScene`]: a fixed cloud of point masses integrated every
//!   physics step, so frames cost something measurable.
//! - [`reference_scene`] / [`stress_scene`]: 1K and 100K body profiles.
//! - [`bench_config`]: an uncapped coordinator configuration.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::time::Duration;

use tandem_core::{EngineError, Scene};
use tandem_engine::CoordinatorConfig;

const GRAVITY: f64 = -9.81;

/// Point masses falling onto a ground plane at `z = 0`.
pub struct BallisticScene {
    positions: Vec<[f64; 3]>,
    velocities: Vec<[f64; 3]>,
    frames: u64,
}

impl BallisticScene {
    /// Create `n` bodies at deterministic positions derived from `seed`.
    pub fn new(n: usize, seed: u64) -> Self {
        let positions = (0..n as u64)
            .map(|i| {
                let h = seed
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(i.wrapping_mul(1442695040888963407));
                [
                    (h % 1000) as f64 / 10.0,
                    ((h >> 16) % 1000) as f64 / 10.0,
                    1.0 + ((h >> 32) % 100) as f64,
                ]
            })
            .collect();
        Self {
            positions,
            velocities: vec![[0.0; 3]; n],
            frames: 0,
        }
    }

    /// Number of bodies.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if the scene has no bodies.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Lowest body height.
    pub fn min_height(&self) -> f64 {
        self.positions
            .iter()
            .map(|p| p[2])
            .fold(f64::INFINITY, f64::min)
    }
}

impl Scene for BallisticScene {
    fn step_physics(&mut self, dt: Duration) -> Result<(), EngineError> {
        let dt = dt.as_secs_f64();
        for (p, v) in self.positions.iter_mut().zip(&mut self.velocities) {
            v[2] += GRAVITY * dt;
            for axis in 0..3 {
                p[axis] += v[axis] * dt;
            }
            if p[2] < 0.0 {
                p[2] = 0.0;
                v[2] = 0.0;
            }
        }
        Ok(())
    }

    fn step_agents(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn render(&mut self) -> Result<(), EngineError> {
        self.frames += 1;
        Ok(())
    }
}

/// 1,000 bodies.
pub fn reference_scene(seed: u64) -> BallisticScene {
    BallisticScene::new(1_000, seed)
}

/// 100,000 bodies.
pub fn stress_scene(seed: u64) -> BallisticScene {
    BallisticScene::new(100_000, seed)
}

/// Coordinator configuration for benchmarks: simulation live, a frame
/// rate high enough that the worker never sleeps, no prompt.
pub fn bench_config() -> CoordinatorConfig {
    CoordinatorConfig {
        frame_rate_hz: 1_000_000.0,
        start_simulation: true,
        ..Default::default()
    }
}
