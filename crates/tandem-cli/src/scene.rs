//! Demonstration scene: point masses over a ground plane, pushed around
//! by drifter agents, drawn by a headless renderer that only counts
//! frames.

use std::time::Duration;

use indexmap::IndexMap;
use tandem::prelude::{EngineError, EvalError, Scene, Scriptable, Value};

/// Name under which the scene itself is reachable from the shell.
pub const WORLD: &str = "world";

const DEFAULT_GRAVITY: [f64; 3] = [0.0, 0.0, -9.81];
/// Bounce speeds below this are treated as resting contact.
const REST_SPEED: f64 = 1e-3;

/// A point mass.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub mass: f64,
    /// Fraction of normal speed kept when bouncing off the ground.
    pub restitution: f64,
    /// Thrust applied each agent tick, if a drifter is attached.
    pub drift: Option<[f64; 3]>,
}

impl Body {
    pub fn at(position: [f64; 3]) -> Self {
        Self {
            position,
            velocity: [0.0; 3],
            mass: 1.0,
            restitution: 0.5,
            drift: None,
        }
    }

    fn integrate(&mut self, gravity: [f64; 3], ground: f64, dt: f64) {
        for axis in 0..3 {
            self.velocity[axis] += gravity[axis] * dt;
            self.position[axis] += self.velocity[axis] * dt;
        }
        if self.position[2] < ground {
            self.position[2] = ground;
            self.velocity[2] = -self.velocity[2] * self.restitution;
            if self.velocity[2].abs() < REST_SPEED {
                self.velocity[2] = 0.0;
            }
        }
    }

    fn is_finite(&self) -> bool {
        self.position
            .iter()
            .chain(&self.velocity)
            .all(|c| c.is_finite())
    }
}

impl Scriptable for Body {
    fn type_name(&self) -> &str {
        "body"
    }

    fn fields(&self) -> &[&'static str] {
        &["position", "velocity", "mass", "restitution", "drift"]
    }

    fn get_field(&self, name: &str) -> Result<Value, EvalError> {
        match name {
            "position" => Ok(Value::Vector(self.position)),
            "velocity" => Ok(Value::Vector(self.velocity)),
            "mass" => Ok(Value::Number(self.mass)),
            "restitution" => Ok(Value::Number(self.restitution)),
            "drift" => Ok(self.drift.map_or(Value::Unit, Value::Vector)),
            _ => Err(self.unknown_field(name)),
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        match name {
            "position" => self.position = value.as_vector()?,
            "velocity" => self.velocity = value.as_vector()?,
            "mass" => {
                let mass = value.as_number()?;
                if !(mass.is_finite() && mass > 0.0) {
                    return Err(EvalError::InvalidArgument(format!(
                        "mass must be positive, got {mass}"
                    )));
                }
                self.mass = mass;
            }
            "restitution" => {
                let restitution = value.as_number()?;
                if !(0.0..=1.0).contains(&restitution) {
                    return Err(EvalError::InvalidArgument(format!(
                        "restitution must be within 0..=1, got {restitution}"
                    )));
                }
                self.restitution = restitution;
            }
            "drift" => {
                self.drift = match value {
                    Value::Unit => None,
                    other => Some(other.as_vector()?),
                }
            }
            _ => return Err(self.unknown_field(name)),
        }
        Ok(())
    }

    fn methods(&self) -> &[&'static str] {
        &["impulse", "stop"]
    }

    fn call_method(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        match name {
            // impulse x y z: instantaneous change of momentum.
            "impulse" => {
                let j = vector_arg(args)?;
                for axis in 0..3 {
                    self.velocity[axis] += j[axis] / self.mass;
                }
                Ok(Value::Vector(self.velocity))
            }
            "stop" => {
                self.velocity = [0.0; 3];
                self.drift = None;
                Ok(Value::Unit)
            }
            _ => Err(EvalError::UnknownMethod {
                object: self.type_name().to_string(),
                method: name.to_string(),
            }),
        }
    }
}

/// Bodies, the forces acting on them, and render bookkeeping.
#[derive(Debug)]
pub struct DemoScene {
    bodies: IndexMap<String, Body>,
    gravity: [f64; 3],
    ground: f64,
    time: f64,
    steps: u64,
    frames: u64,
}

impl Default for DemoScene {
    fn default() -> Self {
        Self {
            bodies: IndexMap::new(),
            gravity: DEFAULT_GRAVITY,
            ground: 0.0,
            time: 0.0,
            steps: 0,
            frames: 0,
        }
    }
}

impl DemoScene {
    /// Add a body. Fails if the name is taken or reserved.
    pub fn spawn(&mut self, name: &str, position: [f64; 3]) -> Result<&Body, EvalError> {
        if name == WORLD || name.is_empty() || name.contains('.') {
            return Err(EvalError::InvalidArgument(format!(
                "'{name}' cannot be used as a body name"
            )));
        }
        if self.bodies.contains_key(name) {
            return Err(EvalError::InvalidArgument(format!(
                "a body named '{name}' already exists"
            )));
        }
        log::debug!("spawned body '{name}' at {position:?}");
        Ok(self
            .bodies
            .entry(name.to_string())
            .or_insert_with(|| Body::at(position)))
    }

    /// Bodies in spawn order.
    pub fn bodies(&self) -> impl Iterator<Item = (&str, &Body)> {
        self.bodies.iter().map(|(name, body)| (name.as_str(), body))
    }

    /// Resolve a shell object name.
    pub fn object(&self, name: &str) -> Result<&dyn Scriptable, EvalError> {
        if name == WORLD {
            return Ok(self);
        }
        self.bodies
            .get(name)
            .map(|body| body as &dyn Scriptable)
            .ok_or_else(|| EvalError::UnknownObject(name.to_string()))
    }

    /// Resolve a shell object name for mutation.
    pub fn object_mut(&mut self, name: &str) -> Result<&mut dyn Scriptable, EvalError> {
        if name == WORLD {
            return Ok(self);
        }
        self.bodies
            .get_mut(name)
            .map(|body| body as &mut dyn Scriptable)
            .ok_or_else(|| EvalError::UnknownObject(name.to_string()))
    }

    /// Simulated seconds since the scene was created or reset.
    pub fn time(&self) -> f64 {
        self.time
    }
}

impl Scene for DemoScene {
    fn step_physics(&mut self, dt: Duration) -> Result<(), EngineError> {
        let dt = dt.as_secs_f64();
        for (name, body) in &mut self.bodies {
            body.integrate(self.gravity, self.ground, dt);
            if !body.is_finite() {
                return Err(EngineError::Physics {
                    reason: format!("body '{name}' diverged at t={:.3}s", self.time),
                });
            }
        }
        self.time += dt;
        self.steps += 1;
        Ok(())
    }

    fn step_agents(&mut self) -> Result<(), EngineError> {
        for (name, body) in &mut self.bodies {
            let Some(thrust) = body.drift else { continue };
            if thrust.iter().any(|c| !c.is_finite()) {
                return Err(EngineError::Agent {
                    name: name.clone(),
                    reason: "drifter thrust is not finite".into(),
                });
            }
            for axis in 0..3 {
                body.velocity[axis] += thrust[axis] / body.mass;
            }
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), EngineError> {
        self.frames += 1;
        if log::log_enabled!(log::Level::Trace) && self.frames % 600 == 0 {
            log::trace!(
                "frame {}: {} bodies at t={:.2}s",
                self.frames,
                self.bodies.len(),
                self.time
            );
        }
        Ok(())
    }
}

impl Scriptable for DemoScene {
    fn type_name(&self) -> &str {
        WORLD
    }

    fn fields(&self) -> &[&'static str] {
        &["gravity", "ground", "time", "steps", "frames", "bodies"]
    }

    fn get_field(&self, name: &str) -> Result<Value, EvalError> {
        match name {
            "gravity" => Ok(Value::Vector(self.gravity)),
            "ground" => Ok(Value::Number(self.ground)),
            "time" => Ok(Value::Number(self.time)),
            "steps" => Ok(Value::Number(self.steps as f64)),
            "frames" => Ok(Value::Number(self.frames as f64)),
            "bodies" => Ok(Value::Number(self.bodies.len() as f64)),
            _ => Err(self.unknown_field(name)),
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        match name {
            "gravity" => self.gravity = value.as_vector()?,
            "ground" => self.ground = value.as_number()?,
            "time" | "steps" | "frames" | "bodies" => {
                return Err(EvalError::ReadOnly {
                    field: name.to_string(),
                })
            }
            _ => return Err(self.unknown_field(name)),
        }
        Ok(())
    }

    fn methods(&self) -> &[&'static str] {
        &["remove", "clear", "reset"]
    }

    fn call_method(&mut self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        match name {
            "remove" => {
                let body = match args {
                    [Value::Text(body)] => body,
                    _ => {
                        return Err(EvalError::InvalidArgument(
                            "usage: call world.remove <body>".into(),
                        ))
                    }
                };
                self.bodies
                    .shift_remove(body.as_str())
                    .map(|_| Value::Unit)
                    .ok_or_else(|| EvalError::UnknownObject(body.clone()))
            }
            "clear" => {
                let removed = self.bodies.len();
                self.bodies.clear();
                Ok(Value::Number(removed as f64))
            }
            "reset" => {
                let frames = self.frames;
                *self = Self {
                    frames,
                    ..Self::default()
                };
                Ok(Value::Unit)
            }
            _ => Err(EvalError::UnknownMethod {
                object: self.type_name().to_string(),
                method: name.to_string(),
            }),
        }
    }
}

/// Accept either one vector argument or three numbers.
fn vector_arg(args: &[Value]) -> Result<[f64; 3], EvalError> {
    match args {
        [v] => v.as_vector(),
        [x, y, z] => Ok([x.as_number()?, y.as_number()?, z.as_number()?]),
        _ => Err(EvalError::InvalidArgument(format!(
            "expected a vector, got {} arguments",
            args.len()
        ))),
    }
}
