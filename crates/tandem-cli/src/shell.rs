//! The shell language.
//!
//! One command per line, words separated by whitespace. Objects are
//! addressed by name (`world`, or a body name) and their members with a
//! dot: `get ball.position`, `call ball.impulse 0 0 5`.

use std::fmt::Write as _;

use tandem::prelude::{Coordinator, EvalError, Interpreter, Scriptable, Value};

use crate::scene::{DemoScene, WORLD};

const HELP: &str = "\
commands:
  help                      this text
  status                    worker and simulation state, frame counters
  list                      every object and its type
  describe <obj>            fields and methods of an object
  get <obj>.<field>         read a field
  set <obj>.<field> <value> assign a field (a value, or three numbers)
  call <obj>.<method> [args...]
  spawn <name> <x> <y> <z>  add a body
  pause | resume            freeze or unfreeze the simulation
  quit | exit               stop everything
  # ...                     comment";

/// Evaluates shell lines against a [`DemoScene`].
#[derive(Debug, Default)]
pub struct ShellInterpreter;

impl Interpreter<DemoScene> for ShellInterpreter {
    fn init(&mut self, coordinator: &Coordinator<DemoScene>) -> Result<(), EvalError> {
        log::info!(
            "shell ready, {} bodies in the scene",
            coordinator.lock_scene().bodies().count()
        );
        Ok(())
    }

    fn evaluate(
        &mut self,
        line: &str,
        coordinator: &Coordinator<DemoScene>,
    ) -> Result<Option<String>, EvalError> {
        if line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        match command {
            "help" => Ok(Some(HELP.to_string())),
            "status" => Ok(Some(status(coordinator))),
            "list" => Ok(Some(list(&coordinator.lock_scene()))),
            "describe" => {
                let [name] = args[..] else {
                    return Err(usage("describe <obj>"));
                };
                let scene = coordinator.lock_scene();
                Ok(Some(describe(scene.object(name)?)))
            }
            "get" => {
                let [target] = args[..] else {
                    return Err(usage("get <obj>.<field>"));
                };
                let (object, field) = split_member(target)?;
                let scene = coordinator.lock_scene();
                Ok(Some(scene.object(object)?.get_field(field)?.to_string()))
            }
            "set" => {
                let Some((target, value)) = args.split_first() else {
                    return Err(usage("set <obj>.<field> <value>"));
                };
                let (object, field) = split_member(target)?;
                let value = parse_value(value)?;
                coordinator
                    .lock_scene()
                    .object_mut(object)?
                    .set_field(field, value)?;
                Ok(None)
            }
            "call" => {
                let Some((target, rest)) = args.split_first() else {
                    return Err(usage("call <obj>.<method> [args...]"));
                };
                let (object, method) = split_member(target)?;
                let call_args: Vec<Value> = rest.iter().map(|a| parse_token(a)).collect();
                let result = coordinator
                    .lock_scene()
                    .object_mut(object)?
                    .call_method(method, &call_args)?;
                Ok((result != Value::Unit).then(|| result.to_string()))
            }
            "spawn" => {
                let [name, x, y, z] = args[..] else {
                    return Err(usage("spawn <name> <x> <y> <z>"));
                };
                let position = [number(x)?, number(y)?, number(z)?];
                coordinator.lock_scene().spawn(name, position)?;
                Ok(None)
            }
            "pause" => {
                coordinator.pause(false)?;
                Ok(Some("simulation paused".into()))
            }
            "resume" => {
                coordinator.resume()?;
                Ok(Some("simulation running".into()))
            }
            "quit" | "exit" => {
                coordinator.quit()?;
                Ok(None)
            }
            other => Err(EvalError::UnknownCommand(other.to_string())),
        }
    }
}

fn status(coordinator: &Coordinator<DemoScene>) -> String {
    let metrics = coordinator.metrics();
    let scene = coordinator.lock_scene();
    format!(
        "worker: {}\nsimulation: {}\nframes: {} ({} simulated, {} over budget)\n\
         last frame: {} us\ntime: {:.3} s\nbodies: {}",
        coordinator.run_state().state(),
        coordinator.simulation_state().state(),
        metrics.frames,
        metrics.simulation_steps,
        metrics.overruns,
        metrics.last_frame_us,
        scene.time(),
        scene.bodies().count(),
    )
}

fn list(scene: &DemoScene) -> String {
    let mut out = format!("{WORLD} ({})", scene.type_name());
    for (name, body) in scene.bodies() {
        let _ = write!(
            out,
            "\n{name} ({}) at {}",
            body.type_name(),
            Value::Vector(body.position)
        );
    }
    out
}

fn describe(object: &dyn Scriptable) -> String {
    let mut out = object.type_name().to_string();
    for field in object.fields() {
        let value = object
            .get_field(field)
            .map_or_else(|e| format!("<{e}>"), |v| v.to_string());
        let _ = write!(out, "\n  {field} = {value}");
    }
    if !object.methods().is_empty() {
        let _ = write!(out, "\n  methods: {}", object.methods().join(", "));
    }
    out
}

fn usage(form: &str) -> EvalError {
    EvalError::InvalidArgument(format!("usage: {form}"))
}

fn split_member(target: &str) -> Result<(&str, &str), EvalError> {
    target
        .split_once('.')
        .filter(|(object, member)| !object.is_empty() && !member.is_empty())
        .ok_or_else(|| {
            EvalError::InvalidArgument(format!("expected <obj>.<member>, got '{target}'"))
        })
}

fn number(token: &str) -> Result<f64, EvalError> {
    parse_token(token).as_number()
}

/// One token, with `none` (or `()`) for the unit value.
fn parse_token(token: &str) -> Value {
    match token {
        "none" | "()" => Value::Unit,
        _ => Value::parse(token),
    }
}

/// A field value: one token, or three numbers forming a vector.
fn parse_value(tokens: &[&str]) -> Result<Value, EvalError> {
    match tokens {
        [token] => Ok(parse_token(token)),
        [x, y, z] => Ok(Value::Vector([number(x)?, number(y)?, number(z)?])),
        _ => Err(EvalError::InvalidArgument(format!(
            "expected one value or three numbers, got {} tokens",
            tokens.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem::prelude::{CoordinatorConfig, SimulationState, StateError};

    fn coordinator() -> Coordinator<DemoScene> {
        Coordinator::new(DemoScene::default(), CoordinatorConfig::default()).unwrap()
    }

    fn eval(coordinator: &Coordinator<DemoScene>, line: &str) -> Result<Option<String>, EvalError> {
        ShellInterpreter.evaluate(line, coordinator)
    }

    #[test]
    fn spawn_get_and_set() {
        let c = coordinator();
        assert_eq!(eval(&c, "spawn ball 1 2 3"), Ok(None));
        assert_eq!(
            eval(&c, "get ball.position"),
            Ok(Some("(1, 2, 3)".into()))
        );
        assert_eq!(eval(&c, "set ball.velocity 0 0 -1"), Ok(None));
        assert_eq!(eval(&c, "set ball.mass 4"), Ok(None));
        assert_eq!(eval(&c, "get ball.mass"), Ok(Some("4".into())));
        assert_eq!(
            eval(&c, "call ball.impulse 0 0 8"),
            Ok(Some("(0, 0, 1)".into()))
        );
    }

    #[test]
    fn errors_name_the_problem() {
        let c = coordinator();
        assert_eq!(
            eval(&c, "get ghost.position"),
            Err(EvalError::UnknownObject("ghost".into()))
        );
        assert_eq!(
            eval(&c, "get world.colour"),
            Err(EvalError::UnknownField {
                object: "world".into(),
                field: "colour".into()
            })
        );
        assert_eq!(
            eval(&c, "set world.frames 3"),
            Err(EvalError::ReadOnly {
                field: "frames".into()
            })
        );
        assert!(matches!(eval(&c, "get world"), Err(EvalError::InvalidArgument(_))));
        assert!(matches!(eval(&c, "spawn a 1 2"), Err(EvalError::InvalidArgument(_))));
        assert!(matches!(
            eval(&c, "spawn a 1 two 3"),
            Err(EvalError::InvalidArgument(_))
        ));
        assert_eq!(
            eval(&c, "teleport"),
            Err(EvalError::UnknownCommand("teleport".into()))
        );
    }

    #[test]
    fn comments_and_blank_words_do_nothing() {
        let c = coordinator();
        assert_eq!(eval(&c, "# spawn ball 0 0 0"), Ok(None));
        assert_eq!(eval(&c, "   "), Ok(None));
        assert_eq!(c.lock_scene().bodies().count(), 0);
    }

    #[test]
    fn list_and_describe() {
        let c = coordinator();
        eval(&c, "spawn b 0 0 1").unwrap();
        eval(&c, "spawn a 0 0 2").unwrap();
        let listing = eval(&c, "list").unwrap().unwrap();
        assert_eq!(listing, "world (world)\nb (body) at (0, 0, 1)\na (body) at (0, 0, 2)");

        let description = eval(&c, "describe a").unwrap().unwrap();
        assert!(description.starts_with("body"));
        assert!(description.contains("position = (0, 0, 2)"));
        assert!(description.contains("drift = ()"));
        assert!(description.contains("methods: impulse, stop"));
    }

    #[test]
    fn drift_can_be_attached_and_cleared() {
        let c = coordinator();
        eval(&c, "spawn d 0 0 0").unwrap();
        eval(&c, "set d.drift 1 0 0").unwrap();
        assert_eq!(eval(&c, "get d.drift"), Ok(Some("(1, 0, 0)".into())));
        eval(&c, "set d.drift none").unwrap();
        assert_eq!(eval(&c, "get d.drift"), Ok(Some("()".into())));
    }

    #[test]
    fn simulation_pause_and_resume() {
        let c = coordinator();
        assert_eq!(
            eval(&c, "resume"),
            Ok(Some("simulation running".into()))
        );
        assert_eq!(c.simulation_state().state(), SimulationState::Running);
        eval(&c, "pause").unwrap();
        // Nobody is stepping, so the request stays pending.
        assert_eq!(c.simulation_state().state(), SimulationState::Pausing);
        assert_eq!(
            eval(&c, "resume"),
            Err(EvalError::State(StateError::Simulation {
                operation: "resume",
                state: SimulationState::Pausing
            }))
        );
    }

    #[test]
    fn status_reports_states() {
        let c = coordinator();
        let status = eval(&c, "status").unwrap().unwrap();
        assert!(status.contains("worker: stopped"));
        assert!(status.contains("simulation: paused"));
        assert!(status.contains("bodies: 0"));
    }

    #[test]
    fn world_methods() {
        let c = coordinator();
        eval(&c, "spawn a 0 0 0").unwrap();
        eval(&c, "spawn b 0 0 0").unwrap();
        assert_eq!(eval(&c, "call world.remove a"), Ok(None));
        assert_eq!(eval(&c, "call world.clear"), Ok(Some("1".into())));
        assert!(matches!(
            eval(&c, "call world.remove 3"),
            Err(EvalError::InvalidArgument(_))
        ));
    }
}
