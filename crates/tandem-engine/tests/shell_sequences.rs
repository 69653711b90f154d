//! Property test: random command sequences through a full run.
//!
//! Every line is evaluated with the worker halted, so simulation pauses
//! complete immediately and only unknown commands can fail. Worker holds
//! and releases issued from inside commands must never wedge the run.

use proptest::prelude::*;
use std::sync::Arc;

use tandem_core::{EvalError, RunState, SimulationState};
use tandem_engine::{Coordinator, CoordinatorConfig, Interpreter, ScriptedSource};
use tandem_test_utils::CountingScene;

#[derive(Clone, Copy, Debug)]
enum Command {
    Pause,
    Resume,
    Hold,
    Release,
    Unknown,
}

impl Command {
    fn line(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Hold => "hold",
            Self::Release => "release",
            Self::Unknown => "frobnicate",
        }
    }
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => Just(Command::Pause),
        3 => Just(Command::Resume),
        1 => Just(Command::Hold),
        1 => Just(Command::Release),
        1 => Just(Command::Unknown),
    ]
}

struct Controller;

impl Interpreter<CountingScene> for Controller {
    fn evaluate(
        &mut self,
        line: &str,
        coordinator: &Coordinator<CountingScene>,
    ) -> Result<Option<String>, EvalError> {
        match line {
            "pause" => {
                coordinator.pause(false)?;
            }
            "resume" => coordinator.resume()?,
            "hold" => {
                coordinator.pause_worker(false)?;
            }
            "release" => coordinator.resume_worker()?,
            "quit" => coordinator.quit()?,
            other => return Err(EvalError::UnknownCommand(other.into())),
        }
        Ok(None)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn only_unknown_commands_fail(commands in prop::collection::vec(arb_command(), 0..24)) {
        let config = CoordinatorConfig {
            frame_rate_hz: 1000.0,
            ..Default::default()
        };
        let (scene, _probe) = CountingScene::new();
        let coordinator = Arc::new(Coordinator::new(scene, config).unwrap());

        let mut lines: Vec<&str> = commands.iter().map(|c| c.line()).collect();
        lines.push("quit");
        let report = coordinator
            .run(Controller, ScriptedSource::new(lines), Box::new(std::io::sink()))
            .unwrap();

        let unknown = commands.iter().filter(|c| matches!(c, Command::Unknown)).count();
        let expected = commands
            .iter()
            .rev()
            .find_map(|c| match c {
                Command::Pause => Some(SimulationState::Paused),
                Command::Resume => Some(SimulationState::Running),
                _ => None,
            })
            .unwrap_or(SimulationState::Paused);

        prop_assert_eq!(report.shell.evaluated, commands.len() as u64 + 1);
        prop_assert_eq!(report.shell.failed, unknown as u64);
        prop_assert_eq!(coordinator.simulation_state().state(), expected);
        prop_assert_eq!(coordinator.run_state().state(), RunState::Stopped);
    }
}
