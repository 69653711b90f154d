//! `tandem`: an interactive shell over a live demo simulation.
//!
//! The simulation runs on the main thread; the shell reads init scripts
//! and then stdin on its own thread, halting the simulation around every
//! command.

mod scene;
mod script;
mod shell;

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use tandem::prelude::{Coordinator, CoordinatorConfig, ReaderSource, ScriptedSource};

use crate::scene::DemoScene;
use crate::shell::ShellInterpreter;

#[derive(Parser)]
#[command(
    name = "tandem",
    about = "Run a simulation with an interactive command shell alongside it",
    version
)]
struct Cli {
    /// Init scripts, run in order before reading stdin
    scripts: Vec<PathBuf>,

    /// Directory that relative script paths are resolved against
    #[arg(short = 'd', long, default_value = ".")]
    base_dir: PathBuf,

    /// Worker frame rate in Hz
    #[arg(long, default_value_t = 60.0)]
    frame_rate: f64,

    /// Start with the simulation running instead of frozen
    #[arg(long)]
    run: bool,

    /// Prompt printed before each line is read
    #[arg(long, default_value = "tandem> ")]
    prompt: String,

    /// Do not print a prompt
    #[arg(long, conflicts_with = "prompt")]
    no_prompt: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    Builder::from_env(Env::default().default_filter_or("warn")).init();

    let script = script::load(&cli.base_dir, &cli.scripts)?;
    let config = CoordinatorConfig {
        frame_rate_hz: cli.frame_rate,
        start_simulation: cli.run,
        prompt: (!cli.no_prompt).then_some(cli.prompt),
        ..Default::default()
    };
    let coordinator = Arc::new(
        Coordinator::new(DemoScene::default(), config).context("invalid configuration")?,
    );

    let input = ScriptedSource::new(script).followed_by(ReaderSource::new(BufReader::new(io::stdin())));
    let report = coordinator
        .run(ShellInterpreter, input, Box::new(io::stdout()))
        .context("simulation terminated")?;

    log::info!(
        "{} frames, {} commands ({} failed) in {:.1?}",
        report.metrics.frames,
        report.shell.evaluated,
        report.shell.failed,
        report.elapsed
    );
    Ok(())
}
