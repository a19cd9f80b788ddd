//! Manus CLI application.
//!
//! Command-line interface for the Manus local task automation agent.

mod args;
mod cli;
mod renderer;

use std::process::ExitCode;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use manus_core::Settings;
use renderer::TerminalRenderer;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();

    let Args {
        workspace,
        runs_dir,
        no_color,
        command,
    } = Args::parse();

    let settings = Settings::load()
        .context("Failed to load settings")?
        .with_workspace_root(workspace)
        .with_runs_dir(runs_dir);

    let renderer = TerminalRenderer::new(!no_color);
    let cli = Cli::new(settings, renderer).context("Failed to initialize agent")?;

    info!("Manus started");

    let status = match command {
        Commands::Execute(args) => cli.handle_execute(args).await?,
        Commands::Run(args) => cli.handle_run(args).await?,
        Commands::Replay(args) => cli.handle_replay(args)?,
    };

    // Success and dry-run exit 0; failed and rejected runs exit nonzero so
    // scripts can branch on the outcome.
    Ok(if status.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
