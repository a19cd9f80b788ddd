use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Main command-line interface for the Manus task automation agent
///
/// Manus turns a natural-language task into a structured plan, classifies the
/// plan's risk, asks for confirmation proportional to that risk, and executes
/// the plan step by step with sandboxed tools. Every run leaves an immutable
/// trace on disk that can be inspected and replayed.
#[derive(Parser)]
#[command(version, about, name = "manus")]
pub struct Args {
    /// Workspace root all file and shell operations are confined to.
    /// Defaults to $MANUS_WORKSPACE or the current directory
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Directory to store run artifacts. Defaults to <workspace>/runs
    #[arg(long, global = true)]
    pub runs_dir: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the Manus CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Plan and execute a natural-language task
    #[command(alias = "x")]
    Execute(ExecuteArgs),
    /// Execute a previously saved plan file
    Run(RunArgs),
    /// Display the plan, result and trace stored in a run directory
    Replay(ReplayArgs),
}

/// Plan and execute a natural-language task
#[derive(ClapArgs)]
pub struct ExecuteArgs {
    /// The task to plan and execute
    pub task: String,

    /// Auto-approve LOW risk plans. MEDIUM and HIGH risk plans still
    /// require interactive confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Plan, classify and confirm, but invoke no tools
    #[arg(long)]
    pub dry_run: bool,

    /// Use the deterministic mock planner backend
    #[arg(long)]
    pub mock: bool,
}

/// Execute a previously saved plan file
#[derive(ClapArgs)]
pub struct RunArgs {
    /// Path to a plan.json file
    pub plan_file: PathBuf,

    /// Auto-approve LOW risk plans
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Plan, classify and confirm, but invoke no tools
    #[arg(long)]
    pub dry_run: bool,
}

/// Display the plan, result and trace stored in a run directory
#[derive(ClapArgs)]
pub struct ReplayArgs {
    /// Path to a run directory containing plan.json
    pub run_dir: PathBuf,
}
