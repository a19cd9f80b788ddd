//! Command handlers.
//!
//! The executing commands funnel into the same confirm-and-execute path:
//! classify the plan, show a preview, apply the confirmation gate, then
//! either execute the plan or persist the rejection. `replay` only renders
//! what a previous run stored. Exit status is derived from the final
//! [`RunStatus`] by the caller.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use log::info;
use manus_core::{
    risk,
    validate::validate_plan,
    Acknowledgment, AgentError, ConfirmationGate, ConfirmationPrompt, ExecuteOptions, Executor,
    ExecutorBuilder, FileTool, GateDecision, MockPlanner, Plan, PlanPreview, RiskLevel, RunReport,
    RunStatus, RunStore, Settings, ShellTool, ToolRegistry, TraceView,
};

use crate::args::{ExecuteArgs, ReplayArgs, RunArgs};
use crate::renderer::TerminalRenderer;

/// Phrase a user must type to confirm a HIGH risk plan.
pub const HIGH_RISK_PHRASE: &str = "i understand the risk";

/// CLI command handlers bound to a workspace.
pub struct Cli {
    executor: Executor,
    registry: ToolRegistry,
    renderer: TerminalRenderer,
}

impl Cli {
    /// Create handlers for the given settings.
    pub fn new(settings: Settings, renderer: TerminalRenderer) -> Result<Self> {
        let workspace = settings
            .workspace_root
            .canonicalize()
            .with_context(|| {
                format!(
                    "workspace root '{}' does not exist",
                    settings.workspace_root.display()
                )
            })?;

        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FileTool::new(&workspace)))?;
        registry.register(Box::new(
            ShellTool::new(&workspace)
                .with_allowlist(settings.shell_allowlist.clone())
                .with_default_timeout(settings.shell_timeout_secs),
        ))?;

        let executor = ExecutorBuilder::new(&workspace)
            .with_runs_dir(settings.runs_dir.as_deref())
            .build()?;

        Ok(Self {
            executor,
            registry,
            renderer,
        })
    }

    /// Plan a task and execute it.
    pub async fn handle_execute(&self, args: ExecuteArgs) -> Result<RunStatus> {
        if !args.mock {
            return Err(AgentError::config(
                "no planner backend is configured; pass --mock to use the deterministic planner",
            )
            .into());
        }

        let planner = MockPlanner::new();
        let plan = manus_core::planner::generate_plan(
            &planner,
            &args.task,
            self.executor.workspace_root(),
            &self.registry,
        )
        .await?;

        self.confirm_and_execute(plan, args.yes, args.dry_run).await
    }

    /// Execute a plan loaded from a plan.json file.
    pub async fn handle_run(&self, args: RunArgs) -> Result<RunStatus> {
        let plan = RunStore::load_plan(&args.plan_file)
            .with_context(|| format!("failed to load plan '{}'", args.plan_file.display()))?;
        self.confirm_and_execute(plan, args.yes, args.dry_run).await
    }

    /// Display the plan, result and trace stored in a run directory.
    ///
    /// Nothing executes and no new run directory is allocated; re-running a
    /// stored plan goes through `run <plan.json>` instead. The exit status
    /// reflects the stored outcome.
    pub fn handle_replay(&self, args: ReplayArgs) -> Result<RunStatus> {
        let (plan, result) = RunStore::load_run(&args.run_dir)
            .with_context(|| format!("failed to load run '{}'", args.run_dir.display()))?;
        info!("showing run {} (status: {})", result.run_id, result.status);

        self.renderer.render(&plan.to_string())?;
        self.renderer.render(&RunReport(&result).to_string())?;
        self.renderer.render(&TraceView(&result.traces).to_string())?;

        Ok(result.status)
    }

    /// Shared path: classify, preview, gate, then execute or persist the
    /// rejection. A new run directory is created either way.
    async fn confirm_and_execute(
        &self,
        mut plan: Plan,
        yes: bool,
        dry_run: bool,
    ) -> Result<RunStatus> {
        // Saved plans may come from another workspace; execution is always
        // confined to the current one, and risk is always re-derived.
        plan.workspace_root = self.executor.workspace_root().to_path_buf();
        plan.risk_level = risk::classify(&plan);
        validate_plan(&plan, &self.registry)?;

        self.renderer.render(&PlanPreview(&plan).to_string())?;

        let gate = ConfirmationGate::new(yes);
        let mut prompt = StdinPrompt;
        let decision = gate.decide(&plan, Some(&mut prompt))?;

        let result = match decision {
            GateDecision::Confirmed => {
                let options = ExecuteOptions {
                    dry_run,
                    cancel: None,
                };
                self.executor.execute(&plan, &self.registry, &options).await?
            }
            GateDecision::Rejected { reason } => self.executor.execute_rejected(&plan, &reason)?,
        };

        self.renderer.render(&RunReport(&result).to_string())?;
        if !result.traces.is_empty() {
            self.renderer.render(&TraceView(&result.traces).to_string())?;
        }

        Ok(result.status)
    }
}

/// Interactive confirmation over stdin.
///
/// The read blocks until a full line or EOF; no timeout is applied to the
/// prompt itself. With stdin closed (piped or unattended use) the read
/// yields an empty answer immediately, which declines; the gate then
/// rejects anything the auto-approve flag cannot clear, so decline-on-EOF
/// is the unattended exit path.
struct StdinPrompt;

impl ConfirmationPrompt for StdinPrompt {
    fn request(&mut self, plan: &Plan) -> manus_core::Result<Option<Acknowledgment>> {
        match plan.risk_level {
            RiskLevel::High => {
                eprint!("This plan is HIGH risk. Type '{HIGH_RISK_PHRASE}' to proceed: ");
            }
            _ => eprint!("Proceed? [y/N] "),
        }
        io::stderr()
            .flush()
            .map_err(|e| AgentError::config(format!("cannot write to stderr: {e}")))?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| AgentError::config(format!("cannot read confirmation: {e}")))?;

        let answer = line.trim().to_lowercase();
        if answer == HIGH_RISK_PHRASE {
            Ok(Some(Acknowledgment::RiskUnderstood))
        } else if matches!(answer.as_str(), "y" | "yes") {
            Ok(Some(Acknowledgment::Plain))
        } else {
            Ok(None)
        }
    }
}
