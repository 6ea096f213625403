//! `modcommit generate`

use super::{load_contract, load_module_map, project_root, read_input, render_output};
use crate::artifacts::{ArtifactSink, DirSink, NoopSink};
use crate::models::{DiffContext, ModcommitConfig, WorkflowConfig};
use crate::orchestrator::{CliAgentClient, GenerationStatus, Pipeline, PipelineOptions};
use crate::ui;
use crate::Result;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Unified diff to describe (`-` for stdin)
    #[arg(long, value_name = "FILE", conflicts_with = "staged")]
    pub diff: Option<PathBuf>,

    /// Describe the staged changes (`git diff --cached`); the default
    #[arg(long)]
    pub staged: bool,

    /// YAML map of file path to owning modules
    #[arg(long, value_name = "FILE")]
    pub modules: Option<PathBuf>,

    /// Repair attempts after the first validation
    #[arg(long)]
    pub repair_iterations: Option<u32>,

    /// Per-agent timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write prompts, replies and drafts under this directory
    #[arg(long, value_name = "DIR")]
    pub debug_dir: Option<PathBuf>,

    /// Project root (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,
}

/// Run the pipeline and print the output contract; returns the exit status
pub async fn run(args: GenerateArgs) -> Result<i32> {
    let root = project_root(args.project_root.clone())?;
    let config = ModcommitConfig::load(&root)?;
    let contract = load_contract(&root, &config)?;

    let diff = match &args.diff {
        Some(path) => read_input(path)?,
        None => staged_diff(&root).await?,
    };
    if diff.trim().is_empty() {
        anyhow::bail!("No changes to describe. Stage files or pass --diff.");
    }

    let module_map = load_module_map(&root, args.modules.as_deref())?;
    let ctx = DiffContext::from_diff(diff, &module_map);
    if ctx.affected_modules.is_empty() {
        ui::warn("No staged file maps to a module; the title scope is not checked");
    }
    tracing::info!(
        files = ctx.staged_files.len(),
        modules = ?ctx.affected_modules,
        "diff context built"
    );

    let sink: Arc<dyn ArtifactSink> = match debug_dir(&root, &args, &config) {
        Some(dir) => {
            let sink = DirSink::create(&dir)?;
            ui::info(&format!("Debug artifacts: {}", sink.run_dir().display()));
            Arc::new(sink)
        }
        None => Arc::new(NoopSink),
    };

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling");
                cancel.cancel();
            }
        })
    };

    let client = Arc::new(CliAgentClient::new(&config)?);
    let pipeline = Pipeline::new(client, contract, pipeline_options(&args, &config.workflow))?
        .with_sink(sink)
        .with_cancellation(cancel);

    let spinner = ui::spinner(format!(
        "Generating commit message for {} module(s)...",
        ctx.affected_modules.len().max(1)
    ));
    let outcome = pipeline.run(&ctx).await;
    spinner.finish_and_clear();
    ctrl_c.abort();

    let outcome = outcome?;
    print!("{}", render_output(&outcome.message, &outcome.result));

    match outcome.status {
        GenerationStatus::Accepted if outcome.result.has_issues() => ui::warn(&format!(
            "Accepted with {} warning(s)",
            outcome.result.warnings().len()
        )),
        GenerationStatus::Accepted => ui::success("Commit message accepted"),
        GenerationStatus::Exhausted => ui::error(&format!(
            "{} error(s) remain after {} repair attempt(s)",
            outcome.result.blocking().len(),
            outcome.attempts
        )),
    }

    Ok(outcome.exit_code())
}

/// Workflow config with command-line overrides applied
fn pipeline_options(args: &GenerateArgs, workflow: &WorkflowConfig) -> PipelineOptions {
    let mut options = PipelineOptions::from_config(workflow);
    if let Some(n) = args.repair_iterations {
        options.repair_iterations = n;
    }
    if let Some(secs) = args.timeout {
        options.agent_timeout = Duration::from_secs(secs);
    }
    options
}

fn debug_dir(root: &Path, args: &GenerateArgs, config: &ModcommitConfig) -> Option<PathBuf> {
    match &args.debug_dir {
        Some(dir) => Some(root.join(dir)),
        None if config.debug.enabled => Some(root.join(&config.debug.dir)),
        None => None,
    }
}

/// `git diff --cached` in `root`
async fn staged_diff(root: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["diff", "--cached", "--no-color", "--no-ext-diff"])
        .current_dir(root)
        .output()
        .await
        .context("Failed to run git. Please ensure it is installed and in your PATH.")?;

    if !output.status.success() {
        anyhow::bail!(
            "git diff --cached failed: {}",
            String::from_utf8_lossy(&output.stderr).trim_end()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_workflow_config() {
        let args = GenerateArgs {
            repair_iterations: Some(3),
            timeout: Some(20),
            ..Default::default()
        };
        let options = pipeline_options(&args, &WorkflowConfig::default());
        assert_eq!(options.repair_iterations, 3);
        assert_eq!(options.agent_timeout, Duration::from_secs(20));
        assert_eq!(options.max_concurrency, 4);
    }

    #[test]
    fn test_debug_dir_from_flag_or_config() {
        let root = Path::new("/repo");
        let mut config = ModcommitConfig::default();
        assert_eq!(debug_dir(root, &GenerateArgs::default(), &config), None);

        config.debug.enabled = true;
        assert_eq!(
            debug_dir(root, &GenerateArgs::default(), &config),
            Some(PathBuf::from("/repo/.modcommit/debug"))
        );

        let args = GenerateArgs {
            debug_dir: Some(PathBuf::from("/tmp/dump")),
            ..Default::default()
        };
        assert_eq!(debug_dir(root, &args, &config), Some(PathBuf::from("/tmp/dump")));
    }

    #[tokio::test]
    async fn test_staged_diff_outside_repository_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(staged_diff(dir.path()).await.is_err());
    }
}
