//! CLI command implementations

pub mod ci;
pub mod cleanup;
pub mod config;
pub mod docs;
pub mod epics;
pub mod issues;
pub mod labels;
pub mod milestones;
pub mod setup;
pub mod sync;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use lumin_core::{Config, Secrets};
use lumin_github::{BatchReport, GitHubApi, GitHubClient, ProjectBoard};
use tracing::warn;

pub use ci::CiArgs;
pub use cleanup::{MarkDeletedArgs, PruneArgs};
pub use docs::LinkDocsArgs;
pub use epics::EpicsArgs;
pub use issues::IssuesArgs;
pub use labels::LabelsArgs;
pub use milestones::MilestonesArgs;
pub use setup::SetupArgs;
pub use sync::SyncArgs;

/// Settings shared by every command
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    token: Option<String>,
    pub dry_run: bool,
}

impl Context {
    pub fn new(config: Config, token: Option<String>, dry_run: bool) -> Self {
        Self {
            config,
            token,
            dry_run,
        }
    }

    /// Token from `--token`, `GITHUB_TOKEN` or the secrets file
    pub fn token(&self) -> anyhow::Result<String> {
        let secrets = Secrets::load()?;
        secrets.resolve_token(self.token.as_deref()).ok_or_else(|| {
            anyhow::anyhow!(
                "GitHub token required. Pass --token, set GITHUB_TOKEN, or add it to {}",
                Secrets::default_secrets_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "secrets.toml".to_string())
            )
        })
    }

    pub fn client(&self) -> anyhow::Result<GitHubClient> {
        let token = self.token()?;
        Ok(GitHubClient::new(
            &token,
            self.config.github.owner.clone(),
            self.config.github.repo.clone(),
        )?)
    }

    /// `--delay` in seconds, else the configured delay
    pub fn delay(&self, seconds: Option<f64>) -> Duration {
        seconds
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(self.config.automation.delay)
    }

    /// Skip confirmation for dry runs and when `--yes` was given
    pub fn confirm(&self, message: &str, yes: bool) -> anyhow::Result<bool> {
        if yes || self.dry_run {
            return Ok(true);
        }
        let stdin = io::stdin();
        ask(message, &mut stdin.lock(), &mut io::stdout())
    }
}

fn ask(message: &str, input: &mut impl BufRead, output: &mut impl Write) -> anyhow::Result<bool> {
    write!(output, "{} Continue? (y/N) ", message)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Board with its Backlog option, or `None` with a warning
pub async fn resolve_board(api: &dyn GitHubApi, title: &str) -> Option<ProjectBoard> {
    match ProjectBoard::resolve(api, title).await {
        Ok(board) => Some(board),
        Err(e) => {
            warn!(project = title, error = %e, "Project board unavailable; issues will not be added to it");
            None
        }
    }
}

/// Print the totals of a batch and map them to an exit code
pub fn finish(what: &str, report: &BatchReport, dry_run: bool) -> ExitCode {
    println!();
    if dry_run {
        println!("[DRY RUN] {}: {} would be written, {} skipped", what, report.planned, report.skipped);
    } else {
        println!("{}: {} written, {} skipped, {} failed", what, report.created, report.skipped, report.failed.len());
    }
    for failure in &report.failed {
        println!("  failed: {}", failure);
    }
    exit_code(report.is_success())
}

pub fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
