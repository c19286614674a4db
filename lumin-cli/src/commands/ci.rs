//! CI orchestration
//!
//! The setup, label and sync checks run this binary again as subprocesses so
//! each is bounded by its own timeout. The board item count is checked in
//! process.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Args;
use lumin_core::{run_subprocess_check, CiCheck, CiReport};
use lumin_github::project_item_count;
use tokio::process::Command;
use tracing::{error, info};

use super::{exit_code, Context};

const SETUP_TIMEOUT: Duration = Duration::from_secs(300);
const LABELS_TIMEOUT: Duration = Duration::from_secs(120);
const SYNC_TIMEOUT: Duration = Duration::from_secs(300);
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

const STATUS_CONTEXT: &str = "ci/lumin-automation";

/// Run the CI checks and report
#[derive(Args, Debug)]
pub struct CiArgs {
    /// Write the JSON report to this file instead of stdout
    #[arg(long)]
    pub report_file: Option<PathBuf>,

    /// Post a commit status for this SHA through `gh api`
    #[arg(long, value_name = "SHA")]
    pub github_status: Option<String>,
}

impl CiArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let token = ctx.token()?;
        let exe = std::env::current_exe()?;
        let start = Instant::now();
        info!(repository = %ctx.config.repository(), "Starting CI checks");

        let subcommand = |args: &[&str]| -> Command {
            let github = &ctx.config.github;
            let mut command = Command::new(&exe);
            command
                .args(args)
                .args(["--owner", github.owner.as_str(), "--repo", github.repo.as_str()])
                .args(["--project", github.project.as_str(), "--log-level", "warning"])
                .env("GITHUB_TOKEN", &token);
            command
        };

        let mut checks = vec![
            run_subprocess_check(
                "Project Setup Validation",
                subcommand(&["validate-setup"]),
                SETUP_TIMEOUT,
                true,
            )
            .await,
            run_subprocess_check(
                "Label Validation",
                subcommand(&["labels", "validate"]),
                LABELS_TIMEOUT,
                true,
            )
            .await,
            run_subprocess_check(
                "Project Sync Dry Run",
                subcommand(&["sync", "--dry-run"]),
                SYNC_TIMEOUT,
                true,
            )
            .await,
        ];
        checks.push(self.issue_sync_check(ctx).await);

        let report = CiReport::new(
            ctx.config.repository(),
            ctx.config.github.project.clone(),
            checks,
            start.elapsed(),
        );
        report.log_summary();

        match &self.report_file {
            Some(path) => report.write_to(path)?,
            None => println!("{}", serde_json::to_string_pretty(&report)?),
        }

        if let Some(sha) = &self.github_status {
            post_commit_status(ctx, sha, report.passed()).await;
        }

        Ok(exit_code(report.passed()))
    }

    async fn issue_sync_check(&self, ctx: &Context) -> CiCheck {
        const NAME: &str = "Issue Sync Check";
        let start = Instant::now();
        let project = &ctx.config.github.project;

        let count = match ctx.client() {
            Ok(client) => project_item_count(&client, project).await.map_err(anyhow::Error::from),
            Err(e) => Err(e),
        };
        match count {
            Ok(0) => CiCheck::fail(NAME, "No items synced to project", start.elapsed()),
            Ok(n) => CiCheck::pass(NAME, format!("Project has {} items synced", n), start.elapsed()),
            Err(e) => CiCheck::fail(NAME, format!("Issue sync check error: {}", e), start.elapsed()),
        }
    }
}

fn status_command(ctx: &Context, sha: &str, passed: bool) -> Command {
    let (state, description) = if passed {
        ("success", "All CI checks passed")
    } else {
        ("failure", "Some critical CI checks failed")
    };

    let mut command = Command::new("gh");
    command.args([
        "api".to_string(),
        "--method".to_string(),
        "POST".to_string(),
        format!("/repos/{}/statuses/{}", ctx.config.repository(), sha),
        "-f".to_string(),
        format!("state={}", state),
        "-f".to_string(),
        format!("description={}", description),
        "-f".to_string(),
        format!("context={}", STATUS_CONTEXT),
    ]);
    command
}

async fn post_commit_status(ctx: &Context, sha: &str, passed: bool) {
    let check = run_subprocess_check(
        "GitHub Status",
        status_command(ctx, sha, passed),
        STATUS_TIMEOUT,
        false,
    )
    .await;

    if check.passed {
        info!(sha, "Created commit status");
    } else {
        error!(sha, "Failed to create commit status: {}", check.message);
    }
}
