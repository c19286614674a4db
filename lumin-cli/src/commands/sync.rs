//! Project board sync

use std::process::ExitCode;

use clap::Args;
use lumin_github::{issues_to_sync, sync_issues, ProjectBoard};

use super::{finish, Context};

/// Add open issues that are on no board to the project
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Lowest issue number to consider (overrides config)
    #[arg(long)]
    pub since_issue: Option<u64>,

    /// Seconds to wait between issues
    #[arg(long)]
    pub delay: Option<f64>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl SyncArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let client = ctx.client()?;
        let since = self.since_issue.unwrap_or(ctx.config.automation.since_issue);

        // A missing board is fatal here; there is nothing to sync to.
        let board = ProjectBoard::resolve(&client, &ctx.config.github.project).await?;
        let candidates = issues_to_sync(&client, since).await?;

        if candidates.is_empty() {
            println!("All open issues from #{} onward are already on a board.", since);
            return Ok(ExitCode::SUCCESS);
        }

        println!("Issues to add to '{}':", board.title);
        for issue in &candidates {
            println!("  #{} {}", issue.number, issue.title);
        }
        if !ctx.confirm(&format!("Add {} issues?", candidates.len()), self.yes)? {
            println!("Aborted.");
            return Ok(ExitCode::SUCCESS);
        }

        let report =
            sync_issues(&client, &board, &candidates, ctx.dry_run, ctx.delay(self.delay)).await;
        Ok(finish("Sync", &report, ctx.dry_run))
    }
}
