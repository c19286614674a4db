//! Cleanup commands

use std::process::ExitCode;

use clap::Args;
use lumin_github::cleanup::{mark_closed_issues_deleted, prune_backlog};

use super::{finish, Context};

/// Issues dropped from the MVP scope
const DEFAULT_PRUNE_TITLES: &[&str] = &[
    "Export Functionality",
    "Geographic Visualizations",
    "Guided Tutorial",
    "Customizable Views",
    "Predictive Modeling",
];

/// Lock and retitle every closed issue as deleted
#[derive(Args, Debug)]
pub struct MarkDeletedArgs {
    /// Seconds to wait between issues
    #[arg(long)]
    pub delay: Option<f64>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl MarkDeletedArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let client = ctx.client()?;
        if !ctx.confirm(
            &format!("Mark every closed issue in {} as deleted?", ctx.config.repository()),
            self.yes,
        )? {
            println!("Aborted.");
            return Ok(ExitCode::SUCCESS);
        }

        let report = mark_closed_issues_deleted(&client, ctx.dry_run, ctx.delay(self.delay)).await?;
        Ok(finish("Deleted issues", &report, ctx.dry_run))
    }
}

/// Close open issues by exact title
#[derive(Args, Debug)]
pub struct PruneArgs {
    /// Title to close; repeatable (defaults to the out-of-scope MVP features)
    #[arg(long = "title")]
    pub titles: Vec<String>,

    /// Seconds to wait between issues
    #[arg(long)]
    pub delay: Option<f64>,
}

impl PruneArgs {
    fn titles(&self) -> Vec<String> {
        if self.titles.is_empty() {
            DEFAULT_PRUNE_TITLES.iter().map(|t| t.to_string()).collect()
        } else {
            self.titles.clone()
        }
    }

    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let client = ctx.client()?;
        let report =
            prune_backlog(&client, &self.titles(), ctx.dry_run, ctx.delay(self.delay)).await?;
        Ok(finish("Pruned issues", &report, ctx.dry_run))
    }
}
