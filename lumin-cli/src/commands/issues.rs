//! Issue commands

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Subcommand};
use lumin_core::extract::{self, prd, IssueSpec};
use lumin_github::{create_issues, CreateOptions};
use tracing::{info, warn};

use super::{finish, resolve_board, Context};

/// PRD files picked up from a directory
const PRD_SUFFIXES: &[&str] = &["_prd.md", "PRD.md"];

/// Issue commands
#[derive(Args, Debug)]
pub struct IssuesArgs {
    #[command(subcommand)]
    pub command: IssueCommand,
}

#[derive(Subcommand, Debug)]
pub enum IssueCommand {
    /// Create issues from an issues export (JSON array)
    Create {
        /// Path to the issues JSON file
        file: PathBuf,

        /// Do not add created issues to the project board
        #[arg(long)]
        no_project: bool,

        /// Seconds to wait between issues
        #[arg(long)]
        delay: Option<f64>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Convert PRD documents into an issues export
    FromPrd {
        /// PRD file or directory of `*_prd.md` / `*PRD.md` files
        path: PathBuf,

        /// Where to write the issues JSON
        #[arg(short, long, default_value = "issues.json")]
        output: PathBuf,
    },
}

impl IssuesArgs {
    /// Execute the issue command
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        match &self.command {
            IssueCommand::Create {
                file,
                no_project,
                delay,
                yes,
            } => {
                let specs = extract::load_issue_specs(file)?;
                create(ctx, &specs, *no_project, ctx.delay(*delay), *yes).await
            }
            IssueCommand::FromPrd { path, output } => {
                let specs = issues_from_prds(path)?;
                extract::write_issue_specs(output, &specs)?;
                println!("Wrote {} issues to {}", specs.len(), output.display());
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Every issue of every PRD under `path`, in file order
fn issues_from_prds(path: &std::path::Path) -> anyhow::Result<Vec<IssueSpec>> {
    let mut specs = Vec::new();
    for file in extract::discover_files(path, PRD_SUFFIXES)? {
        match prd::load_prd_issues(&file) {
            Ok(issues) => {
                info!(file = %file.display(), count = issues.len(), "Parsed PRD");
                specs.extend(issues);
            }
            Err(e) => warn!(file = %file.display(), error = %e, "Failed to read PRD"),
        }
    }
    Ok(specs)
}

/// One stdout line per issue a dry run would create
fn planned_titles(specs: &[IssueSpec]) -> Vec<String> {
    specs
        .iter()
        .map(|spec| format!("[DRY RUN] Would create issue: {}", spec.title))
        .collect()
}

async fn create(
    ctx: &Context,
    specs: &[IssueSpec],
    no_project: bool,
    delay: std::time::Duration,
    yes: bool,
) -> anyhow::Result<ExitCode> {
    if specs.is_empty() {
        println!("No issues to create.");
        return Ok(ExitCode::SUCCESS);
    }

    let client = ctx.client()?;
    println!(
        "{} issues for {} (project: {})",
        specs.len(),
        ctx.config.repository(),
        if no_project { "none" } else { ctx.config.github.project.as_str() }
    );
    if ctx.dry_run {
        for line in planned_titles(specs) {
            println!("{}", line);
        }
    }
    if !ctx.confirm(&format!("Create {} issues?", specs.len()), yes)? {
        println!("Aborted.");
        return Ok(ExitCode::SUCCESS);
    }

    let board = if no_project || ctx.dry_run {
        None
    } else {
        resolve_board(&client, &ctx.config.github.project).await
    };

    let options = CreateOptions {
        dry_run: ctx.dry_run,
        delay,
    };
    let report = create_issues(&client, specs, board.as_ref(), &options).await;
    Ok(finish("Issues", &report, ctx.dry_run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_issues_from_prd_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("WebDev--MVP_prd.md"),
            "# WebDev\n\n## Login\nUsers sign in.\n\n### Password reset\nEmail link.\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.md"), "## Ignored\nnot a prd\n").unwrap();

        let specs = issues_from_prds(dir.path()).unwrap();
        let titles: Vec<&str> = specs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Login", "Password reset"]);
        assert_eq!(specs[0].labels, vec!["webdev"]);
        assert!(specs[1].body.contains("Part of: Login"));
    }

    #[test]
    fn test_dry_run_lists_every_title() {
        let specs = vec![IssueSpec::new("First", "a"), IssueSpec::new("Second", "b")];
        assert_eq!(
            planned_titles(&specs),
            vec![
                "[DRY RUN] Would create issue: First",
                "[DRY RUN] Would create issue: Second",
            ]
        );
    }

    #[test]
    fn test_missing_prd_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(issues_from_prds(&dir.path().join("missing")).is_err());
    }
}
