//! Epic creation from PRD documents

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use lumin_core::extract::{self, epics, EpicSpec};
use lumin_core::Taxonomy;
use lumin_github::{create_epics, CreateOptions};
use tracing::{info, warn};

use super::{finish, resolve_board, Context};

/// Create epics from `### Category: Title` sections of PRD documents
#[derive(Args, Debug)]
pub struct EpicsArgs {
    /// PRD file or directory of `*PRD.md` files
    pub path: PathBuf,

    /// Do not add created epics to the project board
    #[arg(long)]
    pub no_project: bool,

    /// Seconds to wait between epics
    #[arg(long)]
    pub delay: Option<f64>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl EpicsArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let taxonomy = &ctx.config.taxonomy;
        let specs = epics_from_prds(&self.path, taxonomy)?;

        if specs.is_empty() {
            println!("No epics found in {}", self.path.display());
            return Ok(ExitCode::SUCCESS);
        }

        let client = ctx.client()?;
        if !ctx.confirm(&format!("Create {} epics?", specs.len()), self.yes)? {
            println!("Aborted.");
            return Ok(ExitCode::SUCCESS);
        }

        let board = if self.no_project || ctx.dry_run {
            None
        } else {
            resolve_board(&client, &ctx.config.github.project).await
        };

        let options = CreateOptions {
            dry_run: ctx.dry_run,
            delay: ctx.delay(self.delay),
        };
        let report = create_epics(&client, taxonomy, &specs, board.as_ref(), &options).await?;
        Ok(finish("Epics", &report, ctx.dry_run))
    }
}

/// Every epic of every PRD under `path`; unreadable files are skipped
fn epics_from_prds(path: &Path, taxonomy: &Taxonomy) -> anyhow::Result<Vec<EpicSpec>> {
    let mut specs = Vec::new();
    for file in extract::discover_files(path, &["PRD.md"])? {
        match epics::load_epics(&file, taxonomy) {
            Ok(found) => {
                info!(file = %file.display(), count = found.len(), "Parsed epics");
                specs.extend(found);
            }
            Err(e) => warn!(file = %file.display(), error = %e, "Failed to read PRD"),
        }
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unreadable_prd_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Good--PRD.md"), "### Feature: Login
Users sign in.
").unwrap();
        std::fs::write(dir.path().join("Bad--PRD.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let specs = epics_from_prds(dir.path(), &Taxonomy::default()).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].title, "Feature: Login");
    }

    #[test]
    fn test_missing_path_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(epics_from_prds(&dir.path().join("missing"), &Taxonomy::default()).is_err());
    }
}
