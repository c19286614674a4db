//! Milestone creation from roadmap documents

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use lumin_core::extract::{self, milestones, MilestoneSpec};
use lumin_github::create_milestones;
use tracing::{info, warn};

use super::{finish, Context};

/// Create milestones from `## Title (Timeframe)` sections of roadmaps
#[derive(Args, Debug)]
pub struct MilestonesArgs {
    /// Roadmap file or directory of `*ROADMAP.md` files
    pub path: PathBuf,

    /// Seconds to wait between milestones
    #[arg(long)]
    pub delay: Option<f64>,
}

impl MilestonesArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let specs = milestones_from_roadmaps(&self.path)?;

        if specs.is_empty() {
            println!("No milestones found in {}", self.path.display());
            return Ok(ExitCode::SUCCESS);
        }

        let client = ctx.client()?;
        let report = create_milestones(&client, &specs, ctx.dry_run, ctx.delay(self.delay)).await?;
        Ok(finish("Milestones", &report, ctx.dry_run))
    }
}

/// Every milestone of every roadmap under `path`; unreadable files are skipped
fn milestones_from_roadmaps(path: &Path) -> anyhow::Result<Vec<MilestoneSpec>> {
    let mut specs = Vec::new();
    for file in extract::discover_files(path, &["ROADMAP.md"])? {
        match milestones::load_milestones(&file) {
            Ok(found) => {
                info!(file = %file.display(), count = found.len(), "Parsed milestones");
                specs.extend(found);
            }
            Err(e) => warn!(file = %file.display(), error = %e, "Failed to read roadmap"),
        }
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unreadable_roadmap_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ROADMAP.md"), "## Phase 1 (Weeks 1-3)
Setup.
").unwrap();
        std::fs::write(dir.path().join("OLD_ROADMAP.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let specs = milestones_from_roadmaps(dir.path()).unwrap();
        assert_eq!(specs.len(), 1);
        assert!(specs[0].title.starts_with("Phase 1"));
    }
}
