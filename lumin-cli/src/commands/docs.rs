//! Documentation linking command

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use lumin_core::DocIndex;
use lumin_github::docs::{blob_base, link_issues_to_docs, DEFAULT_DOC_QUERY};

use super::{finish, Context};

/// Comment related documentation sections on issues
#[derive(Args, Debug)]
pub struct LinkDocsArgs {
    /// Directory of markdown documentation
    #[arg(default_value = "docs")]
    pub docs_dir: PathBuf,

    /// Issue search query (scoped to the repository)
    #[arg(long, default_value = DEFAULT_DOC_QUERY)]
    pub query: String,

    /// Seconds to wait between comments
    #[arg(long)]
    pub delay: Option<f64>,
}

impl LinkDocsArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let github = &ctx.config.github;
        let index = DocIndex::build(&self.docs_dir, &blob_base(&github.owner, &github.repo))?;
        if index.is_empty() {
            println!("No documentation sections found in {}", self.docs_dir.display());
            return Ok(ExitCode::SUCCESS);
        }

        let client = ctx.client()?;
        let report =
            link_issues_to_docs(&client, &index, &self.query, ctx.dry_run, ctx.delay(self.delay))
                .await?;
        Ok(finish("Doc links", &report, ctx.dry_run))
    }
}
