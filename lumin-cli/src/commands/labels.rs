//! Label commands

use std::process::ExitCode;

use clap::{Args, Subcommand};
use lumin_github::{correct_repository, create_taxonomy_labels, validate_repository};

use super::{exit_code, finish, Context};

/// Label commands
#[derive(Args, Debug)]
pub struct LabelsArgs {
    #[command(subcommand)]
    pub command: LabelCommand,
}

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    /// Create every missing label of the taxonomy
    Create {
        /// Seconds to wait between labels
        #[arg(long)]
        delay: Option<f64>,
    },

    /// Check that every issue has one track and one priority label
    Validate,

    /// Repair issue labels to satisfy the taxonomy
    Fix {
        /// Seconds to wait between issues
        #[arg(long)]
        delay: Option<f64>,
    },
}

impl LabelsArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let client = ctx.client()?;
        let taxonomy = &ctx.config.taxonomy;

        match &self.command {
            LabelCommand::Create { delay } => {
                let report =
                    create_taxonomy_labels(&client, taxonomy, ctx.dry_run, ctx.delay(*delay))
                        .await?;
                Ok(finish("Labels", &report, ctx.dry_run))
            }
            LabelCommand::Validate => {
                let report = validate_repository(&client, taxonomy).await?;
                if report.passed() {
                    println!("All {} issues follow the label taxonomy.", report.checked);
                } else {
                    println!(
                        "{} of {} issues break the label taxonomy:",
                        report.issues.len(),
                        report.checked
                    );
                    for issue in &report.issues {
                        for violation in &issue.violations {
                            println!("  #{} {}: {}", issue.number, issue.title, violation);
                        }
                    }
                }
                Ok(exit_code(report.passed()))
            }
            LabelCommand::Fix { delay } => {
                let report =
                    correct_repository(&client, taxonomy, ctx.dry_run, ctx.delay(*delay)).await?;
                Ok(finish("Label fixes", &report, ctx.dry_run))
            }
        }
    }
}
