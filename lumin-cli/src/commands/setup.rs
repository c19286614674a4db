//! Setup validation command

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use lumin_github::SetupValidator;

use super::{exit_code, Context};

/// Check everything the board automation depends on
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// On failure, write a fix script (default: scripts/fix_project_setup.sh)
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = "scripts/fix_project_setup.sh"
    )]
    pub generate_setup_script: Option<PathBuf>,
}

impl SetupArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<ExitCode> {
        let client = ctx.client()?;
        let report = SetupValidator::new(&client, ctx.config.github.project.clone())
            .run()
            .await;
        report.log_summary();

        println!();
        for result in &report.results {
            let mark = if result.passed { "PASS" } else { "FAIL" };
            println!("[{}] {}: {}", mark, result.name, result.message);
            if let (false, Some(fix)) = (result.passed, &result.fix_instructions) {
                for line in fix.lines() {
                    println!("       Fix: {}", line);
                }
            }
        }

        if report.passed() {
            println!("\nAll validations passed. Project is ready for automation.");
            return Ok(ExitCode::SUCCESS);
        }

        println!("\n{} critical issues found.", report.critical_failures());
        if let Some(path) = &self.generate_setup_script {
            report.write_setup_script(path)?;
            println!("Generated setup script: {}", path.display());
        }
        Ok(exit_code(false))
    }
}
