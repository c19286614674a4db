//! CI checks and the aggregated report
//!
//! Checks run one after another. A check that runs as a subprocess is bounded
//! by a timeout; exceeding it kills the child and records a failed check.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::Result;

/// Result of one CI check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiCheck {
    pub name: String,
    #[serde(rename = "status")]
    pub passed: bool,
    pub message: String,
    /// Wall time in seconds
    pub duration: f64,
    pub critical: bool,
}

impl CiCheck {
    pub fn pass(name: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
            duration: duration.as_secs_f64(),
            critical: true,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            passed: false,
            ..Self::pass(name, message, duration)
        }
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Counts over all checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiSummary {
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub critical_failures: usize,
    /// True when every critical check passed
    pub overall_status: bool,
}

impl CiSummary {
    pub fn from_checks(checks: &[CiCheck]) -> Self {
        let passed_checks = checks.iter().filter(|c| c.passed).count();
        let critical_failures = checks.iter().filter(|c| !c.passed && c.critical).count();
        Self {
            total_checks: checks.len(),
            passed_checks,
            failed_checks: checks.len() - passed_checks,
            critical_failures,
            overall_status: critical_failures == 0,
        }
    }
}

/// Report written at the end of a CI run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiReport {
    pub timestamp: DateTime<Utc>,
    /// `owner/repo`
    pub repository: String,
    pub project: String,
    /// Seconds
    pub total_duration: f64,
    pub checks: Vec<CiCheck>,
    pub summary: CiSummary,
}

impl CiReport {
    pub fn new(
        repository: impl Into<String>,
        project: impl Into<String>,
        checks: Vec<CiCheck>,
        total_duration: Duration,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            repository: repository.into(),
            project: project.into(),
            total_duration: total_duration.as_secs_f64(),
            summary: CiSummary::from_checks(&checks),
            checks,
        }
    }

    pub fn passed(&self) -> bool {
        self.summary.overall_status
    }

    /// Log one line per check plus the totals
    pub fn log_summary(&self) {
        for check in &self.checks {
            if check.passed {
                info!(check = %check.name, duration_secs = check.duration, "{}", check.message);
            } else if check.critical {
                error!(check = %check.name, duration_secs = check.duration, "{}", check.message);
            } else {
                warn!(check = %check.name, duration_secs = check.duration, "{}", check.message);
            }
        }
        info!(
            passed = self.summary.passed_checks,
            total = self.summary.total_checks,
            critical_failures = self.summary.critical_failures,
            total_duration_secs = self.total_duration,
            "CI run finished"
        );
    }

    /// Write the report as pretty JSON
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Wrote CI report");
        Ok(())
    }
}

/// Run `command` as a check
///
/// Exit code 0 passes. A non-zero exit fails with the captured stderr. A
/// spawn failure or a run longer than `limit` fails without propagating.
pub async fn run_subprocess_check(
    name: &str,
    mut command: Command,
    limit: Duration,
    critical: bool,
) -> CiCheck {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(check = name, command = ?command.as_std(), "Running check");
    let start = Instant::now();
    let check = match tokio::time::timeout(limit, command.output()).await {
        Err(_) => CiCheck::fail(
            name,
            format!("Timed out after {:?}", limit),
            start.elapsed(),
        ),
        Ok(Err(e)) => CiCheck::fail(name, format!("Failed to run check: {}", e), start.elapsed()),
        Ok(Ok(output)) if output.status.success() => {
            CiCheck::pass(name, "All checks passed", start.elapsed())
        }
        Ok(Ok(output)) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            CiCheck::fail(
                name,
                format!("Failed (exit {}): {}", code, stderr.trim()),
                start.elapsed(),
            )
        }
    };

    check.with_critical(critical)
}
