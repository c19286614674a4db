//! Repository-wide label audit and repair

use std::time::Duration;

use lumin_core::{Taxonomy, Violation};
use serde::Serialize;
use tracing::{info, warn};

use crate::create::{pace, BatchReport};
use crate::issues::IssueUpdate;
use crate::{GitHubApi, Result, StateFilter};

/// Violations found on one issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueViolations {
    pub number: u64,
    pub title: String,
    #[serde(serialize_with = "serialize_violations")]
    pub violations: Vec<Violation>,
}

fn serialize_violations<S: serde::Serializer>(
    violations: &[Violation],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(violations.iter().map(|v| v.to_string()))
}

/// Outcome of validating every issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Issues inspected (pull requests excluded)
    pub checked: usize,
    pub issues: Vec<IssueViolations>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.issues.iter().map(|i| i.violations.len()).sum()
    }
}

/// Validate the labels of every issue, open or closed
pub async fn validate_repository(api: &dyn GitHubApi, taxonomy: &Taxonomy) -> Result<AuditReport> {
    let issues = api.list_issues(StateFilter::All).await?;
    let mut report = AuditReport::default();

    for issue in issues.into_iter().filter(|i| !i.is_pull_request) {
        report.checked += 1;
        let violations = taxonomy.validate(&issue.labels);
        if violations.is_empty() {
            continue;
        }
        for violation in &violations {
            warn!(number = issue.number, title = %issue.title, "Issue {}", violation);
        }
        report.issues.push(IssueViolations {
            number: issue.number,
            title: issue.title,
            violations,
        });
    }

    if report.passed() {
        info!(checked = report.checked, "All issues follow the label taxonomy");
    } else {
        warn!(
            checked = report.checked,
            failing = report.issues.len(),
            violations = report.violation_count(),
            "Label validation failed"
        );
    }
    Ok(report)
}

/// Repair the labels of every issue, writing only those that change
pub async fn correct_repository(
    api: &dyn GitHubApi,
    taxonomy: &Taxonomy,
    dry_run: bool,
    delay: Duration,
) -> Result<BatchReport> {
    let issues = api.list_issues(StateFilter::All).await?;
    let mut report = BatchReport::default();

    let pending: Vec<_> = issues
        .iter()
        .filter(|i| !i.is_pull_request)
        .filter_map(|i| {
            let correction = taxonomy.correct(&i.labels);
            if correction.changed() {
                Some((i, correction))
            } else {
                None
            }
        })
        .collect();
    report.skipped = issues.iter().filter(|i| !i.is_pull_request).count() - pending.len();

    for (i, (issue, correction)) in pending.iter().enumerate() {
        for change in &correction.changes {
            info!(number = issue.number, "Issue #{}: {}", issue.number, change);
        }

        let before: Vec<&str> = correction.before.iter().map(String::as_str).collect();
        let after: Vec<&str> = correction.after.iter().map(String::as_str).collect();
        if dry_run {
            info!(
                number = issue.number,
                "[DRY RUN] Would update labels. From: {:?} To: {:?}",
                before,
                after
            );
            report.planned += 1;
            continue;
        }

        let update = IssueUpdate::labels(correction.after.iter().cloned());
        match api.update_issue(issue.number, &update).await {
            Ok(_) => {
                info!(number = issue.number, labels = ?after, "Updated labels");
                report.created += 1;
            }
            Err(e) => {
                warn!(number = issue.number, error = %e, "Failed to update labels");
                report.fail(format!("issue #{}: {}", issue.number, e));
            }
        }
        pace(i, pending.len(), delay).await;
    }

    Ok(report)
}
