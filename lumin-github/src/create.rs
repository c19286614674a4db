//! Issue and epic creation from extracted descriptors

use std::time::Duration;

use lumin_core::{EpicSpec, IssueSpec, Taxonomy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::issues::{Issue, NewIssue};
use crate::labels::ensure_labels;
use crate::milestones::find_milestone_number;
use crate::project::{AttachOutcome, ProjectBoard};
use crate::{GitHubApi, Result};

/// Outcome of a batch of create or update calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Entities written
    pub created: usize,
    /// Entities that already existed or needed no change
    pub skipped: usize,
    /// Entities a dry run would have written
    pub planned: usize,
    /// One message per entity that failed
    pub failed: Vec<String>,
}

impl BatchReport {
    pub(crate) fn fail(&mut self, message: String) {
        self.failed.push(message);
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.planned += other.planned;
        self.failed.extend(other.failed);
    }
}

/// Options shared by the creators
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Log what would be created without writing
    pub dry_run: bool,
    /// Pause between consecutive entities
    pub delay: Duration,
}

/// Sleep between entities, but not after the last one
pub(crate) async fn pace(index: usize, total: usize, delay: Duration) {
    if index + 1 < total && !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Create one issue and place it on the board
///
/// The milestone title is resolved with a fresh lookup; an unknown title is
/// logged and the issue is created without one. Failing to attach to the
/// board is logged but does not fail the issue.
pub async fn create_issue(
    api: &dyn GitHubApi,
    spec: &IssueSpec,
    board: Option<&ProjectBoard>,
) -> Result<Issue> {
    let milestone = match spec.milestone.as_deref() {
        Some(title) => {
            let number = find_milestone_number(api, title).await?;
            if number.is_none() {
                warn!(milestone = %title, issue = %spec.title, "Milestone not found");
            }
            number
        }
        None => None,
    };

    let payload = NewIssue {
        title: spec.title.clone(),
        body: spec.body.clone(),
        labels: spec.labels.clone(),
        milestone,
        assignees: spec.assignees.clone(),
    };
    let issue = api.create_issue(&payload).await?;
    info!(title = %issue.title, number = issue.number, "Created issue");

    if let Some(board) = board {
        match board.attach(api, &issue.node_id).await {
            Ok(AttachOutcome::Scheduled { .. }) => {
                info!(number = issue.number, project = %board.title, "Added to board backlog")
            }
            Ok(AttachOutcome::Unscheduled { .. }) => {
                warn!(number = issue.number, project = %board.title, "Added to board without status")
            }
            Err(e) => warn!(number = issue.number, error = %e, "Failed to add issue to board"),
        }
    }

    Ok(issue)
}

/// Create every issue, continuing past failures
///
/// In dry-run mode nothing is sent: each issue is logged and counted as planned.
pub async fn create_issues(
    api: &dyn GitHubApi,
    specs: &[IssueSpec],
    board: Option<&ProjectBoard>,
    options: &CreateOptions,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (i, spec) in specs.iter().enumerate() {
        if options.dry_run {
            info!(
                title = %spec.title,
                labels = ?spec.labels,
                milestone = spec.milestone.as_deref().unwrap_or("none"),
                "[DRY RUN] Would create issue"
            );
            report.planned += 1;
            continue;
        }

        debug!(index = i + 1, total = specs.len(), title = %spec.title, "Creating issue");
        match create_issue(api, spec, board).await {
            Ok(_) => report.created += 1,
            Err(e) => {
                warn!(title = %spec.title, error = %e, "Failed to create issue");
                report.fail(format!("issue '{}': {}", spec.title, e));
            }
        }
        pace(i, specs.len(), options.delay).await;
    }

    report
}

/// Create epics, making sure their labels exist first
pub async fn create_epics(
    api: &dyn GitHubApi,
    taxonomy: &Taxonomy,
    epics: &[EpicSpec],
    board: Option<&ProjectBoard>,
    options: &CreateOptions,
) -> Result<BatchReport> {
    let mut names: Vec<String> = Vec::new();
    for label in epics.iter().flat_map(|e| e.labels.iter()) {
        if !names.contains(label) {
            names.push(label.clone());
        }
    }

    let labels = ensure_labels(api, taxonomy, &names, options.dry_run, options.delay).await?;
    info!(
        created = labels.created,
        existing = labels.skipped,
        planned = labels.planned,
        "Prepared epic labels"
    );

    let specs: Vec<IssueSpec> = epics.iter().cloned().map(IssueSpec::from).collect();
    let mut report = create_issues(api, &specs, board, options).await;
    report.failed.extend(labels.failed);
    Ok(report)
}
