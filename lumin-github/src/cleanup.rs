//! Repository cleanup: retiring closed issues and pruning the backlog
//!
//! GitHub issues cannot be deleted through the API, so "deleting" an issue
//! locks it and rewrites its title and body.

use std::time::Duration;

use tracing::{info, warn};

use crate::create::{pace, BatchReport};
use crate::issues::{Issue, IssueState, IssueUpdate};
use crate::{GitHubApi, Result, StateFilter};

pub const DELETED_PREFIX: &str = "[DELETED] ";
pub const DELETED_BODY: &str = "This issue has been marked as deleted during repository cleanup.";

fn deleted_update(issue: &Issue) -> IssueUpdate {
    IssueUpdate {
        title: Some(format!("{}{}", DELETED_PREFIX, issue.title)),
        body: Some(DELETED_BODY.to_string()),
        state: Some(IssueState::Closed),
        labels: None,
    }
}

/// Lock and relabel every closed issue that is not already marked
pub async fn mark_closed_issues_deleted(
    api: &dyn GitHubApi,
    dry_run: bool,
    delay: Duration,
) -> Result<BatchReport> {
    let closed = api.list_issues(StateFilter::Closed).await?;
    let mut report = BatchReport::default();

    let pending: Vec<&Issue> = closed
        .iter()
        .filter(|i| !i.is_pull_request)
        .filter(|i| {
            let marked = i.title.starts_with(DELETED_PREFIX);
            if marked {
                report.skipped += 1;
            }
            !marked
        })
        .collect();
    info!(count = pending.len(), skipped = report.skipped, "Found closed issues to mark deleted");

    for (i, issue) in pending.iter().enumerate() {
        if dry_run {
            info!(number = issue.number, title = %issue.title, "[DRY RUN] Would mark issue deleted");
            report.planned += 1;
            continue;
        }

        if let Err(e) = api.lock_issue(issue.number).await {
            warn!(number = issue.number, error = %e, "Could not lock issue");
        }

        match api.update_issue(issue.number, &deleted_update(issue)).await {
            Ok(_) => {
                info!(number = issue.number, "Marked issue as deleted");
                report.created += 1;
            }
            Err(e) => {
                warn!(number = issue.number, error = %e, "Failed to mark issue deleted");
                report.fail(format!("issue #{}: {}", issue.number, e));
            }
        }
        pace(i, pending.len(), delay).await;
    }

    Ok(report)
}

/// Close every open issue whose title is in `titles`
pub async fn prune_backlog(
    api: &dyn GitHubApi,
    titles: &[String],
    dry_run: bool,
    delay: Duration,
) -> Result<BatchReport> {
    let open = api.list_issues(StateFilter::Open).await?;
    let matches: Vec<&Issue> = open
        .iter()
        .filter(|i| !i.is_pull_request && titles.contains(&i.title))
        .collect();

    let mut report = BatchReport::default();
    if matches.is_empty() {
        info!("No issues match the pruning list; backlog is already aligned");
        return Ok(report);
    }

    for (i, issue) in matches.iter().enumerate() {
        if dry_run {
            info!(number = issue.number, title = %issue.title, "[DRY RUN] Would close issue");
            report.planned += 1;
            continue;
        }

        match api.update_issue(issue.number, &IssueUpdate::close()).await {
            Ok(_) => {
                info!(number = issue.number, title = %issue.title, "Closed issue");
                report.created += 1;
            }
            Err(e) => {
                warn!(number = issue.number, error = %e, "Failed to close issue");
                report.fail(format!("issue #{}: {}", issue.number, e));
            }
        }
        pace(i, matches.len(), delay).await;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{issue, StubApi};

    fn closed(number: u64, title: &str) -> Issue {
        let mut issue = issue(number, title, &[]);
        issue.state = IssueState::Closed;
        issue
    }

    #[tokio::test]
    async fn test_mark_deleted_skips_marked_and_pull_requests() {
        let mut pr = closed(3, "Merged PR");
        pr.is_pull_request = true;
        let api = StubApi::new().with_issues(vec![
            closed(1, "Old work"),
            closed(2, "[DELETED] Older work"),
            pr,
            issue(4, "Still open", &[]),
        ]);

        let report = mark_closed_issues_deleted(&api, false, Duration::ZERO).await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(api.locked(), vec![1]);
        let updates = api.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.title.as_deref(), Some("[DELETED] Old work"));
        assert_eq!(updates[0].1.body.as_deref(), Some(DELETED_BODY));
        assert_eq!(updates[0].1.state, Some(IssueState::Closed));
    }

    #[tokio::test]
    async fn test_lock_failure_is_only_a_warning() {
        let api = StubApi::new()
            .with_issues(vec![closed(1, "Old work")])
            .failing_lock();

        let report = mark_closed_issues_deleted(&api, false, Duration::ZERO).await.unwrap();
        assert_eq!(report.created, 1);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_prune_closes_exact_title_matches() {
        let api = StubApi::new().with_issues(vec![
            issue(1, "Export Functionality", &[]),
            issue(2, "Export Functionality v2", &[]),
            issue(3, "Guided Tutorial", &[]),
        ]);
        let titles = vec!["Export Functionality".to_string(), "Guided Tutorial".to_string()];

        let report = prune_backlog(&api, &titles, false, Duration::ZERO).await.unwrap();

        assert_eq!(report.created, 2);
        let closed: Vec<u64> = api.updates().iter().map(|(n, _)| *n).collect();
        assert_eq!(closed, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_prune_dry_run() {
        let api = StubApi::new().with_issues(vec![issue(1, "Guided Tutorial", &[])]);
        let report = prune_backlog(&api, &["Guided Tutorial".to_string()], true, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.planned, 1);
        assert_eq!(api.write_count(), 0);
    }
}
