//! Comment related documentation sections on issues

use std::time::Duration;

use lumin_core::docs::{render_comment, DOC_LINKS_MARKER};
use lumin_core::DocIndex;
use tracing::{debug, info, warn};

use crate::create::{pace, BatchReport};
use crate::{GitHubApi, Result};

/// Open issues that are not on any board
pub const DEFAULT_DOC_QUERY: &str = "is:open is:issue no:projectcard";

/// Sections linked per issue
const MAX_LINKS: usize = 3;

/// Blob URL prefix of the default branch
pub fn blob_base(owner: &str, repo: &str) -> String {
    format!("https://github.com/{}/{}/blob/main", owner, repo)
}

/// Comment the best matching documentation sections on every issue of `query`
///
/// Issues that already carry a doc-links comment, or that match nothing, are
/// skipped.
pub async fn link_issues_to_docs(
    api: &dyn GitHubApi,
    index: &DocIndex,
    query: &str,
    dry_run: bool,
    delay: Duration,
) -> Result<BatchReport> {
    info!(query, "Searching for issues");
    let issues = api.search_issues(query).await?;
    info!(count = issues.len(), "Found issues to process");

    let mut report = BatchReport::default();
    for (i, issue) in issues.iter().filter(|i| !i.is_pull_request).enumerate() {
        let matches = index.find_matches(&issue.title, &issue.body, MAX_LINKS);
        if matches.is_empty() {
            debug!(number = issue.number, "No related documentation");
            report.skipped += 1;
            continue;
        }

        let comments = match api.list_comments(issue.number).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(number = issue.number, error = %e, "Failed to list comments");
                report.fail(format!("issue #{}: {}", issue.number, e));
                continue;
            }
        };
        if comments.iter().any(|c| c.body.contains(DOC_LINKS_MARKER)) {
            debug!(number = issue.number, "Documentation already linked");
            report.skipped += 1;
            continue;
        }

        let body = render_comment(&matches);
        if dry_run {
            info!(
                number = issue.number,
                sections = matches.len(),
                "[DRY RUN] Would comment documentation links"
            );
            debug!(number = issue.number, "{}", body);
            report.planned += 1;
            continue;
        }

        match api.create_comment(issue.number, &body).await {
            Ok(_) => {
                info!(number = issue.number, sections = matches.len(), "Linked documentation");
                report.created += 1;
            }
            Err(e) => {
                warn!(number = issue.number, error = %e, "Failed to comment on issue");
                report.fail(format!("issue #{}: {}", issue.number, e));
            }
        }
        pace(i, issues.len(), delay).await;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{issue, StubApi};

    fn index() -> DocIndex {
        let mut index = DocIndex::default();
        index.add_document(
            "docs/architecture/auth.md",
            "# Authentication\nLogin tokens are issued by the gateway.\n\n## Sessions\nSession storage.\n",
            &blob_base("lumin", "lumin-ai"),
        );
        index
    }

    fn issues() -> Vec<crate::issues::Issue> {
        let mut login = issue(1, "Implement authentication", &[]);
        login.body = "Login tokens for the gateway".to_string();
        let unrelated = issue(2, "Paint the logo", &[]);
        vec![login, unrelated]
    }

    #[tokio::test]
    async fn test_links_matching_issue_once() {
        let api = StubApi::new().with_issues(issues());

        let first = link_issues_to_docs(&api, &index(), DEFAULT_DOC_QUERY, false, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(first.created, 1);
        assert_eq!(first.skipped, 1);

        let comments = api.comments_on(1);
        assert_eq!(comments.len(), 1);
        assert!(comments[0].contains(
            "https://github.com/lumin/lumin-ai/blob/main/docs/architecture/auth.md#L1"
        ));
        assert_eq!(api.searches(), vec![DEFAULT_DOC_QUERY]);

        let second = link_issues_to_docs(&api, &index(), DEFAULT_DOC_QUERY, false, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(api.comments_on(1).len(), 1);
    }

    #[tokio::test]
    async fn test_existing_marker_comment_skips() {
        let api = StubApi::new()
            .with_issues(issues())
            .with_comment(1, &format!("links\n{}", DOC_LINKS_MARKER));

        let report = link_issues_to_docs(&api, &index(), DEFAULT_DOC_QUERY, false, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(api.write_count(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_comment() {
        let api = StubApi::new().with_issues(issues());
        let report = link_issues_to_docs(&api, &index(), DEFAULT_DOC_QUERY, true, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.planned, 1);
        assert_eq!(api.write_count(), 0);
    }
}
