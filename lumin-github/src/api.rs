//! The GitHub operations automation code depends on
//!
//! Everything above the client talks to GitHub through [`GitHubApi`], so the
//! creators and synchronizers can run against an in-memory double in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::issues::{Comment, Issue, IssueUpdate, NewIssue};
use crate::labels::{Label, NewLabel};
use crate::milestones::{Milestone, NewMilestone};
use crate::Result;

/// `state` filter for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }
}

/// REST and GraphQL operations against one repository
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Repository owner
    fn owner(&self) -> &str;

    /// Repository name
    fn repo(&self) -> &str;

    /// All issues in a state, following pagination (pull requests included)
    async fn list_issues(&self, state: StateFilter) -> Result<Vec<Issue>>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue>;

    async fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<Issue>;

    /// Lock an issue's conversation as resolved
    async fn lock_issue(&self, number: u64) -> Result<()>;

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>>;

    async fn create_comment(&self, number: u64, body: &str) -> Result<Comment>;

    /// Issue search; `query` is scoped to the repository by the implementation
    async fn search_issues(&self, query: &str) -> Result<Vec<Issue>>;

    async fn list_labels(&self) -> Result<Vec<Label>>;

    async fn create_label(&self, label: &NewLabel) -> Result<Label>;

    async fn list_milestones(&self, state: StateFilter) -> Result<Vec<Milestone>>;

    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone>;

    /// Run a GraphQL document and return its `data` member
    async fn graphql(&self, query: &str, variables: serde_json::Value) -> Result<serde_json::Value>;
}
