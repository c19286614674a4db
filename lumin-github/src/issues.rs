//! Issue and comment shapes

use serde::{Deserialize, Serialize};

/// Issue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// GitHub issue representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RestIssue")]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// GraphQL node id, used for project mutations
    pub node_id: String,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    /// Label names
    pub labels: Vec<String>,
    /// Milestone title
    pub milestone: Option<String>,
    /// True when the entry is a pull request
    pub is_pull_request: bool,
}

#[derive(Deserialize)]
struct RestIssue {
    number: u64,
    #[serde(default)]
    node_id: String,
    title: String,
    body: Option<String>,
    state: IssueState,
    #[serde(default)]
    labels: Vec<NameRef>,
    milestone: Option<TitleRef>,
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct NameRef {
    name: String,
}

#[derive(Deserialize)]
struct TitleRef {
    title: String,
}

impl From<RestIssue> for Issue {
    fn from(issue: RestIssue) -> Self {
        Issue {
            number: issue.number,
            node_id: issue.node_id,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            state: issue.state,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            milestone: issue.milestone.map(|m| m.title),
            is_pull_request: issue.pull_request.is_some(),
        }
    }
}

/// Payload for `POST /repos/{owner}/{repo}/issues`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    /// Milestone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
}

/// Payload for `PATCH /repos/{owner}/{repo}/issues/{number}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl IssueUpdate {
    /// Replace the label set
    pub fn labels(labels: impl IntoIterator<Item = String>) -> Self {
        Self {
            labels: Some(labels.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Close the issue
    pub fn close() -> Self {
        Self {
            state: Some(IssueState::Closed),
            ..Default::default()
        }
    }
}

/// An issue comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
}
