//! Projects V2 board synchronization
//!
//! A board is looked up by title on every run. Issues are attached in two
//! steps: add the item, then set its Status to Backlog when the board has
//! such a field. Placement is checked through each issue's `projectItems`
//! so an issue is never added twice.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::create::{pace, BatchReport};
use crate::graphql::{self, Nodes};
use crate::{Error, GitHubApi, Result};

/// Fields scanned when looking for Status/Backlog
const STATUS_FIELD_SCAN: u32 = 20;

const STATUS_FIELD: &str = "Status";
const BACKLOG_OPTION: &str = "Backlog";

/// The Status field and its Backlog option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusField {
    pub field_id: String,
    pub backlog_option_id: String,
}

/// A Projects V2 board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBoard {
    pub id: String,
    pub title: String,
    pub number: u64,
    /// Present when the board has a Status field with a Backlog option
    pub status: Option<StatusField>,
}

/// An option of a single-select field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

/// A board field definition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectField {
    #[serde(rename = "__typename")]
    pub typename: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

impl ProjectField {
    pub fn is_single_select(&self) -> bool {
        self.typename == "ProjectV2SingleSelectField"
    }

    pub fn option(&self, name: &str) -> Option<&FieldOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

/// Result of attaching an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Added and placed in Backlog
    Scheduled { item_id: String },
    /// Added, but Status could not be set
    Unscheduled { item_id: String },
}

impl AttachOutcome {
    pub fn item_id(&self) -> &str {
        match self {
            AttachOutcome::Scheduled { item_id } | AttachOutcome::Unscheduled { item_id } => item_id,
        }
    }
}

/// An open issue that is not on any board
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncCandidate {
    pub number: u64,
    pub title: String,
    #[serde(rename = "id")]
    pub node_id: String,
}

#[derive(Deserialize)]
struct RepositoryData<T> {
    repository: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectsData {
    projects_v2: Nodes<ProjectNode>,
}

#[derive(Deserialize)]
struct ProjectNode {
    id: String,
    title: String,
    #[serde(default)]
    number: u64,
}

#[derive(Deserialize)]
struct NodeData<T> {
    node: Option<T>,
}

#[derive(Deserialize)]
struct FieldsData {
    fields: Nodes<ProjectField>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemData {
    add_project_v2_item_by_id: AddItemPayload,
}

#[derive(Deserialize)]
struct AddItemPayload {
    item: ItemId,
}

#[derive(Deserialize)]
struct ItemId {
    id: String,
}

#[derive(Deserialize)]
struct IssuesData {
    issues: IssuePage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuePage {
    page_info: PageInfo,
    nodes: Vec<IssueNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    #[serde(flatten)]
    candidate: SyncCandidate,
    project_items: Edges,
}

#[derive(Deserialize)]
struct Edges {
    edges: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct ItemsData {
    items: TotalCount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u64,
}

impl ProjectBoard {
    /// A board with a known Status/Backlog pair
    pub fn with_status(
        id: impl Into<String>,
        title: impl Into<String>,
        field_id: impl Into<String>,
        backlog_option_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            number: 0,
            status: Some(StatusField {
                field_id: field_id.into(),
                backlog_option_id: backlog_option_id.into(),
            }),
        }
    }

    /// Find a board by exact title among the repository's first 100
    pub async fn find(api: &dyn GitHubApi, title: &str) -> Result<Self> {
        let data: RepositoryData<ProjectsData> = graphql::query(
            api,
            graphql::FIND_PROJECTS,
            json!({ "owner": api.owner(), "repo": api.repo() }),
        )
        .await?;

        let node = data
            .repository
            .projects_v2
            .into_vec()
            .into_iter()
            .find(|p| p.title == title)
            .ok_or_else(|| Error::NotFound(format!("project '{}'", title)))?;

        info!(project = %node.title, id = %node.id, "Found project");
        Ok(Self {
            id: node.id,
            title: node.title,
            number: node.number,
            status: None,
        })
    }

    /// Find a board and its Status/Backlog pair
    ///
    /// A board without them is still returned; attached issues stay unscheduled.
    pub async fn resolve(api: &dyn GitHubApi, title: &str) -> Result<Self> {
        let mut board = Self::find(api, title).await?;
        let fields = match board.fields(api, STATUS_FIELD_SCAN).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(
                    project = %board.title,
                    error = %e,
                    "Failed to read project fields; issues will be added without status"
                );
                return Ok(board);
            }
        };

        board.status = fields
            .iter()
            .filter(|f| f.name == STATUS_FIELD && f.is_single_select())
            .find_map(|f| {
                f.option(BACKLOG_OPTION).map(|o| StatusField {
                    field_id: f.id.clone(),
                    backlog_option_id: o.id.clone(),
                })
            });

        match &board.status {
            Some(_) => info!(project = %board.title, "Found Status field and Backlog option"),
            None => warn!(
                project = %board.title,
                "No Status field with a Backlog option; issues will be added without status"
            ),
        }
        Ok(board)
    }

    /// The board's first `first` field definitions
    pub async fn fields(&self, api: &dyn GitHubApi, first: u32) -> Result<Vec<ProjectField>> {
        let data: NodeData<FieldsData> = graphql::query(
            api,
            graphql::PROJECT_FIELDS,
            json!({ "project": self.id, "first": first }),
        )
        .await?;

        data.node
            .map(|n| n.fields.into_vec())
            .ok_or_else(|| Error::NotFound(format!("project node {}", self.id)))
    }

    /// Add an issue to the board and place it in Backlog
    ///
    /// Failing to add is an error. Failing to set the status degrades to
    /// [`AttachOutcome::Unscheduled`].
    pub async fn attach(&self, api: &dyn GitHubApi, node_id: &str) -> Result<AttachOutcome> {
        let data: AddItemData = graphql::query(
            api,
            graphql::ADD_PROJECT_ITEM,
            json!({ "project": self.id, "content": node_id }),
        )
        .await?;
        let item_id = data.add_project_v2_item_by_id.item.id;
        debug!(item = %item_id, "Added project item");

        let Some(status) = &self.status else {
            return Ok(AttachOutcome::Unscheduled { item_id });
        };

        let variables = json!({
            "project": self.id,
            "item": item_id,
            "field": status.field_id,
            "option": status.backlog_option_id,
        });
        match api.graphql(graphql::SET_SINGLE_SELECT, variables).await {
            Ok(_) => Ok(AttachOutcome::Scheduled { item_id }),
            Err(e) => {
                warn!(item = %item_id, error = %e, "Added to project but could not set Backlog");
                Ok(AttachOutcome::Unscheduled { item_id })
            }
        }
    }
}

/// Open issues numbered `since` or higher that are on no board, newest first
///
/// The scan walks pages of 100 and stops at the first issue below `since`.
pub async fn issues_to_sync(api: &dyn GitHubApi, since: u64) -> Result<Vec<SyncCandidate>> {
    let mut candidates = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let data: RepositoryData<IssuesData> = graphql::query(
            api,
            graphql::OPEN_ISSUES,
            json!({ "owner": api.owner(), "repo": api.repo(), "cursor": cursor }),
        )
        .await?;
        let page = data.repository.issues;

        for node in page.nodes {
            if node.candidate.number < since {
                debug!(number = node.candidate.number, since, "Reached sync threshold");
                return Ok(candidates);
            }
            if node.project_items.edges.is_empty() {
                candidates.push(node.candidate);
            }
        }

        match page.page_info.end_cursor {
            Some(next) if page.page_info.has_next_page => cursor = Some(next),
            _ => break,
        }
    }

    Ok(candidates)
}

/// Attach every candidate to the board, continuing past failures
pub async fn sync_issues(
    api: &dyn GitHubApi,
    board: &ProjectBoard,
    candidates: &[SyncCandidate],
    dry_run: bool,
    delay: Duration,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (i, issue) in candidates.iter().enumerate() {
        if dry_run {
            info!(number = issue.number, title = %issue.title, "[DRY RUN] Would add issue to project");
            report.planned += 1;
            continue;
        }

        match board.attach(api, &issue.node_id).await {
            Ok(outcome) => {
                info!(number = issue.number, item = %outcome.item_id(), "Synced issue to project");
                report.created += 1;
            }
            Err(e) => {
                warn!(number = issue.number, error = %e, "Failed to add issue to project");
                report.fail(format!("issue #{}: {}", issue.number, e));
            }
        }
        pace(i, candidates.len(), delay).await;
    }

    report
}

/// Number of items on the board titled `title`
pub async fn project_item_count(api: &dyn GitHubApi, title: &str) -> Result<u64> {
    let board = ProjectBoard::find(api, title).await?;
    let data: NodeData<ItemsData> = graphql::query(
        api,
        graphql::PROJECT_ITEM_COUNT,
        json!({ "project": board.id }),
    )
    .await?;

    data.node
        .map(|n| n.items.total_count)
        .ok_or_else(|| Error::NotFound(format!("project node {}", board.id)))
}
