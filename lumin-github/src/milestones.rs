//! Milestones and the milestone creator

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lumin_core::MilestoneSpec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::create::{pace, BatchReport};
use crate::{GitHubApi, Result, StateFilter};

/// A repository milestone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: String,
}

/// Payload for `POST /repos/{owner}/{repo}/milestones`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMilestone {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `YYYY-MM-DDTHH:MM:SSZ`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
}

impl From<&MilestoneSpec> for NewMilestone {
    fn from(spec: &MilestoneSpec) -> Self {
        NewMilestone {
            title: spec.title.clone(),
            description: Some(spec.description.clone()).filter(|d| !d.is_empty()),
            due_on: spec.due_on_string(),
        }
    }
}

/// Number of the milestone titled `title`, looked up fresh
pub async fn find_milestone_number(api: &dyn GitHubApi, title: &str) -> Result<Option<u64>> {
    let milestones = api.list_milestones(StateFilter::All).await?;
    Ok(milestones
        .into_iter()
        .find(|m| m.title == title)
        .map(|m| m.number))
}

/// Create milestones whose titles do not exist yet
pub async fn create_milestones(
    api: &dyn GitHubApi,
    specs: &[MilestoneSpec],
    dry_run: bool,
    delay: Duration,
) -> Result<BatchReport> {
    let mut existing: HashSet<String> = api
        .list_milestones(StateFilter::All)
        .await?
        .into_iter()
        .map(|m| m.title)
        .collect();

    let mut report = BatchReport::default();
    for (i, spec) in specs.iter().enumerate() {
        if !existing.insert(spec.title.clone()) {
            info!(title = %spec.title, "Milestone already exists, skipping");
            report.skipped += 1;
            continue;
        }

        let milestone = NewMilestone::from(spec);
        if dry_run {
            info!(
                title = %milestone.title,
                due_on = milestone.due_on.as_deref().unwrap_or("none"),
                "[DRY RUN] Would create milestone"
            );
            report.planned += 1;
            continue;
        }

        match api.create_milestone(&milestone).await {
            Ok(created) => {
                info!(title = %created.title, number = created.number, "Created milestone");
                report.created += 1;
            }
            Err(e) => {
                warn!(title = %milestone.title, error = %e, "Failed to create milestone");
                report.fail(format!("milestone '{}': {}", milestone.title, e));
            }
        }
        pace(i, specs.len(), delay).await;
    }

    Ok(report)
}
