//! Labels and the label creator

use std::collections::HashSet;
use std::time::Duration;

use lumin_core::Taxonomy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::create::{pace, BatchReport};
use crate::{GitHubApi, Result};

/// A repository label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload for `POST /repos/{owner}/{repo}/labels`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLabel {
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewLabel {
    /// Label definition from the taxonomy, or a bare label in the default colour
    pub fn from_taxonomy(taxonomy: &Taxonomy, name: &str) -> Self {
        match taxonomy.definition(name) {
            Some(def) => NewLabel {
                name: def.name.clone(),
                color: def.color.clone(),
                description: Some(def.description.clone()).filter(|d| !d.is_empty()),
            },
            None => NewLabel {
                name: name.to_string(),
                color: taxonomy.color_for(name).to_string(),
                description: None,
            },
        }
    }
}

/// Create whichever of `names` do not exist yet
///
/// Existing labels are listed once; names are compared case-insensitively.
pub async fn ensure_labels(
    api: &dyn GitHubApi,
    taxonomy: &Taxonomy,
    names: &[String],
    dry_run: bool,
    delay: Duration,
) -> Result<BatchReport> {
    let mut existing: HashSet<String> = api
        .list_labels()
        .await?
        .into_iter()
        .map(|l| l.name.to_lowercase())
        .collect();

    let mut report = BatchReport::default();
    let mut pending = Vec::new();
    for name in names {
        if existing.insert(name.to_lowercase()) {
            pending.push(NewLabel::from_taxonomy(taxonomy, name));
        } else {
            report.skipped += 1;
        }
    }

    for (i, label) in pending.iter().enumerate() {
        if dry_run {
            info!(label = %label.name, color = %label.color, "[DRY RUN] Would create label");
            report.planned += 1;
            continue;
        }

        match api.create_label(label).await {
            Ok(created) => {
                info!(label = %created.name, "Created label");
                report.created += 1;
            }
            Err(e) => {
                warn!(label = %label.name, error = %e, "Failed to create label");
                report.fail(format!("label '{}': {}", label.name, e));
            }
        }
        pace(i, pending.len(), delay).await;
    }

    Ok(report)
}

/// Create every canonical label of the taxonomy that is missing
pub async fn create_taxonomy_labels(
    api: &dyn GitHubApi,
    taxonomy: &Taxonomy,
    dry_run: bool,
    delay: Duration,
) -> Result<BatchReport> {
    let names: Vec<String> = taxonomy.canonical_labels().map(|d| d.name.clone()).collect();
    ensure_labels(api, taxonomy, &names, dry_run, delay).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubApi;

    #[tokio::test]
    async fn test_existing_labels_skipped_case_insensitively() {
        let api = StubApi::new().with_labels(&["Project", "epic"]);
        let taxonomy = Taxonomy::default();
        let names = vec![
            "project".to_string(),
            "EPIC".to_string(),
            "web-development".to_string(),
            "custom".to_string(),
        ];

        let report = ensure_labels(&api, &taxonomy, &names, false, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.skipped, 2);
        let created = api.created_labels();
        assert_eq!(created[0].name, "web-development");
        assert_eq!(created[0].color, "0075ca");
        assert_eq!(created[1].color, lumin_core::taxonomy::DEFAULT_LABEL_COLOR);
    }

    #[tokio::test]
    async fn test_duplicate_names_in_input_create_once() {
        let api = StubApi::new();
        let names = vec!["roadmap".to_string(), "Roadmap".to_string()];
        let report = ensure_labels(&api, &Taxonomy::default(), &names, false, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let api = StubApi::new();
        let report = create_taxonomy_labels(&api, &Taxonomy::default(), true, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(report.planned, 15);
        assert_eq!(api.write_count(), 0);
    }
}
