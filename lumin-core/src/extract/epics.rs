//! Epic extraction from PRD documents
//!
//! Epics are level-3 headings of the form `### Category: Title`.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::headings::segment;
use super::{file_name, IssueSpec};
use crate::taxonomy::Taxonomy;
use crate::Result;

static MILESTONE_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:phase|week)\s+(\d+)").expect("valid regex"));

/// Categories that carry a matching label
const LABELLED_CATEGORIES: &[&str] = &["feature", "component", "service"];

/// An epic parsed from a PRD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicSpec {
    /// e.g. `Feature`, `Component`, `Service`
    pub category: String,
    /// `Category: Title`
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub milestone: Option<String>,
}

impl From<EpicSpec> for IssueSpec {
    fn from(epic: EpicSpec) -> Self {
        IssueSpec {
            title: epic.title,
            body: epic.body,
            labels: epic.labels,
            milestone: epic.milestone,
            assignees: None,
        }
    }
}

/// Read and parse a PRD file
pub fn load_epics(path: &Path, taxonomy: &Taxonomy) -> Result<Vec<EpicSpec>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_epics(&file_name(path), &content, taxonomy))
}

/// Parse epics out of a PRD document
///
/// The track label comes from the part of `file_name` before `--`
/// (`WebDev--PRD.md` is the web-development track).
pub fn parse_epics(file_name: &str, content: &str, taxonomy: &Taxonomy) -> Vec<EpicSpec> {
    let track = match file_name.split_once("--") {
        Some((prefix, _)) => taxonomy.track_for(prefix),
        None => taxonomy.default_track.clone(),
    };

    let mut epics = Vec::new();
    for section in segment(content, 3..=3) {
        let Some((category, title)) = section.heading.split_once(':') else {
            continue;
        };
        let (category, title) = (category.trim(), title.trim());
        if category.is_empty() || title.is_empty() {
            continue;
        }

        let milestone = MILESTONE_HINT
            .captures(&section.body)
            .map(|caps| format!("Phase {}", &caps[1]));

        let mut labels = vec![track.clone(), "epic".to_string()];
        let lower = category.to_lowercase();
        if LABELLED_CATEGORIES.contains(&lower.as_str()) {
            labels.push(lower);
        }

        let body = format!(
            "{}\n\n---\n**Source**: [{file} (line {line})](../../docs/architecture/{file}#L{line})",
            section.body,
            file = file_name,
            line = section.line,
        );

        let epic = EpicSpec {
            category: category.to_string(),
            title: format!("{}: {}", category, title),
            body,
            labels,
            milestone,
        };
        info!(title = %epic.title, "Found epic");
        epics.push(epic);
    }

    epics
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRD: &str = "\
# Web Development PRD

### Feature: User Authentication
Login and signup flows, delivered in Phase 2.

#### Details
OAuth only.

### Component: Dashboard
Charts for trust metrics.

### Overview without category
Not an epic.

### Service: Export API
Starts Week 4.
";

    #[test]
    fn test_parse_epics() {
        let epics = parse_epics("WebDev--PRD.md", PRD, &Taxonomy::default());
        assert_eq!(epics.len(), 3);

        let auth = &epics[0];
        assert_eq!(auth.title, "Feature: User Authentication");
        assert_eq!(auth.category, "Feature");
        assert_eq!(auth.labels, vec!["web-development", "epic", "feature"]);
        assert_eq!(auth.milestone.as_deref(), Some("Phase 2"));
        assert!(auth.body.contains("#### Details\nOAuth only."));
        assert!(auth.body.ends_with(
            "---\n**Source**: [WebDev--PRD.md (line 3)](../../docs/architecture/WebDev--PRD.md#L3)"
        ));

        assert_eq!(epics[1].milestone, None);
        assert_eq!(epics[2].milestone.as_deref(), Some("Phase 4"));
        assert_eq!(epics[2].labels[2], "service");
    }

    #[test]
    fn test_uncategorised_heading_closes_previous_epic() {
        let epics = parse_epics("WebDev--PRD.md", PRD, &Taxonomy::default());
        assert!(!epics[1].body.contains("Not an epic"));
    }

    #[test]
    fn test_track_defaults_without_prefix() {
        let epics = parse_epics("PRD.md", "### Feature: Thing\nbody\n", &Taxonomy::default());
        assert_eq!(epics[0].labels[0], "project");
    }

    #[test]
    fn test_epic_labels_pass_validation() {
        let taxonomy = Taxonomy::default();
        let epics = parse_epics("DataSci--PRD.md", PRD, &taxonomy);
        let mut labels = epics[0].labels.clone();
        labels.push(taxonomy.default_priority.clone());
        assert!(taxonomy.validate(&labels).is_empty());
    }

    #[test]
    fn test_into_issue_spec() {
        let epic = parse_epics("UX--PRD.md", PRD, &Taxonomy::default()).remove(0);
        let spec = IssueSpec::from(epic);
        assert_eq!(spec.labels[0], "ux-design");
        assert_eq!(spec.milestone.as_deref(), Some("Phase 2"));
    }
}
