//! Markdown entity extraction
//!
//! PRD and roadmap documents are turned into descriptors the creators in
//! `lumin-github` materialise: epics and issues become [`IssueSpec`]s,
//! roadmap phases become [`MilestoneSpec`]s.

pub mod epics;
pub mod headings;
pub mod milestones;
pub mod prd;
pub mod timeframe;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

pub use epics::{parse_epics, EpicSpec};
pub use milestones::{parse_milestones, MilestoneSpec};
pub use prd::parse_prd_issues;

/// An issue to be created, as stored in the issues export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSpec {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Milestone title, resolved to a number at creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
}

impl IssueSpec {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            labels: Vec::new(),
            milestone: None,
            assignees: None,
        }
    }
}

/// Load and validate an issues export file
///
/// The file must hold a JSON array whose entries each carry a string `title`
/// and `body`. Errors name the offending entry (1-based) and field.
pub fn load_issue_specs(path: &Path) -> Result<Vec<IssueSpec>> {
    let contents = std::fs::read_to_string(path)?;
    parse_issue_specs(&contents)
}

/// Validate and decode an issues export document
pub fn parse_issue_specs(contents: &str) -> Result<Vec<IssueSpec>> {
    let value: serde_json::Value = serde_json::from_str(contents)
        .map_err(|e| Error::Parse(format!("Invalid issues JSON: {}", e)))?;

    let entries = value
        .as_array()
        .ok_or_else(|| Error::InvalidInput("Issues file must contain a JSON array".to_string()))?;

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            for field in ["title", "body"] {
                if !entry.get(field).is_some_and(|v| v.is_string()) {
                    return Err(Error::InvalidInput(format!(
                        "Issue {} is missing required field '{}'",
                        idx + 1,
                        field
                    )));
                }
            }
            serde_json::from_value(entry.clone())
                .map_err(|e| Error::InvalidInput(format!("Issue {}: {}", idx + 1, e)))
        })
        .collect()
}

/// Write an issues export file as pretty-printed JSON
pub fn write_issue_specs(path: &Path, specs: &[IssueSpec]) -> Result<()> {
    let json = serde_json::to_string_pretty(specs)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Markdown files an extractor should read
///
/// A file path is returned as-is. A directory yields its direct entries whose
/// names end with one of `suffixes`, sorted by name. A missing path is an error.
pub fn discover_files(path: &Path, suffixes: &[&str]) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Path not found: {}",
            path.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if entry.file_type()?.is_file() && suffixes.iter().any(|s| name.ends_with(s)) {
            debug!(file = %name, "Discovered document");
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// File name component used for labels and backlinks
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_issue_specs() {
        let json = r#"[
            {"title": "One", "body": "first", "labels": ["project"], "milestone": "Phase 1"},
            {"title": "Two", "body": "second", "assignees": ["octocat"]}
        ]"#;
        let specs = parse_issue_specs(json).unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].milestone.as_deref(), Some("Phase 1"));
        assert!(specs[1].labels.is_empty());
        assert_eq!(specs[1].assignees, Some(vec!["octocat".to_string()]));
    }

    #[test]
    fn test_missing_body_names_entry() {
        let json = r#"[{"title": "One", "body": "ok"}, {"title": "Two"}]"#;
        let err = parse_issue_specs(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Issue 2 is missing required field 'body'"
        );
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = parse_issue_specs("[{\"title\": ").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_non_array_is_rejected() {
        let err = parse_issue_specs(r#"{"title": "x", "body": "y"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_write_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.json");
        let mut spec = IssueSpec::new("Title", "Body");
        spec.labels = vec!["webdev".to_string()];

        write_issue_specs(&path, &[spec.clone()]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("milestone"));
        assert_eq!(load_issue_specs(&path).unwrap(), vec![spec]);
    }

    #[test]
    fn test_discover_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("WebDev--PRD.md"), "").unwrap();
        std::fs::write(dir.path().join("ux_prd.md"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();

        let files = discover_files(dir.path(), &["PRD.md", "_prd.md"]).unwrap();
        let names: Vec<_> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["WebDev--PRD.md", "ux_prd.md"]);

        let single = discover_files(&dir.path().join("notes.md"), &["PRD.md"]).unwrap();
        assert_eq!(single.len(), 1);

        assert!(discover_files(&dir.path().join("missing"), &["PRD.md"]).is_err());
    }
}
