//! PRD to issue conversion
//!
//! Level-2 headings become parent issues and level-3 headings become
//! sub-issues. All issues from one file share labels derived from its name.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::headings::segment;
use super::{file_name, IssueSpec};
use crate::Result;

static FILENAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--|_|\.").expect("valid regex"));

/// File name parts that never become labels
const IGNORED_PARTS: &[&str] = &["prd", "md", "mvp", "roadmap"];

/// Labels derived from a PRD file name
///
/// `WebDev--MVP_prd.md` yields `["webdev"]`.
pub fn filename_labels(file_name: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for part in FILENAME_SEPARATORS.split(file_name) {
        let part = part.to_lowercase();
        if part.is_empty() || IGNORED_PARTS.contains(&part.as_str()) || labels.contains(&part) {
            continue;
        }
        labels.push(part);
    }
    labels
}

/// Read and parse a PRD file into issues
pub fn load_prd_issues(path: &Path) -> Result<Vec<IssueSpec>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_prd_issues(&file_name(path), &content))
}

/// Parse a PRD document into issues
///
/// Headings mentioning "table of contents" yield nothing but still end the
/// preceding issue. Sub-issue bodies name their parent.
pub fn parse_prd_issues(file_name: &str, content: &str) -> Vec<IssueSpec> {
    let labels = filename_labels(file_name);
    let mut parent: Option<String> = None;
    let mut issues = Vec::new();

    for section in segment(content, 2..=3) {
        if section.heading.to_lowercase().contains("table of contents") {
            if section.level == 2 {
                parent = None;
            }
            continue;
        }

        let body = match (section.level, parent.as_deref()) {
            (3, Some(parent)) if section.body.is_empty() => format!("Part of: {}", parent),
            (3, Some(parent)) => format!("{}\n\nPart of: {}", section.body, parent),
            _ => section.body,
        };
        if section.level == 2 {
            parent = Some(section.heading.clone());
        }

        debug!(title = %section.heading, level = section.level, "Parsed PRD issue");
        let mut issue = IssueSpec::new(section.heading, body);
        issue.labels = labels.clone();
        issues.push(issue);
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_labels() {
        assert_eq!(filename_labels("WebDev--PRD.md"), vec!["webdev"]);
        assert_eq!(filename_labels("data_science_mvp_prd.md"), vec!["data", "science"]);
        assert_eq!(filename_labels("UX--Roadmap.md"), vec!["ux"]);
    }

    #[test]
    fn test_table_of_contents_is_skipped() {
        let doc = "\
## Overview
Intro text.
### Table of Contents
- Overview
- Goals
### Goals
Ship it.
";
        let issues = parse_prd_issues("ux_prd.md", doc);
        let titles: Vec<_> = issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Overview", "Goals"]);

        assert_eq!(issues[0].body, "Intro text.");
        assert_eq!(issues[1].body, "Ship it.\n\nPart of: Overview");
        assert!(!issues[0].body.contains("- Goals"));
    }

    #[test]
    fn test_parent_and_sub_issues_share_labels() {
        let doc = "## Auth\nUsers log in.\n### Login form\n### Password reset\nEmail link.\n## Reports\n";
        let issues = parse_prd_issues("WebDev--PRD.md", doc);

        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|i| i.labels == vec!["webdev"]));
        assert_eq!(issues[1].body, "Part of: Auth");
        assert_eq!(issues[2].body, "Email link.\n\nPart of: Auth");
        assert_eq!(issues[3].body, "");
    }

    #[test]
    fn test_sub_issue_without_parent() {
        let issues = parse_prd_issues("x_prd.md", "### Orphan\ntext\n");
        assert_eq!(issues[0].body, "text");
    }
}
