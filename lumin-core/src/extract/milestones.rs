//! Milestone extraction from roadmap documents
//!
//! Milestones are level-2 headings of the form `## Title (Timeframe)`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::headings::segment;
use super::timeframe::{due_date, DUE_DATE_FORMAT};
use crate::Result;

/// A milestone parsed from a roadmap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSpec {
    pub title: String,
    pub description: String,
    pub due_on: Option<DateTime<Utc>>,
}

impl MilestoneSpec {
    /// Due date in the format the milestones endpoint accepts
    pub fn due_on_string(&self) -> Option<String> {
        self.due_on.map(|d| d.format(DUE_DATE_FORMAT).to_string())
    }
}

/// Read and parse a roadmap file, dating milestones from now
pub fn load_milestones(path: &Path) -> Result<Vec<MilestoneSpec>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_milestones(&content, Utc::now()))
}

/// Parse milestones out of a roadmap document
pub fn parse_milestones(content: &str, now: DateTime<Utc>) -> Vec<MilestoneSpec> {
    segment(content, 2..=2)
        .into_iter()
        .filter_map(|section| {
            let (title, timeframe) = split_timeframe(&section.heading);
            if title.is_empty() {
                return None;
            }
            let milestone = MilestoneSpec {
                title: title.to_string(),
                description: section.body,
                due_on: timeframe.and_then(|t| due_date(t, now)),
            };
            info!(title = %milestone.title, "Found milestone");
            Some(milestone)
        })
        .collect()
}

/// `Phase 1: Foundation (Weeks 1-3)` -> (`Phase 1: Foundation`, `Weeks 1-3`)
fn split_timeframe(heading: &str) -> (&str, Option<&str>) {
    if let Some(inner) = heading.strip_suffix(')') {
        if let Some((title, timeframe)) = inner.rsplit_once('(') {
            return (title.trim(), Some(timeframe.trim()));
        }
    }
    (heading.trim(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_split_timeframe() {
        assert_eq!(
            split_timeframe("Phase 1: Foundation (Weeks 1-3)"),
            ("Phase 1: Foundation", Some("Weeks 1-3"))
        );
        assert_eq!(split_timeframe("Launch"), ("Launch", None));
    }

    #[test]
    fn test_parse_milestones() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let roadmap = "\
# Roadmap

## Phase 1 (Weeks 1-3)
Set up infrastructure.

### Deliverables
- CI

## Phase 2 (Month 2)
Build features.

## Beyond
Open ended.
";
        let milestones = parse_milestones(roadmap, now);
        assert_eq!(milestones.len(), 3);

        assert_eq!(milestones[0].title, "Phase 1");
        assert_eq!(milestones[0].due_on, Some(now + Duration::weeks(3)));
        assert!(milestones[0].description.contains("### Deliverables"));

        assert_eq!(milestones[1].due_on, Some(now + Duration::days(60)));
        assert_eq!(
            milestones[1].due_on_string().as_deref(),
            Some("2025-04-30T00:00:00Z")
        );

        assert_eq!(milestones[2].due_on, None);
        assert_eq!(milestones[2].due_on_string(), None);
    }
}
