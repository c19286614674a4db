//! Canonical label taxonomy
//!
//! Every issue is expected to carry exactly one *track* label (which workstream
//! it belongs to) and exactly one *priority* label. A small set of pass-through
//! labels (`epic`, `feature`, ...) is allowed alongside them; anything else is
//! non-canonical. All comparisons are case-insensitive.
//!
//! The taxonomy is a plain value: it is built from defaults or the `[taxonomy]`
//! section of the config file and handed to whatever needs it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Colour used for labels the taxonomy knows nothing about
pub const DEFAULT_LABEL_COLOR: &str = "6f42c1";

/// A label the taxonomy governs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDef {
    /// Label name (lowercase)
    pub name: String,
    /// Hex colour without the leading `#`
    pub color: String,
    /// Short description shown in the GitHub UI
    #[serde(default)]
    pub description: String,
}

impl LabelDef {
    fn new(name: &str, color: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            description: description.to_string(),
        }
    }
}

/// Derived category of a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCategory {
    Track,
    Priority,
    Other,
}

/// The canonical label set plus repair rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
    /// Workstream labels, exactly one expected per issue
    pub tracks: Vec<LabelDef>,
    /// Urgency labels, exactly one expected per issue
    pub priorities: Vec<LabelDef>,
    /// Canonical labels outside the track/priority rules
    pub allowed: Vec<LabelDef>,
    /// Non-canonical label -> canonical replacement
    pub mappings: BTreeMap<String, String>,
    /// Short track names (as used in PRD file names) -> track label
    pub track_aliases: BTreeMap<String, String>,
    /// Track label added to issues that have none
    pub default_track: String,
    /// Priority label added to issues that have none
    pub default_priority: String,
}

impl Default for Taxonomy {
    fn default() -> Self {
        let tracks = vec![
            LabelDef::new("deep-learning", "d73a4a", "Deep learning track"),
            LabelDef::new("data-science", "008672", "Data science track"),
            LabelDef::new("web-development", "0075ca", "Web development track"),
            LabelDef::new("ux-design", "fbca04", "UX design track"),
            LabelDef::new("project", "5319e7", "Cross-cutting project work"),
        ];
        let priorities = vec![
            LabelDef::new("priority/highest", "b60205", "Drop everything"),
            LabelDef::new("priority/high", "d93f0b", "Next up"),
            LabelDef::new("priority/medium", "fef2c0", "Planned"),
            LabelDef::new("priority/low", "c2e0c6", "When time allows"),
            LabelDef::new("priority/lowest", "bfdadc", "Nice to have"),
        ];
        let allowed = vec![
            LabelDef::new("epic", DEFAULT_LABEL_COLOR, "Coarse-grained work item from a PRD"),
            LabelDef::new("feature", "a2eeef", "PRD feature"),
            LabelDef::new("component", "1d76db", "PRD component"),
            LabelDef::new("service", "0e8a16", "PRD service"),
            LabelDef::new("roadmap", "c5def5", "Roadmap item"),
        ];

        let mappings = [
            ("bug", "project"),
            ("enhancement", "project"),
            ("documentation", "project"),
            ("dependencies", "project"),
            ("python", "data-science"),
            ("ux", "ux-design"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let track_aliases = [
            ("webdev", "web-development"),
            ("datasci", "data-science"),
            ("deeplearn", "deep-learning"),
            ("ux", "ux-design"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            tracks,
            priorities,
            allowed,
            mappings,
            track_aliases,
            default_track: "project".to_string(),
            default_priority: "priority/medium".to_string(),
        }
    }
}

/// A single taxonomy rule an issue breaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Labels outside the canonical set
    NonCanonical(Vec<String>),
    /// No track label at all
    MissingTrack,
    /// More than one track label
    MultipleTracks(Vec<String>),
    /// Priority label count other than one
    PriorityCount(usize),
}

impl Violation {
    pub fn is_track(&self) -> bool {
        matches!(self, Violation::MissingTrack | Violation::MultipleTracks(_))
    }

    pub fn is_priority(&self) -> bool {
        matches!(self, Violation::PriorityCount(_))
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NonCanonical(labels) => {
                write!(f, "has non-canonical labels: {}", labels.join(", "))
            }
            Violation::MissingTrack => write!(f, "is missing a track label"),
            Violation::MultipleTracks(labels) => {
                write!(f, "has multiple track labels: {}", labels.join(", "))
            }
            Violation::PriorityCount(n) => {
                write!(f, "must have exactly one priority label (found {})", n)
            }
        }
    }
}

/// One step of a label repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    Mapped { from: String, to: String },
    AddedTrack(String),
    AddedPriority(String),
    DroppedPriorities { kept: String, dropped: Vec<String> },
}

impl fmt::Display for LabelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelChange::Mapped { from, to } => write!(f, "replacing '{}' with '{}'", from, to),
            LabelChange::AddedTrack(label) => write!(f, "adding default track label '{}'", label),
            LabelChange::AddedPriority(label) => {
                write!(f, "adding default priority label '{}'", label)
            }
            LabelChange::DroppedPriorities { kept, dropped } => write!(
                f,
                "keeping priority label '{}', dropping {}",
                kept,
                dropped.join(", ")
            ),
        }
    }
}

/// Outcome of repairing one label set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCorrection {
    pub before: BTreeSet<String>,
    pub after: BTreeSet<String>,
    pub changes: Vec<LabelChange>,
}

impl LabelCorrection {
    /// True when a write is needed
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

impl Taxonomy {
    /// Lowercased, trimmed, de-duplicated label set
    pub fn normalize<I, S>(labels: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|l| l.as_ref().trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Every canonical label, tracks first
    pub fn canonical_labels(&self) -> impl Iterator<Item = &LabelDef> {
        self.tracks
            .iter()
            .chain(self.priorities.iter())
            .chain(self.allowed.iter())
    }

    pub fn definition(&self, name: &str) -> Option<&LabelDef> {
        self.canonical_labels()
            .find(|def| def.name.eq_ignore_ascii_case(name))
    }

    pub fn is_canonical(&self, name: &str) -> bool {
        self.definition(name).is_some()
    }

    pub fn category(&self, name: &str) -> LabelCategory {
        if self.tracks.iter().any(|d| d.name.eq_ignore_ascii_case(name)) {
            LabelCategory::Track
        } else if self.priorities.iter().any(|d| d.name.eq_ignore_ascii_case(name)) {
            LabelCategory::Priority
        } else {
            LabelCategory::Other
        }
    }

    /// Colour for a label, falling back to [`DEFAULT_LABEL_COLOR`]
    pub fn color_for(&self, name: &str) -> &str {
        self.definition(name)
            .map(|d| d.color.as_str())
            .unwrap_or(DEFAULT_LABEL_COLOR)
    }

    /// Track label for a short track name such as `WebDev`
    ///
    /// Names that are already track labels pass through; unknown names fall
    /// back to the default track.
    pub fn track_for(&self, name: &str) -> String {
        let key = name.trim().to_lowercase();
        if self.category(&key) == LabelCategory::Track {
            return key;
        }
        self.track_aliases
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.default_track.clone())
    }

    fn matching(&self, labels: &BTreeSet<String>, category: LabelCategory) -> Vec<String> {
        labels
            .iter()
            .filter(|l| self.category(l) == category)
            .cloned()
            .collect()
    }

    /// Check a label set against the taxonomy without changing it
    pub fn validate<I, S>(&self, labels: I) -> Vec<Violation>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = Self::normalize(labels);
        let mut violations = Vec::new();

        let unknown: Vec<String> = labels
            .iter()
            .filter(|l| !self.is_canonical(l))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            violations.push(Violation::NonCanonical(unknown));
        }

        let tracks = self.matching(&labels, LabelCategory::Track);
        match tracks.len() {
            0 => violations.push(Violation::MissingTrack),
            1 => {}
            _ => violations.push(Violation::MultipleTracks(tracks)),
        }

        let priorities = self.matching(&labels, LabelCategory::Priority);
        if priorities.len() != 1 {
            violations.push(Violation::PriorityCount(priorities.len()));
        }

        violations
    }

    /// Repair a label set
    ///
    /// Mapped non-canonical labels are replaced, a missing track or priority
    /// gets the default, and surplus priorities are reduced to the one that
    /// sorts first. Multiple tracks and unmapped labels are left alone.
    pub fn correct<I, S>(&self, labels: I) -> LabelCorrection
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = Self::normalize(labels);
        let mut after = before.clone();
        let mut changes = Vec::new();

        for label in before.iter().filter(|l| !self.is_canonical(l)) {
            if let Some(target) = self.mappings.get(label.as_str()) {
                after.remove(label);
                after.insert(target.to_lowercase());
                changes.push(LabelChange::Mapped {
                    from: label.clone(),
                    to: target.to_lowercase(),
                });
            }
        }

        if self.matching(&after, LabelCategory::Track).is_empty() {
            let track = self.default_track.to_lowercase();
            after.insert(track.clone());
            changes.push(LabelChange::AddedTrack(track));
        }

        // BTreeSet iteration is sorted, so the first match is the string-sort minimum.
        let priorities = self.matching(&after, LabelCategory::Priority);
        match priorities.split_first() {
            None => {
                let priority = self.default_priority.to_lowercase();
                after.insert(priority.clone());
                changes.push(LabelChange::AddedPriority(priority));
            }
            Some((kept, rest)) if !rest.is_empty() => {
                for label in rest {
                    after.remove(label);
                }
                changes.push(LabelChange::DroppedPriorities {
                    kept: kept.clone(),
                    dropped: rest.to_vec(),
                });
            }
            Some(_) => {}
        }

        LabelCorrection {
            before,
            after,
            changes,
        }
    }
}
