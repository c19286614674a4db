//! Keyword index over markdown documentation
//!
//! Every heading in every `.md` file under a directory is indexed by the
//! keywords of its text and the first sentence of its body. Issues are matched
//! against the index by shared keywords.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::extract::headings::segment;
use crate::{Error, Result};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "else", "when", "at", "from", "by", "for",
    "with", "about", "to", "in", "on",
];

/// Marker embedded in generated comments so an issue is linked only once
pub const DOC_LINKS_MARKER: &str = "<!-- lumin:doc-links -->";

/// An indexed documentation section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocSection {
    /// Path relative to the parent of the indexed directory
    pub file: String,
    pub heading: String,
    pub level: usize,
    /// 1-based line of the heading
    pub line: usize,
    /// Blob URL pointing at the heading line
    pub url: String,
}

impl DocSection {
    pub fn file_name(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }
}

/// Keyword -> sections index
#[derive(Debug, Default)]
pub struct DocIndex {
    sections: Vec<DocSection>,
    keywords: BTreeMap<String, Vec<usize>>,
}

/// Keywords of a heading plus the first sentence of its content
///
/// Words are lowercased, stopwords and words of two characters or fewer are
/// dropped, and the heading itself (punctuation removed) is added as a phrase.
pub fn extract_keywords(heading: &str, content: &str) -> BTreeSet<String> {
    let first_sentence = content.split('.').next().unwrap_or_default();
    let combined = format!("{} {}", heading, first_sentence).to_lowercase();

    let mut keywords: BTreeSet<String> = WORD
        .find_iter(&combined)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 2 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect();

    let phrase = PUNCTUATION
        .replace_all(&heading.to_lowercase(), "")
        .trim()
        .to_string();
    if !phrase.is_empty() {
        keywords.insert(phrase);
    }
    keywords
}

impl DocIndex {
    /// Index every markdown file below `docs_dir`
    ///
    /// `blob_base` is the URL prefix of the repository tree, e.g.
    /// `https://github.com/owner/repo/blob/main`. Unreadable files are
    /// logged and skipped; a missing directory is an error.
    pub fn build(docs_dir: &Path, blob_base: &str) -> Result<Self> {
        if !docs_dir.is_dir() {
            return Err(Error::InvalidInput(format!(
                "Documentation directory not found: {}",
                docs_dir.display()
            )));
        }

        let root = docs_dir.parent().unwrap_or(docs_dir);
        let mut files = Vec::new();
        collect_markdown(docs_dir, &mut files)?;
        files.sort();
        info!(count = files.len(), dir = %docs_dir.display(), "Found markdown files");

        let mut index = Self::default();
        for path in files {
            let rel = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            match std::fs::read_to_string(&path) {
                Ok(content) => index.add_document(&rel, &content, blob_base),
                Err(e) => warn!(file = %rel, error = %e, "Failed to read document"),
            }
        }

        info!(keywords = index.keywords.len(), sections = index.sections.len(), "Built doc index");
        Ok(index)
    }

    /// Index one document under its repository-relative path
    pub fn add_document(&mut self, rel_path: &str, content: &str, blob_base: &str) {
        for section in segment(content, 1..=6) {
            let keywords = extract_keywords(&section.heading, &section.body);
            let id = self.sections.len();
            self.sections.push(DocSection {
                file: rel_path.to_string(),
                url: format!(
                    "{}/{}#L{}",
                    blob_base.trim_end_matches('/'),
                    rel_path,
                    section.line
                ),
                heading: section.heading,
                level: section.level,
                line: section.line,
            });
            for keyword in keywords {
                self.keywords.entry(keyword).or_default().push(id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Up to `limit` sections sharing the most keywords with an issue
    pub fn find_matches(&self, title: &str, body: &str, limit: usize) -> Vec<&DocSection> {
        let mut scores: BTreeMap<usize, usize> = BTreeMap::new();
        for keyword in extract_keywords(title, body) {
            for &id in self.keywords.get(&keyword).into_iter().flatten() {
                *scores.entry(id).or_default() += 1;
            }
        }

        let mut ranked: Vec<(usize, usize)> = scores.into_iter().collect();
        // Ties keep index order, which follows file then line.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(id, _)| &self.sections[id])
            .collect()
    }
}

/// Comment body listing related documentation sections
pub fn render_comment(matches: &[&DocSection]) -> String {
    let mut body = String::from("## Related Documentation\n\n");
    body.push_str(
        "These documentation sections may be related to this issue:\n\n",
    );
    for (i, doc) in matches.iter().enumerate() {
        body.push_str(&format!(
            "{}. **[{}]({})** in [{}]({})\n",
            i + 1,
            doc.heading,
            doc.url,
            doc.file_name(),
            doc.url
        ));
    }
    body.push_str("\n---\n*Generated by `lumin link-docs`.*\n");
    body.push_str(DOC_LINKS_MARKER);
    body
}

fn collect_markdown(dir: &Path, files: &mut Vec<std::path::PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_markdown(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BASE: &str = "https://github.com/uelkerd/lumin-ai/blob/main";

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords("Trust Metrics", "Compute the trust score for each survey. Ignored.");
        assert!(keywords.contains("trust"));
        assert!(keywords.contains("metrics"));
        assert!(keywords.contains("survey"));
        assert!(keywords.contains("trust metrics"));
        assert!(!keywords.contains("the"));
        assert!(!keywords.contains("for"));
        assert!(!keywords.contains("ignored"));
    }

    #[test]
    fn test_find_matches_ranks_by_shared_keywords() {
        let mut index = DocIndex::default();
        index.add_document(
            "docs/architecture/WebDev--PRD.md",
            "# Dashboard\nCharts for trust metrics.\n## Authentication\nOAuth login flow.\n",
            BASE,
        );

        let matches = index.find_matches("Add OAuth login", "", 3);
        assert_eq!(matches[0].heading, "Authentication");
        assert_eq!(
            matches[0].url,
            format!("{}/docs/architecture/WebDev--PRD.md#L3", BASE)
        );
        assert_eq!(matches[0].file_name(), "WebDev--PRD.md");

        assert!(index.find_matches("zzz", "", 3).is_empty());
    }

    #[test]
    fn test_build_walks_subdirectories() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(docs.join("architecture")).unwrap();
        std::fs::write(docs.join("README.md"), "# Overview\nProject intro.\n").unwrap();
        std::fs::write(docs.join("architecture/UX--PRD.md"), "## Personas\nWho uses it.\n").unwrap();
        std::fs::write(docs.join("notes.txt"), "# Not markdown\n").unwrap();

        let index = DocIndex::build(&docs, BASE).unwrap();
        assert_eq!(index.len(), 2);

        let matches = index.find_matches("Personas research", "", 3);
        assert_eq!(matches[0].file, "docs/architecture/UX--PRD.md");
    }

    #[test]
    fn test_missing_directory() {
        assert!(DocIndex::build(Path::new("/nonexistent/docs"), BASE).is_err());
    }

    #[test]
    fn test_render_comment() {
        let mut index = DocIndex::default();
        index.add_document("docs/a.md", "# Alpha\ntext\n", BASE);
        let matches = index.find_matches("alpha", "", 3);
        let comment = render_comment(&matches);

        assert!(comment.starts_with("## Related Documentation"));
        assert!(comment.contains("1. **[Alpha](https://github.com/uelkerd/lumin-ai/blob/main/docs/a.md#L1)** in [a.md]"));
        assert!(comment.ends_with(DOC_LINKS_MARKER));
    }
}
