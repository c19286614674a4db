//! Heading-based segmentation of markdown documents

use std::ops::RangeInclusive;

/// A heading and the text it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Number of leading `#`
    pub level: usize,
    /// Heading text without the `#` markers
    pub heading: String,
    /// 1-based line number of the heading
    pub line: usize,
    /// Trimmed body text
    pub body: String,
}

/// Parse an ATX heading line, returning its level and text
///
/// `## Title` yields `(2, "Title")`. A run of `#` without a following space
/// (`#hashtag`) is not a heading.
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_end();
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }

    let rest = &trimmed[level..];
    if rest.is_empty() {
        return Some((level, ""));
    }
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((level, rest.trim()))
}

/// Split a document into sections opened by headings within `levels`
///
/// A section runs until the next heading whose level is at most the deepest
/// level in `levels`; deeper headings stay in the body. Headings shallower than
/// the range close the current section without opening a new one. Fenced code
/// blocks are never treated as headings.
pub fn segment(content: &str, levels: RangeInclusive<usize>) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<(Section, Vec<&str>)> = None;
    let mut in_fence = false;

    for (idx, line) in content.lines().enumerate() {
        let fence = line.trim_start().starts_with("```");
        if fence {
            in_fence = !in_fence;
        }

        let heading = if in_fence || fence {
            None
        } else {
            parse_heading(line)
        };

        match heading {
            Some((level, text)) if level <= *levels.end() => {
                if let Some((section, body)) = current.take() {
                    sections.push(finish(section, &body));
                }
                if levels.contains(&level) {
                    let section = Section {
                        level,
                        heading: text.to_string(),
                        line: idx + 1,
                        body: String::new(),
                    };
                    current = Some((section, Vec::new()));
                }
            }
            _ => {
                if let Some((_, body)) = current.as_mut() {
                    body.push(line);
                }
            }
        }
    }

    if let Some((section, body)) = current.take() {
        sections.push(finish(section, &body));
    }

    sections
}

fn finish(mut section: Section, body: &[&str]) -> Section {
    section.body = body.join("\n").trim().to_string();
    section
}
