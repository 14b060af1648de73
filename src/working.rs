use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::article::ArticleRecord;
use crate::frontmatter::{build_frontmatter, strip_frontmatter, IssueDate};
use crate::split::{ArticleParser, ParseError};

static FIRST_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*######(?:[^#]|$)").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("nothing to do: no articles selected")]
    Empty,
}

/// Articles picked by title, by block position, or both.
/// A title selects every record carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub titles: BTreeSet<String>,
    pub positions: BTreeSet<usize>,
}

impl Selection {
    pub fn by_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { titles: titles.into_iter().map(Into::into).collect(), positions: BTreeSet::new() }
    }

    pub fn by_positions<I: IntoIterator<Item = usize>>(positions: I) -> Self {
        Self { titles: BTreeSet::new(), positions: positions.into_iter().collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty() && self.positions.is_empty()
    }

    pub fn matches(&self, record: &ArticleRecord) -> bool {
        self.titles.contains(&record.title) || self.positions.contains(&record.position)
    }

    /// Selected records, in input order.
    pub fn pick<'a>(&self, records: &'a [ArticleRecord]) -> Vec<&'a ArticleRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

impl ArticleParser {
    /// Raw blocks joined with the split marker, ending in a single newline.
    /// Splitting the result again yields the same blocks.
    pub fn rejoin<'a, I>(&self, records: I) -> String
    where
        I: IntoIterator<Item = &'a ArticleRecord>,
    {
        let separator = format!("\n\n{}\n\n", self.split_marker());
        let blocks: Vec<&str> = records.into_iter().map(|r| r.raw.trim_end()).collect();
        if blocks.is_empty() {
            return String::new();
        }
        let mut out = blocks.join(separator.as_str());
        out.push('\n');
        out
    }

    /// Frontmatter from the records' own metadata, then the rejoined blocks.
    /// Not yet normalized.
    pub fn render_selection(
        &self,
        selected: &[&ArticleRecord],
        title: &str,
        date: IssueDate,
    ) -> Result<String, SelectionError> {
        if selected.is_empty() {
            return Err(SelectionError::Empty);
        }
        let categories: Vec<&str> = selected.iter().flat_map(|r| r.categories.iter()).map(String::as_str).collect();
        let tags: Vec<&str> = selected.iter().flat_map(|r| r.tags.iter()).map(String::as_str).collect();
        let locations: Vec<&str> = selected.iter().flat_map(|r| r.locations.iter()).map(String::as_str).collect();
        let fm = build_frontmatter(title, date, &categories, &tags, &locations);
        Ok(format!("{}\n{}", fm, self.rejoin(selected.iter().copied())))
    }

    /// Re-split `text`, drop the selected articles and rejoin the rest.
    /// Removing everything yields an empty string; so does empty input.
    pub fn remaining_after_removal(&self, text: &str, removed: &Selection) -> Result<String, ParseError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let outcome = self.parse(text)?;
        let total = outcome.records.len();
        let remaining: Vec<&ArticleRecord> = outcome.records.iter().filter(|r| !removed.matches(r)).collect();
        debug!(total, remaining = remaining.len(), "updated working text");
        Ok(self.rejoin(remaining))
    }
}

/// Working text from an uploaded source: frontmatter removed, everything
/// before the first heading dropped, no leading newlines and exactly one
/// trailing newline.
pub fn prepare_working_text(source: &str) -> String {
    let body = strip_frontmatter(source);
    let body = match FIRST_HEADING_RE.find(body) {
        Some(m) => &body[m.start()..],
        None => body,
    };
    let body = body.trim_start_matches(|c: char| c == '\n' || c == '\r');
    let trimmed = body.trim_end_matches(|c: char| c == '\n' || c == '\r');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}\n", trimmed)
}
