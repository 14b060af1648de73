use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::article::{extract_article, ArticleRecord, ExtractError};
use crate::config::Config;

static HEADING_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*######(?:[^#]|$)").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no articles recognized in input")]
    NoArticles { blocks: usize },
}

/// A block that was skipped while parsing; the rest of the input still parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParseWarning {
    MissingTitle { block: usize, preview: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::MissingTitle { block, preview } => {
                write!(f, "skipped block {}: missing title ({:?})", block, preview)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseOutcome {
    pub records: Vec<ArticleRecord>,
    pub warnings: Vec<ParseWarning>,
}

/// Splits a text blob into article blocks and extracts records from them.
#[derive(Debug, Clone)]
pub struct ArticleParser {
    split_marker: String,
    min_block_chars: usize,
}

impl ArticleParser {
    pub fn new(cfg: &Config) -> Self {
        Self { split_marker: cfg.split_marker.trim().to_string(), min_block_chars: cfg.min_block_chars }
    }

    pub fn split_marker(&self) -> &str {
        &self.split_marker
    }

    /// Split on the split marker; surrounding whitespace is insignificant.
    /// Input without markers that holds several headings is split on
    /// heading lines instead. Blocks are trimmed; short ones are dropped.
    pub fn split_blocks(&self, text: &str) -> Vec<String> {
        let blocks: Vec<String> = text
            .split(self.split_marker.as_str())
            .map(str::trim)
            .filter(|b| self.keep(b))
            .map(str::to_string)
            .collect();

        if blocks.len() == 1 {
            let by_heading = split_on_headings(&blocks[0]);
            if by_heading.len() > 1 {
                let fallback: Vec<String> = by_heading
                    .into_iter()
                    .map(str::trim)
                    .filter(|b| self.keep(b))
                    .map(str::to_string)
                    .collect();
                debug!(blocks = fallback.len(), "no split markers, split on headings");
                return fallback;
            }
        }
        debug!(blocks = blocks.len(), "split on markers");
        blocks
    }

    fn keep(&self, block: &str) -> bool {
        block.chars().count() >= self.min_block_chars
    }

    /// Parse every block. Title-less blocks become warnings unless no
    /// block yields a record at all.
    pub fn parse(&self, text: &str) -> Result<ParseOutcome, ParseError> {
        let blocks = self.split_blocks(text);
        let mut outcome = ParseOutcome::default();
        for (i, block) in blocks.iter().enumerate() {
            match extract_article(block, i) {
                Ok(record) => outcome.records.push(record),
                Err(ExtractError::MissingTitle(_)) => {
                    let preview: String = block.chars().take(40).collect();
                    warn!(block = i, %preview, "skipping block without title");
                    outcome.warnings.push(ParseWarning::MissingTitle { block: i, preview });
                }
            }
        }
        if outcome.records.is_empty() {
            return Err(ParseError::NoArticles { blocks: blocks.len() });
        }
        debug!(records = outcome.records.len(), skipped = outcome.warnings.len(), "parsed articles");
        Ok(outcome)
    }
}

/// Slice `text` at every level-6 heading line. Text before the first
/// heading is kept as its own slice.
fn split_on_headings(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = HEADING_START_RE.find_iter(text).map(|m| m.start()).collect();
    if starts.len() < 2 {
        return vec![text];
    }
    let mut parts = Vec::with_capacity(starts.len() + 1);
    if starts[0] > 0 {
        parts.push(&text[..starts[0]]);
    }
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        parts.push(&text[start..end]);
    }
    parts
}
