use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*######[ \t]*([^#\r\n][^\r\n]*)").unwrap());
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());

/// One parsed article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Index of the source block in split order.
    pub position: usize,
    pub title: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub locations: Vec<String>,
    /// Verbatim block text plus exactly one trailing newline.
    pub raw: String,
}

/// Lists read from one metadata comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaKey {
    Categories,
    Tags,
    Locations,
}

const META_KEYS: [(&str, MetaKey); 3] = [
    ("categories:", MetaKey::Categories),
    ("tags:", MetaKey::Tags),
    ("orte:", MetaKey::Locations),
];

/// Parse the inside of a `<!-- ... -->` metadata comment.
/// - Keys are matched case-insensitively at line start: `categories:`, `tags:`, `orte:`.
/// - Values are comma separated, optionally wrapped in `[...]`.
/// - Unknown lines are skipped. A repeated key appends to its list.
/// - Locations are only read from their own `orte:` line.
pub fn parse_metadata_comment(comment: &str) -> Metadata {
    let mut meta = Metadata::default();
    for line in comment.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((key, value)) = match_key(line) else { continue };
        let values = split_list(value);
        match key {
            MetaKey::Categories => meta.categories.extend(values),
            MetaKey::Tags => meta.tags.extend(values),
            MetaKey::Locations => meta.locations.extend(values),
        }
    }
    meta
}

fn match_key(line: &str) -> Option<(MetaKey, &str)> {
    META_KEYS.iter().find_map(|(prefix, key)| {
        let head = line.get(..prefix.len())?;
        if head.eq_ignore_ascii_case(prefix) {
            Some((*key, &line[prefix.len()..]))
        } else {
            None
        }
    })
}

fn split_list(value: &str) -> Vec<String> {
    let mut v = value.trim();
    if let Some(inner) = v.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        v = inner;
    }
    v.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every metadata comment in `text`, as raw inner text.
pub fn metadata_comments(text: &str) -> impl Iterator<Item = &str> {
    COMMENT_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing title in block {0}")]
    MissingTitle(usize),
}

/// Whether a line is a level-6 heading (exactly six hashes).
pub fn is_heading_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("######") && !t.starts_with("#######")
}

/// First non-empty level-6 heading title in a block.
pub fn extract_title(block: &str) -> Option<String> {
    TITLE_RE
        .captures_iter(block)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Inner text of the first comment in a block, trimmed; empty if there is none.
pub fn extract_comment(block: &str) -> &str {
    metadata_comments(block).next().map(str::trim).unwrap_or("")
}

/// Build a record from one trimmed block.
pub fn extract_article(block: &str, position: usize) -> Result<ArticleRecord, ExtractError> {
    let title = extract_title(block).ok_or(ExtractError::MissingTitle(position))?;
    let meta = parse_metadata_comment(extract_comment(block));
    let mut raw = String::with_capacity(block.len() + 1);
    raw.push_str(block);
    raw.push('\n');
    Ok(ArticleRecord {
        position,
        title,
        categories: meta.categories,
        tags: meta.tags,
        locations: meta.locations,
        raw,
    })
}
