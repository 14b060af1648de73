use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// Consumed by the site generator; the layout below is a byte-exact contract.
const TIME_OF_DAY: &str = "T12:23:04+02:00";
const DAY_OF_MONTH: u8 = 20;
const SERIES: &str = "[Blog, Kurznachrichten]";
const MEDIA_BASE: &str = "http://kastl/blog-bf/news";
const LAYOUT: &str = "card-columns";

static LEADING_FRONTMATTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A---[ \t]*\r?\n((?s:.*?))\r?\n---[ \t]*(?:\r?\n|\z)").unwrap());
static MEDIA_PATH_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^[ \t]+path:[ \t]*"?([^"\r\n]+)"?"#).unwrap());
static MEDIA_PATH_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{4})/(\d{2})/?$").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IssueDateError {
    #[error("invalid month: {0} (expected 1-12)")]
    InvalidMonth(u8),
    #[error("invalid year: {0}")]
    InvalidYear(u16),
}

/// Year and month an output issue is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDate {
    year: u16,
    month: u8,
}

impl IssueDate {
    pub fn new(year: u16, month: u8) -> Result<Self, IssueDateError> {
        if !(1..=12).contains(&month) {
            return Err(IssueDateError::InvalidMonth(month));
        }
        if !(1000..=9999).contains(&year) {
            return Err(IssueDateError::InvalidYear(year));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }
}

impl Default for IssueDate {
    fn default() -> Self {
        Self { year: 2025, month: 10 }
    }
}

impl fmt::Display for IssueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Sorted, deduplicated, non-empty values joined with `", "`.
fn flow_list<S: AsRef<str>>(values: &[S]) -> String {
    let set: BTreeSet<&str> = values.iter().map(|v| v.as_ref()).filter(|v| !v.is_empty()).collect();
    set.into_iter().collect::<Vec<_>>().join(", ")
}

/// Render the header block for one output file. Ends with `---\n`.
pub fn build_frontmatter<S: AsRef<str>>(
    title: &str,
    date: IssueDate,
    categories: &[S],
    tags: &[S],
    locations: &[S],
) -> String {
    let (year, month) = (date.year, date.month);
    format!(
        "---\n\
title: \"{title}\"\n\
date: {year}-{month:02}-{DAY_OF_MONTH:02}{TIME_OF_DAY}\n\
series: {SERIES}\n\
categories: [{cats}]\n\
tags: [{tags}]\n\
orte: [{orte}]\n\
media:\n    path: \"{MEDIA_BASE}/{year}/{month:02}/\"\n\
layout: {LAYOUT}\n\
---\n",
        cats = flow_list(categories),
        tags = flow_list(tags),
        orte = flow_list(locations),
    )
}

/// Split a leading `---` frontmatter block off `text`.
/// Returns the YAML between the fences and the remaining text.
pub fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let caps = LEADING_FRONTMATTER_RE.captures(text)?;
    let whole = caps.get(0)?;
    let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    Some((inner, &text[whole.end()..]))
}

/// `text` without its leading frontmatter block, if it has one.
pub fn strip_frontmatter(text: &str) -> &str {
    split_frontmatter(text).map(|(_, rest)| rest).unwrap_or(text)
}

#[derive(Debug, Default, Deserialize)]
struct SourceFrontmatter {
    #[serde(default)]
    media: Option<SourceMedia>,
}

#[derive(Debug, Default, Deserialize)]
struct SourceMedia {
    #[serde(default)]
    path: Option<String>,
}

/// Issue date of a source file, read from its frontmatter `media.path`
/// (`.../<YYYY>/<MM>/`).
pub fn extract_issue_date(source: &str) -> Option<IssueDate> {
    let (yaml, _) = split_frontmatter(source)?;
    let path = match serde_yaml::from_str::<SourceFrontmatter>(yaml) {
        Ok(fm) => fm.media.and_then(|m| m.path),
        Err(e) => {
            // hand-written headers are not always valid YAML; the path line usually is
            debug!(error = %e, "source frontmatter is not valid YAML");
            MEDIA_PATH_LINE_RE.captures(yaml).map(|c| c[1].to_string())
        }
    }?;
    let caps = MEDIA_PATH_DATE_RE.captures(path.trim())?;
    let year = caps[1].parse::<u16>().ok()?;
    let month = caps[2].parse::<u8>().ok()?;
    IssueDate::new(year, month).ok()
}
