//! Text passes applied to a generated output file, in order:
//!
//! 1. drop one blank line after text lines, keeping the spacing passes 2-4 own
//! 2. blank line around level-6 headings
//! 3. blank line around comments
//! 4. replace/prepend the frontmatter, aggregated from all metadata comments
//! 5. strip `(*Date*)` suffixes from headings
//! 6. delete placeholder link shortcode lines
//! 7. collapse blank-line runs to a single blank line
//!
//! Every pass is a plain `&str -> String` function over LF-terminated text;
//! [`Normalizer::normalize`] converts CRLF input before the first pass.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::article::{is_heading_line, metadata_comments, parse_metadata_comment};
use crate::categories::{CategoryError, CategoryValidator, Corrections};
use crate::config::Config;
use crate::frontmatter::{build_frontmatter, split_frontmatter, strip_frontmatter, IssueDate};

static HEADING_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^([ \t]*######(?:[^#\r\n][^\r\n]*?)?)[ \t]*\(\*date\*\)[ \t]*(\r?)$").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Pass 1: after a non-blank line, drop one of the blank lines that follow.
/// A single blank line disappears; longer runs shrink by one.
///
/// Runs after a heading, after a line closing a comment, and after the
/// closing fence of a leading frontmatter are left alone: passes 2, 3 and 4
/// put exactly those blank lines back.
pub fn collapse_blank_after_text(text: &str) -> String {
    let fence_end = split_frontmatter(text).map(|(_, rest)| text.len() - rest.len());
    let lines = lines(text);
    let mut out = String::with_capacity(text.len());
    let mut offset = 0;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        out.push_str(line);
        offset += line.len();
        i += 1;
        if is_blank(line) || is_spaced_by_later_pass(line) || Some(offset) == fence_end {
            continue;
        }
        let run_start = i;
        while i < lines.len() && is_blank(lines[i]) {
            offset += lines[i].len();
            i += 1;
        }
        if i > run_start {
            for kept in &lines[run_start..i - 1] {
                out.push_str(kept);
            }
        }
    }
    out
}

fn is_spaced_by_later_pass(line: &str) -> bool {
    is_heading_line(line) || line.contains("-->")
}

/// Pass 2: a blank line before a heading (only if the line above has text)
/// and always one after it.
pub fn space_headings(text: &str) -> String {
    let lines = lines(text);
    let mut out = String::with_capacity(text.len() + 64);
    for (i, line) in lines.iter().enumerate() {
        if !is_heading_line(line) {
            out.push_str(line);
            continue;
        }
        if i > 0 && !is_blank(lines[i - 1]) {
            out.push('\n');
        }
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Pass 3: a blank line before a line opening with `<!--` and after any
/// line holding `-->`, each only where the neighbouring line has text.
/// Open and close on the same line get both.
pub fn space_comments(text: &str) -> String {
    let lines = lines(text);
    let mut out = String::with_capacity(text.len() + 64);
    for (i, line) in lines.iter().enumerate() {
        if line.trim_start().starts_with("<!--") && i > 0 && !is_blank(lines[i - 1]) {
            out.push('\n');
        }
        out.push_str(line);
        if line.contains("-->") {
            if let Some(next) = lines.get(i + 1) {
                if !is_blank(next) {
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Pass 4: aggregate categories/tags/locations from every metadata comment
/// and put a fresh frontmatter in front. An existing leading frontmatter is
/// replaced. Categories are mapped through `corrections`.
pub fn inject_frontmatter(text: &str, title: &str, date: IssueDate, corrections: &Corrections) -> String {
    let body = strip_frontmatter(text).trim_start_matches(|c: char| c == '\n' || c == '\r');

    let mut categories: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut locations: Vec<String> = Vec::new();
    for comment in metadata_comments(body) {
        let meta = parse_metadata_comment(comment);
        categories.extend(meta.categories.iter().map(|c| corrections.apply(c).to_string()));
        tags.extend(meta.tags);
        locations.extend(meta.locations);
    }

    let fm = build_frontmatter(title, date, &categories, &tags, &locations);
    let mut out = String::with_capacity(fm.len() + 1 + body.len());
    out.push_str(&fm);
    out.push('\n');
    out.push_str(body);
    out
}

/// Pass 5: `###### Title (*Date*)` becomes `###### Title`.
pub fn strip_heading_date_suffix(text: &str) -> String {
    HEADING_DATE_RE.replace_all(text, "${1}${2}").into_owned()
}

/// Whether a line is nothing but `{{< <shortcode> url="<url>" >}}`.
pub fn is_placeholder_line(line: &str, shortcode: &str, url: &str) -> bool {
    let Some(inner) = line.trim().strip_prefix("{{<").and_then(|s| s.strip_suffix(">}}")) else {
        return false;
    };
    let mut parts = inner.split_whitespace();
    let expected_attr = format!("url=\"{}\"", url);
    parts.next() == Some(shortcode) && parts.next() == Some(expected_attr.as_str()) && parts.next().is_none()
}

/// Pass 6: delete placeholder shortcode lines, line terminator included.
/// The shortcode inside other text is left alone.
pub fn remove_placeholder_lines(text: &str, shortcode: &str, url: &str) -> String {
    lines(text)
        .into_iter()
        .filter(|line| !is_placeholder_line(line, shortcode, url))
        .collect()
}

/// Pass 7: three or more newlines become two.
pub fn collapse_blank_runs(text: &str) -> String {
    BLANK_RUN_RE.replace_all(text, "\n\n").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    CollapseBlankAfterText,
    HeadingSpacing,
    CommentSpacing,
    Frontmatter,
    HeadingDateSuffix,
    PlaceholderShortcodes,
    BlankRunCollapse,
}

impl Pass {
    pub const ALL: [Pass; 7] = [
        Pass::CollapseBlankAfterText,
        Pass::HeadingSpacing,
        Pass::CommentSpacing,
        Pass::Frontmatter,
        Pass::HeadingDateSuffix,
        Pass::PlaceholderShortcodes,
        Pass::BlankRunCollapse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::CollapseBlankAfterText => "collapse_blank_after_text",
            Pass::HeadingSpacing => "heading_spacing",
            Pass::CommentSpacing => "comment_spacing",
            Pass::Frontmatter => "frontmatter",
            Pass::HeadingDateSuffix => "heading_date_suffix",
            Pass::PlaceholderShortcodes => "placeholder_shortcodes",
            Pass::BlankRunCollapse => "blank_run_collapse",
        }
    }
}

/// Runs the passes with the output's title and issue date.
#[derive(Debug, Clone)]
pub struct Normalizer {
    placeholder_shortcode: String,
    placeholder_url: String,
    corrections: Corrections,
}

impl Normalizer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            placeholder_shortcode: cfg.placeholder_shortcode.clone(),
            placeholder_url: cfg.placeholder_url.clone(),
            corrections: Corrections::default(),
        }
    }

    /// Map corrected category names when building the frontmatter.
    pub fn with_corrections(mut self, corrections: Corrections) -> Self {
        self.corrections = corrections;
        self
    }

    pub fn apply(&self, pass: Pass, text: &str, title: &str, date: IssueDate) -> String {
        match pass {
            Pass::CollapseBlankAfterText => collapse_blank_after_text(text),
            Pass::HeadingSpacing => space_headings(text),
            Pass::CommentSpacing => space_comments(text),
            Pass::Frontmatter => inject_frontmatter(text, title, date, &self.corrections),
            Pass::HeadingDateSuffix => strip_heading_date_suffix(text),
            Pass::PlaceholderShortcodes => {
                remove_placeholder_lines(text, &self.placeholder_shortcode, &self.placeholder_url)
            }
            Pass::BlankRunCollapse => collapse_blank_runs(text),
        }
    }

    pub fn run(&self, passes: &[Pass], text: &str, title: &str, date: IssueDate) -> String {
        let mut current = text.to_string();
        for &pass in passes {
            let before = current.len();
            current = self.apply(pass, &current, title, date);
            debug!(pass = pass.name(), before, after = current.len(), "normalize pass");
        }
        current
    }

    /// All seven passes, in order, over `text` with CRLF line endings
    /// converted to LF.
    ///
    /// Rerunning on the output changes nothing, except that a blank line
    /// between two body paragraphs is dropped by pass 1 each time.
    pub fn normalize(&self, text: &str, title: &str, date: IssueDate) -> String {
        let text = text.replace("\r\n", "\n");
        self.run(&Pass::ALL, &text, title, date)
    }
}

/// Every category named in the metadata comments of `text`, leading
/// frontmatter excluded.
pub fn comment_categories(text: &str) -> Vec<String> {
    metadata_comments(strip_frontmatter(text))
        .flat_map(|c| parse_metadata_comment(c).categories)
        .collect()
}

impl Normalizer {
    /// Normalizer for an already emitted file: the categories in its comments
    /// are checked against the vocabulary so the rebuilt frontmatter carries
    /// corrected names only.
    pub fn for_text(cfg: &Config, text: &str) -> Result<Self, CategoryError> {
        let categories = comment_categories(text);
        let corrections = CategoryValidator::new(cfg).correct(categories.iter().map(String::as_str))?;
        Ok(Self::new(cfg).with_corrections(corrections))
    }
}
