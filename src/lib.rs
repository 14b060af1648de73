//! Split a flat Markdown file of short news articles into records, validate
//! their categories, and re-emit a selection as a normalized output file.
//!
//! Article convention: a `###### Title` heading, an HTML comment carrying
//! `categories:`, `tags:` and `orte:` lines, the body, and a split marker
//! (`<!--split-->` by default) between articles.

pub mod article;
pub mod categories;
pub mod config;
pub mod emit;
pub mod frontmatter;
pub mod normalize;
pub mod split;
pub mod working;

pub use article::{extract_article, parse_metadata_comment, ArticleRecord, ExtractError, Metadata};
pub use categories::{distinct_titles, group_by_category, CategoryError, CategoryValidator, Correction, Corrections};
pub use config::{Config, ConfigError};
pub use emit::{emit_output, sha256_hex, slugify, write_atomic, EmitError, EmitPaths};
pub use frontmatter::{build_frontmatter, extract_issue_date, strip_frontmatter, IssueDate, IssueDateError};
pub use normalize::{comment_categories, Normalizer, Pass};
pub use split::{ArticleParser, ParseError, ParseOutcome, ParseWarning};
pub use working::{prepare_working_text, Selection, SelectionError};

/// Parse `text` with the default configuration.
pub fn parse(text: &str) -> Result<ParseOutcome, ParseError> {
    ArticleParser::new(&Config::default()).parse(text)
}

/// Validate categories against the default vocabulary; returns the
/// correction summary (`""` when nothing changed).
pub fn validate_categories(records: &mut [ArticleRecord]) -> Result<String, CategoryError> {
    CategoryValidator::new(&Config::default()).validate(records).map(|c| c.summary())
}

/// Unnormalized output for `selected` with the default configuration.
pub fn render_selection(selected: &[&ArticleRecord], title: &str, date: IssueDate) -> Result<String, SelectionError> {
    ArticleParser::new(&Config::default()).render_selection(selected, title, date)
}

/// Run all normalization passes with the default configuration.
pub fn normalize(text: &str, title: &str, date: IssueDate) -> String {
    Normalizer::new(&Config::default()).normalize(text, title, date)
}

/// Working text after removing the articles whose titles are in `removed_titles`.
pub fn remaining_after_removal<I, S>(text: &str, removed_titles: I) -> Result<String, ParseError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ArticleParser::new(&Config::default()).remaining_after_removal(text, &Selection::by_titles(removed_titles))
}
