use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::article::ArticleRecord;
use crate::config::Config;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unrecognized category: {value}, no correction found")]
    Unrecognized { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
}

/// Corrections applied by one validation run, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Corrections(pub Vec<Correction>);

impl Corrections {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Correction recorded for `category`, if any.
    pub fn corrected(&self, category: &str) -> Option<&str> {
        self.0.iter().find(|c| c.original == category).map(|c| c.corrected.as_str())
    }

    /// Corrected name for `category`, or the category itself.
    pub fn apply<'a>(&'a self, category: &'a str) -> &'a str {
        self.corrected(category).unwrap_or(category)
    }

    /// Human-readable summary, `""` when nothing was corrected.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Corrections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| format!("{} -> {}", c.original, c.corrected)).collect();
        f.write_str(&parts.join(" | "))
    }
}

/// Maps category strings onto the closed vocabulary, fuzzy-correcting near misses.
#[derive(Debug, Clone)]
pub struct CategoryValidator {
    vocabulary: Vec<String>,
    threshold: f64,
    uncategorized_label: String,
}

impl CategoryValidator {
    pub fn new(cfg: &Config) -> Self {
        Self {
            vocabulary: cfg.categories.clone(),
            threshold: cfg.fuzzy_threshold,
            uncategorized_label: cfg.uncategorized_label.clone(),
        }
    }

    pub fn with_vocabulary<I, S>(vocabulary: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: vocabulary.into_iter().map(Into::into).collect(),
            threshold,
            uncategorized_label: Config::default().uncategorized_label,
        }
    }

    /// Closest vocabulary entry scoring at least the threshold. Ties go to
    /// the entry listed first.
    pub fn best_match(&self, value: &str) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for candidate in &self.vocabulary {
            let score = strsim::normalized_levenshtein(value, candidate);
            if score < self.threshold {
                continue;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate.as_str(), score));
            }
        }
        best.map(|(c, _)| c)
    }

    /// Corrections for the out-of-vocabulary names among `categories`.
    /// Fails on the first name without a correction.
    pub fn correct<'a, I>(&self, categories: I) -> Result<Corrections, CategoryError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let in_use: BTreeSet<&str> = categories
            .into_iter()
            .map(str::trim)
            .filter(|c| *c != self.uncategorized_label)
            .collect();

        let mut corrections = Vec::new();
        for value in in_use {
            if self.vocabulary.iter().any(|v| v == value) {
                continue;
            }
            let corrected = self
                .best_match(value)
                .ok_or_else(|| CategoryError::Unrecognized { value: value.to_string() })?;
            warn!(original = %value, corrected = %corrected, "corrected category");
            corrections.push(Correction { original: value.to_string(), corrected: corrected.to_string() });
        }
        Ok(Corrections(corrections))
    }

    /// Rewrite every out-of-vocabulary category on every record to its
    /// correction. Fails on the first category without a correction,
    /// leaving the records untouched.
    pub fn validate(&self, records: &mut [ArticleRecord]) -> Result<Corrections, CategoryError> {
        let corrections = self.correct(records.iter().flat_map(|r| r.categories.iter()).map(String::as_str))?;
        for record in records.iter_mut() {
            for category in record.categories.iter_mut() {
                if let Some(fixed) = corrections.corrected(category.trim()) {
                    *category = fixed.to_string();
                }
            }
        }
        Ok(corrections)
    }
}

/// Records grouped by category. A record appears under each of its
/// categories; records without any go under `uncategorized_label`.
pub fn group_by_category<'a>(
    records: &'a [ArticleRecord],
    uncategorized_label: &str,
) -> BTreeMap<String, Vec<&'a ArticleRecord>> {
    let mut groups: BTreeMap<String, Vec<&ArticleRecord>> = BTreeMap::new();
    for record in records {
        if record.categories.is_empty() {
            groups.entry(uncategorized_label.to_string()).or_default().push(record);
            continue;
        }
        let mut seen = HashSet::new();
        for category in &record.categories {
            if seen.insert(category.as_str()) {
                groups.entry(category.clone()).or_default().push(record);
            }
        }
    }
    groups
}

/// Number of distinct titles across `records`.
pub fn distinct_titles(records: &[ArticleRecord]) -> usize {
    records.iter().map(|r| r.title.as_str()).collect::<HashSet<_>>().len()
}
