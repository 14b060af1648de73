use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CATEGORIES: [&str; 14] = [
    "Politik",
    "Gesellschaft",
    "Bildung & Erziehung",
    "Wissenschaft & Forschung",
    "Umwelt & Klima",
    "Energie & Ressourcen",
    "Wirtschaft",
    "Gesundheit",
    "Kultur & Kunst",
    "Medien & Öffentlichkeit",
    "Digitales & Technik",
    "Mobilität & Verkehr",
    "Engagement & Protest",
    "Recht & Justiz",
];

/// Environment variable that overrides `output_dir`.
pub const OUTPUT_DIR_ENV: &str = "NEWSDIGEST_OUTPUT_DIR";

/// Runtime configuration handed to the parser, validator and pipeline.
/// Every field has a default so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Closed, ordered category vocabulary.
    pub categories: Vec<String>,
    pub fuzzy_threshold: f64,
    /// Grouping bucket for articles without categories; never written to records.
    pub uncategorized_label: String,
    pub split_marker: String,
    pub placeholder_shortcode: String,
    pub placeholder_url: String,
    pub output_dir: String,
    /// Trimmed blocks shorter than this (in chars) are noise.
    pub min_block_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            fuzzy_threshold: 0.8,
            uncategorized_label: "Unkategorisiert".to_string(),
            split_marker: "<!--split-->".to_string(),
            placeholder_shortcode: "my_link".to_string(),
            placeholder_url: "Link".to_string(),
            output_dir: "./output".to_string(),
            min_block_chars: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Read a YAML config file, fill gaps with defaults and validate.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Config, ConfigError> {
        // an empty document deserializes to unit, not to a mapping
        let cfg: Config = if raw.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid("categories must not be empty".into()));
        }
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_threshold must be in (0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.split_marker.trim().is_empty() {
            return Err(ConfigError::Invalid("missing split_marker".into()));
        }
        if self.placeholder_shortcode.trim().is_empty() {
            return Err(ConfigError::Invalid("missing placeholder_shortcode".into()));
        }
        Ok(())
    }

    /// Apply overrides taken from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.output_dir = dir;
            }
        }
        self
    }

    pub fn is_allowed_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
