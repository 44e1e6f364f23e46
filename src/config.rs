use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::highlight::{DEFAULT_EXCERPT_CHARS, DEFAULT_HIGHLIGHT_COUNT, DEFAULT_LABELS};
use crate::link::DEFAULT_EMBED_BASE_URL;
use crate::source::LanguagePolicy;
use crate::summarize::DEFAULT_MAX_INPUT_CHARS;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-6";
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 60;

/// On-disk configuration; every key is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub languages: Option<Vec<String>>,
    pub language_policy: Option<LanguagePolicy>,
    pub highlight_count: Option<usize>,
    pub highlight_labels: Option<Vec<String>>,
    pub excerpt_chars: Option<usize>,
    pub similarity_threshold: Option<f64>,
    pub summary_max_chars: Option<usize>,
    pub target_language: Option<String>,
    pub model: Option<String>,
    pub downloader: Option<Vec<String>>,
    pub source_timeout_secs: Option<u64>,
    pub summarizer_timeout_secs: Option<u64>,
    pub embed_base_url: Option<String>,
}

impl Config {
    /// Load config from ~/.config/vidsum/config.toml if it exists
    pub fn load() -> Result<Self, Error> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, Error> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("could not read {}: {e}", path.display())))?;
            toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// Resolve file values over built-in defaults.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, Error> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            languages: self.languages.clone().unwrap_or(defaults.languages),
            language_policy: self.language_policy.unwrap_or(defaults.language_policy),
            highlight_count: self.highlight_count.unwrap_or(defaults.highlight_count),
            highlight_labels: self.highlight_labels.clone().unwrap_or(defaults.highlight_labels),
            excerpt_chars: self.excerpt_chars.unwrap_or(defaults.excerpt_chars),
            similarity_threshold: self.similarity_threshold.unwrap_or(defaults.similarity_threshold),
            summary_max_chars: self.summary_max_chars.unwrap_or(defaults.summary_max_chars),
            target_language: self.target_language.clone().unwrap_or(defaults.target_language),
            source_timeout: self
                .source_timeout_secs
                .map_or(defaults.source_timeout, Duration::from_secs),
            summarizer_timeout: self
                .summarizer_timeout_secs
                .map_or(defaults.summarizer_timeout, Duration::from_secs),
            embed_base_url: self.embed_base_url.clone().unwrap_or(defaults.embed_base_url),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Fully resolved settings for one pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub languages: Vec<String>,
    pub language_policy: LanguagePolicy,
    pub highlight_count: usize,
    pub highlight_labels: Vec<String>,
    pub excerpt_chars: usize,
    pub similarity_threshold: f64,
    pub summary_max_chars: usize,
    pub target_language: String,
    pub source_timeout: Duration,
    pub summarizer_timeout: Duration,
    pub embed_base_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            language_policy: LanguagePolicy::default(),
            highlight_count: DEFAULT_HIGHLIGHT_COUNT,
            highlight_labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            summary_max_chars: DEFAULT_MAX_INPUT_CHARS,
            target_language: "en".to_string(),
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
            summarizer_timeout: Duration::from_secs(DEFAULT_SUMMARIZER_TIMEOUT_SECS),
            embed_base_url: DEFAULT_EMBED_BASE_URL.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(format!(
                "similarity_threshold must be between 0 and 1, got {}",
                self.similarity_threshold
            )));
        }
        if self.highlight_count == 0 {
            return Err(Error::Config("highlight_count must be at least 1".to_string()));
        }
        if self.excerpt_chars < 4 {
            return Err(Error::Config("excerpt_chars must be at least 4".to_string()));
        }
        if self.summary_max_chars == 0 {
            return Err(Error::Config("summary_max_chars must be at least 1".to_string()));
        }
        if self.source_timeout.is_zero() || self.summarizer_timeout.is_zero() {
            return Err(Error::Config("timeouts must be at least one second".to_string()));
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("vidsum")
        .join("config.toml")
}
