use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use crate::errors::SyncError;
use crate::sync::driver::SyncOptions;
use crate::sync::models::{ItemFilter, Policy};
use crate::sync::scheduler::SchedulerConfig;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target language code for the synonyms (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Update policy applied to every item of a run
    #[serde(default)]
    pub policy: Policy,

    /// Study service config
    #[serde(default)]
    pub study: StudyConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batch pacing config
    #[serde(default)]
    pub batch: BatchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation account tier
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationTier {
    #[default]
    Free,
    Pro,
}

impl TranslationTier {
    // @returns: Capitalized tier name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Free => "Free",
            Self::Pro => "Pro",
        }
    }

    // @returns: API host serving this tier
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Free => "https://api-free.deepl.com",
            Self::Pro => "https://api.deepl.com",
        }
    }
}

impl std::fmt::Display for TranslationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

impl std::str::FromStr for TranslationTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            _ => Err(anyhow!("Invalid translation tier: {}", s)),
        }
    }
}

/// Study service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StudyConfig {
    /// Personal API token
    #[serde(default = "String::new")]
    pub api_token: String,

    /// Service endpoint URL
    #[serde(default = "default_study_endpoint")]
    pub endpoint: String,

    /// Subject type whose synonyms are synchronized
    #[serde(default = "default_subject_type")]
    pub subject_type: String,

    /// Levels to synchronize; empty means every level
    #[serde(default)]
    pub levels: Vec<u32>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            endpoint: default_study_endpoint(),
            subject_type: default_subject_type(),
            levels: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StudyConfig {
    /// Item filter built from the configured subject type and levels
    pub fn filter(&self) -> ItemFilter {
        ItemFilter::new(self.subject_type.clone(), self.levels.clone())
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Account tier
    #[serde(default)]
    pub tier: TranslationTier,

    /// Service endpoint URL; derived from the tier when empty
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Source language of the labels
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Context sent along with every label
    #[serde(default = "default_context")]
    pub context: Option<String>,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            tier: TranslationTier::default(),
            endpoint: String::new(),
            source_language: default_source_language(),
            context: default_context(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranslationConfig {
    /// Get the endpoint, falling back to the tier's host
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }
        self.tier.default_endpoint().to_string()
    }
}

/// Batch pacing configuration
///
/// The defaults keep a run below the study service's limit of 60 requests
/// per minute with some margin for the lookup requests made at start.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Items per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay after each item in milliseconds
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,

    /// Additional delay between batches in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Largest synonym set that may be written
    #[serde(default = "default_max_synonyms")]
    pub max_synonyms: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            item_delay_ms: default_item_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            max_synonyms: default_max_synonyms(),
        }
    }
}

impl BatchConfig {
    /// Scheduler settings
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            batch_size: self.batch_size,
            item_delay: Duration::from_millis(self.item_delay_ms),
            batch_delay: Duration::from_millis(self.batch_delay_ms),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "de".to_string()
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_study_endpoint() -> String {
    crate::providers::wanikani::DEFAULT_ENDPOINT.to_string()
}

fn default_subject_type() -> String {
    crate::sync::models::default_subject_type()
}

fn default_context() -> Option<String> {
    Some("Meaning of a kanji radical, translated as a single word or short phrase.".to_string())
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_batch_size() -> usize {
    crate::sync::scheduler::DEFAULT_BATCH_SIZE
}

fn default_item_delay_ms() -> u64 {
    crate::sync::scheduler::DEFAULT_ITEM_DELAY_MS
}

fn default_batch_delay_ms() -> u64 {
    crate::sync::scheduler::DEFAULT_BATCH_DELAY_MS
}

fn default_max_synonyms() -> usize {
    crate::sync::merge::DEFAULT_MAX_SYNONYMS
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Failed to create config file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::to_translation_code(&self.target_language)?;
        crate::language_utils::to_source_code(&self.translation.source_language)?;

        if self.study.api_token.trim().is_empty() {
            return Err(SyncError::MissingCredentials("study service API token is required".to_string()).into());
        }

        if self.policy.needs_translation() && self.translation.api_key.trim().is_empty() {
            return Err(SyncError::MissingCredentials(format!(
                "translation API key is required for the {} policy",
                self.policy
            ))
            .into());
        }

        if self.batch.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }

        if self.batch.max_synonyms == 0 {
            return Err(anyhow!("Maximum synonym count must be at least 1"));
        }

        Ok(())
    }

    /// Options for the sync engine
    pub fn sync_options(&self) -> Result<SyncOptions> {
        Ok(SyncOptions {
            target_language: crate::language_utils::to_translation_code(&self.target_language)?,
            source_language: Some(crate::language_utils::to_source_code(&self.translation.source_language)?),
            tier: self.translation.tier,
            retries: self.translation.retry_count,
            context: self.translation.context.clone(),
            max_synonyms: self.batch.max_synonyms,
            scheduler: self.batch.scheduler(),
        })
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            policy: Policy::default(),
            study: StudyConfig::default(),
            translation: TranslationConfig::default(),
            batch: BatchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
