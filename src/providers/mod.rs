/*!
 * Clients for the remote services the sync engine talks to.
 *
 * - `wanikani`: study service holding items and their synonym records
 * - `deepl`: translation service
 * - `mock`: in-memory implementations of both, for tests
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::app_config::TranslationTier;
use crate::errors::ProviderError;
use crate::sync::models::{Item, ItemFilter, ItemId, RecordId, RecordRef};

/// Study service holding items and their synonym records
///
/// Implementations own their credentials. Every call is a single remote
/// request sequence; pacing is the caller's responsibility.
#[async_trait]
pub trait StudyService: Send + Sync + Debug {
    /// List the items matching `filter`, with their current synonyms
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, ProviderError>;

    /// Look up the synonym records that already exist for `item_ids`
    async fn list_existing_records(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, RecordRef>, ProviderError>;

    /// Create a synonym record for an item that has none yet
    async fn create_record(&self, item_id: ItemId, synonyms: &[String]) -> Result<RecordRef, ProviderError>;

    /// Overwrite the synonyms of an existing record
    async fn update_record(&self, record_id: RecordId, synonyms: &[String]) -> Result<RecordRef, ProviderError>;

    /// Whether credentials are configured at all
    fn has_credentials(&self) -> bool {
        true
    }
}

/// A single translation request
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    /// Text to translate
    pub text: String,
    /// Target language code
    pub target_language: String,
    /// Source language code; detected by the service when absent
    pub source_language: Option<String>,
    /// Account tier, which selects the API host
    pub tier: TranslationTier,
    /// Additional attempts after a transient failure
    pub retries: u32,
    /// Extra text that guides the translation without being translated
    pub context: Option<String>,
}

impl TranslationRequest {
    /// Create a request with no retries and no context
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_language: target_language.into(),
            source_language: None,
            tier: TranslationTier::default(),
            retries: 0,
            context: None,
        }
    }

    /// Set the source language
    pub fn source_language(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = Some(source_language.into());
        self
    }

    /// Set the account tier
    pub fn tier(mut self, tier: TranslationTier) -> Self {
        self.tier = tier;
        self
    }

    /// Set the retry budget
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the translation context
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Translation service
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `request.text`, returning the translated text
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;

    /// Whether credentials are configured at all
    fn has_credentials(&self) -> bool {
        true
    }
}

pub mod deepl;
pub mod mock;
pub mod wanikani;
