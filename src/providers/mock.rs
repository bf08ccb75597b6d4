/*!
 * Mock collaborators for testing.
 *
 * This module provides in-memory implementations of both remote services:
 * - `MockStudyService` - Holds items and synonym records, records every write
 * - `MockTranslator::working()` - Translates from a dictionary, echoing unknown labels
 * - `MockTranslator::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{StudyService, TranslationRequest, Translator};
use crate::sync::models::{Item, ItemFilter, ItemId, RecordId, RecordRef};

/// A write received by the mock study service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCall {
    /// `create_record` call
    Create { item_id: ItemId, synonyms: Vec<String> },
    /// `update_record` call
    Update { record_id: RecordId, synonyms: Vec<String> },
}

#[derive(Debug, Default)]
struct StudyState {
    items: Vec<Item>,
    records: HashMap<ItemId, RecordRef>,
    next_record_id: u64,
    writes: Vec<WriteCall>,
    lookups: usize,
}

/// In-memory study service
#[derive(Debug, Clone)]
pub struct MockStudyService {
    state: Arc<Mutex<StudyState>>,
    failing_items: HashSet<ItemId>,
    auth_failure: bool,
    lookup_unreachable: bool,
    has_credentials: bool,
}

impl Default for MockStudyService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStudyService {
    /// Create an empty service with valid credentials
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StudyState {
                next_record_id: 1000,
                ..StudyState::default()
            })),
            failing_items: HashSet::new(),
            auth_failure: false,
            lookup_unreachable: false,
            has_credentials: true,
        }
    }

    /// Create a service holding `items`
    pub fn with_items(items: Vec<Item>) -> Self {
        let service = Self::new();
        service.state.lock().items = items;
        service
    }

    /// Add an existing synonym record for an item
    pub fn with_record(self, item_id: u64, synonyms: &[&str]) -> Self {
        {
            let mut state = self.state.lock();
            let record = RecordRef {
                id: RecordId(state.next_record_id),
                item_id: ItemId(item_id),
                synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            };
            state.next_record_id += 1;
            state.records.insert(ItemId(item_id), record);
        }
        self
    }

    /// Make every write for `item_id` fail with a network error
    pub fn failing_writes_for(mut self, item_id: u64) -> Self {
        self.failing_items.insert(ItemId(item_id));
        self
    }

    /// Reject every call as unauthorized
    pub fn with_auth_failure(mut self) -> Self {
        self.auth_failure = true;
        self
    }

    /// Make `list_existing_records` fail with a network error
    pub fn with_unreachable_lookup(mut self) -> Self {
        self.lookup_unreachable = true;
        self
    }

    /// Report missing credentials
    pub fn without_credentials(mut self) -> Self {
        self.has_credentials = false;
        self
    }

    /// Writes received so far, in order
    pub fn writes(&self) -> Vec<WriteCall> {
        self.state.lock().writes.clone()
    }

    /// Current record of an item
    pub fn record_for(&self, item_id: u64) -> Option<RecordRef> {
        self.state.lock().records.get(&ItemId(item_id)).cloned()
    }

    /// Number of `list_existing_records` calls
    pub fn lookup_count(&self) -> usize {
        self.state.lock().lookups
    }

    fn check_auth(&self) -> Result<(), ProviderError> {
        if self.auth_failure {
            return Err(ProviderError::AuthenticationError("401 Unauthorized".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self, item_id: ItemId) -> Result<(), ProviderError> {
        self.check_auth()?;
        if self.failing_items.contains(&item_id) {
            return Err(ProviderError::ConnectionError(format!("Simulated failure for item {}", item_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl StudyService for MockStudyService {
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, ProviderError> {
        self.check_auth()?;
        let state = self.state.lock();
        Ok(state
            .items
            .iter()
            .filter(|item| filter.levels.is_empty() || filter.levels.contains(&item.level))
            .cloned()
            .collect())
    }

    async fn list_existing_records(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, RecordRef>, ProviderError> {
        self.check_auth()?;
        let mut state = self.state.lock();
        state.lookups += 1;
        if self.lookup_unreachable {
            return Err(ProviderError::ConnectionError("Connection reset by peer".to_string()));
        }
        Ok(item_ids
            .iter()
            .filter_map(|id| state.records.get(id).map(|record| (*id, record.clone())))
            .collect())
    }

    async fn create_record(&self, item_id: ItemId, synonyms: &[String]) -> Result<RecordRef, ProviderError> {
        self.check_writable(item_id)?;
        let mut state = self.state.lock();
        state.writes.push(WriteCall::Create {
            item_id,
            synonyms: synonyms.to_vec(),
        });

        if state.records.contains_key(&item_id) {
            return Err(ProviderError::ApiError {
                status_code: 422,
                message: format!("Study material for subject {} already exists", item_id),
            });
        }

        let record = RecordRef {
            id: RecordId(state.next_record_id),
            item_id,
            synonyms: synonyms.to_vec(),
        };
        state.next_record_id += 1;
        state.records.insert(item_id, record.clone());
        Ok(record)
    }

    async fn update_record(&self, record_id: RecordId, synonyms: &[String]) -> Result<RecordRef, ProviderError> {
        let item_id = self
            .state
            .lock()
            .records
            .values()
            .find(|record| record.id == record_id)
            .map(|record| record.item_id);
        let item_id = item_id.ok_or_else(|| ProviderError::ApiError {
            status_code: 404,
            message: format!("Study material {} not found", record_id),
        })?;
        self.check_writable(item_id)?;

        let mut state = self.state.lock();
        state.writes.push(WriteCall::Update {
            record_id,
            synonyms: synonyms.to_vec(),
        });
        let record = RecordRef {
            id: record_id,
            item_id,
            synonyms: synonyms.to_vec(),
        };
        state.records.insert(item_id, record.clone());
        Ok(record)
    }

    fn has_credentials(&self) -> bool {
        self.has_credentials
    }
}

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with a network error
    Failing,
    /// Always fails because the quota is used up
    QuotaExceeded,
    /// Always fails because the key is rejected
    Unauthorized,
    /// Returns an empty translation
    Empty,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Mock translator with a fixed dictionary
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    dictionary: HashMap<String, String>,
    failing_labels: HashSet<String>,
    has_credentials: bool,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<TranslationRequest>>>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            dictionary: HashMap::new(),
            failing_labels: HashSet::new(),
            has_credentials: true,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a translator that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a translator that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a translator that succeeds after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Translate `label` to `translated`
    pub fn with_translation(mut self, label: &str, translated: &str) -> Self {
        self.dictionary.insert(label.to_string(), translated.to_string());
        self
    }

    /// Fail every request for `label` with a network error
    pub fn failing_for(mut self, label: &str) -> Self {
        self.failing_labels.insert(label.to_string());
        self
    }

    /// Report missing credentials
    pub fn without_credentials(mut self) -> Self {
        self.has_credentials = false;
        self
    }

    /// Number of translate calls received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<TranslationRequest> {
        self.requests.lock().clone()
    }

    fn lookup(&self, text: &str) -> String {
        self.dictionary.get(text).cloned().unwrap_or_else(|| text.to_string())
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if self.failing_labels.contains(&request.text) {
            return Err(ProviderError::ConnectionError(format!(
                "Simulated failure for '{}'",
                request.text
            )));
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.lookup(&request.text)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request {})", count + 1),
                    })
                } else {
                    Ok(self.lookup(&request.text))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated network failure".to_string())),

            MockBehavior::QuotaExceeded => Err(ProviderError::QuotaExceeded("456 Quota exceeded".to_string())),

            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError("403 Forbidden".to_string())),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.lookup(&request.text))
            }
        }
    }

    fn has_credentials(&self) -> bool {
        self.has_credentials
    }
}
