/*!
 * Synchronization driver.
 *
 * A run moves through `Idle -> Running -> {Completed, Cancelled, Failed}`.
 * Preconditions (credentials and the one-off lookup of existing records) are
 * checked before the run task is spawned; failing them moves the session to
 * `Failed` and rejects the run. Once running, every item ends in exactly one
 * [`Outcome`]: collaborator errors are folded into `Failed` and the loop moves
 * on to the next item.
 */

use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app_config::TranslationTier;
use crate::errors::{ErrorKind, SyncError};
use crate::providers::{StudyService, TranslationRequest, Translator};

use super::merge::{DEFAULT_MAX_SYNONYMS, MergeEngine};
use super::models::{Item, ItemId, ItemReport, Outcome, Policy, RecordRef, RunReport, RunState, SessionId, Stats};
use super::scheduler::{BatchScheduler, SchedulerConfig};
use super::session::SessionController;

/// Settings shared by every run of an engine
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    /// Target language in translation API format ("DE", "EN-GB")
    pub target_language: String,
    /// Source language of the labels; detected when absent
    pub source_language: Option<String>,
    /// Translation account tier
    pub tier: TranslationTier,
    /// Retry budget handed to the translator
    pub retries: u32,
    /// Context sent with every label
    pub context: Option<String>,
    /// Largest synonym set that may be written
    pub max_synonyms: usize,
    /// Batch pacing
    pub scheduler: SchedulerConfig,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            target_language: "DE".to_string(),
            source_language: None,
            tier: TranslationTier::default(),
            retries: 3,
            context: None,
            max_synonyms: DEFAULT_MAX_SYNONYMS,
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Entry point for synchronization runs
#[derive(Debug, Clone)]
pub struct SyncEngine {
    study: Arc<dyn StudyService>,
    translator: Arc<dyn Translator>,
    sessions: Arc<SessionController>,
    options: SyncOptions,
}

impl SyncEngine {
    /// Create an engine over the given collaborators
    pub fn new(study: Arc<dyn StudyService>, translator: Arc<dyn Translator>, options: SyncOptions) -> Self {
        Self {
            study,
            translator,
            sessions: Arc::new(SessionController::new()),
            options,
        }
    }

    /// Options used for every run
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Session controller shared with running tasks
    pub fn sessions(&self) -> Arc<SessionController> {
        Arc::clone(&self.sessions)
    }

    /// Open a session and spawn its run
    ///
    /// Supersedes any run still in progress. Returns an error, leaving the new
    /// session `Failed`, when credentials are missing or the lookup of
    /// existing records fails.
    pub async fn start_run(&self, items: Vec<Item>, policy: Policy) -> Result<RunHandle, SyncError> {
        let session_id = self.sessions.start_session();
        info!(
            "Session {}: syncing {} items with policy '{}'",
            session_id,
            items.len(),
            policy.display_name()
        );

        let existing = match self.prepare(&items, policy).await {
            Ok(existing) => existing,
            Err(e) => {
                error!("Session {} failed before processing any item: {}", session_id, e);
                self.sessions.set_state(session_id, RunState::Failed);
                self.sessions.finalize(session_id);
                return Err(e);
            }
        };
        debug!("Session {}: {} items already have synonym records", session_id, existing.len());

        let cancel = self
            .sessions
            .cancel_token(session_id)
            .ok_or(SyncError::SessionNotFound(session_id.0))?;
        self.sessions.set_state(session_id, RunState::Running);

        let driver = Driver {
            session_id,
            sessions: Arc::clone(&self.sessions),
            scheduler: BatchScheduler::new(self.options.scheduler),
            cancel,
            processor: ItemProcessor {
                study: Arc::clone(&self.study),
                translator: Arc::clone(&self.translator),
                policy,
                merge: MergeEngine::new(self.options.max_synonyms),
                existing,
                options: self.options.clone(),
            },
        };

        Ok(RunHandle {
            session_id,
            sessions: Arc::clone(&self.sessions),
            join: tokio::spawn(driver.drive(items)),
        })
    }

    /// Start a run and wait for its report
    pub async fn run(&self, items: Vec<Item>, policy: Policy) -> Result<RunReport, SyncError> {
        self.start_run(items, policy).await?.wait().await
    }

    /// Request cancellation of a session's run
    pub fn cancel(&self, session_id: SessionId) -> Result<(), SyncError> {
        info!("Cancelling session {}", session_id);
        self.sessions.cancel(session_id)
    }

    /// Committed stats of a session
    pub fn stats(&self, session_id: SessionId) -> Option<Stats> {
        self.sessions.stats(session_id)
    }

    /// Last published progress of a session, 0..=100
    pub fn progress_percent(&self, session_id: SessionId) -> Option<u8> {
        self.sessions.progress_percent(session_id)
    }

    /// Lifecycle state of a session
    pub fn state(&self, session_id: SessionId) -> Option<RunState> {
        self.sessions.state(session_id)
    }

    /// Most recently started session
    pub fn current_session(&self) -> Option<SessionId> {
        self.sessions.current()
    }

    async fn prepare(&self, items: &[Item], policy: Policy) -> Result<HashMap<ItemId, RecordRef>, SyncError> {
        if !self.study.has_credentials() {
            return Err(SyncError::MissingCredentials(
                "study service API token is not configured".to_string(),
            ));
        }
        if policy.needs_translation() && !self.translator.has_credentials() {
            return Err(SyncError::MissingCredentials(
                "translation API key is not configured".to_string(),
            ));
        }
        if items.is_empty() {
            return Ok(HashMap::new());
        }

        let item_ids: Vec<ItemId> = items.iter().map(|item| item.id).collect();
        self.study
            .list_existing_records(&item_ids)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Auth => SyncError::Authentication(e.to_string()),
                _ => SyncError::Provider(e),
            })
    }
}

/// Handle to a spawned run
#[derive(Debug)]
pub struct RunHandle {
    /// Session the run belongs to
    pub session_id: SessionId,
    sessions: Arc<SessionController>,
    join: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Wait for the run to end
    pub async fn wait(self) -> Result<RunReport, SyncError> {
        match self.join.await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Session {} aborted: {}", self.session_id, e);
                self.sessions.set_state(self.session_id, RunState::Failed);
                self.sessions.finalize(self.session_id);
                Err(SyncError::Aborted(e.to_string()))
            }
        }
    }

    /// Whether the run task has ended
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Applies one policy to single items
#[derive(Debug)]
struct ItemProcessor {
    study: Arc<dyn StudyService>,
    translator: Arc<dyn Translator>,
    policy: Policy,
    merge: MergeEngine,
    existing: HashMap<ItemId, RecordRef>,
    options: SyncOptions,
}

impl ItemProcessor {
    async fn process(&self, item: &Item) -> Outcome {
        match self.try_process(item).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }

    async fn try_process(&self, item: &Item) -> Result<Outcome, SyncError> {
        let translated = if self.policy.needs_translation() {
            self.translator.translate(&self.request_for(item)).await?
        } else {
            String::new()
        };

        let result = self.merge.apply(&item.current_synonyms, &translated, self.policy)?;
        if !result.changed {
            return Ok(Outcome::Skipped);
        }

        match self.existing.get(&item.id) {
            Some(record) => {
                self.study.update_record(record.id, &result.next_synonyms).await?;
                Ok(Outcome::Updated)
            }
            None => {
                self.study.create_record(item.id, &result.next_synonyms).await?;
                Ok(Outcome::Created)
            }
        }
    }

    fn request_for(&self, item: &Item) -> TranslationRequest {
        let mut request = TranslationRequest::new(item.label.clone(), self.options.target_language.clone())
            .tier(self.options.tier)
            .retries(self.options.retries);
        if let Some(source) = &self.options.source_language {
            request = request.source_language(source.clone());
        }
        if let Some(context) = &self.options.context {
            request = request.context(context.clone());
        }
        request
    }
}

/// State owned by a spawned run
struct Driver {
    session_id: SessionId,
    sessions: Arc<SessionController>,
    scheduler: BatchScheduler,
    cancel: CancellationToken,
    processor: ItemProcessor,
}

impl Driver {
    async fn drive(self, items: Vec<Item>) -> RunReport {
        let session_id = self.session_id;
        let sessions = &self.sessions;
        let processor = &self.processor;
        let mut report = RunReport {
            session_id,
            state: RunState::Running,
            stats: Stats::new(),
            attempted: 0,
            total: items.len(),
            items: Vec::with_capacity(items.len()),
        };

        let summary = self
            .scheduler
            .run(
                &items,
                &self.cancel,
                |item: &Item| {
                    let item = item.clone();
                    async move { processor.process(&item).await }
                },
                |item: &Item, outcome: Outcome, progress| {
                    match &outcome {
                        Outcome::Created | Outcome::Updated => info!(
                            "[{}/{}] '{}' ({}): {:?}",
                            progress.completed, progress.total, item.label, item.id, outcome
                        ),
                        Outcome::Skipped => debug!(
                            "[{}/{}] '{}' ({}): already up to date",
                            progress.completed, progress.total, item.label, item.id
                        ),
                        Outcome::Failed(reason) => warn!(
                            "[{}/{}] '{}' ({}) failed: {}",
                            progress.completed, progress.total, item.label, item.id, reason
                        ),
                    }

                    report.stats.record(&outcome);
                    if !sessions.commit(session_id, &outcome) {
                        debug!("Session {} is no longer current, outcome of '{}' not committed", session_id, item.label);
                    }
                    sessions.record_progress(session_id, progress.percent);
                    report.items.push(ItemReport {
                        item_id: item.id,
                        label: item.label.clone(),
                        outcome,
                    });
                },
            )
            .await;

        report.attempted = summary.processed;
        report.state = if summary.cancelled {
            RunState::Cancelled
        } else {
            sessions.record_progress(session_id, 100);
            RunState::Completed
        };
        sessions.set_state(session_id, report.state);
        sessions.finalize(session_id);

        match report.state {
            RunState::Cancelled => info!(
                "Session {} cancelled after {} of {} items: {}",
                session_id, report.attempted, report.total, report.stats
            ),
            _ => info!("Session {} completed: {}", session_id, report.stats),
        }
        report
    }
}
