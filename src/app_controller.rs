use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::SyncError;
use crate::providers::deepl::DeepL;
use crate::providers::wanikani::WaniKani;
use crate::providers::{StudyService, Translator};
use crate::sync::{RunHandle, RunReport, RunState, SessionId, SyncEngine};

// @module: Application controller for synonym synchronization

/// Interval at which the progress bar polls the running session
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Main application controller for synonym synchronization
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Study service client built from the configuration
    pub fn study_client(&self) -> WaniKani {
        WaniKani::new_with_config(
            self.config.study.api_token.clone(),
            self.config.study.endpoint.clone(),
            self.config.study.timeout_secs,
        )
    }

    /// Translation client built from the configuration
    pub fn translation_client(&self) -> DeepL {
        DeepL::new_with_config(
            self.config.translation.api_key.clone(),
            self.config.translation.get_endpoint(),
            self.config.translation.retry_backoff_ms,
            self.config.translation.timeout_secs,
        )
    }

    /// Run a sync against the configured remote services
    pub async fn run(&self) -> Result<RunReport> {
        self.config.validate().context("Configuration validation failed")?;
        let study: Arc<dyn StudyService> = Arc::new(self.study_client());
        let translator: Arc<dyn Translator> = Arc::new(self.translation_client());
        self.run_with(study, translator).await
    }

    /// Run a sync against the given collaborators
    pub async fn run_with(&self, study: Arc<dyn StudyService>, translator: Arc<dyn Translator>) -> Result<RunReport> {
        let start_time = Instant::now();
        let filter = self.config.study.filter();

        let items = study
            .list_items(&filter)
            .await
            .map_err(SyncError::from)
            .with_context(|| format!("Failed to list {} items", filter.subject_type))?;
        if items.is_empty() {
            warn!("No {} items match the configured levels", filter.subject_type);
        }
        info!(
            "Syncing {} items to {} with policy '{}'",
            items.len(),
            self.config.target_language,
            self.config.policy.display_name()
        );

        let engine = SyncEngine::new(study, translator, self.config.sync_options()?);
        let total = items.len() as u64;
        let handle = engine
            .start_run(items, self.config.policy)
            .await
            .context("Failed to start synchronization")?;

        let interrupt = Self::cancel_on_interrupt(&engine, handle.session_id);
        let report = Self::wait_with_progress(&engine, handle, total).await;
        interrupt.abort();
        let report = report?;

        self.log_summary(&report, start_time.elapsed());
        Ok(report)
    }

    /// Cancel the session when Ctrl-C is pressed
    fn cancel_on_interrupt(engine: &SyncEngine, session_id: SessionId) -> tokio::task::JoinHandle<()> {
        let sessions = engine.sessions();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing the current item before stopping");
                if let Err(e) = sessions.cancel(session_id) {
                    debug!("Could not cancel session {}: {}", session_id, e);
                }
            }
        })
    }

    /// Draw a progress bar until the run ends
    async fn wait_with_progress(engine: &SyncEngine, handle: RunHandle, total: u64) -> Result<RunReport> {
        let session_id = handle.session_id;
        let progress_bar = ProgressBar::new(total);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} items ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let mut ticker = tokio::time::interval(PROGRESS_POLL_INTERVAL);
        while !handle.is_finished() {
            ticker.tick().await;
            if let Some(stats) = engine.stats(session_id) {
                progress_bar.set_position(stats.total() as u64);
                progress_bar.set_message(format!("{} failed", stats.failed));
            }
        }

        let report = handle.wait().await?;
        progress_bar.set_position(report.attempted as u64);
        if report.state == RunState::Completed {
            progress_bar.finish_with_message("done");
        } else {
            progress_bar.abandon_with_message(format!("{:?}", report.state).to_lowercase());
        }
        Ok(report)
    }

    fn log_summary(&self, report: &RunReport, elapsed: Duration) {
        let summary = format!(
            "Session {}: {} of {} items processed ({}) in {}",
            report.session_id,
            report.attempted,
            report.total,
            report.stats,
            Self::format_duration(elapsed)
        );

        match report.state {
            RunState::Completed if report.stats.failed == 0 => info!("{}", summary),
            RunState::Completed => warn!("{}", summary),
            _ => warn!("{} [{:?}]", summary, report.state),
        }

        for item in report.items.iter().filter(|item| !item.outcome.is_success()) {
            debug!("Failed item {} ('{}'): {:?}", item.item_id, item.label, item.outcome);
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
