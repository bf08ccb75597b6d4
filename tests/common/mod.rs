/*!
 * Common test utilities for the synsync test suite
 */

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use synsync::app_config::Config;
use synsync::providers::mock::{MockStudyService, MockTranslator};
use synsync::sync::{Item, SchedulerConfig, SyncEngine, SyncOptions};

/// Route library logs to the test output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes `config` to `conf.json` inside `dir`
pub fn write_config(dir: &Path, config: &Config) -> Result<PathBuf> {
    let path = dir.join("conf.json");
    config.save(&path)?;
    Ok(path)
}

/// A configuration with credentials and no pauses
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.study.api_token = "wk-test-token".to_string();
    config.translation.api_key = "deepl-test-key:fx".to_string();
    config.batch.item_delay_ms = 0;
    config.batch.batch_delay_ms = 0;
    config
}

/// Build a string vector
pub fn synonyms(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// `count` items without synonyms, ids starting at `first_id`
pub fn items(first_id: u64, count: usize) -> Vec<Item> {
    (0..count as u64)
        .map(|i| Item::new(first_id + i, format!("radical {}", first_id + i), Vec::new(), 1))
        .collect()
}

/// Engine options without pauses
pub fn fast_options() -> SyncOptions {
    SyncOptions {
        scheduler: SchedulerConfig::without_delays(20),
        ..SyncOptions::default()
    }
}

/// Engine over clones of the given mocks, sharing their recorded state
pub fn engine_with(study: &MockStudyService, translator: &MockTranslator, options: SyncOptions) -> SyncEngine {
    SyncEngine::new(Arc::new(study.clone()), Arc::new(translator.clone()), options)
}
