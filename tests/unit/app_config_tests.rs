/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::time::Duration;

use synsync::app_config::{Config, LogLevel, TranslationTier};
use synsync::errors::SyncError;
use synsync::sync::Policy;

use crate::common;

/// Test configuration save and load
#[test]
fn test_config_saveAndLoad_shouldPreserveValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config();
    config.policy = Policy::Delete;
    config.target_language = "fr".to_string();
    config.translation.tier = TranslationTier::Pro;
    config.study.levels = vec![3, 4];
    config.log_level = LogLevel::Debug;

    let path = common::write_config(temp_dir.path(), &config)?;
    let loaded = Config::load(&path)?;

    assert_eq!(loaded.policy, Policy::Delete);
    assert_eq!(loaded.target_language, "fr");
    assert_eq!(loaded.translation.tier, TranslationTier::Pro);
    assert_eq!(loaded.study.levels, vec![3, 4]);
    assert_eq!(loaded.log_level, LogLevel::Debug);
    assert_eq!(loaded.study.api_token, config.study.api_token);
    Ok(())
}

#[test]
fn test_config_load_withMalformedJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    std::fs::write(&path, "{ \"policy\": ")?;

    assert!(Config::load(&path).is_err());
    assert!(Config::load(&temp_dir.path().join("missing.json")).is_err());
    Ok(())
}

#[test]
fn test_config_validate_defaultConfig_shouldRequireCredentials() {
    let error = Config::default().validate().unwrap_err();
    assert!(matches!(
        error.downcast_ref::<SyncError>(),
        Some(SyncError::MissingCredentials(_))
    ));
}

#[test]
fn test_config_syncOptions_shouldCarryPacingAndLimits() -> Result<()> {
    let mut config = common::test_config();
    config.target_language = "pt-br".to_string();
    config.batch.batch_size = 5;
    config.batch.batch_delay_ms = 750;
    config.batch.max_synonyms = 4;
    config.translation.context = None;

    let options = config.sync_options()?;

    assert_eq!(options.target_language, "PT-BR");
    assert_eq!(options.scheduler.batch_size, 5);
    assert_eq!(options.scheduler.batch_delay, Duration::from_millis(750));
    assert_eq!(options.max_synonyms, 4);
    assert_eq!(options.context, None);
    Ok(())
}

#[test]
fn test_studyConfig_filter_shouldUseSubjectTypeAndLevels() {
    let mut config = common::test_config();
    config.study.levels = vec![1, 2];

    let filter = config.study.filter();

    assert_eq!(filter.subject_type, "radical");
    assert_eq!(filter.levels, vec![1, 2]);
}

#[test]
fn test_translationTier_fromStr_shouldAcceptNames() {
    assert_eq!("pro".parse::<TranslationTier>().unwrap(), TranslationTier::Pro);
    assert_eq!("Free".parse::<TranslationTier>().unwrap(), TranslationTier::Free);
    assert!("enterprise".parse::<TranslationTier>().is_err());
}
