/*!
 * # synsync - Batch synonym synchronization
 *
 * A Rust library that translates the meanings of study items and keeps the
 * translations in sync with the synonym lists stored on a study service.
 *
 * ## Features
 *
 * - Translate item labels through DeepL (free or pro tier)
 * - Fold translations into existing synonyms with a selectable policy:
 *   - Replace: the translation becomes the only synonym
 *   - Smart merge: the translation is appended unless already present
 *   - Delete: all synonyms are removed
 * - Rate-limited batch processing with cooperative cancellation
 * - Session isolation so a superseded run never pollutes later statistics
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `sync`: The synchronization engine:
 *   - `sync::merge`: Merge policies
 *   - `sync::scheduler`: Batch scheduling and cancellation
 *   - `sync::session`: Session bookkeeping
 *   - `sync::driver`: Run state machine
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Clients for the remote services:
 *   - `providers::wanikani`: WaniKani API client
 *   - `providers::deepl`: DeepL API client
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod sync;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ErrorKind, ProviderError, SyncError};
pub use language_utils::{get_language_name, normalize_to_part2t, to_source_code, to_translation_code};
pub use sync::{Item, Outcome, Policy, RunReport, RunState, SessionId, Stats, SyncEngine, SyncOptions};
