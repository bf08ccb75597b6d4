// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, warn};
use std::io::Write;
use std::path::Path;

use synsync::app_config::{self, Config};
use synsync::app_controller::Controller;
use synsync::sync::{Policy, RunState};

/// CLI Wrapper for Policy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliPolicy {
    Replace,
    SmartMerge,
    Delete,
}

impl From<CliPolicy> for Policy {
    fn from(cli_policy: CliPolicy) -> Self {
        match cli_policy {
            CliPolicy::Replace => Policy::Replace,
            CliPolicy::SmartMerge => Policy::SmartMerge,
            CliPolicy::Delete => Policy::Delete,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate item meanings and sync them as synonyms (default command)
    Sync(SyncArgs),

    /// Generate shell completions for synsync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
struct SyncArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: String,

    /// Update policy applied to every item
    #[arg(short, long, value_enum)]
    policy: Option<CliPolicy>,

    /// Levels to sync, comma separated (e.g. '1,2,3')
    #[arg(long, value_delimiter = ',')]
    levels: Option<Vec<u32>>,

    /// Target language code (e.g. 'de', 'fr', 'pt-br')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// synsync - Batch synonym synchronization
///
/// Translates the meanings of study items and stores the translations as
/// meaning synonyms, in rate-limited batches.
#[derive(Parser, Debug)]
#[command(name = "synsync")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(about = "Translate study item meanings into synonyms")]
#[command(long_about = "synsync translates the meanings of WaniKani items with DeepL and stores the translations as meaning synonyms.

EXAMPLES:
    synsync                                     # Sync using the default config
    synsync --policy replace                    # Make the translation the only synonym
    synsync --levels 1,2,3 -t fr                # Sync levels 1-3 into French
    synsync --policy delete                     # Remove all synonyms
    synsync completions bash > synsync.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    is created and the run stops so the API credentials can be filled in.

POLICIES:
    replace     - The translation becomes the only synonym
    smart-merge - The translation is added unless already present (default)
    delete      - All synonyms are removed, no translation is requested")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    sync: SyncArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Filtering happens through log::set_max_level so the level can change after init
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "synsync", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Sync(args)) => run_sync(args).await,
        None => run_sync(cli.sync).await,
    }
}

async fn run_sync(options: SyncArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(log_level.to_level_filter());
    }

    let config_path = Path::new(&options.config);
    if !config_path.exists() {
        warn!("Config file not found at '{}', creating default config.", options.config);
        Config::default()
            .save(config_path)
            .context("Failed to write default config")?;
        return Err(anyhow!(
            "Fill in study.api_token and translation.api_key in '{}' and run again",
            options.config
        ));
    }

    let mut config = Config::load(config_path)?;
    apply_overrides(&mut config, &options);

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;
    let report = controller.run().await?;

    match report.state {
        RunState::Completed => Ok(()),
        RunState::Cancelled => {
            error!("Sync cancelled after {} of {} items", report.attempted, report.total);
            Ok(())
        }
        state => Err(anyhow!("Sync ended in state {:?}", state)),
    }
}

// Override config with CLI options if provided
fn apply_overrides(config: &mut Config, options: &SyncArgs) {
    if let Some(policy) = &options.policy {
        config.policy = policy.clone().into();
    }

    if let Some(levels) = &options.levels {
        config.study.levels = levels.clone();
    }

    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}
