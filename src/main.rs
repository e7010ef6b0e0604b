// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;

use bimtrans::app_config::{self, Config};
use bimtrans::app_controller::Controller;

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
    /// Translate the texts of a model file
    Translate(TranslateArgs),

    /// Show the character usage of the API account
    Usage(UsageArgs),

    /// Generate shell completions for bimtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Model file to translate
    #[arg(value_name = "MODEL")]
    model_path: PathBuf,

    /// Output file (default: <model>.<target>.json next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language code (e.g., 'en', 'de'); omit for auto-detection
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'fr', 'en-gb', 'pt-br')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Apply partial results without asking when the run is interrupted
    #[arg(short = 'y', long)]
    yes: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct UsageArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// API key, overrides the configuration file
    #[arg(long, env = "DEEPL_AUTH_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

/// bimtrans - Building model text translation
///
/// Extracts names, parameter values, notes, schedules and dimension texts
/// from a building model and translates them through the DeepL API.
#[derive(Parser, Debug)]
#[command(name = "bimtrans")]
#[command(version)]
#[command(about = "Translate the texts of a building model")]
#[command(long_about = "bimtrans extracts the texts of a building model and translates them with the DeepL API.

EXAMPLES:
    bimtrans translate tower.json -t fr          # Translate to French
    bimtrans translate tower.json -t de -o out.json
    bimtrans translate tower.json -y             # Keep partial results on interruption
    bimtrans usage                               # Show the account's character usage
    bimtrans completions bash > bimtrans.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. The API key may also come from DEEPL_AUTH_KEY.

INTERRUPTING:
    Ctrl-C stops the translation; you are then asked whether the texts translated
    so far should be written. A second Ctrl-C stops the write-back before the next
    document.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the configuration and apply command line overrides
fn load_config(common: &CommonArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(api_key) = &common.api_key {
        config.api.api_key = api_key.clone();
    }

    // Command line level wins over the config file
    match &common.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.into()),
    }

    Ok(config)
}

fn apply_log_level(common: &CommonArgs) {
    if let Some(level) = &common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.into());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the global max level does the filtering
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "bimtrans", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Usage(args) => run_usage(args).await,
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    apply_log_level(&options.common);
    let mut config = load_config(&options.common)?;

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    let controller = Controller::with_config(config)?;
    let result = controller
        .run(&options.model_path, options.output.clone(), options.yes)
        .await
        .with_context(|| format!("Failed to translate {:?}", options.model_path))?;

    if let Some(reason) = &result.cancel_reason {
        warn!("Run ended early: {}", reason);
    }
    if let Some(apply) = &result.apply {
        if apply.groups_rolled_back > 0 {
            error!("{} document(s) could not be updated", apply.groups_rolled_back);
        }
    }
    Ok(())
}

async fn run_usage(options: UsageArgs) -> Result<()> {
    apply_log_level(&options.common);
    let config = load_config(&options.common)?;
    let controller = Controller::with_config(config)?;

    let usage = controller.usage().await?;
    info!("{}", usage);
    if usage.is_exhausted() {
        warn!("The monthly character limit has been reached");
    } else if usage.character_limit > 0 {
        info!("{} characters remaining", usage.remaining());
    }
    Ok(())
}
