// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::app_config::Config;
use crate::app_controller::TranscriptPipeline;
use crate::server::auth::TokenInfoVerifier;
use crate::server::{AppState, serve};

mod app_config;
mod app_controller;
mod enrichment;
mod errors;
mod playback_sync;
mod providers;
mod segment;
mod server;
mod sources;
mod timed_text;
mod video_reference;

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

fn to_level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the transcript HTTP service (default command)
    #[command(alias = "serve")]
    Serve(ServeArgs),

    /// Generate shell completions for kikitori
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Bind address, overrides the configuration
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Register the external downloader tier
    #[arg(long)]
    enable_downloader: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Kikitori - listening practice transcript service
///
/// Acquires time-aligned transcripts for videos through a chain of fallback
/// strategies and enriches them with romaji and a translation.
#[derive(Parser, Debug)]
#[command(name = "kikitori")]
#[command(version = "1.0.0")]
#[command(about = "Transcript acquisition and enrichment service")]
#[command(long_about = "Kikitori serves time-aligned video transcripts over HTTP, \
acquiring captions through a chain of fallback strategies (hosted captions, raw \
player tracks, optional yt-dlp, speech recognition) and enriching each line with \
romaji and a translation.

EXAMPLES:
    kikitori                               # Serve using conf.json
    kikitori -p 8080                       # Override the listen port
    kikitori --enable-downloader           # Register the yt-dlp tier
    kikitori --log-level debug             # Verbose logging
    kikitori completions bash > kikitori.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically. The enrichment API key falls back to the
    OPENAI_API_KEY environment variable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Bind address, overrides the configuration
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Register the external downloader tier
    #[arg(long)]
    enable_downloader: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
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
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} [{}] {}\x1B[0m",
                color,
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

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "kikitori", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Serve(args)) => run_serve(args).await,
        None => {
            // Default behavior - use top-level args
            let serve_args = ServeArgs {
                host: cli.host,
                port: cli.port,
                enable_downloader: cli.enable_downloader,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_serve(serve_args).await
        }
    }
}

async fn run_serve(options: ServeArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(to_level_filter(&config_log_level));
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        config
    } else {
        // Create default configuration if not exists
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let config = Config::default();

        // Save default config
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Override config with CLI options if provided
    if let Some(host) = &options.host {
        config.server.host = host.clone();
    }
    if let Some(port) = options.port {
        config.server.port = port;
    }
    if options.enable_downloader {
        config.sources.enable_downloader = true;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(to_level_filter(&config.log_level));
    }

    let has_key = !config.enrichment.get_api_key().is_empty();
    if !has_key {
        warn!("No enrichment API key configured - romaji and translation will be empty");
    }

    let pipeline = Arc::new(TranscriptPipeline::from_config(&config));

    let verifier = if config.server.token_info_endpoint.is_empty() {
        None
    } else {
        Some(Arc::new(TokenInfoVerifier::new(
            config.server.token_info_endpoint.clone(),
        )) as Arc<dyn server::auth::IdentityVerifier>)
    };

    let state = AppState {
        pipeline,
        require_auth: config.server.require_auth,
        verifier,
        has_key,
    };

    serve(state, &config.server.host, config.server.port).await
}
