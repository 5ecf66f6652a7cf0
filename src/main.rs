// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use sqlshift::app_config::{self, Config};
use sqlshift::app_controller::Controller;
use sqlshift::conversion::ConversionOutcome;
use sqlshift::export::DirectorySink;
use sqlshift::notifications::{Notification, NotificationKind};
use sqlshift::services::http::HttpService;

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

/// Options shared by every command that talks to the service
#[derive(Args, Debug, Clone)]
struct ServiceArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Override the service endpoint from the configuration
    #[arg(long)]
    endpoint: Option<String>,

    /// API key forwarded to the conversion service
    #[arg(long, env = "SQLSHIFT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// SQL file to convert
    #[arg(value_name = "FILE", conflicts_with = "sql")]
    input_file: Option<PathBuf>,

    /// SQL text to convert instead of a file
    #[arg(long)]
    sql: Option<String>,

    /// Source dialect (defaults to the first dialect offered by the service)
    #[arg(short, long)]
    source: Option<String>,

    /// Target dialect (defaults to the second dialect offered by the service)
    #[arg(short, long)]
    target: Option<String>,

    /// Export format; may be given several times
    #[arg(short, long = "format", value_name = "FORMAT")]
    formats: Vec<String>,

    /// Export every format the service supports
    #[arg(long, conflicts_with = "formats")]
    all_formats: bool,

    /// Directory receiving exported documents
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Print the converted SQL to stdout
    #[arg(long)]
    print: bool,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the dialects and export formats offered by the service
    Dialects(ServiceArgs),

    /// Convert SQL statements from one dialect to another
    Convert(ConvertArgs),

    /// Check an API key with the service
    ValidateKey {
        /// Key to validate
        key: String,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Show whether the service is reachable
    Status(ServiceArgs),

    /// Generate shell completions for sqlshift
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// sqlshift - SQL dialect conversion client
#[derive(Parser, Debug)]
#[command(name = "sqlshift")]
#[command(version)]
#[command(about = "Convert SQL between database dialects")]
#[command(long_about = "sqlshift extracts SQL statements from text or files, converts them between dialects using the conversion service and exports the results.

EXAMPLES:
    sqlshift dialects                                   # List supported dialects and formats
    sqlshift convert schema.sql -s MySQL -t PostgreSQL  # Convert a file
    sqlshift convert --sql 'SELECT 1;' --print          # Convert inline SQL
    sqlshift convert schema.sql -f PDF -f 'SQL File'    # Convert and export two formats
    sqlshift convert schema.sql --all-formats -o out/   # Export every format
    sqlshift status                                     # Check the service
    sqlshift completions bash > sqlshift.bash           # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
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

    // @returns: Emoji and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
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
            let (emoji, colour) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                emoji,
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
    // The level is lowered or raised once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sqlshift", &mut std::io::stdout());
            Ok(())
        }
        Commands::Dialects(args) => run_dialects(args).await,
        Commands::Convert(args) => run_convert(args).await,
        Commands::ValidateKey { key, service } => run_validate_key(key, service).await,
        Commands::Status(args) => run_status(args).await,
    }
}

/// Load the configuration and apply command line overrides
fn load_config(args: &ServiceArgs) -> Result<Config> {
    if let Some(cmd_log_level) = &args.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&args.config_path)?;

    if let Some(endpoint) = &args.endpoint {
        config.service.endpoint = endpoint.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.service.api_key = api_key.clone();
    }
    if let Some(log_level) = &args.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

/// Notifications are already logged as they are raised; this only keeps
/// track of whether any error was reported.
fn watch_notifications(mut rx: UnboundedReceiver<Notification>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut errors = 0;
        while let Some(notification) = rx.recv().await {
            if notification.kind == NotificationKind::Error {
                errors += 1;
            }
        }
        errors
    })
}

fn conversion_spinner(statements: usize) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(format!("Converting {} statement(s)", statements));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn run_dialects(args: ServiceArgs) -> Result<()> {
    let config = load_config(&args)?;
    let (controller, rx) = Controller::with_config(config)?;
    let watcher = watch_notifications(rx);

    let catalog = controller.start().await.context("Failed to load configuration")?;

    println!("Dialects:");
    for dialect in catalog.dialects() {
        println!("  {}", dialect);
    }
    println!("Export formats:");
    for format in catalog.formats() {
        println!("  {}", format);
    }

    drop(controller);
    watcher.await?;
    Ok(())
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let mut config = load_config(&args.service)?;
    if let Some(dir) = &args.output_dir {
        config.export.output_dir = Some(dir.clone());
    }

    let services = Arc::new(HttpService::new(&config.service)?);
    let sink = Arc::new(DirectorySink::new(config.export.resolved_output_dir()));
    let (controller, rx) = Controller::with_services(config, services, sink);
    let watcher = watch_notifications(rx);

    controller.start().await.context("Failed to load configuration")?;

    if let Some(source) = &args.source {
        controller.select_source(source)?;
    }
    if let Some(target) = &args.target {
        controller.select_target(target)?;
    }

    match (&args.input_file, &args.sql) {
        (Some(path), _) => {
            controller.submit_path(path).await?;
        }
        (None, Some(sql)) => {
            controller.submit_text(sql).await?;
        }
        (None, None) => return Err(anyhow!("Provide a FILE or --sql TEXT to convert")),
    }

    let snapshot = controller.snapshot();
    if let Some(selection) = &snapshot.selection {
        info!("{} statement(s), {}", snapshot.statements.len(), selection);
    }

    let spinner = conversion_spinner(snapshot.statements.len());
    let outcome = controller.convert().await;
    spinner.finish_and_clear();

    let outcome = outcome?;
    let snapshot = controller.snapshot();
    match outcome {
        ConversionOutcome::Completed(summary) => {
            info!(
                "{}. Total: {}, converted: {}, failed: {}",
                snapshot.state.display_name(),
                summary.total,
                summary.success,
                summary.error
            );
        }
        ConversionOutcome::Discarded => warn!(
            "Conversion results were discarded, session is {}",
            snapshot.state.display_name()
        ),
    }

    if args.print {
        for result in snapshot.results.as_deref().unwrap_or_default() {
            match &result.converted {
                Some(converted) => println!("{}\n", converted),
                None => println!(
                    "-- statement {} failed: {}\n",
                    result.index + 1,
                    result.notes.as_deref().unwrap_or("Conversion failed")
                ),
            }
        }
    }

    if args.all_formats {
        controller.export_all().await?;
    } else {
        for format in &args.formats {
            // Each format is reported on its own; one failure does not stop the others
            let _ = controller.export(format).await;
        }
    }

    drop(controller);
    let errors = watcher.await?;
    if errors > 0 {
        return Err(anyhow!("{} error(s) reported", errors));
    }
    Ok(())
}

async fn run_validate_key(key: String, args: ServiceArgs) -> Result<()> {
    let config = load_config(&args)?;
    let (controller, rx) = Controller::with_config(config)?;
    let watcher = watch_notifications(rx);

    let validation = controller.validate_api_key(&key).await?;
    println!("{}", validation.message);

    drop(controller);
    watcher.await?;
    if !validation.valid {
        return Err(anyhow!("API key is not valid"));
    }
    Ok(())
}

async fn run_status(args: ServiceArgs) -> Result<()> {
    let config = load_config(&args)?;
    let endpoint = config.service.endpoint.clone();
    let (controller, _rx) = Controller::with_config(config)?;

    let health = match controller.health().await {
        Ok(health) => health,
        Err(e) if e.is_transport() => {
            return Err(anyhow!(e).context(format!("Service at {} is not reachable", endpoint)));
        }
        Err(e) => return Err(anyhow!(e).context(format!("Service at {} is unhealthy", endpoint))),
    };
    println!("{} {} ({}) at {}", health.message, health.version, health.status, endpoint);
    Ok(())
}
