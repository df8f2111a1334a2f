//! move2innodb CLI - switch forum tables between InnoDB and MyISAM.

use clap::{Parser, Subcommand};
use move2innodb::error::EXIT_DDL_FAILURE;
use move2innodb::{
    Config, ConfigStore, EngineMigrator, FileConfigStore, MigrateError, MigrationReport,
    MysqlBackend, Principal, SettingsController, SettingsForm,
};
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "move2innodb")]
#[command(about = "Switch forum Discussion/Comment tables between InnoDB and MyISAM")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server version, fulltext support and current table engines
    Status,

    /// Switch the managed tables to an engine (requires stored consent)
    Migrate {
        /// Target engine: InnoDB or MyISAM
        #[arg(long)]
        engine: String,
    },

    /// Submit the settings form: store consent and switch engines
    Settings {
        /// true switches to InnoDB, false switches back to MyISAM
        #[arg(long, action = clap::ArgAction::Set)]
        use_innodb: bool,
    },

    /// Run the activation routine (default consent, then try InnoDB)
    Setup,

    /// Test the database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) if e.is_refusal() => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let backend = MysqlBackend::connect(&config.database).await?;
    let (command, output_json) = (cli.command, cli.output_json);

    with_backend(
        backend,
        |backend| execute(command, output_json, &config, backend),
        MysqlBackend::close,
    )
    .await
}

/// Run `command` against `backend`, then close the backend whether the
/// command succeeded or not.
async fn with_backend<B, F, Fut, C, CFut>(
    backend: B,
    command: F,
    close: C,
) -> Result<ExitCode, MigrateError>
where
    F: FnOnce(Arc<B>) -> Fut,
    Fut: Future<Output = Result<ExitCode, MigrateError>>,
    C: FnOnce(B) -> CFut,
    CFut: Future<Output = ()>,
{
    let backend = Arc::new(backend);
    let result = command(backend.clone()).await;

    match Arc::try_unwrap(backend) {
        Ok(backend) => close(backend).await,
        Err(_) => warn!("Backend still referenced after command, leaving pool to drop"),
    }

    result
}

async fn execute(
    command: Commands,
    output_json: bool,
    config: &Config,
    backend: Arc<MysqlBackend>,
) -> Result<ExitCode, MigrateError> {
    match command {
        Commands::HealthCheck => {
            let result = backend.health_check().await;

            if output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  MySQL: {} ({}ms)",
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref version) = result.server_version {
                    println!("    Version: {}", version);
                }
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            if !result.connected {
                return Err(MigrateError::database(
                    result.error.unwrap_or_default(),
                    "health check",
                ));
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Status => {
            let migrator = EngineMigrator::from_backend(backend, config);
            let store = FileConfigStore::open(&config.settings.path)?;
            let status = migrator.status().await?;
            let consent = store.flag_or(move2innodb::CONSENT_KEY, false).await?;
            let use_innodb = store.flag_or(move2innodb::USE_INNODB_KEY, false).await?;

            if output_json {
                let json = serde_json::json!({
                    "status": status,
                    "settings_path": store.path().display().to_string(),
                    "consent": consent,
                    "use_innodb": use_innodb,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("Server version: {} ({:?})", status.server_version, status.flavor);
                println!(
                    "InnoDB fulltext: {}",
                    if status.fulltext_available { "available" } else { "unavailable" }
                );
                for table in &status.tables {
                    println!("  {}: {}", table.name, table.current_engine);
                }
                for name in &status.missing {
                    println!("  {}: (missing)", name);
                }
                println!("Settings file: {}", store.path().display());
                println!("Consent: {}", consent);
                println!("Use InnoDB: {}", use_innodb);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Migrate { engine } => {
            let migrator = EngineMigrator::from_backend(backend, config);
            let store = FileConfigStore::open(&config.settings.path)?;
            let cancel = setup_signal_handler();

            let report = migrator.migrate_with_store(&store, &engine, &cancel).await?;
            print_report(&report, output_json)
        }

        Commands::Settings { use_innodb } => {
            let controller = controller(backend, config)?;
            let cancel = setup_signal_handler();
            let principal = Principal::operator(current_user());

            let report = controller
                .submit(&principal, SettingsForm { use_innodb }, &cancel)
                .await?;
            print_report(&report, output_json)
        }

        Commands::Setup => {
            let controller = controller(backend, config)?;
            let cancel = setup_signal_handler();

            let report = controller.setup(&cancel).await?;
            print_report(&report, output_json)
        }
    }
}

fn controller(
    backend: Arc<MysqlBackend>,
    config: &Config,
) -> Result<SettingsController, MigrateError> {
    let migrator = EngineMigrator::from_backend(backend, config);
    let store = FileConfigStore::open(&config.settings.path)?;
    Ok(SettingsController::new(Arc::new(migrator), Arc::new(store)))
}

fn print_report(report: &MigrationReport, json: bool) -> Result<ExitCode, MigrateError> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.summary());
        println!("  Run ID: {}", report.run_id);
        println!("  Duration: {:.2}s", report.duration_seconds);
    }

    if report.has_failures() {
        Ok(ExitCode::from(EXIT_DDL_FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn current_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "operator".to_string())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Cancel the returned token on SIGINT or SIGTERM.
///
/// Cancellation stops further ALTER TABLE statements; one already running
/// is left to finish.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        match signal(kind) {
            Ok(mut stream) => {
                tokio::spawn(async move {
                    stream.recv().await;
                    eprintln!("\nReceived {}. Finishing the current table, then stopping...", name);
                    token.cancel();
                });
            }
            Err(e) => eprintln!("Failed to install {} handler: {}", name, e),
        }
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived Ctrl-C. Finishing the current table, then stopping...");
            token.cancel();
        }
    });

    cancel_token
}
