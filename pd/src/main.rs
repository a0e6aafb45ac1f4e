//! pillard - cross-pillar coordinator
//!
//! CLI entry point: runs the daemon or queries a running one.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use pillard::cli::{Cli, Command, OutputFormat, get_log_path};
use pillard::config::Config;
use pillard::coordinator::{Collaborators, Coordinator};
use pillard::events::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventLogger};
use pillard::health::{HealthMonitor, HttpProbe};
use pillard::ipc::{self, DaemonClient};
use pillard::registry::PillarRegistry;
use pillard::render;

fn parse_level(s: &str) -> tracing::Level {
    match s.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, stderr: bool) -> Result<()> {
    // Priority: CLI --log-level > config file > INFO
    let level = cli_log_level
        .or(config_log_level)
        .map(parse_level)
        .unwrap_or(tracing::Level::INFO);
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    if stderr {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        let log_path = get_log_path();
        if let Some(log_dir) = log_path.parent() {
            fs::create_dir_all(log_dir).context("Failed to create log directory")?;
        }
        let log_file = fs::File::create(&log_path).context("Failed to create log file")?;
        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_ansi(false)
            .with_env_filter(filter)
            .init();
    }

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref(), cli.stderr)
        .context("Failed to setup logging")?;
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run => run_daemon(config).await,
        Command::Status { format } => cmd_status(format).await,
        Command::Cycles { limit, format } => {
            let cycles = DaemonClient::new().cycles(limit).await.context(not_running())?;
            print_output(format, cycles.as_slice(), render::render_cycles)
        }
        Command::Activity { limit, format } => {
            let activities = DaemonClient::new().activities(limit).await.context(not_running())?;
            print_output(format, activities.as_slice(), render::render_activities)
        }
        Command::Repos { limit, format } => {
            let entries = DaemonClient::new()
                .repository_activity(limit)
                .await
                .context(not_running())?;
            print_output(format, entries.as_slice(), render::render_repository_activity)
        }
        Command::Discussions { limit, format } => {
            let messages = DaemonClient::new().discussions(limit).await.context(not_running())?;
            print_output(format, messages.as_slice(), render::render_discussions)
        }
        Command::Check { format } => cmd_check(&config, format).await,
        Command::Cycle { format } => cmd_cycle(config, format).await,
        Command::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
        Command::Ping => {
            let version = DaemonClient::new().ping().await.context(not_running())?;
            println!("pillard {} is running", version);
            Ok(())
        }
        Command::Stop => {
            DaemonClient::new().shutdown().await.context(not_running())?;
            println!("Shutdown requested");
            Ok(())
        }
    }
}

fn not_running() -> &'static str {
    "Daemon not reachable (is `pd run` running?)"
}

fn print_output<T: Serialize + ?Sized>(format: OutputFormat, value: &T, text: impl Fn(&T) -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => print!("{}", text(value)),
    }
    Ok(())
}

async fn cmd_status(format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_status: called");
    let (status, metrics, current) = DaemonClient::new().status().await.context(not_running())?;
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "status": status,
                "metrics": metrics,
                "current_cycle": current,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => print!("{}", render::render_status(&status, &metrics, current.as_ref())),
    }
    Ok(())
}

/// One-shot health check of every configured pillar
async fn cmd_check(config: &Config, format: OutputFormat) -> Result<()> {
    debug!("cmd_check: called");
    let registry = Arc::new(PillarRegistry::new(config.build_pillars()));
    let probe = HttpProbe::new(config.health.timeout()).context("Failed to build HTTP client")?;
    let monitor = HealthMonitor::new(registry, Arc::new(probe), Arc::new(EventBus::with_default_capacity()));
    let reports = monitor.check_all().await;
    print_output(format, reports.as_slice(), render::render_health)
}

/// One-shot feedback cycle against the configured store
async fn cmd_cycle(config: Config, format: OutputFormat) -> Result<()> {
    debug!("cmd_cycle: called");
    let collaborators = Collaborators::from_config(&config).await?;
    let coordinator = Coordinator::new(config, collaborators, Arc::new(EventBus::with_default_capacity()));
    let outcome = coordinator.feedback().run_cycle().await;
    let cycles: Vec<_> = outcome.cycle().cloned().into_iter().collect();
    print_output(format, cycles.as_slice(), render::render_cycles)
}

/// Run the coordinator until SIGINT, SIGTERM or an IPC shutdown request
async fn run_daemon(config: Config) -> Result<()> {
    debug!("run_daemon: called");
    info!(pillars = config.pillars.len(), "Daemon starting...");

    let events = Arc::new(EventBus::new(DEFAULT_CHANNEL_CAPACITY));
    match EventLogger::with_default_path() {
        Ok(logger) => {
            info!(path = %logger.path().display(), "Event log enabled");
            tokio::spawn(logger.run(events.clone()));
        }
        Err(e) => warn!(error = %e, "Event log disabled"),
    }

    let collaborators = Collaborators::from_config(&config).await?;
    let mut coordinator = Coordinator::new(config, collaborators, events);

    let (listener, socket_path) = ipc::create_listener()?;
    info!(?socket_path, "IPC socket listening");

    coordinator.start();
    info!("Daemon running. Press Ctrl+C to stop.");

    let result = serve(&coordinator, &listener, &socket_path).await;

    info!("Daemon shutting down...");
    coordinator.stop().await;
    ipc::cleanup_socket(&socket_path);
    debug!("run_daemon: shutdown complete");
    result
}

async fn serve(coordinator: &Coordinator, listener: &tokio::net::UnixListener, socket_path: &PathBuf) -> Result<()> {
    debug!(?socket_path, "serve: called");
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                warn!("SIGINT received");
                return Ok(());
            }
            _ = sigterm.recv() => {
                warn!("SIGTERM received");
                return Ok(());
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => match ipc::handle_connection(stream, coordinator).await {
                        Ok(true) => {
                            info!("Shutdown requested over IPC");
                            return Ok(());
                        }
                        Ok(false) => {}
                        Err(e) => warn!(error = %e, "IPC connection failed"),
                    },
                    Err(e) => warn!(error = %e, "IPC accept failed"),
                }
            }
        }
    }
}
