//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// pillard - cross-pillar coordinator
#[derive(Parser)]
#[command(
    name = "pd",
    about = "Cross-pillar coordinator: health checks, message exchange and feedback cycles",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    pub stderr: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the coordinator in the foreground
    Run,

    /// Show system status from a running daemon
    Status {
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show recent feedback cycles from a running daemon
    Cycles {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show recent system activities from a running daemon
    Activity {
        #[arg(short = 'n', long, default_value = "30")]
        limit: usize,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show recent repository activity from a running daemon
    Repos {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show recent discussion messages from a running daemon
    Discussions {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check every pillar once, without a daemon
    Check {
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run one feedback cycle against the configured store, without a daemon
    Cycle {
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the effective configuration as YAML
    Config,

    /// Ping the daemon to check if it's alive and responsive
    Ping,

    /// Ask a running daemon to stop
    Stop,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pillard")
        .join("logs")
        .join("pillard.log")
}

/// Output format for query commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
