//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Learning-management results client
#[derive(Parser, Debug)]
#[command(name = "lms-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config and environment)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Results per page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Session file
    #[arg(short, long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search feedback results
    Search {
        /// Filter as key=value (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Number of pages to load
        #[arg(long, default_value = "1", conflicts_with = "all")]
        pages: u32,

        /// Load every page
        #[arg(long)]
        all: bool,
    },

    /// Sign in with an access token
    Login {
        /// Access token issued by the backend
        #[arg(long)]
        token: String,
    },

    /// Show the signed-in user
    Whoami {
        /// Trust the persisted session without asking the backend
        #[arg(long)]
        no_validate: bool,
    },

    /// Sign out and forget the session
    Logout,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one document per line)
    Json,
    /// Human-readable output
    Pretty,
}
