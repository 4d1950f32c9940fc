//! CLI command definitions for the `codemate` binary.
//!
//! Uses clap derive macros for argument parsing. Database and API key
//! settings are read from the environment through clap's `env` support.

pub mod session;

use clap::{Parser, Subcommand};

/// Coding-assistant chat backed by Gemini, with history in SQLite.
#[derive(Parser)]
#[command(name = "codemate", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// SQLite connection URL (e.g. `sqlite://codemate.db?mode=rwc`).
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the chosen verbosity; `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn,codemate=info",
            1 => "info,codemate=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat web application.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "8501")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// List the most recently updated chat sessions.
    #[command(alias = "ls")]
    Sessions {
        /// Maximum number of sessions to show (defaults to the configured page size).
        #[arg(short, long)]
        limit: Option<u32>,

        /// Output machine-readable JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the stored transcript of one session.
    Show {
        /// Session id.
        session_id: uuid::Uuid,

        /// Output machine-readable JSON instead of styled text.
        #[arg(long)]
        json: bool,
    },
}
