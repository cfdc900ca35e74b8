//! CLI module for medrec
//!
//! Provides command-line interface parsing for the medrec-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod admin;
pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// medrec - health-records portal server
///
/// Serves patients, doctors, diagnoses, medications, vitals, goals and
/// appointments behind a JWT-authenticated REST API.
#[derive(Parser, Debug)]
#[command(
    name = "medrec-server",
    version,
    about = "medrec - health-records portal server",
    long_about = "A REST server for patient health records with role-based access for\n\
                  patients, doctors and administrators.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a new deployment.",
    after_help = "EXAMPLES:\n    \
                  medrec-server init                 # Scaffold medrec.toml and .env.example\n    \
                  medrec-server migrate              # Apply database migrations and exit\n    \
                  medrec-server create-admin --name Ops --email ops@example.com --password '...'\n    \
                  medrec-server                      # Start the server\n    \
                  medrec-server --config prod.toml   # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "medrec.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (the default)
    Serve,

    /// Initialize a new deployment with configuration files
    ///
    /// Creates medrec.toml, .env.example and the data/ directory.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Show configuration information
    Config {
        /// Validate the configuration and required environment variables
        #[arg(long)]
        validate: bool,
    },

    /// Create an administrator account
    CreateAdmin {
        /// Display name
        #[arg(long)]
        name: String,

        /// Login email
        #[arg(long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(long, env = "MEDREC_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
