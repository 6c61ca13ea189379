//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// SpendSense - See where your money went
#[derive(Parser)]
#[command(name = "spendsense")]
#[command(about = "Categorize, flag and summarize a month of bank transactions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a CSV export or PDF statement
    Analyze {
        /// Statement file to analyze
        #[arg(short, long)]
        file: PathBuf,

        /// MIME type (inferred from the file extension if not specified)
        #[arg(long)]
        mime: Option<String>,

        /// Write the annotated transactions as CSV to this file or directory
        #[arg(long)]
        export_csv: Option<PathBuf>,

        /// Print the full dashboard data as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print or analyze the built-in sample statement
    Sample {
        /// Run the analysis instead of printing the CSV
        #[arg(long)]
        analyze: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allowed-origin")]
        allowed_origins: Vec<String>,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Show inference backend configuration and health
    Backend,
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., categorize_transactions, detect_anomalies)
        prompt_id: String,
    },
}
