//! SpendSense CLI - Transaction analysis from the terminal
//!
//! Usage:
//!   spendsense analyze --file statement.csv   Analyze a statement
//!   spendsense sample --analyze               Analyze the built-in sample
//!   spendsense serve --port 3000              Start web server
//!   spendsense backend                        Check the inference backend

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Analyze {
            file,
            mime,
            export_csv,
            json,
        } => {
            let gateway = commands::gateway_from_env()?;
            commands::cmd_analyze(
                &gateway,
                &file,
                mime.as_deref(),
                export_csv.as_deref(),
                json,
            )
            .await
        }
        Commands::Sample { analyze } => {
            if analyze {
                let gateway = commands::gateway_from_env()?;
                commands::cmd_sample_analyze(&gateway).await
            } else {
                commands::cmd_sample_print()
            }
        }
        Commands::Serve {
            port,
            host,
            allowed_origins,
            static_dir,
        } => {
            let gateway = commands::gateway_from_env()?;
            commands::cmd_serve(gateway, &host, port, allowed_origins, static_dir.as_deref())
                .await
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
        },
        Commands::Backend => {
            let gateway = spendsense_core::InferenceGateway::from_env();
            commands::cmd_backend(gateway.as_ref()).await
        }
    }
}
