//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use spendsense_core::{InferenceBackend, InferenceGateway};
use spendsense_server::ServerConfig;

pub async fn cmd_serve(
    gateway: InferenceGateway,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
    static_dir: Option<&Path>,
) -> Result<()> {
    let backend = gateway.backend();
    println!("🚀 Starting SpendSense web server...");
    println!("   Listening: http://{}:{}", host, port);
    println!(
        "   Backend: {} at {} (model: {})",
        backend.kind(),
        backend.host(),
        backend.model()
    );
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if allowed_origins.is_empty() {
        println!("   CORS: same-origin only");
    } else {
        println!("   CORS: {}", allowed_origins.join(", "));
    }
    println!();

    let config = ServerConfig {
        allowed_origins,
        ..Default::default()
    };

    let static_dir = static_dir
        .map(|p| {
            p.to_str()
                .map(str::to_string)
                .with_context(|| format!("Static directory path is not valid UTF-8: {}", p.display()))
        })
        .transpose()?;

    spendsense_server::serve(gateway, host, port, static_dir.as_deref(), config)
        .await
        .context("Server failed")
}
