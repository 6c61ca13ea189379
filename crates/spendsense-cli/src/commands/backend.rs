//! Inference backend status command

use anyhow::Result;

use spendsense_core::{Capability, InferenceBackend, InferenceGateway};

pub async fn cmd_backend(gateway: Option<&InferenceGateway>) -> Result<()> {
    print!("{}", render_backend_status(gateway).await);
    Ok(())
}

/// Backend configuration, per-capability routing and health
pub async fn render_backend_status(gateway: Option<&InferenceGateway>) -> String {
    let Some(gateway) = gateway else {
        return [
            "⚠️  No inference backend configured.",
            "",
            "To use an OpenAI-compatible server:",
            "  export OPENAI_COMPATIBLE_HOST=http://localhost:8000",
            "  export OPENAI_COMPATIBLE_MODEL=gpt-4o-mini   # optional",
            "  export OPENAI_COMPATIBLE_API_KEY=...         # optional",
            "",
            "To run offline with the deterministic stub:",
            "  export AI_BACKEND=mock",
            "",
        ]
        .join("\n");
    };

    let backend = gateway.backend();
    let router = gateway.router();
    let mut out = String::from("🔍 Inference backend\n\n");
    out.push_str(&format!("  Kind:  {}\n", backend.kind()));
    out.push_str(&format!("  Host:  {}\n", backend.host()));
    out.push_str(&format!("  Model: {}\n", backend.model()));
    out.push_str(&format!(
        "  Config: {}\n\n",
        router
            .config_path()
            .filter(|p| p.exists())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(embedded defaults)".to_string())
    ));

    out.push_str(&format!("  {:<24} {:<28} {}\n", "CAPABILITY", "MODEL", "TIMEOUT"));
    for capability in Capability::all() {
        out.push_str(&format!(
            "  {:<24} {:<28} {}s\n",
            capability.as_str(),
            router.model_for(*capability, backend.model()),
            router.timeout_for(*capability).as_secs()
        ));
    }
    out.push('\n');

    if backend.health_check().await {
        out.push_str("  Status: ✅ Connected\n");
    } else {
        out.push_str(&format!(
            "  Status: ❌ Not responding at {}\n",
            backend.host()
        ));
    }
    out
}
