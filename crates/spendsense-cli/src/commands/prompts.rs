//! Prompts-related command implementations

use anyhow::{Context, Result};
use spendsense_core::prompts::{default_prompts_dir, PromptId, PromptLibrary};

/// List all available prompts and their override status
pub fn cmd_prompts_list() -> Result<()> {
    let mut library = PromptLibrary::new();
    print!("{}", render_prompt_list(&mut library));
    Ok(())
}

pub fn render_prompt_list(library: &mut PromptLibrary) -> String {
    let mut out = String::from("Available Prompts:\n\n");

    out.push_str(&format!(
        "{:<28} {:>7}  {:<22}  {}\n",
        "ID", "VERSION", "CAPABILITY", "OVERRIDE"
    ));
    out.push_str(&format!("{}\n", "-".repeat(72)));

    for info in library.list() {
        let override_status = if info.has_override {
            "✓ Custom"
        } else {
            "Default"
        };
        out.push_str(&format!(
            "{:<28} {:>7}  {:<22}  {}\n",
            info.id, info.version, info.capability, override_status
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "Override directory: {}\n",
        library
            .override_dir()
            .cloned()
            .or_else(default_prompts_dir)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    ));
    out.push('\n');
    out.push_str("To customize a prompt:\n");
    out.push_str("  1. Copy the default to the override directory as <id>.md\n");
    out.push_str("  2. Edit the file with your changes\n");
    out.push_str("  3. Restart the server to use the new prompt\n");
    out
}

/// Show the content of a specific prompt
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let mut library = PromptLibrary::new();
    print!("{}", render_prompt(&mut library, prompt_id)?);
    Ok(())
}

pub fn render_prompt(library: &mut PromptLibrary, prompt_id: &str) -> Result<String> {
    let id: PromptId = prompt_id.parse().map_err(|e: String| {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        anyhow::anyhow!("{}. Available prompts: {}", e, known.join(", "))
    })?;

    let prompt = library
        .get(id)
        .with_context(|| format!("Failed to load prompt {}", prompt_id))?;

    let mut out = String::new();
    out.push_str(&format!("Prompt: {}\n", prompt.metadata.id));
    out.push_str(&format!("Version: {}\n", prompt.metadata.version));
    out.push_str(&format!("Capability: {}\n", prompt.metadata.capability));
    out.push_str(&format!(
        "Source: {}\n",
        if prompt.is_override {
            "Override"
        } else {
            "Default"
        }
    ));
    if let Some(ref path) = prompt.override_path {
        out.push_str(&format!("Override Path: {}\n", path.display()));
    }
    out.push_str("\n--- Content ---\n");
    out.push_str(&prompt.content);
    if !prompt.content.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}
