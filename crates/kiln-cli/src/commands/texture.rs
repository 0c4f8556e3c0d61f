//! Texture command

use anyhow::{Context, Result};
use kiln_gen::{GenerationClient, KilnConfig};

pub fn run(prompt: &str) -> Result<()> {
    let config = KilnConfig::load().context("Failed to load config")?;
    let client = GenerationClient::from_config(&config)?;

    println!("Generating texture via {}...", client.provider_name());
    let result = client.request_texture(prompt);

    if result.asset_reference.is_empty() {
        anyhow::bail!("No texture produced; the fallback texture could not be stored");
    }
    if result.is_fallback() {
        println!("  Backend unavailable, synthesized locally");
    }
    println!("  Texture: {}", result.asset_reference);
    Ok(())
}
