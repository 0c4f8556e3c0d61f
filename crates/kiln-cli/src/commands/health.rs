//! Health command

use anyhow::{Context, Result};
use kiln_gen::{GenerationClient, KilnConfig};

pub fn run() -> Result<()> {
    let config = KilnConfig::load().context("Failed to load config")?;
    let client = GenerationClient::from_config(&config)?;

    println!("Provider: {}", client.provider_name());
    println!("Backend:  {}", config.backend.url);
    println!("Status:   {}", client.health_check()?);
    Ok(())
}
