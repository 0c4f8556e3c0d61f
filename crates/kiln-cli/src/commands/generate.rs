//! Generate command

use anyhow::{Context, Result};
use kiln_gen::KilnConfig;
use kiln_studio::Studio;

pub fn run(prompt: &str) -> Result<()> {
    let config = KilnConfig::load().context("Failed to load config")?;
    let mut studio = Studio::from_config(&config)?;

    println!(
        "Generating model via {} ({})...",
        studio.client().provider_name(),
        config.backend.url
    );

    let submission = studio.submit_prompt(prompt)?;
    if submission.is_fallback() {
        println!("  Backend unavailable, using placeholder");
    }
    println!("  Model: {}", submission.reference);

    if let Some(scene) = studio.scene() {
        println!("  Scene: {}", scene.summary());
    }
    Ok(())
}
