//! Upload command

use anyhow::{Context, Result};
use kiln_gen::KilnConfig;
use kiln_media::MediaAsset;
use kiln_studio::Studio;
use std::path::Path;

pub fn run(file: &str, mime: Option<&str>) -> Result<()> {
    let asset = MediaAsset::from_path(Path::new(file), mime)
        .with_context(|| format!("Failed to read {}", file))?;

    let config = KilnConfig::load().context("Failed to load config")?;
    let mut studio = Studio::from_config(&config)?;

    println!("Uploading {} ({}, {} bytes)...", asset.source_name, asset.kind, asset.bytes.len());

    let submission = studio.submit_file(&asset)?;
    match submission.origin {
        None => println!("  Using model file as-is"),
        Some(_) if submission.is_fallback() => println!("  Backend unavailable, using placeholder"),
        Some(_) => {}
    }
    println!("  Model: {}", submission.reference);

    if let Some(scene) = studio.scene() {
        println!("  Scene: {}", scene.summary());
    }
    Ok(())
}
