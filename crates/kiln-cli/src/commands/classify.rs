//! Classify command

use anyhow::Result;
use kiln_media::classify;

pub fn run(file: &str, mime: &str) -> Result<()> {
    println!("{}", classify(mime, file));
    Ok(())
}
