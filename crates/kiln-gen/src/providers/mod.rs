//! Provider registry
//!
//! Maps provider names to concrete implementations.

pub mod http;
pub mod offline;

use crate::config::KilnConfig;
use crate::provider::GenerationProvider;
use kiln_core::{KilnError, Result};

/// Create a provider by name with configuration
pub fn create_provider(name: &str, config: &KilnConfig) -> Result<Box<dyn GenerationProvider>> {
    match name {
        "http" => Ok(Box::new(http::HttpProvider::from_config(config))),
        "offline" => Ok(Box::new(offline::OfflineProvider::new())),
        _ => Err(KilnError::ConfigError(format!(
            "Unknown provider '{}'. Available: {}",
            name,
            available_providers().join(", ")
        ))),
    }
}

/// List all available provider names
pub fn available_providers() -> Vec<&'static str> {
    vec!["http", "offline"]
}
