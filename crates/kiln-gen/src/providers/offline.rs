//! Offline provider
//!
//! Never reaches a backend. Every request fails, so the client always takes
//! its fallback path. Useful without a GPU box and in tests.

use crate::provider::*;
use kiln_core::{KilnError, Result};

#[derive(Debug, Default)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }
}

impl GenerationProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    fn health_check(&self) -> Result<ProviderStatus> {
        Ok(ProviderStatus::Unavailable("offline mode".to_string()))
    }

    fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>> {
        Err(KilnError::GenerationError(format!(
            "{} unavailable in offline mode",
            request.modality
        )))
    }
}
