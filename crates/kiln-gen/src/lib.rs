//! Kiln Gen - generation client for models and textures
//!
//! A pluggable `GenerationProvider` talks to the synthesis backend. The
//! `GenerationClient` wraps a provider and never fails on remote errors:
//! it stores successful results content-addressed in the output directory
//! and degrades to placeholder references or a procedural texture otherwise.

pub mod client;
pub mod config;
pub mod fallback;
pub mod provider;
pub mod providers;
pub mod store;

#[cfg(test)]
mod test_server;

pub use client::{GenerationClient, GenerationResult, Origin};
pub use config::KilnConfig;
pub use fallback::{synthesize_texture, FallbackPolicy};
pub use provider::{GenerateRequest, GenerationProvider, Modality, Payload, ProviderStatus};
pub use store::ResultStore;
