//! Generation provider trait and request types

use kiln_core::Result;
use kiln_media::NormalizedImage;
use std::fmt;

/// What the backend is asked to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    TextToModel,
    ImageToModel,
    TextToTexture,
}

impl Modality {
    /// Path segment under `/generate/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            Modality::TextToModel => "text-to-3d",
            Modality::ImageToModel => "image-to-3d",
            Modality::TextToTexture => "texture",
        }
    }

    pub fn produces_model(&self) -> bool {
        !matches!(self, Modality::TextToTexture)
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::TextToModel => write!(f, "text-to-model"),
            Modality::ImageToModel => write!(f, "image-to-model"),
            Modality::TextToTexture => write!(f, "text-to-texture"),
        }
    }
}

/// Request body. Images are only accepted after normalization, so raw video
/// bytes cannot be sent.
#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    Image(NormalizedImage),
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub modality: Modality,
    pub payload: Payload,
}

impl GenerateRequest {
    pub fn text_to_model(prompt: impl Into<String>) -> Self {
        Self {
            modality: Modality::TextToModel,
            payload: Payload::Text(prompt.into()),
        }
    }

    pub fn image_to_model(image: NormalizedImage) -> Self {
        Self {
            modality: Modality::ImageToModel,
            payload: Payload::Image(image),
        }
    }

    pub fn texture(prompt: impl Into<String>) -> Self {
        Self {
            modality: Modality::TextToTexture,
            payload: Payload::Text(prompt.into()),
        }
    }
}

/// Status returned by a provider health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Available { gpu: bool },
    Unavailable(String),
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderStatus::Available { gpu: true } => write!(f, "available (gpu)"),
            ProviderStatus::Available { gpu: false } => write!(f, "available (cpu)"),
            ProviderStatus::Unavailable(reason) => write!(f, "unavailable: {}", reason),
        }
    }
}

/// Trait implemented by each generation backend (http, offline)
pub trait GenerationProvider: Send {
    /// Provider name (e.g. "http", "offline")
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    fn health_check(&self) -> Result<ProviderStatus>;

    /// Run one request synchronously and return the raw asset bytes
    fn generate(&self, request: &GenerateRequest) -> Result<Vec<u8>>;
}
