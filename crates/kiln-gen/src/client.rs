//! Generation client
//!
//! Every request first goes to the provider. Any remote failure (transport,
//! status, malformed body, storage) is logged and replaced by a fallback
//! result, so callers always get an asset reference back. The only error a
//! caller can see is an `ExtractionError` from normalizing a video.

use crate::config::KilnConfig;
use crate::fallback::{synthesize_texture, FallbackPolicy};
use crate::provider::{GenerateRequest, GenerationProvider, ProviderStatus};
use crate::providers::create_provider;
use crate::store::ResultStore;
use kiln_core::Result;
use kiln_media::{ExtractionError, ImageSource, MediaAsset, MediaNormalizer, NormalizedImage};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Fallback,
}

/// The outcome of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub asset_reference: String,
    pub origin: Origin,
}

impl GenerationResult {
    fn remote(path: PathBuf) -> Self {
        Self {
            asset_reference: path.to_string_lossy().to_string(),
            origin: Origin::Remote,
        }
    }

    fn fallback(reference: impl Into<String>) -> Self {
        Self {
            asset_reference: reference.into(),
            origin: Origin::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

pub struct GenerationClient {
    provider: Box<dyn GenerationProvider>,
    store: ResultStore,
    policy: FallbackPolicy,
}

impl GenerationClient {
    pub fn new(provider: Box<dyn GenerationProvider>, store: ResultStore, policy: FallbackPolicy) -> Self {
        Self {
            provider,
            store,
            policy,
        }
    }

    /// Build the configured provider, output store and fallback policy
    pub fn from_config(config: &KilnConfig) -> Result<Self> {
        let provider = create_provider(&config.backend.provider, config)?;
        Ok(Self::new(
            provider,
            ResultStore::new(config.output_dir.clone()),
            FallbackPolicy::from_config(&config.fallback),
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn health_check(&self) -> Result<ProviderStatus> {
        self.provider.health_check()
    }

    /// Text prompt to 3D model
    pub fn request_model(&self, prompt: &str) -> GenerationResult {
        let request = GenerateRequest::text_to_model(prompt);
        self.model_or_placeholder(&request, None)
    }

    /// Still image to 3D model; the placeholder depends on where the image
    /// came from
    pub fn request_model_from_image(&self, image: &NormalizedImage) -> GenerationResult {
        let source = image.source();
        let request = GenerateRequest::image_to_model(image.clone());
        self.model_or_placeholder(&request, Some(source))
    }

    /// Normalize a dropped file, then request a model from the still image.
    /// Extraction failures are returned and the provider is not called.
    pub fn request_model_from_media(
        &self,
        asset: &MediaAsset,
        normalizer: &MediaNormalizer,
    ) -> std::result::Result<GenerationResult, ExtractionError> {
        let image = normalizer.normalize(asset)?;
        Ok(self.request_model_from_image(&image))
    }

    /// Text prompt to texture image
    pub fn request_texture(&self, prompt: &str) -> GenerationResult {
        let request = GenerateRequest::texture(prompt);
        let start = Instant::now();

        match self
            .provider
            .generate(&request)
            .and_then(|bytes| self.store.store_texture(&bytes))
        {
            Ok(path) => {
                tracing::info!(
                    provider = self.provider.name(),
                    path = %path.display(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "texture generated"
                );
                GenerationResult::remote(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "texture generation failed, synthesizing locally");
                self.fallback_texture()
            }
        }
    }

    fn model_or_placeholder(
        &self,
        request: &GenerateRequest,
        source: Option<ImageSource>,
    ) -> GenerationResult {
        let start = Instant::now();

        match self
            .provider
            .generate(request)
            .and_then(|bytes| self.store.store_model(&bytes))
        {
            Ok(path) => {
                tracing::info!(
                    provider = self.provider.name(),
                    modality = %request.modality,
                    path = %path.display(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "model generated"
                );
                GenerationResult::remote(path)
            }
            Err(e) => {
                let (placeholder, delay) = self.policy.model_placeholder(source);
                tracing::warn!(
                    modality = %request.modality,
                    error = %e,
                    placeholder,
                    "model generation failed, using placeholder"
                );
                std::thread::sleep(delay);
                GenerationResult::fallback(placeholder)
            }
        }
    }

    fn fallback_texture(&self) -> GenerationResult {
        let texture = synthesize_texture(
            &mut rand::rng(),
            self.policy.texture_size,
            self.policy.speckles,
        );
        match self.store.store_png(&texture) {
            Ok(path) => GenerationResult::fallback(path.to_string_lossy().to_string()),
            Err(e) => {
                tracing::error!(error = %e, "could not store fallback texture");
                GenerationResult::fallback(String::new())
            }
        }
    }
}
