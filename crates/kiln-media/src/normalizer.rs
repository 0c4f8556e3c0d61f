//! Media normalization: every non-model input becomes one still image

use crate::classify::{MediaAsset, MediaKind};
use crate::decoder::VideoDecoder;
use crate::extract::{extract_frame, ExtractOptions, ExtractionError};

/// Where a normalized image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Image,
    Video,
}

/// A still image ready for image-to-model generation.
///
/// Only `MediaNormalizer` builds these, so a video can never reach the
/// generation client without going through frame extraction first.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    bytes: Vec<u8>,
    file_name: String,
    source: ImageSource,
    dimensions: Option<(u32, u32)>,
}

impl NormalizedImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn source(&self) -> ImageSource {
        self.source
    }

    /// Known for extracted frames; passthrough images are not decoded
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

pub type DecoderFactory = Box<dyn Fn() -> Box<dyn VideoDecoder> + Send + Sync>;

/// Turns media assets into still images, creating one decoder per video
pub struct MediaNormalizer {
    factory: DecoderFactory,
    options: ExtractOptions,
}

impl MediaNormalizer {
    pub fn new<F, D>(factory: F, options: ExtractOptions) -> Self
    where
        F: Fn() -> D + Send + Sync + 'static,
        D: VideoDecoder + 'static,
    {
        Self {
            factory: Box::new(move || Box::new(factory()) as Box<dyn VideoDecoder>),
            options,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Videos are reduced to one JPEG frame; images and unknown files pass
    /// through untouched. Models should not be normalized, but pass through
    /// too.
    pub fn normalize(&self, asset: &MediaAsset) -> Result<NormalizedImage, ExtractionError> {
        match asset.kind {
            MediaKind::Video => {
                let mut decoder = (self.factory)();
                let frame = extract_frame(asset, decoder.as_mut(), &self.options)?;
                Ok(NormalizedImage {
                    bytes: frame.image_bytes,
                    file_name: "input_image.jpg".to_string(),
                    source: ImageSource::Video,
                    dimensions: Some((frame.width, frame.height)),
                })
            }
            MediaKind::Image | MediaKind::Unknown | MediaKind::Model => {
                tracing::debug!(source = %asset.source_name, kind = %asset.kind, "passing image through");
                Ok(NormalizedImage {
                    bytes: asset.bytes.clone(),
                    file_name: asset.source_name.clone(),
                    source: ImageSource::Image,
                    dimensions: None,
                })
            }
        }
    }
}

impl std::fmt::Debug for MediaNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaNormalizer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
