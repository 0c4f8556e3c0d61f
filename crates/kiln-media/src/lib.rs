//! Kiln Media - turns dropped files into still images
//!
//! Files are classified by MIME type and extension. Videos go through a
//! frame-extraction state machine driven by a `VideoDecoder`, producing a
//! single JPEG frame or one terminal `ExtractionError`.

pub mod classify;
pub mod decoder;
pub mod extract;
pub mod ffmpeg;
pub mod normalizer;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classify::{classify, MediaAsset, MediaKind};
pub use decoder::{DecoderEvent, RawFrame, ReadyState, VideoDecoder, VideoMetadata};
pub use extract::{
    extract_frame, seek_target, ExtractOptions, ExtractedFrame, ExtractionError, ExtractionState,
    FrameExtraction,
};
pub use ffmpeg::FfmpegDecoder;
pub use normalizer::{ImageSource, MediaNormalizer, NormalizedImage};
