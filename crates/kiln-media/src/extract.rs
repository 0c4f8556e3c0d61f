//! Video frame extraction
//!
//! `FrameExtraction` is the state machine:
//!
//! ```text
//! Idle -> MetadataLoaded -> Seeking -> FrameReady -> Succeeded
//!   \________________\___________\__________\_____-> Failed(kind)
//! ```
//!
//! `extract_frame` drives it from decoder events with a deadline. The first
//! terminal transition wins and every later event is ignored. The temporary
//! source file and the decoder are released on every exit path.

use crate::classify::MediaAsset;
use crate::decoder::{DecoderEvent, RawFrame, VideoDecoder};
use image::codecs::jpeg::JpegEncoder;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_TIMEOUT_MS: u64 = 8000;
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Terminal extraction failures; the only errors that reach the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("video has 0 dimensions (codec not supported?)")]
    NoDimensions,

    #[error("cannot decode this video")]
    DecodeUnsupported,

    #[error("video processing timed out - file might be incompatible")]
    Timeout,

    #[error("captured frame is empty")]
    EmptyFrame,
}

/// A single still image taken from a video
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFrame {
    /// JPEG bytes
    pub image_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Fixed seek position; `None` uses `seek_target(duration)`
    pub seek_seconds: Option<f64>,
    pub timeout: Duration,
    pub jpeg_quality: u8,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            seek_seconds: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Seek past leading black frames: 0.5s, or the midpoint of shorter clips
pub fn seek_target(duration: f64) -> f64 {
    if duration.is_nan() {
        return 0.0;
    }
    (duration / 2.0).min(0.5).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    MetadataLoaded,
    Seeking,
    FrameReady,
    Succeeded,
    Failed(ExtractionError),
}

impl ExtractionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExtractionState::Succeeded | ExtractionState::Failed(_))
    }
}

/// Outcome of a terminal transition
pub type Outcome = std::result::Result<ExtractedFrame, ExtractionError>;

/// The extraction state machine. Handlers return `Some` exactly once, on the
/// first terminal transition.
#[derive(Debug)]
pub struct FrameExtraction {
    state: ExtractionState,
    seek_override: Option<f64>,
    jpeg_quality: u8,
    seek_position: Option<f64>,
    seek_completed: bool,
}

impl FrameExtraction {
    pub fn new(options: &ExtractOptions) -> Self {
        Self {
            state: ExtractionState::Idle,
            seek_override: options.seek_seconds,
            jpeg_quality: options.jpeg_quality,
            seek_position: None,
            seek_completed: false,
        }
    }

    pub fn state(&self) -> ExtractionState {
        self.state
    }

    /// Position the decoder was asked to seek to, once known
    pub fn seek_position(&self) -> Option<f64> {
        self.seek_position
    }

    pub fn handle(&mut self, event: DecoderEvent, decoder: &mut dyn VideoDecoder) -> Option<Outcome> {
        if self.state.is_terminal() {
            tracing::trace!(?event, "extraction already finished, ignoring event");
            return None;
        }

        match event {
            DecoderEvent::MetadataLoaded(meta) => {
                if self.state != ExtractionState::Idle {
                    return None;
                }
                self.state = ExtractionState::MetadataLoaded;
                if meta.width == 0 || meta.height == 0 {
                    return self.fail(ExtractionError::NoDimensions);
                }
                let target = self.seek_override.unwrap_or_else(|| seek_target(meta.duration));
                tracing::debug!(
                    width = meta.width,
                    height = meta.height,
                    duration = meta.duration,
                    target,
                    "video metadata loaded, seeking"
                );
                self.seek_position = Some(target);
                self.state = ExtractionState::Seeking;
                decoder.seek(target);
                None
            }
            DecoderEvent::Seeked(ready) => {
                if self.state != ExtractionState::Seeking {
                    return None;
                }
                self.seek_completed = true;
                if !ready.can_paint() {
                    tracing::debug!(?ready, "seek finished without frame data, waiting");
                    return None;
                }
                self.capture(decoder)
            }
            DecoderEvent::DataReady => {
                if self.state != ExtractionState::Seeking || !self.seek_completed {
                    return None;
                }
                self.capture(decoder)
            }
            DecoderEvent::Error(message) => {
                tracing::warn!(decoder = decoder.name(), %message, "video decode failed");
                self.fail(ExtractionError::DecodeUnsupported)
            }
        }
    }

    /// The deadline passed; forces `Timeout` unless already terminal
    pub fn on_timeout(&mut self) -> Option<Outcome> {
        if self.state.is_terminal() {
            return None;
        }
        self.fail(ExtractionError::Timeout)
    }

    fn capture(&mut self, decoder: &mut dyn VideoDecoder) -> Option<Outcome> {
        self.state = ExtractionState::FrameReady;

        let frame = decoder.current_frame();
        let encoded = frame
            .as_ref()
            .map(|f| encode_jpeg(f, self.jpeg_quality))
            .unwrap_or_default();

        match frame {
            Some(f) if !encoded.is_empty() => {
                tracing::info!(
                    width = f.width,
                    height = f.height,
                    bytes = encoded.len(),
                    "frame captured"
                );
                self.state = ExtractionState::Succeeded;
                Some(Ok(ExtractedFrame {
                    image_bytes: encoded,
                    width: f.width,
                    height: f.height,
                }))
            }
            _ => self.fail(ExtractionError::EmptyFrame),
        }
    }

    fn fail(&mut self, error: ExtractionError) -> Option<Outcome> {
        self.state = ExtractionState::Failed(error);
        Some(Err(error))
    }
}

/// Paint an RGBA frame onto an RGB surface and encode it as JPEG.
/// Returns an empty buffer when the frame cannot be encoded.
fn encode_jpeg(frame: &RawFrame, quality: u8) -> Vec<u8> {
    if frame.width == 0 || frame.height == 0 {
        return Vec::new();
    }
    let Some(rgba) = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
    else {
        return Vec::new();
    };
    let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    if let Err(e) = encoder.encode_image(&rgb) {
        tracing::warn!(error = %e, "JPEG encoding failed");
        return Vec::new();
    }
    bytes
}

/// Temporary on-disk copy of the source bytes, removed on drop
struct SourceHandle {
    path: PathBuf,
}

impl SourceHandle {
    fn create(bytes: &[u8], extension: &str) -> std::io::Result<Self> {
        let path = std::env::temp_dir().join(format!(
            "kiln_source_{}.{}",
            uuid::Uuid::new_v4(),
            extension
        ));
        std::fs::write(&path, bytes)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "could not remove temporary source");
        }
    }
}

/// Releases the decoder when extraction returns, whichever way it returns
struct DecoderGuard<'a> {
    decoder: &'a mut dyn VideoDecoder,
}

impl Drop for DecoderGuard<'_> {
    fn drop(&mut self) {
        self.decoder.release();
    }
}

/// Extract one still frame from a video asset.
///
/// Blocks until the state machine reaches a terminal state or
/// `options.timeout` elapses.
pub fn extract_frame(
    asset: &MediaAsset,
    decoder: &mut dyn VideoDecoder,
    options: &ExtractOptions,
) -> Outcome {
    let deadline = Instant::now() + options.timeout;
    let mut guard = DecoderGuard { decoder };

    let extension = asset.extension().unwrap_or_else(|| "mp4".to_string());
    let source = SourceHandle::create(&asset.bytes, &extension).map_err(|e| {
        tracing::error!(error = %e, "could not stage video for decoding");
        ExtractionError::DecodeUnsupported
    })?;

    tracing::debug!(
        source = %asset.source_name,
        decoder = guard.decoder.name(),
        "extracting frame"
    );

    let (tx, rx) = mpsc::channel();
    guard.decoder.open(source.path(), tx);

    let mut machine = FrameExtraction::new(options);
    let outcome = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let step = match rx.recv_timeout(remaining) {
            Ok(event) => machine.handle(event, &mut *guard.decoder),
            Err(RecvTimeoutError::Timeout) => machine.on_timeout(),
            Err(RecvTimeoutError::Disconnected) => machine.handle(
                DecoderEvent::Error("decoder stopped before producing a frame".to_string()),
                &mut *guard.decoder,
            ),
        };
        if let Some(outcome) = step {
            break outcome;
        }
    };

    if let Err(e) = &outcome {
        tracing::error!(source = %asset.source_name, error = %e, "frame extraction failed");
    }

    drop(source);
    drop(guard);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{ReadyState, VideoMetadata};
    use crate::testing::{solid_frame, ScriptedDecoder};

    fn video() -> MediaAsset {
        MediaAsset::new("clip.mp4", "video/mp4", vec![0u8; 64])
    }

    fn fast() -> ExtractOptions {
        ExtractOptions {
            timeout: Duration::from_millis(200),
            ..Default::default()
        }
    }

    fn meta(width: u32, height: u32, duration: f64) -> DecoderEvent {
        DecoderEvent::MetadataLoaded(VideoMetadata {
            width,
            height,
            duration,
        })
    }

    #[test]
    fn test_seek_target() {
        assert_eq!(seek_target(0.6), 0.3);
        assert_eq!(seek_target(0.2), 0.1);
        assert_eq!(seek_target(1.0), 0.5);
        assert_eq!(seek_target(120.0), 0.5);
        assert_eq!(seek_target(f64::INFINITY), 0.5);
        assert_eq!(seek_target(f64::NAN), 0.0);
    }

    #[test]
    fn test_successful_extraction() {
        let mut decoder = ScriptedDecoder::new()
            .on_open(vec![meta(4, 2, 10.0)])
            .on_seek(vec![DecoderEvent::Seeked(ReadyState::HaveEnoughData)])
            .with_frame(solid_frame(4, 2));
        let probe = decoder.probe();

        let frame = extract_frame(&video(), &mut decoder, &fast()).unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(&frame.image_bytes[..2], &[0xFF, 0xD8]);

        assert_eq!(probe.seeks(), vec![0.5]);
        assert!(probe.released());
        assert!(!probe.opened_path().unwrap().exists());
    }

    #[test]
    fn test_short_clip_seeks_to_midpoint() {
        let mut decoder = ScriptedDecoder::new()
            .on_open(vec![meta(4, 4, 0.4)])
            .on_seek(vec![DecoderEvent::Seeked(ReadyState::HaveCurrentData)])
            .with_frame(solid_frame(4, 4));
        let probe = decoder.probe();

        extract_frame(&video(), &mut decoder, &fast()).unwrap();
        assert_eq!(probe.seeks(), vec![0.2]);
    }

    #[test]
    fn test_zero_dimensions() {
        let mut decoder = ScriptedDecoder::new().on_open(vec![meta(0, 720, 3.0)]);
        let probe = decoder.probe();

        let err = extract_frame(&video(), &mut decoder, &fast()).unwrap_err();
        assert_eq!(err, ExtractionError::NoDimensions);
        assert!(probe.seeks().is_empty());
        assert!(probe.released());
    }

    #[test]
    fn test_decode_error() {
        let mut decoder =
            ScriptedDecoder::new().on_open(vec![DecoderEvent::Error("codec hevc".into())]);
        let probe = decoder.probe();

        let err = extract_frame(&video(), &mut decoder, &fast()).unwrap_err();
        assert_eq!(err, ExtractionError::DecodeUnsupported);
        assert!(probe.released());
        assert!(!probe.opened_path().unwrap().exists());
    }

    #[test]
    fn test_timeout_releases_decoder() {
        let mut decoder = ScriptedDecoder::new();
        let probe = decoder.probe();

        let start = Instant::now();
        let err = extract_frame(&video(), &mut decoder, &fast()).unwrap_err();
        assert_eq!(err, ExtractionError::Timeout);
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(probe.released());
        assert!(!probe.opened_path().unwrap().exists());
    }

    #[test]
    fn test_unready_seek_waits_for_data() {
        let mut decoder = ScriptedDecoder::new()
            .on_open(vec![meta(2, 2, 5.0)])
            .on_seek(vec![
                DecoderEvent::Seeked(ReadyState::HaveMetadata),
                DecoderEvent::DataReady,
            ])
            .with_frame(solid_frame(2, 2));

        let frame = extract_frame(&video(), &mut decoder, &fast()).unwrap();
        assert_eq!(frame.width, 2);
    }

    #[test]
    fn test_unready_seek_without_data_times_out() {
        let mut decoder = ScriptedDecoder::new()
            .on_open(vec![meta(2, 2, 5.0)])
            .on_seek(vec![DecoderEvent::Seeked(ReadyState::HaveMetadata)])
            .with_frame(solid_frame(2, 2));

        let err = extract_frame(&video(), &mut decoder, &fast()).unwrap_err();
        assert_eq!(err, ExtractionError::Timeout);
    }

    #[test]
    fn test_empty_frame() {
        let mut decoder = ScriptedDecoder::new()
            .on_open(vec![meta(8, 8, 5.0)])
            .on_seek(vec![DecoderEvent::Seeked(ReadyState::HaveEnoughData)])
            .with_frame(RawFrame {
                width: 8,
                height: 8,
                rgba: Vec::new(),
            });
        let probe = decoder.probe();

        let err = extract_frame(&video(), &mut decoder, &fast()).unwrap_err();
        assert_eq!(err, ExtractionError::EmptyFrame);
        assert!(probe.released());
        assert!(!probe.opened_path().unwrap().exists());
    }

    #[test]
    fn test_missing_frame_is_empty() {
        let mut decoder = ScriptedDecoder::new()
            .on_open(vec![meta(8, 8, 5.0)])
            .on_seek(vec![DecoderEvent::Seeked(ReadyState::HaveEnoughData)]);
        let probe = decoder.probe();

        let err = extract_frame(&video(), &mut decoder, &fast()).unwrap_err();
        assert_eq!(err, ExtractionError::EmptyFrame);
        assert!(probe.released());
        assert!(!probe.opened_path().unwrap().exists());
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert_eq!(options.timeout, Duration::from_millis(8000));
        assert_eq!(options.jpeg_quality, 95);
        assert!(options.seek_seconds.is_none());
    }

    #[test]
    fn test_default_options_encode_at_quality_95() {
        let frame = RawFrame {
            width: 16,
            height: 16,
            rgba: (0..16 * 16 * 4).map(|i| (i * 7 % 251) as u8).collect(),
        };
        let mut decoder = ScriptedDecoder::new()
            .on_open(vec![meta(16, 16, 4.0)])
            .on_seek(vec![DecoderEvent::Seeked(ReadyState::HaveEnoughData)])
            .with_frame(frame.clone());

        let extracted = extract_frame(&video(), &mut decoder, &ExtractOptions::default()).unwrap();
        assert_eq!(extracted.image_bytes, encode_jpeg(&frame, 95));
        assert_ne!(extracted.image_bytes, encode_jpeg(&frame, 50));
    }

    #[test]
    fn test_events_after_terminal_are_ignored() {
        let mut decoder = ScriptedDecoder::new().with_frame(solid_frame(2, 2));
        let mut machine = FrameExtraction::new(&ExtractOptions::default());

        assert!(machine.handle(meta(2, 2, 1.0), &mut decoder).is_none());
        let first = machine.handle(DecoderEvent::Seeked(ReadyState::HaveEnoughData), &mut decoder);
        assert!(matches!(first, Some(Ok(_))));

        assert!(machine.on_timeout().is_none());
        assert!(machine
            .handle(DecoderEvent::Error("late".into()), &mut decoder)
            .is_none());
        assert!(machine.handle(DecoderEvent::DataReady, &mut decoder).is_none());
        assert_eq!(machine.state(), ExtractionState::Succeeded);
    }

    #[test]
    fn test_timeout_then_late_frame_is_ignored() {
        let mut decoder = ScriptedDecoder::new().with_frame(solid_frame(2, 2));
        let mut machine = FrameExtraction::new(&ExtractOptions::default());

        machine.handle(meta(2, 2, 1.0), &mut decoder);
        assert_eq!(machine.on_timeout(), Some(Err(ExtractionError::Timeout)));
        assert!(machine
            .handle(DecoderEvent::Seeked(ReadyState::HaveEnoughData), &mut decoder)
            .is_none());
        assert_eq!(
            machine.state(),
            ExtractionState::Failed(ExtractionError::Timeout)
        );
    }

    #[test]
    fn test_seek_override() {
        let options = ExtractOptions {
            seek_seconds: Some(2.0),
            ..fast()
        };
        let mut decoder = ScriptedDecoder::new()
            .on_open(vec![meta(2, 2, 10.0)])
            .on_seek(vec![DecoderEvent::Seeked(ReadyState::HaveEnoughData)])
            .with_frame(solid_frame(2, 2));
        let probe = decoder.probe();

        extract_frame(&video(), &mut decoder, &options).unwrap();
        assert_eq!(probe.seeks(), vec![2.0]);
    }

    #[test]
    fn test_seeked_before_metadata_is_ignored() {
        let mut decoder = ScriptedDecoder::new();
        let mut machine = FrameExtraction::new(&ExtractOptions::default());
        assert!(machine
            .handle(DecoderEvent::Seeked(ReadyState::HaveEnoughData), &mut decoder)
            .is_none());
        assert_eq!(machine.state(), ExtractionState::Idle);
    }
}
