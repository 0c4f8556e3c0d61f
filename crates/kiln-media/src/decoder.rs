//! Video decoder collaborator
//!
//! A decoder loads a video from a temporary file and reports progress as
//! events on a channel. The extraction state machine reacts to those events
//! and calls back into the decoder to seek and to read the current frame.

use std::path::Path;
use std::sync::mpsc::Sender;

/// Stream properties reported once metadata is available
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Duration in seconds; may be infinite for streams
    pub duration: f64,
}

/// How much decoded data is available at the current position.
///
/// A frame can only be painted from `HaveCurrentData` upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    pub fn can_paint(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}

/// A decoded frame in tightly packed RGBA8
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    MetadataLoaded(VideoMetadata),
    /// A seek completed with the given readiness
    Seeked(ReadyState),
    /// Frame data became available after a seek that was not yet paintable
    DataReady,
    /// Decode or playback failure
    Error(String),
}

/// Platform video decoder
pub trait VideoDecoder: Send {
    /// Decoder name for diagnostics
    fn name(&self) -> &str;

    /// Start loading `source`. Every later event is delivered on `events`.
    fn open(&mut self, source: &Path, events: Sender<DecoderEvent>);

    /// Request a seek; completion is reported with `DecoderEvent::Seeked`
    fn seek(&mut self, seconds: f64);

    /// The frame at the current position, if one has been decoded
    fn current_frame(&mut self) -> Option<RawFrame>;

    /// Stop all work and free decoder resources. Must be idempotent.
    fn release(&mut self);
}
