//! Scripted decoder for tests in this and downstream crates

use crate::decoder::{DecoderEvent, RawFrame, VideoDecoder};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct ProbeState {
    opened_path: Option<PathBuf>,
    seeks: Vec<f64>,
    released: bool,
}

/// Read-only view of what a `ScriptedDecoder` was asked to do.
/// Stays valid after the decoder is moved or dropped.
#[derive(Debug, Clone, Default)]
pub struct DecoderProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl DecoderProbe {
    pub fn opened_path(&self) -> Option<PathBuf> {
        self.state.lock().ok().and_then(|s| s.opened_path.clone())
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().map(|s| s.seeks.clone()).unwrap_or_default()
    }

    pub fn released(&self) -> bool {
        self.state.lock().map(|s| s.released).unwrap_or(false)
    }
}

/// Replays fixed event lists on `open` and `seek`. With no events scripted it
/// stays silent, which is how a hung decoder looks.
#[derive(Debug, Default)]
pub struct ScriptedDecoder {
    open_events: Vec<DecoderEvent>,
    seek_events: Vec<DecoderEvent>,
    frame: Option<RawFrame>,
    events: Option<Sender<DecoderEvent>>,
    probe: DecoderProbe,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open(mut self, events: Vec<DecoderEvent>) -> Self {
        self.open_events = events;
        self
    }

    pub fn on_seek(mut self, events: Vec<DecoderEvent>) -> Self {
        self.seek_events = events;
        self
    }

    pub fn with_frame(mut self, frame: RawFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn probe(&self) -> DecoderProbe {
        self.probe.clone()
    }

    fn emit(&self, events: &[DecoderEvent]) {
        if let Some(tx) = &self.events {
            for event in events {
                let _ = tx.send(event.clone());
            }
        }
    }
}

impl VideoDecoder for ScriptedDecoder {
    fn name(&self) -> &str {
        "scripted"
    }

    fn open(&mut self, source: &Path, events: Sender<DecoderEvent>) {
        if let Ok(mut state) = self.probe.state.lock() {
            state.opened_path = Some(source.to_path_buf());
        }
        self.events = Some(events);
        let scripted = self.open_events.clone();
        self.emit(&scripted);
    }

    fn seek(&mut self, seconds: f64) {
        if let Ok(mut state) = self.probe.state.lock() {
            state.seeks.push(seconds);
        }
        let scripted = self.seek_events.clone();
        self.emit(&scripted);
    }

    fn current_frame(&mut self) -> Option<RawFrame> {
        self.frame.clone()
    }

    fn release(&mut self) {
        self.events = None;
        if let Ok(mut state) = self.probe.state.lock() {
            state.released = true;
        }
    }
}

/// An opaque mid-grey RGBA frame
pub fn solid_frame(width: u32, height: u32) -> RawFrame {
    RawFrame {
        width,
        height,
        rgba: [128, 128, 128, 255].repeat((width * height) as usize),
    }
}
