//! `VideoDecoder` backed by the ffprobe and ffmpeg executables.
//!
//! Each step runs a subprocess on a worker thread and reports back through
//! the event channel. `release` kills whatever is still running.

use crate::decoder::{DecoderEvent, RawFrame, ReadyState, VideoDecoder, VideoMetadata};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`)
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    pub format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_name: Option<String>,
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<String>,
    pub tags: Option<FfprobeTags>,
    #[serde(default)]
    pub side_data_list: Vec<FfprobeSideData>,
}

/// Older muxers put the display rotation in the stream tags
#[derive(Debug, Deserialize)]
pub struct FfprobeTags {
    pub rotate: Option<String>,
}

/// Display matrix side data carries the rotation in degrees
#[derive(Debug, Deserialize)]
pub struct FfprobeSideData {
    pub rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Duration in seconds: format level first, then the video stream.
/// Unknown durations are reported as infinite, like a live stream.
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    let format_duration = probe.format.as_ref().and_then(|f| f.duration.as_deref());
    let stream_duration = first_video_stream(probe).and_then(|s| s.duration.as_deref());

    format_duration
        .into_iter()
        .chain(stream_duration)
        .find_map(|d| d.parse::<f64>().ok())
        .unwrap_or(f64::INFINITY)
}

/// Clockwise display rotation of a stream, normalized to 0, 90, 180 or 270
pub fn parse_rotation(stream: &FfprobeStream) -> u32 {
    let degrees = stream
        .side_data_list
        .iter()
        .find_map(|d| d.rotation)
        .or_else(|| {
            stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.trim().parse::<f64>().ok())
        })
        .unwrap_or(0.0);
    let quarter_turns = (degrees / 90.0).round() as i64;
    (quarter_turns.rem_euclid(4) * 90) as u32
}

/// Display resolution. ffmpeg autorotates decoded frames, so a stream
/// rotated by a quarter turn is reported with width and height swapped.
pub fn parse_resolution(probe: &FfprobeOutput) -> (u32, u32) {
    first_video_stream(probe)
        .map(|s| {
            let (w, h) = (s.width.unwrap_or(0), s.height.unwrap_or(0));
            if parse_rotation(s) % 180 == 90 {
                (h, w)
            } else {
                (w, h)
            }
        })
        .unwrap_or((0, 0))
}

/// Metadata for the first video stream, `None` when the file has none
pub fn parse_metadata(probe: &FfprobeOutput) -> Option<VideoMetadata> {
    first_video_stream(probe)?;
    let (width, height) = parse_resolution(probe);
    Some(VideoMetadata {
        width,
        height,
        duration: parse_duration(probe),
    })
}

type Children = Arc<Mutex<Vec<Child>>>;

/// Run a command to completion while keeping it killable from `release`.
/// Returns stdout, or an error message when it could not run or failed.
fn run_tracked(mut command: Command, children: &Children, released: &AtomicBool) -> Result<Vec<u8>, String> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to start {:?}: {}", command.get_program(), e))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| "child has no stdout".to_string())?;
    let id = child.id();
    if let Ok(mut list) = children.lock() {
        list.push(child);
    }
    if released.load(Ordering::SeqCst) {
        kill_all(children);
    }

    let mut output = Vec::new();
    let read = stdout.read_to_end(&mut output);

    let child = children.lock().ok().and_then(|mut list| {
        let pos = list.iter().position(|c| c.id() == id)?;
        Some(list.swap_remove(pos))
    });
    let status = match child {
        Some(mut c) => c.wait().map_err(|e| e.to_string())?,
        None => return Err("process was killed".to_string()),
    };

    read.map_err(|e| e.to_string())?;
    if !status.success() {
        return Err(format!(
            "{:?} exited with code {:?}",
            command.get_program(),
            status.code()
        ));
    }
    Ok(output)
}

fn kill_all(children: &Children) {
    if let Ok(mut list) = children.lock() {
        for child in list.iter_mut() {
            let _ = child.kill();
        }
    }
}

pub struct FfmpegDecoder {
    ffmpeg: String,
    ffprobe: String,
    source: Option<PathBuf>,
    events: Option<Sender<DecoderEvent>>,
    metadata: Arc<Mutex<Option<VideoMetadata>>>,
    frame: Arc<Mutex<Option<RawFrame>>>,
    children: Children,
    released: Arc<AtomicBool>,
}

impl FfmpegDecoder {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            source: None,
            events: None,
            metadata: Arc::new(Mutex::new(None)),
            frame: Arc::new(Mutex::new(None)),
            children: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn open(&mut self, source: &Path, events: Sender<DecoderEvent>) {
        self.source = Some(source.to_path_buf());
        self.events = Some(events.clone());

        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(source);

        let children = Arc::clone(&self.children);
        let released = Arc::clone(&self.released);
        let metadata = Arc::clone(&self.metadata);

        thread::spawn(move || {
            let event = match run_tracked(command, &children, &released) {
                Ok(stdout) => match serde_json::from_slice::<FfprobeOutput>(&stdout) {
                    Ok(probe) => match parse_metadata(&probe) {
                        Some(meta) => {
                            if let Ok(mut slot) = metadata.lock() {
                                *slot = Some(meta);
                            }
                            DecoderEvent::MetadataLoaded(meta)
                        }
                        None => DecoderEvent::Error("no video stream".to_string()),
                    },
                    Err(e) => DecoderEvent::Error(format!("failed to parse ffprobe output: {}", e)),
                },
                Err(message) => DecoderEvent::Error(message),
            };
            if !released.load(Ordering::SeqCst) {
                let _ = events.send(event);
            }
        });
    }

    fn seek(&mut self, seconds: f64) {
        let (Some(source), Some(events)) = (self.source.clone(), self.events.clone()) else {
            return;
        };
        let Some(meta) = self.metadata.lock().ok().and_then(|m| *m) else {
            return;
        };

        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-v", "error", "-ss", &format!("{:.3}", seconds), "-i"])
            .arg(&source)
            .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"]);

        let children = Arc::clone(&self.children);
        let released = Arc::clone(&self.released);
        let frame = Arc::clone(&self.frame);

        thread::spawn(move || {
            let event = match run_tracked(command, &children, &released) {
                Ok(rgba) => {
                    let expected = meta.width as usize * meta.height as usize * 4;
                    let rgba = if rgba.len() == expected { rgba } else { Vec::new() };
                    if let Ok(mut slot) = frame.lock() {
                        *slot = Some(RawFrame {
                            width: meta.width,
                            height: meta.height,
                            rgba,
                        });
                    }
                    DecoderEvent::Seeked(ReadyState::HaveEnoughData)
                }
                Err(message) => DecoderEvent::Error(message),
            };
            if !released.load(Ordering::SeqCst) {
                let _ = events.send(event);
            }
        });
    }

    fn current_frame(&mut self) -> Option<RawFrame> {
        self.frame.lock().ok().and_then(|f| f.clone())
    }

    fn release(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        kill_all(&self.children);
        self.events = None;
        tracing::debug!("ffmpeg decoder released");
    }
}
