//! Input classification

use std::fmt;
use std::path::Path;

/// What a dropped or selected file is treated as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Model,
    Unknown,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Model => write!(f, "model"),
            MediaKind::Unknown => write!(f, "unknown"),
        }
    }
}

const MODEL_EXTENSIONS: &[&str] = &["glb", "gltf"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Classify a file from its declared MIME type and its name.
///
/// The MIME type is often empty for drag-dropped files, so the extension is
/// the fallback. A model extension always wins so that `.glb` files dropped
/// with a generic MIME type skip generation.
pub fn classify(mime_type: &str, file_name: &str) -> MediaKind {
    let ext = extension_of(file_name);
    let has_ext = |list: &[&str]| ext.as_deref().is_some_and(|e| list.contains(&e));

    if has_ext(MODEL_EXTENSIONS) {
        return MediaKind::Model;
    }

    let mime = mime_type.trim().to_ascii_lowercase();
    if mime.starts_with("video/") {
        return MediaKind::Video;
    }
    if mime.starts_with("image/") {
        return MediaKind::Image;
    }
    if mime.starts_with("model/gltf") {
        return MediaKind::Model;
    }

    if has_ext(VIDEO_EXTENSIONS) {
        MediaKind::Video
    } else if has_ext(IMAGE_EXTENSIONS) {
        MediaKind::Image
    } else {
        MediaKind::Unknown
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// A user-supplied file, classified on creation
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
    pub source_name: String,
    /// Declared MIME type, empty when the platform did not provide one
    pub mime_type: String,
}

impl MediaAsset {
    pub fn new(source_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let source_name = source_name.into();
        let mime_type = mime_type.into();
        Self {
            kind: classify(&mime_type, &source_name),
            bytes,
            source_name,
            mime_type,
        }
    }

    /// Read a file from disk. Local files carry no MIME type unless one is given.
    pub fn from_path(path: &Path, mime_type: Option<&str>) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(name, mime_type.unwrap_or(""), bytes))
    }

    /// Extension of the source name, used to name temporary copies
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.source_name)
    }
}
