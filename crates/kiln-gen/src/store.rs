//! Content-addressed storage for generated artifacts

use kiln_core::{ContentHash, KilnError, Result};
use std::path::{Path, PathBuf};

const GLB_MAGIC: &[u8] = b"glTF";

/// Writes generated assets into one directory under hash-derived names.
/// Identical bytes always land in the same file.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store a model body. Binary GLB becomes `.glb`, a JSON glTF document
    /// becomes `.gltf`. Bodies that do not parse as glTF, or whose buffers
    /// are missing or truncated, are rejected as malformed.
    pub fn store_model(&self, bytes: &[u8]) -> Result<PathBuf> {
        validate_gltf(bytes)?;
        let extension = if bytes.starts_with(GLB_MAGIC) { "glb" } else { "gltf" };
        self.write(bytes, extension)
    }

    /// Store a texture body after checking that it decodes as an image
    pub fn store_texture(&self, bytes: &[u8]) -> Result<PathBuf> {
        let format = image::guess_format(bytes).map_err(|e| {
            KilnError::TextureError(format!("texture response is not an image: {}", e))
        })?;
        image::load_from_memory_with_format(bytes, format).map_err(|e| {
            KilnError::TextureError(format!("texture response does not decode: {}", e))
        })?;

        let extension = format.extensions_str().first().copied().unwrap_or("img");
        self.write(bytes, extension)
    }

    /// Encode and store a locally synthesized texture as PNG
    pub fn store_png(&self, image: &image::RgbaImage) -> Result<PathBuf> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| KilnError::TextureError(format!("Failed to encode PNG: {}", e)))?;
        self.write(&bytes, "png")
    }

    fn write(&self, bytes: &[u8], extension: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let hash = ContentHash::from_bytes(bytes);
        let path = self.dir.join(hash.file_name(extension));
        if !path.exists() {
            std::fs::write(&path, bytes)?;
        }
        tracing::debug!(path = %path.display(), %hash, "stored artifact");
        Ok(path)
    }
}

fn malformed(detail: impl std::fmt::Display) -> KilnError {
    KilnError::GenerationError(format!("model response is not usable glTF: {}", detail))
}

/// A stored model must load on its own: every buffer has to be embedded,
/// either in the GLB binary chunk or as a data URI.
fn validate_gltf(bytes: &[u8]) -> Result<()> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(malformed)?;
    let blob_len = gltf.blob.as_ref().map_or(0, |b| b.len());

    for buffer in gltf.document.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin if blob_len >= buffer.length() => {}
            gltf::buffer::Source::Bin => {
                return Err(malformed(format!(
                    "binary chunk holds {} of {} bytes",
                    blob_len,
                    buffer.length()
                )))
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {}
            gltf::buffer::Source::Uri(uri) => {
                return Err(malformed(format!("external buffer '{}'", uri)))
            }
        }
    }
    Ok(())
}
