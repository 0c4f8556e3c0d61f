//! Color textures

use kiln_core::{KilnError, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

/// Decoded RGBA8 image assigned to a surface.
///
/// Rows are kept in file order (`flip_y == false`), matching glTF UV
/// conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub color_space: ColorSpace,
    pub flip_y: bool,
}

/// Load an image file as an sRGB color map
pub fn load_color_texture(reference: &str) -> Result<Texture> {
    let img = image::open(Path::new(reference)).map_err(|e| {
        KilnError::TextureError(format!("Failed to open image '{}': {}", reference, e))
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(Texture {
        source: reference.to_string(),
        width,
        height,
        rgba: rgba.into_raw(),
        color_space: ColorSpace::Srgb,
        flip_y: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_color_texture() {
        let dir = std::env::temp_dir().join(format!("kiln_texture_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("t.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let texture = load_color_texture(path.to_str().unwrap()).unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
        assert_eq!(texture.rgba.len(), 3 * 2 * 4);
        assert_eq!(texture.color_space, ColorSpace::Srgb);
        assert!(!texture.flip_y);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_texture() {
        let err = load_color_texture("/nonexistent/kiln/texture.png").unwrap_err();
        assert!(matches!(err, KilnError::TextureError(_)));
    }
}
