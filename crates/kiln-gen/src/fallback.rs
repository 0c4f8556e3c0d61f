//! Local stand-ins for failed generation requests

use crate::config::FallbackConfig;
use image::{Rgba, RgbaImage};
use kiln_media::ImageSource;
use rand::Rng;
use std::time::Duration;

pub const PLACEHOLDER_MODEL: &str = "/placeholder-model.glb";
pub const PLACEHOLDER_MODEL_FROM_IMAGE: &str = "/placeholder-model-from-image.glb";
pub const PLACEHOLDER_MODEL_FROM_VIDEO: &str = "/placeholder-model-from-video.glb";

/// Delays and texture parameters used when the backend cannot deliver
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPolicy {
    pub text_to_model_delay: Duration,
    pub image_to_model_delay: Duration,
    pub texture_size: u32,
    pub speckles: u32,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            text_to_model_delay: Duration::from_millis(2000),
            image_to_model_delay: Duration::from_millis(3000),
            texture_size: 512,
            speckles: 5000,
        }
    }
}

impl FallbackPolicy {
    pub fn from_config(config: &FallbackConfig) -> Self {
        Self {
            text_to_model_delay: Duration::from_millis(config.text_to_model_delay_ms),
            image_to_model_delay: Duration::from_millis(config.image_to_model_delay_ms),
            texture_size: config.texture_size.max(1),
            speckles: config.speckles,
        }
    }

    /// Placeholder reference and delay for a model request. `None` means the
    /// request came from a text prompt.
    pub fn model_placeholder(&self, source: Option<ImageSource>) -> (&'static str, Duration) {
        match source {
            None => (PLACEHOLDER_MODEL, self.text_to_model_delay),
            Some(ImageSource::Image) => (PLACEHOLDER_MODEL_FROM_IMAGE, self.image_to_model_delay),
            Some(ImageSource::Video) => (PLACEHOLDER_MODEL_FROM_VIDEO, self.image_to_model_delay),
        }
    }
}

/// Procedural texture: a solid color of random hue (saturation and lightness
/// 50%) with `speckles` translucent white squares scattered over it.
pub fn synthesize_texture<R: Rng + ?Sized>(rng: &mut R, size: u32, speckles: u32) -> RgbaImage {
    let hue = rng.random::<f32>() * 360.0;
    let [r, g, b] = hsl_to_rgb(hue, 0.5, 0.5);
    let mut image = RgbaImage::from_pixel(size, size, Rgba([r, g, b, 255]));

    let extent = size as f32;
    for _ in 0..speckles {
        let x = rng.random::<f32>() * extent;
        let y = rng.random::<f32>() * extent;
        let side = rng.random::<f32>() * 4.0;
        let alpha = rng.random::<f32>() * 0.3;
        speckle(&mut image, x, y, side, alpha);
    }
    image
}

/// Blend a white square over the pixels it touches
fn speckle(image: &mut RgbaImage, x: f32, y: f32, side: f32, alpha: f32) {
    if side <= 0.0 {
        return;
    }
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = ((x + side).ceil() as u32).min(image.width());
    let y1 = ((y + side).ceil() as u32).min(image.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let pixel = image.get_pixel_mut(px, py);
            for channel in pixel.0.iter_mut().take(3) {
                let c = *channel as f32;
                *channel = (c + (255.0 - c) * alpha).round().min(255.0) as u8;
            }
        }
    }
}

/// HSL to 8-bit RGB; hue in degrees, saturation and lightness in [0, 1]
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_delays() {
        let policy = FallbackPolicy::default();
        assert_eq!(
            policy.model_placeholder(None),
            ("/placeholder-model.glb", Duration::from_millis(2000))
        );
        assert_eq!(
            policy.model_placeholder(Some(ImageSource::Image)),
            (
                "/placeholder-model-from-image.glb",
                Duration::from_millis(3000)
            )
        );
        assert_eq!(
            policy.model_placeholder(Some(ImageSource::Video)),
            (
                "/placeholder-model-from-video.glb",
                Duration::from_millis(3000)
            )
        );
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), [0, 0, 255]);
        assert_eq!(hsl_to_rgb(0.0, 0.5, 0.5), [191, 64, 64]);
    }

    #[test]
    fn test_plain_texture_has_half_saturation() {
        let mut rng = StdRng::seed_from_u64(7);
        let texture = synthesize_texture(&mut rng, 16, 0);
        assert_eq!(texture.dimensions(), (16, 16));

        let first = *texture.get_pixel(0, 0);
        assert!(texture.pixels().all(|p| *p == first));

        let max = *first.0[..3].iter().max().unwrap() as i32;
        let min = *first.0[..3].iter().min().unwrap() as i32;
        assert!((max + min - 255).abs() <= 2, "lightness off: {:?}", first);
        assert!((max - min - 128).abs() <= 2, "saturation off: {:?}", first);
    }

    #[test]
    fn test_speckles_only_lighten() {
        let mut plain_rng = StdRng::seed_from_u64(42);
        let base = synthesize_texture(&mut plain_rng, 64, 0);
        let base_pixel = *base.get_pixel(0, 0);

        let mut rng = StdRng::seed_from_u64(42);
        let texture = synthesize_texture(&mut rng, 64, 500);
        assert_eq!(texture.dimensions(), (64, 64));

        let mut lighter = 0;
        for pixel in texture.pixels() {
            for c in 0..3 {
                assert!(pixel.0[c] >= base_pixel.0[c]);
            }
            assert_eq!(pixel.0[3], 255);
            if *pixel != base_pixel {
                lighter += 1;
            }
        }
        assert!(lighter > 0);
    }
}
