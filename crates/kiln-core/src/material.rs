//! Material configuration applied to bound scenes

use crate::color::Rgb;

/// Clamp a scalar into [0, 1]; NaN maps to 0
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Surface appearance shared by every renderable surface of a bound scene.
///
/// Fields are private so metalness and roughness stay in [0, 1] no matter how
/// the configuration is edited.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialConfig {
    base_color: Rgb,
    metalness: f32,
    roughness: f32,
    texture_reference: Option<String>,
}

impl MaterialConfig {
    pub fn new(base_color: Rgb, metalness: f32, roughness: f32) -> Self {
        Self {
            base_color,
            metalness: clamp_unit(metalness),
            roughness: clamp_unit(roughness),
            texture_reference: None,
        }
    }

    pub fn base_color(&self) -> Rgb {
        self.base_color
    }

    pub fn metalness(&self) -> f32 {
        self.metalness
    }

    pub fn roughness(&self) -> f32 {
        self.roughness
    }

    pub fn texture_reference(&self) -> Option<&str> {
        self.texture_reference.as_deref()
    }

    pub fn set_base_color(&mut self, color: Rgb) {
        self.base_color = color;
    }

    pub fn set_metalness(&mut self, metalness: f32) {
        self.metalness = clamp_unit(metalness);
    }

    pub fn set_roughness(&mut self, roughness: f32) {
        self.roughness = clamp_unit(roughness);
    }

    /// Set or clear the color map. An empty reference clears it.
    pub fn set_texture_reference(&mut self, reference: Option<String>) {
        self.texture_reference = reference.filter(|r| !r.is_empty());
    }

    pub fn with_texture(mut self, reference: impl Into<String>) -> Self {
        self.set_texture_reference(Some(reference.into()));
        self
    }

    /// Merge a partial update, as the material editor sends one field at a time
    pub fn apply(&mut self, patch: &MaterialPatch) {
        if let Some(color) = patch.base_color {
            self.set_base_color(color);
        }
        if let Some(metalness) = patch.metalness {
            self.set_metalness(metalness);
        }
        if let Some(roughness) = patch.roughness {
            self.set_roughness(roughness);
        }
    }
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self::new(Rgb::WHITE, 0.5, 0.5)
    }
}

/// A partial material update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialPatch {
    pub base_color: Option<Rgb>,
    pub metalness: Option<f32>,
    pub roughness: Option<f32>,
}
