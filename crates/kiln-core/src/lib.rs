//! Kiln Core - Foundational types shared by every Kiln crate
//!
//! - `KilnError` / `Result` - the workspace error type
//! - `ContentHash` - SHA-256 naming for generated artifacts
//! - `Rgb` - base colors as edited by the color picker
//! - `MaterialConfig` - clamped surface appearance parameters
//! - `Session` - the explicit per-user session context

mod color;
mod error;
mod hash;
mod material;
mod session;

pub use color::Rgb;
pub use error::{KilnError, Result};
pub use hash::ContentHash;
pub use material::{clamp_unit, MaterialConfig, MaterialPatch};
pub use session::{ReferenceToken, Session};
