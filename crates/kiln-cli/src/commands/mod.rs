//! CLI command implementations

pub mod classify;
pub mod generate;
pub mod health;
pub mod inspect;
pub mod texture;
pub mod upload;
