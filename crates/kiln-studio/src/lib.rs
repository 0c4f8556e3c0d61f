//! Kiln Studio - the prompt/upload/edit loop
//!
//! A `Studio` owns one explicit `Session` and routes user actions through
//! the media normalizer, the generation client and the asset binder.

mod error;
mod studio;

pub use error::{Result, StudioError};
pub use studio::{Studio, Submission, Target};
