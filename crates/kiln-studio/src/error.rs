//! Errors surfaced to the user by studio operations

use kiln_core::KilnError;
use kiln_media::ExtractionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("A generation is already in progress")]
    Busy,

    #[error("Video processing failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Kiln(#[from] KilnError),
}

pub type Result<T> = std::result::Result<T, StudioError>;
