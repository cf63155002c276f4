//! Error types for the rendering backends.

use thiserror::Error;

/// Errors that can occur while producing audio or plot artifacts.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Amplitude was NaN or infinite
    #[error("Invalid amplitude: {0}")]
    InvalidAmplitude(f64),

    /// WAV encoding or file write failed
    #[error("Audio output error: {0}")]
    Audio(#[from] hound::Error),

    /// Bitmap drawing failed
    #[error("Plot error: {0}")]
    Plot(String),

    /// Scene serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rerun recording stream failed
    #[error("Rerun error: {0}")]
    Rerun(String),
}

impl RenderError {
    /// Creates a plot error from any displayable drawing error.
    pub fn plot(err: impl std::fmt::Display) -> Self {
        Self::Plot(err.to_string())
    }
}
