//! Error types shared across Colmix crates.

use std::path::PathBuf;

/// Top-level error type for Colmix operations.
#[derive(Debug, thiserror::Error)]
pub enum ColmixError {
    #[error("image decode failed: {}", path.display())]
    ImageDecode { path: PathBuf, message: String },

    #[error("Media error: {message}")]
    Media { message: String },

    #[error("Frame error: {message}")]
    Frame { message: String },

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ColmixError.
pub type ColmixResult<T> = Result<T, ColmixError>;

impl ColmixError {
    pub fn image_decode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::ImageDecode {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media {
            message: msg.into(),
        }
    }

    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame {
            message: msg.into(),
        }
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
