//! Crate error type, tagged by pipeline stage.

use std::path::{Path, PathBuf};

/// Result alias used throughout the crate.
pub type QuoteReelResult<T> = Result<T, QuoteReelError>;

/// Error taxonomy for the slideshow pipeline.
///
/// Each variant maps to one pipeline stage. None of them are retried; the first error aborts
/// the run.
#[derive(thiserror::Error, Debug)]
pub enum QuoteReelError {
    /// Malformed or missing record list, invalid record, or unusable background asset.
    #[error("input error: {0}")]
    Input(String),

    /// One record could not be rendered into a frame.
    #[error("render error (record {index}): {message}")]
    Render {
        /// Position of the failing record in the input list.
        index: usize,
        /// Backend diagnostic.
        message: String,
    },

    /// A frame (or its directory) could not be written.
    #[error("storage error ({}): {message}", path.display())]
    Storage {
        /// Path that failed to be written.
        path: PathBuf,
        /// Filesystem diagnostic.
        message: String,
    },

    /// The encoding backend failed; carries its diagnostic output.
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid pipeline configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Plumbing failure with an `anyhow` context chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuoteReelError {
    /// Build an [`QuoteReelError::Input`].
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`QuoteReelError::Render`] for record `index`.
    pub fn render(index: usize, msg: impl Into<String>) -> Self {
        Self::Render {
            index,
            message: msg.into(),
        }
    }

    /// Build a [`QuoteReelError::Storage`] for `path`.
    pub fn storage(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::Storage {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Build a [`QuoteReelError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`QuoteReelError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Name of the pipeline stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Render { .. } => "render",
            Self::Storage { .. } => "storage",
            Self::Encode(_) => "encode",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }

    /// Record index carried by render errors.
    pub fn record_index(&self) -> Option<usize> {
        match self {
            Self::Render { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Re-tag a non-render error as a render failure of record `index`.
    ///
    /// Errors that already carry an index, or belong to a later stage, pass through unchanged.
    pub(crate) fn at_record(self, index: usize) -> Self {
        match self {
            Self::Render { .. } | Self::Storage { .. } | Self::Encode(_) => self,
            other => Self::render(index, other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
