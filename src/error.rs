//! Error types for loading and validating simulation input.

use std::io;
use thiserror::Error;

/// Errors raised while reading a project file or validating parameters.
///
/// The per-frame simulation never fails; only configuration does.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Project file is not valid JSON for the expected layout
    #[error("Invalid project file: {0}")]
    Json(#[from] serde_json::Error),

    /// A simulation parameter violates its range
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// An obstacle rectangle is malformed
    #[error("Invalid obstacle `{id}`: {reason}")]
    InvalidObstacle { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
