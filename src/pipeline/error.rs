//! Pass-level errors.

use thiserror::Error;

/// Errors that abort a whole pass.
///
/// Per-image problems never end up here: they are reported in the
/// transcode report and the image is left as it was.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("pass cancelled")]
    Cancelled,

    #[error("unknown stage `{0}`")]
    UnknownStage(String),

    #[error("failed to serialize manifest")]
    Manifest(#[from] serde_json::Error),
}
