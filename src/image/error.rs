//! Per-image transcode errors.
//!
//! None of these abort a pass: the affected image is left unmodified.

use thiserror::Error;

use super::{CodecError, ImageFormat};

#[derive(Debug, Clone, Error)]
pub enum TranscodeError {
    #[error("cannot read image dimensions")]
    DimensionProbe(#[source] CodecError),

    #[error("cannot decode image")]
    Decode(#[source] CodecError),

    #[error("resize failed")]
    Resize(#[source] CodecError),

    #[error("{format} encoding failed")]
    CodecEncode {
        format: ImageFormat,
        #[source]
        source: CodecError,
    },

    #[error("variant path `{0}` is already taken")]
    VariantPathTaken(String),
}

impl TranscodeError {
    /// Unreadable inputs are skipped; everything else is a failed image.
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, Self::DimensionProbe(_))
    }
}
