//! The codec capability consumed by the transcode stage.
//!
//! The stage never touches pixels itself. Everything goes through a
//! [`Codec`], which keeps the search/resize logic testable with a mock.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output format of a transcoded variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Avif,
    Webp,
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
}

impl ImageFormat {
    /// File extension for this format.
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The larger of width and height.
    pub const fn max_edge(&self) -> u32 {
        if self.width > self.height {
            self.width
        } else {
            self.height
        }
    }

    /// Scale down, preserving aspect ratio, so neither edge exceeds `edge`.
    ///
    /// The larger edge becomes exactly `edge`; the smaller one is floored.
    /// Dimensions already inside the envelope are returned unchanged.
    #[allow(clippy::cast_possible_truncation)] // result <= self.width/height
    pub fn fit_within(&self, edge: u32) -> Self {
        let edge = edge.max(1);
        let large = self.max_edge();
        if large <= edge {
            return *self;
        }
        // ratio = edge / large; integer math avoids float floor drift
        let scale = |side: u32| ((u64::from(side) * u64::from(edge)) / u64::from(large)).max(1) as u32;
        Self::new(scale(self.width), scale(self.height))
    }

    pub const fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Settings for one encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub format: ImageFormat,
    /// 1 (smallest) ..= 100 (best).
    pub quality: u8,
    /// 0 (fastest) ..= 9 (slowest, smallest output).
    pub effort: u8,
}

/// Codec failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported or corrupt image: {0}")]
    Unreadable(String),

    #[error("cannot resize to {0}: {1}")]
    Resize(Dimensions, String),

    #[error("{format} encoder produced no output: {reason}")]
    Encode { format: ImageFormat, reason: String },
}

/// Image codec capability.
///
/// Implementations must be shareable across worker threads; the transcode
/// stage calls them from a rayon pool.
pub trait Codec: Send + Sync {
    /// Decoded, resizable image handle.
    type Image: Send + Sync;

    /// Read dimensions without a full decode.
    fn probe(&self, bytes: &[u8]) -> Result<Dimensions, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Image, CodecError>;

    /// Resample to exactly `to`.
    fn resize(&self, image: &Self::Image, to: Dimensions) -> Result<Self::Image, CodecError>;

    /// Encode, returning the encoded file bytes.
    fn encode(&self, image: &Self::Image, settings: EncodeSettings) -> Result<Vec<u8>, CodecError>;

    /// Whether `quality` changes the output size for `format`.
    ///
    /// Formats encoded losslessly return `false`, which collapses the
    /// quality search to a single attempt.
    fn quality_sensitive(&self, format: ImageFormat) -> bool {
        let _ = format;
        true
    }
}
