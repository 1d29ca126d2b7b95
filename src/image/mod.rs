//! Image transcoding building blocks.
//!
//! # Modules
//!
//! - [`codec`]: the [`Codec`] capability (probe, decode, resize, encode)
//! - [`native`]: [`ImageCodec`], the `image` + `ravif` backed codec
//! - [`resize`]: envelope fitting and budget-driven downsizing
//! - [`search`]: descending quality search under a byte budget
//!
//! # Flow
//!
//! ```text
//! bytes ──► probe ──► decode ──► resize::fit ──► search::search_quality (per format)
//!                                  │                      │
//!                                  └── proxy encodes ─────┘── Codec::encode
//! ```

pub mod codec;
mod error;
pub mod native;
pub mod resize;
pub mod search;

#[cfg(test)]
pub(crate) mod mock;

pub use codec::{Codec, CodecError, Dimensions, EncodeSettings, ImageFormat};
pub use error::TranscodeError;
pub use native::ImageCodec;
pub use resize::{ResizeRequest, Resized, fit};
pub use search::{Encoded, SearchPolicy, search_quality};
