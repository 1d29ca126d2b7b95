//! Session-lifetime transcode cache.
//!
//! Maps image fingerprints to the variants produced for them, so unchanged
//! images are not re-encoded on every watch pass. Lives exactly as long as
//! the owning [`BuildSession`](crate::pipeline::BuildSession).

mod transcode;

pub use transcode::{CacheEntry, CacheOutcome, CacheStats, TranscodeCache, Variant, Variants};
