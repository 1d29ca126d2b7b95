//! Blaze: build-time media optimization for bundler output.
//!
//! A pass takes the asset set a bundler produced and
//!
//! 1. transcodes raster images into size-budgeted AVIF/WebP variants,
//!    deduplicating identical content through a session-lifetime cache;
//! 2. renames every non-protected asset to a short sequential id and
//!    writes a manifest mapping original paths to ids.
//!
//! ```ignore
//! let config = BlazeConfig::load_or_default(Path::new("blaze.toml"))?.resolve(None)?;
//! let mut session = BuildSession::init(config, ImageCodec::new())?;
//! let (assets, report) = session.run_pass(scan_dir(input, Some(output))?, &CancelToken::new())?;
//! write_dir(&assets, output, true)?;
//! session.teardown();
//! ```

pub mod asset;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod fingerprint;
pub mod image;
pub mod logger;
pub mod pipeline;
pub mod rename;
pub mod utils;
