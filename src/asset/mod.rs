//! Output asset set handed over by the bundler.
//!
//! - [`Asset`] / [`AssetSet`]: in-memory asset collection owned by one pass
//! - [`AssetCategory`]: extension-based classification
//! - [`scan_dir`] / [`write_dir`]: load and persist an asset set on disk

mod kind;
mod scan;
mod set;
mod write;

pub use kind::{AssetCategory, DEFAULT_PROTECTED_EXTENSIONS};
pub use scan::scan_dir;
pub use set::{Asset, AssetSet};
pub use write::write_dir;
