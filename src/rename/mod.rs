//! Deterministic asset renaming and the manifest that maps names back.
//!
//! ```text
//! AssetSet ──► AssetRenamer::plan ──► RenamePlan ──► AssetRenamer::apply
//!  (sorted by path)   (pure)                            ├─ move every entry
//!                                                       └─ ManifestBuilder → replace manifest
//! ```

mod manifest;
mod renamer;

pub use manifest::{Manifest, ManifestBuilder};
pub use renamer::{AssetRenamer, RenameEntry, RenamePlan, RenameSummary};
