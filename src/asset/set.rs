//! In-memory asset set.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::kind::extension_of;

/// One output asset.
///
/// Bytes are immutable and shared: renaming or re-emitting an asset never
/// copies its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Output path, `/`-separated, relative to the output root.
    pub path: String,
    /// Content.
    pub bytes: Arc<[u8]>,
    /// Input file this output was generated from, if any.
    pub source_path: Option<String>,
    /// Logical image this asset is an encoded variant of (the original
    /// asset path). Members of one group are renamed together.
    pub sibling_group: Option<String>,
}

impl Asset {
    pub fn new(path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
            source_path: None,
            sibling_group: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_path = Some(source.into());
        self
    }

    pub fn with_sibling_group(mut self, group: impl Into<String>) -> Self {
        self.sibling_group = Some(group.into());
        self
    }

    /// Extension without the dot, or `""`.
    pub fn extension(&self) -> &str {
        extension_of(&self.path)
    }

    /// Path with the extension (and its dot) removed.
    pub fn path_without_extension(&self) -> &str {
        let ext = self.extension();
        if ext.is_empty() {
            &self.path
        } else {
            &self.path[..self.path.len() - ext.len() - 1]
        }
    }

    /// Source path if known, else the output path.
    pub fn origin(&self) -> &str {
        self.source_path.as_deref().unwrap_or(&self.path)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Asset collection keyed by output path.
///
/// Iteration is always in path order, so every stage walking the set sees
/// the same sequence for the same input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    assets: BTreeMap<String, Asset>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset, returning the one previously stored at the same path.
    pub fn emit(&mut self, asset: Asset) -> Option<Asset> {
        self.assets.insert(asset.path.clone(), asset)
    }

    /// Remove an asset by path.
    pub fn delete(&mut self, path: &str) -> Option<Asset> {
        self.assets.remove(path)
    }

    /// Replace whatever lives at `asset.path` with `asset` in one call.
    ///
    /// Used for artifacts like the manifest that must never be observed
    /// missing or half-written.
    pub fn replace(&mut self, asset: Asset) -> Option<Asset> {
        let old = self.assets.remove(&asset.path);
        self.assets.insert(asset.path.clone(), asset);
        old
    }

    /// Move an asset to a new path, keeping its bytes and metadata.
    ///
    /// Returns `false` if `from` does not exist.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        let Some(mut asset) = self.assets.remove(from) else {
            return false;
        };
        asset.path = to.to_string();
        self.assets.insert(asset.path.clone(), asset);
        true
    }

    pub fn get(&self, path: &str) -> Option<&Asset> {
        self.assets.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.assets.contains_key(path)
    }

    /// Iterate assets in path order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    /// Every origin (source path, falling back to output path) in the set.
    pub fn origins(&self) -> FxHashSet<&str> {
        self.assets.values().map(Asset::origin).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.assets.values().map(Asset::len).sum()
    }
}

impl FromIterator<Asset> for AssetSet {
    fn from_iter<I: IntoIterator<Item = Asset>>(iter: I) -> Self {
        let mut set = Self::new();
        for asset in iter {
            set.emit(asset);
        }
        set
    }
}

impl IntoIterator for AssetSet {
    type Item = Asset;
    type IntoIter = std::collections::btree_map::IntoValues<String, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.into_values()
    }
}
