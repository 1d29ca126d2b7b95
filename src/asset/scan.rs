//! Load an asset set from a directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use jwalk::WalkDir;

use super::{Asset, AssetSet};

/// Read every file below `root` into an asset set.
///
/// Output paths are `/`-separated and relative to `root`. Each asset's
/// source path is the same relative path, so cache pruning can tell when
/// an input disappears between passes.
///
/// Files under `skip` are left out when it lies inside `root`, so an output
/// directory nested in the input is never read back as input.
pub fn scan_dir(root: &Path, skip: Option<&Path>) -> Result<AssetSet> {
    let root = root
        .canonicalize()
        .with_context(|| format!("failed to resolve `{}`", root.display()))?;
    let skip = skip
        .and_then(|dir| dir.canonicalize().ok())
        .filter(|dir| dir.starts_with(&root) && *dir != root);

    let mut set = AssetSet::new();

    let files = WalkDir::new(&root)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| skip.as_ref().is_none_or(|dir| !path.starts_with(dir)));

    for path in files {
        let rel = relative_slash_path(&root, &path);
        let bytes = fs::read(&path).with_context(|| format!("failed to read `{}`", path.display()))?;
        set.emit(Asset::new(rel.clone(), bytes).with_source(rel));
    }

    Ok(set)
}

/// `path` relative to `root`, with `/` separators on every platform.
pub(crate) fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
