//! Persist an asset set to a directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::AssetSet;

/// Write every asset below `out_dir`.
///
/// With `clean`, the directory is removed first so assets deleted or
/// renamed by the pass do not linger from a previous run.
pub fn write_dir(assets: &AssetSet, out_dir: &Path, clean: bool) -> Result<()> {
    if clean && out_dir.exists() {
        fs::remove_dir_all(out_dir)
            .with_context(|| format!("failed to clean `{}`", out_dir.display()))?;
    }
    fs::create_dir_all(out_dir)?;

    for asset in assets.iter() {
        let target = out_dir.join(&asset.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &asset.bytes)
            .with_context(|| format!("failed to write `{}`", target.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use tempfile::TempDir;

    #[test]
    fn test_write_dir_creates_parents() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let set: AssetSet = [Asset::new("fonts/a.woff2", b"font".to_vec())].into_iter().collect();

        write_dir(&set, &out, false).unwrap();
        assert_eq!(fs::read(out.join("fonts/a.woff2")).unwrap(), b"font");
    }

    #[test]
    fn test_write_dir_clean_removes_stale_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.png"), "old").unwrap();

        let set: AssetSet = [Asset::new("0.avif", b"new".to_vec())].into_iter().collect();
        write_dir(&set, &out, true).unwrap();

        assert!(!out.join("stale.png").exists());
        assert!(out.join("0.avif").exists());
    }
}
