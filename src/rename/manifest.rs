//! Manifest serialization: `{"files":[["img/a.avif","0"], ...]}`.

use serde::{Deserialize, Serialize};

use super::renamer::RenamePlan;
use crate::asset::Asset;

/// Parsed manifest, as clients read it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// `(original_path, assigned_id)` in plan order.
    pub files: Vec<(String, String)>,
}

impl Manifest {
    /// Id assigned to `original_path`.
    pub fn id_of(&self, original_path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(path, _)| path == original_path)
            .map(|(_, id)| id.as_str())
    }
}

#[derive(Serialize)]
struct ManifestRef<'a> {
    files: Vec<(&'a str, &'a str)>,
}

pub struct ManifestBuilder<'a> {
    path: &'a str,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(path: &'a str) -> Self {
        Self { path }
    }

    /// Compact JSON of the plan's entries.
    pub fn to_json(&self, plan: &RenamePlan) -> Result<Vec<u8>, serde_json::Error> {
        let manifest = ManifestRef {
            files: plan
                .entries
                .iter()
                .map(|e| (e.original_path.as_str(), e.assigned_id.as_str()))
                .collect(),
        };
        serde_json::to_vec(&manifest)
    }

    /// Manifest asset, ready for `AssetSet::replace`.
    pub fn build(&self, plan: &RenamePlan) -> Result<Asset, serde_json::Error> {
        Ok(Asset::new(self.path, self.to_json(plan)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rename::RenameEntry;

    fn plan() -> RenamePlan {
        let entry = |path: &str, id: &str, new_path: &str| RenameEntry {
            original_path: path.to_string(),
            source_key: path.to_string(),
            assigned_id: id.to_string(),
            new_path: new_path.to_string(),
        };
        RenamePlan {
            entries: vec![
                entry("img/a.avif", "0", "0.avif"),
                entry("img/a.webp", "0", "0.webp"),
                entry("clip.mp4", "1", "1.mp4"),
            ],
        }
    }

    #[test]
    fn test_manifest_shape() {
        let json = ManifestBuilder::new("assets.json").to_json(&plan()).unwrap();
        assert_eq!(
            String::from_utf8(json).unwrap(),
            r#"{"files":[["img/a.avif","0"],["img/a.webp","0"],["clip.mp4","1"]]}"#
        );
    }

    #[test]
    fn test_empty_plan() {
        let json = ManifestBuilder::new("assets.json").to_json(&RenamePlan::default()).unwrap();
        assert_eq!(json, br#"{"files":[]}"#);
    }

    #[test]
    fn test_manifest_reads_back() {
        let asset = ManifestBuilder::new("map.json").build(&plan()).unwrap();
        assert_eq!(asset.path, "map.json");

        let manifest: Manifest = serde_json::from_slice(&asset.bytes).unwrap();
        assert_eq!(manifest.files.len(), 3);
        assert_eq!(manifest.id_of("img/a.webp"), Some("0"));
        assert_eq!(manifest.id_of("missing.png"), None);
    }
}
