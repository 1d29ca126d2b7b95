//! Sequential id assignment.
//!
//! Non-protected assets are walked in path order and given decimal ids
//! `0, 1, 2, ...`. All members of a sibling group share the id assigned to
//! the group's first member. The new path is `<id>.<ext>` at the output
//! root (or just `<id>` without an extension).

use rustc_hash::{FxHashMap, FxHashSet};

use super::manifest::ManifestBuilder;
use crate::asset::{Asset, AssetSet};
use crate::config::RenameSettings;
use crate::debug;

/// One planned rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    /// Path before renaming, without a leading `/`.
    pub original_path: String,
    /// Key of the asset in the set, as stored.
    pub source_key: String,
    pub assigned_id: String,
    /// Path after renaming.
    pub new_path: String,
}

/// Rename entries of one pass, in assignment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    pub entries: Vec<RenameEntry>,
}

impl RenamePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct ids.
    pub fn id_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.assigned_id.as_str())
            .collect::<FxHashSet<_>>()
            .len()
    }
}

/// Outcome of [`AssetRenamer::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSummary {
    pub renamed: usize,
    pub ids: usize,
    pub manifest_path: String,
    pub manifest_bytes: usize,
}

pub struct AssetRenamer<'a> {
    settings: &'a RenameSettings,
}

impl<'a> AssetRenamer<'a> {
    pub fn new(settings: &'a RenameSettings) -> Self {
        Self { settings }
    }

    /// Protected assets keep their paths.
    pub fn is_protected(&self, asset: &Asset) -> bool {
        let path = asset.path.trim_start_matches('/');
        if path == self.settings.manifest {
            return true;
        }
        let ext = asset.extension().to_ascii_lowercase();
        if !ext.is_empty() && self.settings.protected_extensions.contains(&ext) {
            return true;
        }
        self.settings.exclude.iter().any(|re| re.is_match(path))
    }

    /// Assign ids without touching the set.
    pub fn plan(&self, assets: &AssetSet) -> RenamePlan {
        let mut occupied: FxHashSet<&str> = FxHashSet::default();
        let mut renamable = Vec::new();
        for asset in assets.iter() {
            if self.is_protected(asset) {
                occupied.insert(asset.path.trim_start_matches('/'));
            } else {
                renamable.push(asset);
            }
        }
        occupied.insert(self.settings.manifest.as_str());

        // Every extension a group will need, so the id fits all members
        let mut group_exts: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        for asset in &renamable {
            if let Some(group) = asset.sibling_group.as_deref() {
                group_exts.entry(group).or_default().push(asset.extension());
            }
        }

        let mut group_ids: FxHashMap<&str, String> = FxHashMap::default();
        let mut next: u64 = 0;
        let mut entries = Vec::with_capacity(renamable.len());

        for asset in renamable {
            let group = asset.sibling_group.as_deref();
            let id = match group.and_then(|g| group_ids.get(g)) {
                Some(id) => id.clone(),
                None => {
                    let own = [asset.extension()];
                    let exts = group
                        .and_then(|g| group_exts.get(g))
                        .map_or(&own[..], Vec::as_slice);
                    let id = loop {
                        let candidate = next.to_string();
                        next += 1;
                        if exts.iter().all(|ext| !occupied.contains(target_path(&candidate, ext).as_str())) {
                            break candidate;
                        }
                        debug!("rename"; "id {} skipped, taken by a protected asset", candidate);
                    };
                    if let Some(g) = group {
                        group_ids.insert(g, id.clone());
                    }
                    id
                }
            };

            entries.push(RenameEntry {
                original_path: asset.path.trim_start_matches('/').to_string(),
                source_key: asset.path.clone(),
                new_path: target_path(&id, asset.extension()),
                assigned_id: id,
            });
        }

        RenamePlan { entries }
    }

    /// Move every planned asset and replace the manifest in one step.
    pub fn apply(
        &self,
        plan: &RenamePlan,
        assets: &mut AssetSet,
    ) -> Result<RenameSummary, serde_json::Error> {
        let manifest = ManifestBuilder::new(&self.settings.manifest).build(plan)?;

        // Take everything out first: a new path may equal an old path still waiting to move
        let moved: Vec<(Asset, &RenameEntry)> = plan
            .entries
            .iter()
            .filter_map(|entry| assets.delete(&entry.source_key).map(|asset| (asset, entry)))
            .collect();
        let renamed = moved.len();
        for (mut asset, entry) in moved {
            asset.path.clone_from(&entry.new_path);
            assets.emit(asset);
        }

        let manifest_bytes = manifest.len();
        assets.replace(manifest);

        Ok(RenameSummary {
            renamed,
            ids: plan.id_count(),
            manifest_path: self.settings.manifest.clone(),
            manifest_bytes,
        })
    }
}

fn target_path(id: &str, ext: &str) -> String {
    if ext.is_empty() {
        id.to_string()
    } else {
        format!("{id}.{ext}")
    }
}
