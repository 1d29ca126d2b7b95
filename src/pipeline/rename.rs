//! Rename stage: sequential ids plus the manifest.

use super::error::PassError;
use super::stage::{PassContext, Stage, StageReport};
use crate::asset::{AssetCategory, AssetSet};
use crate::image::Codec;
use crate::rename::{AssetRenamer, RenameSummary};
use crate::utils::plural::plural_count;
use crate::{debug, log};

#[derive(Debug, Clone, Default)]
pub struct RenameReport {
    /// `None` when renaming is disabled.
    pub summary: Option<RenameSummary>,
}

pub struct RenameStage;

impl<C: Codec> Stage<C> for RenameStage {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn run(&self, assets: &mut AssetSet, ctx: &PassContext<'_, C>) -> Result<StageReport, PassError> {
        let settings = &ctx.config.rename;
        if !settings.enable {
            debug!("rename"; "disabled");
            return Ok(StageReport::Rename(RenameReport::default()));
        }

        let renamer = AssetRenamer::new(settings);
        let plan = renamer.plan(assets);

        crate::debug_do! {
            let mut by_category = std::collections::BTreeMap::new();
            for entry in &plan.entries {
                *by_category.entry(AssetCategory::from_path(&entry.original_path).label()).or_insert(0usize) += 1;
            }
            for (category, count) in by_category {
                debug!("rename"; "{}: {}", category, count);
            }
        }

        // Last point a pass can stop without a half-applied rename
        ctx.check_cancelled()?;
        let summary = renamer.apply(&plan, assets)?;

        log!(
            "rename";
            "{} -> {} ids, {} ({} bytes)",
            plural_count(summary.renamed, "asset"),
            summary.ids,
            summary.manifest_path,
            summary.manifest_bytes
        );
        Ok(StageReport::Rename(RenameReport {
            summary: Some(summary),
        }))
    }
}
