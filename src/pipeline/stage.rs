//! Stage abstraction.

use rayon::ThreadPool;

use super::error::PassError;
use super::rename::{RenameReport, RenameStage};
use super::transcode::{TranscodeReport, TranscodeStage};
use crate::asset::AssetSet;
use crate::cache::TranscodeCache;
use crate::config::StageConfig;
use crate::core::CancelToken;
use crate::image::Codec;

/// Everything a stage may read during a pass.
pub struct PassContext<'a, C: Codec> {
    pub config: &'a StageConfig,
    pub codec: &'a C,
    pub cache: &'a TranscodeCache,
    pub pool: &'a ThreadPool,
    pub cancel: &'a CancelToken,
    /// Show a progress line.
    pub progress: bool,
}

impl<C: Codec> PassContext<'_, C> {
    pub fn check_cancelled(&self) -> Result<(), PassError> {
        if self.cancel.is_cancelled() {
            Err(PassError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Report of one stage run.
#[derive(Debug)]
pub enum StageReport {
    Transcode(TranscodeReport),
    Rename(RenameReport),
}

impl StageReport {
    pub fn as_transcode(&self) -> Option<&TranscodeReport> {
        match self {
            Self::Transcode(report) => Some(report),
            Self::Rename(_) => None,
        }
    }

    pub fn as_rename(&self) -> Option<&RenameReport> {
        match self {
            Self::Rename(report) => Some(report),
            Self::Transcode(_) => None,
        }
    }
}

/// One named step of a pass.
pub trait Stage<C: Codec>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrite `assets` in place.
    fn run(&self, assets: &mut AssetSet, ctx: &PassContext<'_, C>) -> Result<StageReport, PassError>;
}

/// Stage objects for `names`, in order.
pub fn resolve_stages<C: Codec>(names: &[String]) -> Result<Vec<Box<dyn Stage<C>>>, PassError> {
    names
        .iter()
        .map(|name| -> Result<Box<dyn Stage<C>>, PassError> {
            match name.as_str() {
                "transcode" => Ok(Box::new(TranscodeStage)),
                "rename" => Ok(Box::new(RenameStage)),
                other => Err(PassError::UnknownStage(other.to_string())),
            }
        })
        .collect()
}
