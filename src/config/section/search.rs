//! `[search]` section: per-field overrides of the mode's search policy.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::BuildMode;
use crate::image::SearchPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_attempts: Option<u32>,
    pub quality_step: Option<u8>,
    pub starting_quality: Option<u8>,
    pub codec_effort: Option<u8>,
}

impl SearchConfig {
    const MAX_ATTEMPTS: FieldPath = FieldPath::new("search.max_attempts");
    const QUALITY_STEP: FieldPath = FieldPath::new("search.quality_step");
    const STARTING_QUALITY: FieldPath = FieldPath::new("search.starting_quality");
    const CODEC_EFFORT: FieldPath = FieldPath::new("search.codec_effort");

    /// Mode defaults with the configured overrides applied.
    pub fn policy(&self, mode: BuildMode) -> SearchPolicy {
        let base = SearchPolicy::for_mode(mode);
        SearchPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            quality_step: self.quality_step.unwrap_or(base.quality_step),
            starting_quality: self.starting_quality.unwrap_or(base.starting_quality),
            codec_effort: self.codec_effort.unwrap_or(base.codec_effort),
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_attempts == Some(0) {
            diag.error(Self::MAX_ATTEMPTS, "must be at least 1");
        }
        if self.quality_step == Some(0) {
            diag.error_with_hint(
                Self::QUALITY_STEP,
                "must be at least 1",
                format!("set {} = 1 to try a single quality", Self::MAX_ATTEMPTS),
            );
        }
        if let Some(q) = self.starting_quality
            && !(1..=100).contains(&q)
        {
            diag.error(Self::STARTING_QUALITY, format!("must be within 1..=100, got {q}"));
        }
        if let Some(effort) = self.codec_effort
            && effort > 9
        {
            diag.error(Self::CODEC_EFFORT, format!("must be within 0..=9, got {effort}"));
        }
    }
}
