//! `[pipeline]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [pipeline]
//! stages = ["transcode", "rename"]
//! workers = 0      # 0 = available parallelism
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Stage names a pass can run.
pub const KNOWN_STAGES: &[&str] = &["transcode", "rename"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stage names in execution order.
    pub stages: Vec<String>,
    /// Transcode worker threads.
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: KNOWN_STAGES.iter().map(|s| (*s).to_string()).collect(),
            workers: 0,
        }
    }
}

impl PipelineConfig {
    const STAGES: FieldPath = FieldPath::new("pipeline.stages");

    /// Worker count with `0` resolved to the machine's parallelism.
    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for stage in &self.stages {
            if !KNOWN_STAGES.contains(&stage.as_str()) {
                diag.error_with_hint(
                    Self::STAGES,
                    format!("unknown stage `{stage}`"),
                    format!("available: {}", KNOWN_STAGES.join(", ")),
                );
            }
        }
        let mut seen: Vec<&str> = Vec::new();
        for stage in &self.stages {
            if seen.contains(&stage.as_str()) {
                diag.error(Self::STAGES, format!("stage `{stage}` listed more than once"));
            }
            seen.push(stage.as_str());
        }
    }
}
