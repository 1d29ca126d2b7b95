//! `[images]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [images]
//! dir = "img"
//! extensions = ["png", "jpg"]
//! formats = ["avif", "webp"]
//! max_edge = 3840
//! byte_budget = 100000     # default depends on mode
//! resize_steps = 4
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::BuildMode;
use crate::image::ImageFormat;

/// Per-image byte budget when none is configured.
const PRODUCTION_BUDGET: usize = 100_000;
const DEVELOPMENT_BUDGET: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Directory prefix (relative to the asset root) holding transcodable images.
    pub dir: String,
    /// File extensions treated as transcode candidates, without the dot.
    pub extensions: Vec<String>,
    /// Output formats, in encode order.
    pub formats: Vec<ImageFormat>,
    /// Maximum width/height of any emitted image.
    pub max_edge: u32,
    /// Byte budget per encoded variant.
    pub byte_budget: Option<usize>,
    /// Number of fractional edge targets tried while over budget.
    pub resize_steps: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dir: "img".to_string(),
            extensions: vec!["png".to_string()],
            formats: vec![ImageFormat::Avif, ImageFormat::Webp],
            max_edge: 3840,
            byte_budget: None,
            resize_steps: 4,
        }
    }
}

impl ImagesConfig {
    const DIR: FieldPath = FieldPath::new("images.dir");
    const EXTENSIONS: FieldPath = FieldPath::new("images.extensions");
    const FORMATS: FieldPath = FieldPath::new("images.formats");
    const MAX_EDGE: FieldPath = FieldPath::new("images.max_edge");
    const BYTE_BUDGET: FieldPath = FieldPath::new("images.byte_budget");
    const RESIZE_STEPS: FieldPath = FieldPath::new("images.resize_steps");

    /// Configured budget, or the mode default.
    pub fn budget_for(&self, mode: BuildMode) -> usize {
        self.byte_budget.unwrap_or(match mode {
            BuildMode::Development => DEVELOPMENT_BUDGET,
            BuildMode::Production => PRODUCTION_BUDGET,
        })
    }

    /// Directory prefix without surrounding slashes.
    pub fn normalized_dir(&self) -> String {
        self.dir.trim_matches('/').to_string()
    }

    /// Lowercased extensions without leading dots.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.dir.contains("..") {
            diag.error(Self::DIR, "must not contain `..`");
        }
        if self.extensions.is_empty() {
            diag.error_with_hint(Self::EXTENSIONS, "must not be empty", "e.g. extensions = [\"png\"]");
        }
        if self.formats.is_empty() {
            diag.error_with_hint(Self::FORMATS, "must not be empty", "e.g. formats = [\"avif\", \"webp\"]");
        }
        let mut seen = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            if seen.contains(format) {
                diag.error(Self::FORMATS, format!("`{format}` listed more than once"));
            }
            seen.push(*format);
        }
        if self.max_edge == 0 {
            diag.error(Self::MAX_EDGE, "must be at least 1");
        }
        if self.byte_budget == Some(0) {
            diag.error(Self::BYTE_BUDGET, "must be at least 1");
        }
        if self.resize_steps == 0 {
            diag.error_with_hint(Self::RESIZE_STEPS, "must be at least 1", "use 1 to disable shrinking");
        }
    }
}
