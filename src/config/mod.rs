//! Configuration for `blaze.toml`.
//!
//! ```text
//! blaze.toml ──► BlazeConfig ──validate──► resolve(mode) ──► StageConfig
//!                (file shape)                                 (shared by every stage)
//! ```
//!
//! Every section is optional; a missing file behaves like an empty one.

mod section;
mod types;

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::BuildMode;
use crate::image::{EncodeSettings, ImageFormat, ResizeRequest, SearchPolicy};
use crate::log;

pub use section::{
    CacheConfig, ImagesConfig, KNOWN_STAGES, PipelineConfig, RenameConfig, SearchConfig,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

/// Default config file name.
pub const CONFIG_FILE: &str = "blaze.toml";

/// Contents of `blaze.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlazeConfig {
    /// Build mode; the CLI flag takes precedence.
    pub mode: Option<BuildMode>,
    pub images: ImagesConfig,
    pub search: SearchConfig,
    pub rename: RenameConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
}

impl BlazeConfig {
    /// Parse configuration from TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.is_file() {
            Self::from_path(path)
        } else {
            crate::debug!("config"; "{} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Check every section, reporting all problems together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.images.validate(&mut diag);
        self.search.validate(&mut diag);
        self.rename.validate(&mut diag);
        self.cache.validate(&mut diag);
        self.pipeline.validate(&mut diag);
        diag.into_result()
    }

    /// Validate and build the settings shared by every stage.
    ///
    /// `mode` overrides the file's `mode`; with neither, production is used.
    pub fn resolve(&self, mode: Option<BuildMode>) -> Result<StageConfig, ConfigError> {
        self.validate()?;
        Ok(self.build_stage_config(mode.or(self.mode).unwrap_or_default()))
    }

    fn build_stage_config(&self, mode: BuildMode) -> StageConfig {
        StageConfig {
            mode,
            policy: self.search.policy(mode),
            image_dir: self.images.normalized_dir(),
            image_extensions: self.images.normalized_extensions(),
            formats: self.images.formats.clone(),
            max_edge: self.images.max_edge,
            byte_budget: self.images.budget_for(mode),
            resize_steps: self.images.resize_steps,
            rename: RenameSettings {
                enable: self.rename.enable,
                manifest: self.rename.manifest_path(),
                protected_extensions: self
                    .rename
                    .protected_extensions
                    .iter()
                    .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                    .collect(),
                exclude: self.rename.exclude_patterns(),
            },
            cache_capacity: self.cache.capacity,
            stages: self.pipeline.stages.clone(),
            workers: self.pipeline.resolved_workers(),
        }
    }
}

// ============================================================================
// StageConfig
// ============================================================================

/// Resolved settings, built once per session and read by every stage.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub mode: BuildMode,
    pub policy: SearchPolicy,
    pub image_dir: String,
    pub image_extensions: Vec<String>,
    pub formats: Vec<ImageFormat>,
    pub max_edge: u32,
    pub byte_budget: usize,
    pub resize_steps: u32,
    pub rename: RenameSettings,
    pub cache_capacity: usize,
    pub stages: Vec<String>,
    pub workers: usize,
}

/// Resolved `[rename]` settings.
#[derive(Debug, Clone)]
pub struct RenameSettings {
    pub enable: bool,
    pub manifest: String,
    pub protected_extensions: Vec<String>,
    pub exclude: Vec<Regex>,
}

impl StageConfig {
    /// Defaults for `mode`.
    pub fn for_mode(mode: BuildMode) -> Self {
        BlazeConfig::default().build_stage_config(mode)
    }

    /// Resize parameters; the proxy is the first format at the search floor.
    pub fn resize_request(&self) -> ResizeRequest {
        ResizeRequest {
            max_edge: self.max_edge,
            byte_budget: self.byte_budget,
            steps: self.resize_steps,
            proxy: EncodeSettings {
                format: self.formats.first().copied().unwrap_or(ImageFormat::Avif),
                quality: self.policy.floor_quality(),
                effort: self.policy.codec_effort,
            },
        }
    }
}
