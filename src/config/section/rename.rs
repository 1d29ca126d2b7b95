//! `[rename]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [rename]
//! enable = true
//! manifest = "assets.json"
//! protected_extensions = ["html", "js", "css"]
//! exclude = ["^robots\\.txt$", "^favicon\\."]
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::asset::DEFAULT_PROTECTED_EXTENSIONS;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    pub enable: bool,
    /// Manifest path relative to the output root.
    pub manifest: String,
    /// Extensions (without dot) that keep their paths.
    pub protected_extensions: Vec<String>,
    /// Regexes matched against asset paths; matching assets keep their paths.
    pub exclude: Vec<String>,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            enable: true,
            manifest: "assets.json".to_string(),
            protected_extensions: DEFAULT_PROTECTED_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
            exclude: Vec::new(),
        }
    }
}

impl RenameConfig {
    const MANIFEST: FieldPath = FieldPath::new("rename.manifest");
    const EXCLUDE: FieldPath = FieldPath::new("rename.exclude");

    /// Manifest path without a leading slash.
    pub fn manifest_path(&self) -> String {
        self.manifest.trim_start_matches('/').to_string()
    }

    /// Compile `exclude`, skipping invalid patterns (reported by `validate`).
    pub fn exclude_patterns(&self) -> Vec<Regex> {
        self.exclude
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.manifest_path().is_empty() {
            diag.error(Self::MANIFEST, "must not be empty");
        }
        for pattern in &self.exclude {
            if let Err(err) = Regex::new(pattern) {
                diag.error_with_hint(
                    Self::EXCLUDE,
                    format!("invalid regex `{pattern}`"),
                    err.to_string(),
                );
            }
        }
    }
}
