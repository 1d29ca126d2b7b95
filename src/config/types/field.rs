//! Config field path used to point diagnostics at a `blaze.toml` key.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path of a config key, e.g. `images.max_edge`.
///
/// # Example
///
/// ```ignore
/// const MAX_EDGE: FieldPath = FieldPath::new("images.max_edge");
/// diag.error(MAX_EDGE, "must be at least 1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}
