//! Asset categories.

/// Extensions whose consumer-facing names must stay readable.
///
/// Markup, scripts, stylesheets and fonts are referenced by name from
/// outside the manifest (HTML entry points, `@font-face` rules).
pub const DEFAULT_PROTECTED_EXTENSIONS: &[&str] = &[
    "html", "htm", "js", "mjs", "css", "woff", "woff2", "ttf", "otf", "eot",
];

/// Broad category of an output asset, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Markup,
    Script,
    Stylesheet,
    Font,
    Image,
    Other,
}

impl AssetCategory {
    /// Classify a path by its extension (case-insensitive).
    pub fn from_path(path: &str) -> Self {
        let ext = extension_of(path).to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Self::Markup,
            "js" | "mjs" | "cjs" => Self::Script,
            "css" => Self::Stylesheet,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Self::Font,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" => Self::Image,
            _ => Self::Other,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Font => "font",
            Self::Image => "image",
            Self::Other => "other",
        }
    }
}

/// Extension of the file name in `path` (without the dot), or `""`.
pub(crate) fn extension_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(i) => &name[i + 1..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_path() {
        assert_eq!(AssetCategory::from_path("index.html"), AssetCategory::Markup);
        assert_eq!(AssetCategory::from_path("main.1a2b.js"), AssetCategory::Script);
        assert_eq!(AssetCategory::from_path("fonts/x.WOFF2"), AssetCategory::Font);
        assert_eq!(AssetCategory::from_path("img/a.png"), AssetCategory::Image);
        assert_eq!(AssetCategory::from_path("data/clip.mp4"), AssetCategory::Other);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("img/photo.png"), "png");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("dir.v2/README"), "");
        assert_eq!(extension_of(".hidden"), "");
    }
}
