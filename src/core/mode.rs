//! Build mode: fast development passes vs thorough production passes.

use serde::{Deserialize, Serialize};

/// Build mode of a session.
///
/// Selects the default encoder effort, quality search bounds and byte budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Fast passes for watch mode.
    #[serde(alias = "dev")]
    Development,
    /// Thorough passes for shipped output.
    #[default]
    #[serde(alias = "prod")]
    Production,
}

impl BuildMode {
    /// Check if this is development mode.
    #[inline]
    pub const fn is_dev(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Short label for log lines.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Development => "dev",
            Self::Production => "prod",
        }
    }
}

impl std::str::FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            other => Err(format!("unknown build mode `{other}` (expected dev or prod)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_aliases() {
        assert_eq!("dev".parse::<BuildMode>().unwrap(), BuildMode::Development);
        assert_eq!("Production".parse::<BuildMode>().unwrap(), BuildMode::Production);
        assert!("fast".parse::<BuildMode>().is_err());
    }

    #[test]
    fn test_mode_deserialize_alias() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: BuildMode,
        }
        let w: Wrapper = toml::from_str("mode = \"dev\"").unwrap();
        assert!(w.mode.is_dev());
        let w: Wrapper = toml::from_str("mode = \"production\"").unwrap();
        assert!(!w.mode.is_dev());
    }
}
