//! Build target detection (`BUILD_MODE`, `BUILD_APP`).

use crate::env::{ENV_BUILD_APP, ENV_BUILD_MODE, EnvSnapshot};
use serde::Serialize;
use std::fmt;

/// How the web app is bundled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Server build with API routes.
    #[default]
    Standalone,
    /// Static export without a server.
    Export,
}

impl BuildMode {
    /// Parse a mode name; `None` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standalone" => Some(Self::Standalone),
            "export" => Some(Self::Export),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Bundle mode plus whether the desktop app is being built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTarget {
    /// Bundle mode.
    pub mode: BuildMode,
    /// True when building the desktop app.
    pub is_app: bool,
}

impl BuildTarget {
    /// Read the build target from a snapshot.
    ///
    /// Absent or empty `BUILD_MODE` means standalone. Unknown modes also fall
    /// back to standalone, with a warning.
    #[must_use]
    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        let mode = match env.get(ENV_BUILD_MODE).filter(|value| !value.trim().is_empty()) {
            None => BuildMode::default(),
            Some(raw) => BuildMode::parse(raw).unwrap_or_else(|| {
                tracing::warn!(
                    env_var = ENV_BUILD_MODE,
                    value = raw,
                    "unknown build mode; falling back to standalone"
                );
                BuildMode::default()
            }),
        };

        Self {
            mode,
            is_app: env.is_set(ENV_BUILD_APP),
        }
    }

    /// True for static exports, which have no server-side API routes.
    #[must_use]
    pub const fn is_export(self) -> bool {
        matches!(self.mode, BuildMode::Export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_standalone_server() {
        let target = BuildTarget::from_snapshot(&EnvSnapshot::default());
        assert_eq!(target, BuildTarget::default());
        assert!(!target.is_export());
    }

    #[test]
    fn reads_export_app_build() {
        let env = EnvSnapshot::from_pairs([(ENV_BUILD_MODE, "export"), (ENV_BUILD_APP, "1")]);
        let target = BuildTarget::from_snapshot(&env);
        assert_eq!(target.mode, BuildMode::Export);
        assert!(target.is_app);
        assert!(target.is_export());
    }

    #[test]
    fn unknown_mode_falls_back() {
        let env = EnvSnapshot::from_pairs([(ENV_BUILD_MODE, "serverless")]);
        assert_eq!(BuildTarget::from_snapshot(&env).mode, BuildMode::Standalone);
    }

    #[test]
    fn mode_names_are_case_insensitive() {
        assert_eq!(BuildMode::parse(" Export "), Some(BuildMode::Export));
        assert_eq!(BuildMode::Export.to_string(), "export");
    }
}
