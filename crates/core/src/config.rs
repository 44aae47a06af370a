// Run Configuration
//
// Plain data; loading and layering (file, env, flags) is done by the binary.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::PackageOverride;

/// Default TCP dial timeout for addr checks (500ms)
pub const DEFAULT_DIAL_TIMEOUT_MS: u64 = 500;

/// Default wall-clock limit for host tools run by checks (10s)
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Forces the package-manager strategy regardless of detection
    pub package: Option<PackageOverride>,
    pub dial_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

impl RunConfig {
    pub fn with_package(mut self, package: Option<PackageOverride>) -> Self {
        self.package = package;
        self
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            package: None,
            dial_timeout_ms: DEFAULT_DIAL_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial() {
        let config: RunConfig = serde_json::from_str(r#"{"package":"deb"}"#).unwrap();
        assert_eq!(config.package, Some(PackageOverride::Deb));
        assert_eq!(config.dial_timeout_ms, DEFAULT_DIAL_TIMEOUT_MS);

        let config: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_deserialize_rejects_unknown_override() {
        assert!(serde_json::from_str::<RunConfig>(r#"{"package":"apk"}"#).is_err());
    }
}
