//! Run configuration loading
//!
//! Layers, lowest to highest: built-in defaults, TOML file, `HOSTSPEC_*`
//! environment, command-line flags.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hostspec_core::domain::PackageOverride;
use hostspec_core::RunConfig;

pub const ENV_PREFIX: &str = "HOSTSPEC";

/// `<config_dir>/hostspec/config.toml`, when a home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hostspec").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load from the process environment
pub fn load(explicit: Option<&Path>, package: Option<PackageOverride>) -> Result<RunConfig> {
    load_with_env(explicit, package, None)
}

/// `env` replaces the process environment as the `HOSTSPEC_*` source
pub fn load_with_env(
    explicit: Option<&Path>,
    package: Option<PackageOverride>,
    env: Option<HashMap<String, String>>,
) -> Result<RunConfig> {
    let mut builder = Config::builder();

    // An explicit file must exist; the default location is optional
    match explicit {
        Some(path) => builder = builder.add_source(File::from(path).required(true)),
        None => {
            if let Some(path) = default_config_path() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        )
        .set_override_option("package", package.map(|p| p.to_string()))
        .context("invalid --package override")?
        .build()
        .context("failed to read configuration")?;

    config
        .try_deserialize::<RunConfig>()
        .context("invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostspec_core::config::DEFAULT_DIAL_TIMEOUT_MS;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_sources() {
        let file = write_config("");
        let config = load_with_env(Some(file.path()), None, env(&[])).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_layer_precedence() {
        let file = write_config("package = \"deb\"\ndial_timeout_ms = 900\ncommand_timeout_ms = 2000\n");

        let config = load_with_env(Some(file.path()), None, env(&[])).unwrap();
        assert_eq!(config.package, Some(PackageOverride::Deb));
        assert_eq!(config.dial_timeout_ms, 900);

        let config = load_with_env(
            Some(file.path()),
            None,
            env(&[("HOSTSPEC_PACKAGE", "rpm"), ("HOSTSPEC_DIAL_TIMEOUT_MS", "250")]),
        )
        .unwrap();
        assert_eq!(config.package, Some(PackageOverride::Rpm));
        assert_eq!(config.dial_timeout_ms, 250);
        assert_eq!(config.command_timeout_ms, 2000);

        let config = load_with_env(
            Some(file.path()),
            Some(PackageOverride::Deb),
            env(&[("HOSTSPEC_PACKAGE", "rpm")]),
        )
        .unwrap();
        assert_eq!(config.package, Some(PackageOverride::Deb));
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let file = write_config("");
        let result = load_with_env(Some(file.path()), None, env(&[("HOSTSPEC_PACKAGE", "apk")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = load_with_env(Some(Path::new("/nonexistent/hostspec.toml")), None, env(&[]));
        assert!(result.is_err());

        let file = write_config("");
        let config = load_with_env(Some(file.path()), None, env(&[])).unwrap();
        assert_eq!(config.dial_timeout_ms, DEFAULT_DIAL_TIMEOUT_MS);
    }
}
