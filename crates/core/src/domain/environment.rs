// Environment Profile Domain Model

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::DomainError;

/// Which process supervisor manages services on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitSystemKind {
    Systemd,
    TraditionalInit,
}

impl std::fmt::Display for InitSystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitSystemKind::Systemd => write!(f, "systemd"),
            InitSystemKind::TraditionalInit => write!(f, "init"),
        }
    }
}

/// Which package ecosystem governs installed software
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManagerKind {
    Rpm,
    Deb,
    None,
}

impl std::fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageManagerKind::Rpm => write!(f, "rpm"),
            PackageManagerKind::Deb => write!(f, "deb"),
            PackageManagerKind::None => write!(f, "none"),
        }
    }
}

/// Explicit package-manager choice from run configuration.
///
/// Only concrete families can be forced; "no package manager" is never an
/// override, it is what detection falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageOverride {
    Rpm,
    Deb,
}

impl FromStr for PackageOverride {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rpm" => Ok(PackageOverride::Rpm),
            "deb" => Ok(PackageOverride::Deb),
            other => Err(DomainError::InvalidPackageOverride(other.to_string())),
        }
    }
}

impl From<PackageOverride> for PackageManagerKind {
    fn from(value: PackageOverride) -> Self {
        match value {
            PackageOverride::Rpm => PackageManagerKind::Rpm,
            PackageOverride::Deb => PackageManagerKind::Deb,
        }
    }
}

impl std::fmt::Display for PackageOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        PackageManagerKind::from(*self).fmt(f)
    }
}

/// Host classification, computed once per run and never mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    pub init_system: InitSystemKind,
    pub package_manager: PackageManagerKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_override_parse() {
        assert_eq!("rpm".parse::<PackageOverride>().unwrap(), PackageOverride::Rpm);
        assert_eq!(" deb ".parse::<PackageOverride>().unwrap(), PackageOverride::Deb);
        assert!("none".parse::<PackageOverride>().is_err());
        assert!("apk".parse::<PackageOverride>().is_err());
        assert!("".parse::<PackageOverride>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(InitSystemKind::Systemd.to_string(), "systemd");
        assert_eq!(InitSystemKind::TraditionalInit.to_string(), "init");
        assert_eq!(PackageManagerKind::None.to_string(), "none");
        assert_eq!(PackageOverride::Deb.to_string(), "deb");
    }
}
