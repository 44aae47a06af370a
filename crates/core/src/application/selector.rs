// Capability Selector - turns detection answers into concrete strategies
use crate::domain::{EnvironmentProfile, InitSystemKind, PackageManagerKind, PackageOverride};
use serde::Serialize;
use tracing::{info, warn};

/// How package checks are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStrategy {
    Rpm,
    Deb,
    /// No package manager detected: every query reports "unavailable"
    Null,
}

impl std::fmt::Display for PackageStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageStrategy::Rpm => write!(f, "rpm"),
            PackageStrategy::Deb => write!(f, "deb"),
            PackageStrategy::Null => write!(f, "null"),
        }
    }
}

/// How service checks are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStrategy {
    /// Queries the service manager over its control channel
    Systemd,
    /// Inspects init scripts and runlevel links
    Init,
}

impl std::fmt::Display for ServiceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStrategy::Systemd => write!(f, "systemd"),
            ServiceStrategy::Init => write!(f, "init"),
        }
    }
}

/// The strategy pair bound into a system context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub package: PackageStrategy,
    pub service: ServiceStrategy,
}

pub struct CapabilitySelector;

impl CapabilitySelector {
    pub fn select(
        package_override: Option<PackageOverride>,
        profile: &EnvironmentProfile,
    ) -> Capabilities {
        Capabilities {
            package: Self::package_strategy(package_override, profile.package_manager),
            service: Self::service_strategy(profile.init_system),
        }
    }

    /// An override wins unconditionally, whatever was detected
    pub fn package_strategy(
        package_override: Option<PackageOverride>,
        detected: PackageManagerKind,
    ) -> PackageStrategy {
        if let Some(forced) = package_override {
            info!(
                package_override = %forced,
                detected = %detected,
                "Package manager forced by configuration"
            );
            return match forced {
                PackageOverride::Rpm => PackageStrategy::Rpm,
                PackageOverride::Deb => PackageStrategy::Deb,
            };
        }

        match detected {
            PackageManagerKind::Rpm => PackageStrategy::Rpm,
            PackageManagerKind::Deb => PackageStrategy::Deb,
            PackageManagerKind::None => {
                warn!("No package manager detected; package checks will report unavailable");
                PackageStrategy::Null
            }
        }
    }

    /// No override exists for the service manager
    pub fn service_strategy(init_system: InitSystemKind) -> ServiceStrategy {
        match init_system {
            InitSystemKind::Systemd => ServiceStrategy::Systemd,
            InitSystemKind::TraditionalInit => ServiceStrategy::Init,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_DETECTED: [PackageManagerKind; 3] = [
        PackageManagerKind::Rpm,
        PackageManagerKind::Deb,
        PackageManagerKind::None,
    ];

    #[test]
    fn test_override_always_wins() {
        for detected in ALL_DETECTED {
            assert_eq!(
                CapabilitySelector::package_strategy(Some(PackageOverride::Rpm), detected),
                PackageStrategy::Rpm
            );
            assert_eq!(
                CapabilitySelector::package_strategy(Some(PackageOverride::Deb), detected),
                PackageStrategy::Deb
            );
        }
    }

    #[test]
    fn test_detected_without_override() {
        assert_eq!(
            CapabilitySelector::package_strategy(None, PackageManagerKind::Rpm),
            PackageStrategy::Rpm
        );
        assert_eq!(
            CapabilitySelector::package_strategy(None, PackageManagerKind::Deb),
            PackageStrategy::Deb
        );
        assert_eq!(
            CapabilitySelector::package_strategy(None, PackageManagerKind::None),
            PackageStrategy::Null
        );
    }

    #[test]
    fn test_service_strategy_is_binary() {
        let systemd = EnvironmentProfile {
            init_system: InitSystemKind::Systemd,
            package_manager: PackageManagerKind::None,
        };
        let init = EnvironmentProfile {
            init_system: InitSystemKind::TraditionalInit,
            ..systemd
        };

        assert_eq!(
            CapabilitySelector::select(None, &systemd).service,
            ServiceStrategy::Systemd
        );
        assert_eq!(
            CapabilitySelector::select(Some(PackageOverride::Deb), &init),
            Capabilities {
                package: PackageStrategy::Deb,
                service: ServiceStrategy::Init,
            }
        );
    }
}
