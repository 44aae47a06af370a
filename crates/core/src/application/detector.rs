//! Environment Detector - classifies the host before any check runs
//!
//! Package-manager detection is a deterministic cascade:
//! 1. A distribution marker file is authoritative for its family
//! 2. Otherwise exactly one of `dpkg`/`rpm` on the search path picks the family
//! 3. Otherwise (both or neither) no family is detected
//!
//! Ambiguity never raises an error; it resolves to "no package manager".

use crate::application::constants::{DEBIAN_MARKERS, DPKG_COMMAND, RPM_COMMAND, RPM_MARKERS};
use crate::domain::{EnvironmentProfile, InitSystemKind, PackageManagerKind};
use crate::port::HostProbe;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct EnvironmentDetector {
    probe: Arc<dyn HostProbe>,
}

impl EnvironmentDetector {
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        Self { probe }
    }

    /// True when the live init process is systemd; false means traditional init
    pub fn is_running_systemd(&self) -> bool {
        self.probe.is_running_systemd()
    }

    pub fn is_deb(&self) -> bool {
        if self.any_marker(DEBIAN_MARKERS) {
            return true;
        }
        self.has_command(DPKG_COMMAND) && !self.has_command(RPM_COMMAND)
    }

    pub fn is_rpm(&self) -> bool {
        if self.any_marker(RPM_MARKERS) {
            return true;
        }
        self.has_command(RPM_COMMAND) && !self.has_command(DPKG_COMMAND)
    }

    /// Search-path lookup only; the program is never executed
    pub fn has_command(&self, name: &str) -> bool {
        self.probe.has_command(name)
    }

    /// RPM is checked before Debian, so a host carrying both markers is RPM
    pub fn package_manager(&self) -> PackageManagerKind {
        if self.is_rpm() {
            PackageManagerKind::Rpm
        } else if self.is_deb() {
            PackageManagerKind::Deb
        } else {
            PackageManagerKind::None
        }
    }

    pub fn init_system(&self) -> InitSystemKind {
        if self.is_running_systemd() {
            InitSystemKind::Systemd
        } else {
            InitSystemKind::TraditionalInit
        }
    }

    pub fn profile(&self) -> EnvironmentProfile {
        let profile = EnvironmentProfile {
            init_system: self.init_system(),
            package_manager: self.package_manager(),
        };

        debug!(
            init_system = %profile.init_system,
            package_manager = %profile.package_manager,
            "Environment detected"
        );

        profile
    }

    fn any_marker(&self, markers: &[&str]) -> bool {
        markers
            .iter()
            .any(|marker| self.probe.path_exists(Path::new(marker)))
    }
}
