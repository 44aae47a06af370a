// Live host probe
// reason: `which` resolves commands the way a shell does (regular file, execute bit)
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::trace;

use hostspec_core::port::HostProbe;

/// Directory that exists only while systemd is PID 1 (sd_booted(3))
pub const SYSTEMD_RUNTIME_DIR: &str = "/run/systemd/system";

/// Host probe backed by the real filesystem and `$PATH`
pub struct LiveHostProbe {
    // None reads $PATH on every lookup
    search_path: Option<OsString>,
    systemd_dir: PathBuf,
}

impl LiveHostProbe {
    pub fn new() -> Self {
        Self {
            search_path: None,
            systemd_dir: PathBuf::from(SYSTEMD_RUNTIME_DIR),
        }
    }

    /// Resolve commands against `search_path` instead of `$PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn with_systemd_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.systemd_dir = dir.into();
        self
    }
}

impl Default for LiveHostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe for LiveHostProbe {
    fn path_exists(&self, path: &Path) -> bool {
        // Dangling symlinks count as present
        path.symlink_metadata().is_ok()
    }

    fn has_command(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }

        let found = match &self.search_path {
            Some(search_path) => std::env::current_dir()
                .map(|cwd| which::which_in(name, Some(search_path), cwd).is_ok())
                .unwrap_or(false),
            None => which::which(name).is_ok(),
        };

        trace!(command = %name, found = found, "Search path lookup");
        found
    }

    fn is_running_systemd(&self) -> bool {
        // A symlink in its place does not count
        self.systemd_dir
            .symlink_metadata()
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
