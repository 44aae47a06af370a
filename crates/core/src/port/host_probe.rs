// Host Probe Port
// Read-only host facts consumed by the environment detector
use std::path::Path;

/// Host probe port for environment detection
///
/// Implementations must be side-effect free apart from filesystem stat
/// calls and search-path lookups.
pub trait HostProbe: Send + Sync {
    /// Does a file (of any type) exist at `path`?
    fn path_exists(&self, path: &Path) -> bool;

    /// Is `name` resolvable to an executable on the search path?
    ///
    /// Never runs the program.
    fn has_command(&self, name: &str) -> bool;

    /// Is the live init process the systemd variant?
    fn is_running_systemd(&self) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    /// In-memory host description
    #[derive(Debug, Clone, Default)]
    pub struct MockHostProbe {
        files: HashSet<PathBuf>,
        commands: HashSet<String>,
        systemd: bool,
    }

    impl MockHostProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
            self.files.insert(path.into());
            self
        }

        pub fn with_command(mut self, name: impl Into<String>) -> Self {
            self.commands.insert(name.into());
            self
        }

        pub fn with_systemd(mut self, systemd: bool) -> Self {
            self.systemd = systemd;
            self
        }
    }

    impl HostProbe for MockHostProbe {
        fn path_exists(&self, path: &Path) -> bool {
            self.files.contains(path)
        }

        fn has_command(&self, name: &str) -> bool {
            self.commands.contains(name)
        }

        fn is_running_systemd(&self) -> bool {
            self.systemd
        }
    }
}
