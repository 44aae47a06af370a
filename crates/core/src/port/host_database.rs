// Host Database Port
// Account and process lookups backing the user/group/process checks
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserEntry {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: String,
    pub shell: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub name: String,
    pub gid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("lookup of {name} failed: {reason}")]
pub struct LookupError {
    pub name: String,
    pub reason: String,
}

/// Account database and process table
#[async_trait]
pub trait HostDatabase: Send + Sync {
    /// `Ok(None)` when no such user exists
    async fn user(&self, name: &str) -> Result<Option<UserEntry>, LookupError>;

    /// `Ok(None)` when no such group exists
    async fn group(&self, name: &str) -> Result<Option<GroupEntry>, LookupError>;

    /// Running processes whose executable name is exactly `name`
    ///
    /// Linux truncates the kernel process name to 15 bytes, so live
    /// implementations also compare the file name of the process executable.
    async fn processes_named(&self, name: &str) -> Vec<ProcessEntry>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Fixed account and process tables
    #[derive(Debug, Clone, Default)]
    pub struct StaticHostDatabase {
        pub users: Vec<UserEntry>,
        pub groups: Vec<GroupEntry>,
        pub processes: Vec<ProcessEntry>,
    }

    impl StaticHostDatabase {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_user(mut self, name: &str, uid: u32, gid: u32) -> Self {
            self.users.push(UserEntry {
                name: name.to_string(),
                uid,
                gid,
                home: format!("/home/{}", name),
                shell: "/bin/sh".to_string(),
            });
            self
        }

        pub fn with_group(mut self, name: &str, gid: u32) -> Self {
            self.groups.push(GroupEntry {
                name: name.to_string(),
                gid,
            });
            self
        }

        pub fn with_process(mut self, pid: u32, name: &str) -> Self {
            self.processes.push(ProcessEntry {
                pid,
                name: name.to_string(),
            });
            self
        }
    }

    #[async_trait]
    impl HostDatabase for StaticHostDatabase {
        async fn user(&self, name: &str) -> Result<Option<UserEntry>, LookupError> {
            Ok(self.users.iter().find(|u| u.name == name).cloned())
        }

        async fn group(&self, name: &str) -> Result<Option<GroupEntry>, LookupError> {
            Ok(self.groups.iter().find(|g| g.name == name).cloned())
        }

        async fn processes_named(&self, name: &str) -> Vec<ProcessEntry> {
            self.processes
                .iter()
                .filter(|p| p.name == name)
                .cloned()
                .collect()
        }
    }
}
