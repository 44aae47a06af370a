// Live account database and process table
// reason: nix wraps getpwnam_r/getgrnam_r; sysinfo walks the process table
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use sysinfo::System;
use tracing::debug;

use hostspec_core::port::{GroupEntry, HostDatabase, LookupError, ProcessEntry, UserEntry};

pub struct LiveHostDatabase {
    system: Arc<Mutex<System>>,
}

impl LiveHostDatabase {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for LiveHostDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_error(name: &str, reason: impl ToString) -> LookupError {
    LookupError {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// The kernel name is cut to 15 bytes, so long names only match through the executable
fn matches_name(name: &str, exe: Option<&Path>, wanted: &str) -> bool {
    name == wanted || exe.and_then(Path::file_name).is_some_and(|f| f == wanted)
}

#[async_trait]
impl HostDatabase for LiveHostDatabase {
    async fn user(&self, name: &str) -> Result<Option<UserEntry>, LookupError> {
        let owned = name.to_string();
        let found = tokio::task::spawn_blocking(move || nix::unistd::User::from_name(&owned))
            .await
            .map_err(|e| lookup_error(name, e))?
            .map_err(|e| lookup_error(name, e))?;

        Ok(found.map(|user| UserEntry {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir.to_string_lossy().into_owned(),
            shell: user.shell.to_string_lossy().into_owned(),
        }))
    }

    async fn group(&self, name: &str) -> Result<Option<GroupEntry>, LookupError> {
        let owned = name.to_string();
        let found = tokio::task::spawn_blocking(move || nix::unistd::Group::from_name(&owned))
            .await
            .map_err(|e| lookup_error(name, e))?
            .map_err(|e| lookup_error(name, e))?;

        Ok(found.map(|group| GroupEntry {
            name: group.name,
            gid: group.gid.as_raw(),
        }))
    }

    async fn processes_named(&self, name: &str) -> Vec<ProcessEntry> {
        let system = self.system.clone();
        let owned = name.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let mut sys = match system.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            sys.refresh_processes();
            sys.processes()
                .values()
                .filter(|p| matches_name(p.name(), p.exe(), &owned))
                .map(|p| ProcessEntry {
                    pid: p.pid().as_u32(),
                    name: p.name().to_string(),
                })
                .collect::<Vec<_>>()
        })
        .await;

        match result {
            Ok(found) => {
                debug!(process = %name, matches = found.len(), "Process table searched");
                found
            }
            Err(e) => {
                debug!(process = %name, error = %e, "Process table search failed");
                Vec::new()
            }
        }
    }
}
