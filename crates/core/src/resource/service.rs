// Service check - systemd control channel or init scripts, per the bound strategy
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::constants::{INIT_SCRIPT_DIR, RUNLEVEL_DIRS, SERVICE_UNIT_SUFFIX};
use crate::application::selector::ServiceStrategy;
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};
use crate::port::{ChannelError, UnitState};

const UNIT_SUFFIXES: &[&str] = &[".service", ".socket", ".timer", ".target", ".mount", ".path"];

pub struct Service {
    name: String,
    strategy: ServiceStrategy,
    ctx: Arc<SystemContext>,
}

/// Point-in-time answers for one service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub exists: bool,
    pub enabled: bool,
    pub running: bool,
}

impl Service {
    pub fn new(name: &str, ctx: &Arc<SystemContext>) -> Self {
        Self {
            name: name.to_string(),
            strategy: ctx.capabilities().service,
            ctx: ctx.clone(),
        }
    }

    pub fn strategy(&self) -> ServiceStrategy {
        self.strategy
    }

    /// Full unit name as the service manager knows it
    pub fn unit_name(&self) -> String {
        if UNIT_SUFFIXES.iter().any(|s| self.name.ends_with(s)) {
            self.name.clone()
        } else {
            format!("{}{}", self.name, SERVICE_UNIT_SUFFIX)
        }
    }

    pub async fn status(&self) -> Result<ServiceStatus, ResourceError> {
        match self.strategy {
            ServiceStrategy::Systemd => {
                let state = self.unit_state().await?;
                Ok(ServiceStatus {
                    exists: state.is_loaded(),
                    enabled: state.is_enabled(),
                    running: state.is_active(),
                })
            }
            ServiceStrategy::Init => {
                let script = Path::new(INIT_SCRIPT_DIR).join(&self.name);
                let exists = tokio::fs::try_exists(&script).await.unwrap_or(false);
                let dirs: Vec<PathBuf> = RUNLEVEL_DIRS.iter().map(PathBuf::from).collect();
                let enabled = has_start_link(&dirs, &self.name).await;
                let running = self.init_script_running().await?;
                Ok(ServiceStatus {
                    exists,
                    enabled,
                    running,
                })
            }
        }
    }

    pub async fn enabled(&self) -> Result<bool, ResourceError> {
        Ok(self.status().await?.enabled)
    }

    pub async fn running(&self) -> Result<bool, ResourceError> {
        Ok(self.status().await?.running)
    }

    async fn unit_state(&self) -> Result<UnitState, ResourceError> {
        let unit = self.unit_name();
        // Present whenever the systemd strategy was bound
        let channel = self
            .ctx
            .control_channel()
            .ok_or_else(|| ChannelError::Query {
                unit: unit.clone(),
                reason: "no control channel bound".to_string(),
            })?;
        Ok(channel.unit_state(&unit).await?)
    }

    async fn init_script_running(&self) -> Result<bool, ResourceError> {
        let output = self
            .ctx
            .runner()
            .run("service", &[self.name.as_str(), "status"])
            .await?;
        Ok(output.success())
    }
}

/// Any `S<NN><name>` entry in the runlevel directories. Missing directories are skipped.
async fn has_start_link(dirs: &[PathBuf], name: &str) -> bool {
    for dir in dirs {
        let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let file_name = entry.file_name();
            if is_start_link(&file_name.to_string_lossy(), name) {
                return true;
            }
        }
    }
    false
}

fn is_start_link(file_name: &str, name: &str) -> bool {
    let Some(rest) = file_name.strip_prefix('S') else {
        return false;
    };
    match (rest.get(..2), rest.get(2..)) {
        (Some(order), Some(tail)) => order.chars().all(|c| c.is_ascii_digit()) && tail == name,
        _ => false,
    }
}

#[async_trait]
impl Resource for Service {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Service
    }

    fn id(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let status = self.status().await?;
        Ok(Observation::new(ResourceKind::Service, &self.name, status.exists)
            .with("enabled", status.enabled)
            .with("running", status.running)
            .with("strategy", self.strategy.to_string()))
    }
}
