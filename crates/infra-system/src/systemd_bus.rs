// systemd control channel
// reason: systemctl talks to the manager over the bus for us; connecting asks
// the manager for its state so an unreachable manager fails context construction
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info};

use hostspec_core::port::{
    ChannelConnector, ChannelError, CommandRunner, ConnectError, ControlChannel, UnitState,
};

/// Manager client used for every query
pub const SYSTEMCTL: &str = "systemctl";

const SHOW_PROPERTIES: &str = "--property=LoadState,ActiveState,SubState,UnitFileState";

/// `is-system-running` states in which the manager answers unit queries.
/// `degraded` exits non-zero but the manager is up.
const REACHABLE_STATES: &[&str] = &[
    "initializing",
    "starting",
    "running",
    "degraded",
    "maintenance",
    "stopping",
];

/// Opens the control channel to the running systemd instance
pub struct SystemdBusConnector {
    runner: Arc<dyn CommandRunner>,
    systemctl: PathBuf,
}

impl SystemdBusConnector {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            systemctl: PathBuf::from(SYSTEMCTL),
        }
    }

    /// Use another `systemctl` binary
    pub fn with_systemctl(mut self, systemctl: impl Into<PathBuf>) -> Self {
        self.systemctl = systemctl.into();
        self
    }

    /// The manager's answer to `is-system-running`
    fn manager_state(&self) -> Result<String, ConnectError> {
        let endpoint = self.systemctl.display().to_string();
        let output = Command::new(&self.systemctl)
            .arg("is-system-running")
            .env("LC_ALL", "C")
            .output()
            .map_err(|source| ConnectError::Unreachable {
                endpoint: endpoint.clone(),
                source,
            })?;

        let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if REACHABLE_STATES.contains(&state.as_str()) {
            return Ok(state);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(ConnectError::Refused(match (state.is_empty(), stderr.is_empty()) {
            (false, _) => format!("manager state is {}", state),
            (true, false) => stderr,
            (true, true) => format!("{} is-system-running exited with {}", endpoint, output.status),
        }))
    }
}

impl ChannelConnector for SystemdBusConnector {
    fn connect(&self) -> Result<Arc<dyn ControlChannel>, ConnectError> {
        let state = self.manager_state()?;

        info!(manager_state = %state, "Connected to systemd");
        Ok(Arc::new(SystemdBus {
            endpoint: self.systemctl.display().to_string(),
            runner: self.runner.clone(),
        }))
    }
}

/// Open control channel; unit queries go through `systemctl show`
pub struct SystemdBus {
    endpoint: String,
    runner: Arc<dyn CommandRunner>,
}

#[async_trait]
impl ControlChannel for SystemdBus {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn unit_state(&self, unit: &str) -> Result<UnitState, ChannelError> {
        let output = self
            .runner
            .run(&self.endpoint, &["show", unit, SHOW_PROPERTIES])
            .await
            .map_err(|e| ChannelError::Query {
                unit: unit.to_string(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            return Err(ChannelError::Query {
                unit: unit.to_string(),
                reason: output.stderr.trim().to_string(),
            });
        }

        let state = parse_show_output(&output.stdout).ok_or_else(|| ChannelError::MalformedReply {
            unit: unit.to_string(),
            reply: output.stdout.clone(),
        })?;

        debug!(
            unit = %unit,
            load_state = %state.load_state,
            active_state = %state.active_state,
            "Unit state read"
        );
        Ok(state)
    }
}

/// `Key=Value` lines from `systemctl show`. LoadState and ActiveState are required.
fn parse_show_output(stdout: &str) -> Option<UnitState> {
    let props: HashMap<&str, &str> = stdout
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let get = |key: &str| props.get(key).map(|v| v.to_string());

    Some(UnitState {
        load_state: get("LoadState")?,
        active_state: get("ActiveState")?,
        sub_state: get("SubState").unwrap_or_default(),
        unit_file_state: get("UnitFileState").unwrap_or_default(),
    })
}
