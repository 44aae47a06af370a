// Control Channel Port
// Handle to the init system's service manager (systemd only)
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Unit properties reported by the service manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitState {
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
    pub unit_file_state: String,
}

impl UnitState {
    /// The manager knows about the unit (it has a unit file)
    pub fn is_loaded(&self) -> bool {
        self.load_state == "loaded"
    }

    pub fn is_active(&self) -> bool {
        self.active_state == "active"
    }

    pub fn is_enabled(&self) -> bool {
        self.unit_file_state == "enabled"
    }

    /// What systemd reports for a unit it has never heard of
    pub fn not_found() -> Self {
        Self {
            load_state: "not-found".to_string(),
            active_state: "inactive".to_string(),
            sub_state: "dead".to_string(),
            unit_file_state: String::new(),
        }
    }
}

/// Connection to the control channel could not be established
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("init system control channel unreachable at {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("init system control channel refused connection: {0}")]
    Refused(String),
}

/// A query over an established channel failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("query for unit {unit} failed: {reason}")]
    Query { unit: String, reason: String },

    #[error("unexpected reply for unit {unit}: {reply}")]
    MalformedReply { unit: String, reply: String },
}

/// Control channel to the init system
///
/// Shared read-only by every service check for the life of the run.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// What the channel talks to (manager client path or similar)
    fn endpoint(&self) -> &str;

    /// Load/active/enablement state of a unit
    ///
    /// `unit` is a full unit name such as `sshd.service`.
    async fn unit_state(&self, unit: &str) -> Result<UnitState, ChannelError>;
}

/// Opens the control channel
///
/// Called at most once per system context, and only when the systemd
/// service strategy was selected.
pub trait ChannelConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn ControlChannel>, ConnectError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub const MOCK_ENDPOINT: &str = "mock://systemd";

    /// Channel answering from a fixed unit table
    #[derive(Default)]
    pub struct MockControlChannel {
        units: HashMap<String, UnitState>,
        queries: AtomicUsize,
    }

    impl MockControlChannel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_unit(mut self, unit: &str, active: bool, enabled: bool) -> Self {
            self.units.insert(
                unit.to_string(),
                UnitState {
                    load_state: "loaded".to_string(),
                    active_state: if active { "active" } else { "inactive" }.to_string(),
                    sub_state: if active { "running" } else { "dead" }.to_string(),
                    unit_file_state: if enabled { "enabled" } else { "disabled" }.to_string(),
                },
            );
            self
        }

        pub fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ControlChannel for MockControlChannel {
        fn endpoint(&self) -> &str {
            MOCK_ENDPOINT
        }

        async fn unit_state(&self, unit: &str) -> Result<UnitState, ChannelError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .units
                .get(unit)
                .cloned()
                .unwrap_or_else(UnitState::not_found))
        }
    }

    /// Connector that either hands out a mock channel or fails
    pub struct MockConnector {
        channel: Option<Arc<MockControlChannel>>,
        attempts: AtomicUsize,
    }

    impl MockConnector {
        pub fn succeeding(channel: MockControlChannel) -> Self {
            Self {
                channel: Some(Arc::new(channel)),
                attempts: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                channel: None,
                attempts: AtomicUsize::new(0),
            }
        }

        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl ChannelConnector for MockConnector {
        fn connect(&self) -> Result<Arc<dyn ControlChannel>, ConnectError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match &self.channel {
                Some(channel) => Ok(channel.clone()),
                None => Err(ConnectError::Unreachable {
                    endpoint: MOCK_ENDPOINT.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "mock connector configured to fail",
                    ),
                }),
            }
        }
    }
}
