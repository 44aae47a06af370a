//! System Context - the per-run root object
//!
//! Built once per run: detects the environment, binds one strategy per
//! capability, opens the control channel when the systemd strategy is bound,
//! and owns the lazily scanned port table. Every resource check is handed out
//! from here and shares the same detection answers and port snapshot.

use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::detector::EnvironmentDetector;
use crate::application::port_cache::{CacheState, PortCache};
use crate::application::selector::{Capabilities, CapabilitySelector, ServiceStrategy};
use crate::config::RunConfig;
use crate::domain::{EnvironmentProfile, PortTable, ResourceKind};
use crate::error::Result;
use crate::port::{
    ChannelConnector, CommandRunner, ControlChannel, HostDatabase, HostProbe, PortScanner,
};
use crate::resource::{
    Addr, Command, Dns, File, Group, IncludeFile, Package, Port, Process, Resource, Service, User,
};

/// Everything the context needs from the host, injected by the binary
#[derive(Clone)]
pub struct HostAdapters {
    pub probe: Arc<dyn HostProbe>,
    pub connector: Arc<dyn ChannelConnector>,
    pub scanner: Arc<dyn PortScanner>,
    pub runner: Arc<dyn CommandRunner>,
    pub database: Arc<dyn HostDatabase>,
}

pub struct SystemContext {
    config: RunConfig,
    profile: EnvironmentProfile,
    capabilities: Capabilities,
    // Some iff capabilities.service == Systemd
    control_channel: Option<Arc<dyn ControlChannel>>,
    runner: Arc<dyn CommandRunner>,
    database: Arc<dyn HostDatabase>,
    ports: PortCache,
}

impl fmt::Debug for SystemContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemContext")
            .field("profile", &self.profile)
            .field("capabilities", &self.capabilities)
            .field(
                "control_channel",
                &self.control_channel.as_ref().map(|c| c.endpoint().to_string()),
            )
            .field("ports", &self.ports.state())
            .finish()
    }
}

impl SystemContext {
    /// Detect, select and connect. A control channel that cannot be opened
    /// fails the whole build.
    #[instrument(skip_all, fields(package_override = ?config.package))]
    pub fn build(config: RunConfig, adapters: HostAdapters) -> Result<Arc<Self>> {
        let profile = EnvironmentDetector::new(adapters.probe.clone()).profile();
        let capabilities = CapabilitySelector::select(config.package, &profile);

        let control_channel = match capabilities.service {
            ServiceStrategy::Systemd => Some(adapters.connector.connect()?),
            ServiceStrategy::Init => None,
        };

        info!(
            init_system = %profile.init_system,
            package_manager = %profile.package_manager,
            package_strategy = %capabilities.package,
            service_strategy = %capabilities.service,
            control_channel = control_channel.as_ref().map(|c| c.endpoint()),
            "System context ready"
        );

        Ok(Arc::new(Self {
            config,
            profile,
            capabilities,
            control_channel,
            runner: adapters.runner,
            database: adapters.database,
            ports: PortCache::new(adapters.scanner),
        }))
    }

    pub fn profile(&self) -> EnvironmentProfile {
        self.profile
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn control_channel(&self) -> Option<&Arc<dyn ControlChannel>> {
        self.control_channel.as_ref()
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    pub fn database(&self) -> &Arc<dyn HostDatabase> {
        &self.database
    }

    /// Shared port table; the first call scans, later calls reuse it
    pub async fn ports(&self) -> Arc<PortTable> {
        self.ports.get().await
    }

    pub fn port_cache_state(&self) -> CacheState {
        self.ports.state()
    }

    pub fn new_package(self: &Arc<Self>, name: &str) -> Package {
        Package::new(name, self)
    }

    pub fn new_file(self: &Arc<Self>, path: &str) -> File {
        File::new(path, self)
    }

    pub fn new_addr(self: &Arc<Self>, id: &str) -> Addr {
        Addr::new(id, self)
    }

    pub fn new_port(self: &Arc<Self>, id: &str) -> Port {
        Port::new(id, self)
    }

    pub fn new_service(self: &Arc<Self>, name: &str) -> Service {
        Service::new(name, self)
    }

    pub fn new_user(self: &Arc<Self>, name: &str) -> User {
        User::new(name, self)
    }

    pub fn new_group(self: &Arc<Self>, name: &str) -> Group {
        Group::new(name, self)
    }

    pub fn new_command(self: &Arc<Self>, command_line: &str) -> Command {
        Command::new(command_line, self)
    }

    pub fn new_dns(self: &Arc<Self>, host: &str) -> Dns {
        Dns::new(host, self)
    }

    pub fn new_process(self: &Arc<Self>, name: &str) -> Process {
        Process::new(name, self)
    }

    pub fn new_include_file(self: &Arc<Self>, path: &str) -> IncludeFile {
        IncludeFile::new(path, self)
    }

    /// Kind-dispatched constructor for callers that hold a `ResourceKind`
    pub fn new_resource(self: &Arc<Self>, kind: ResourceKind, id: &str) -> Box<dyn Resource> {
        match kind {
            ResourceKind::Addr => Box::new(self.new_addr(id)),
            ResourceKind::Command => Box::new(self.new_command(id)),
            ResourceKind::Dns => Box::new(self.new_dns(id)),
            ResourceKind::File => Box::new(self.new_file(id)),
            ResourceKind::Group => Box::new(self.new_group(id)),
            ResourceKind::IncludeFile => Box::new(self.new_include_file(id)),
            ResourceKind::Package => Box::new(self.new_package(id)),
            ResourceKind::Port => Box::new(self.new_port(id)),
            ResourceKind::Process => Box::new(self.new_process(id)),
            ResourceKind::Service => Box::new(self.new_service(id)),
            ResourceKind::User => Box::new(self.new_user(id)),
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::command_runner::mocks::ScriptedCommandRunner;
    use crate::port::control_channel::mocks::{MockConnector, MockControlChannel};
    use crate::port::host_database::mocks::StaticHostDatabase;
    use crate::port::host_probe::mocks::MockHostProbe;
    use crate::port::port_scanner::mocks::CountingPortScanner;

    /// Inert adapters around the given probe; override fields with struct update syntax
    pub fn mock_adapters(probe: MockHostProbe) -> HostAdapters {
        HostAdapters {
            probe: Arc::new(probe),
            connector: Arc::new(MockConnector::succeeding(MockControlChannel::new())),
            scanner: Arc::new(CountingPortScanner::new(Vec::new())),
            runner: Arc::new(ScriptedCommandRunner::new()),
            database: Arc::new(StaticHostDatabase::new()),
        }
    }
}
