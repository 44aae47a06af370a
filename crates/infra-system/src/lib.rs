// Hostspec Infrastructure - Live Host Adapters
// Implements: HostProbe, PortScanner, CommandRunner, ChannelConnector, HostDatabase

pub mod host_database_impl;
pub mod host_probe_impl;
pub mod proc_net_scanner;
pub mod subprocess_runner;
pub mod systemd_bus;

pub use host_database_impl::LiveHostDatabase;
pub use host_probe_impl::LiveHostProbe;
pub use proc_net_scanner::ProcNetScanner;
pub use subprocess_runner::SubprocessRunner;
pub use systemd_bus::{SystemdBus, SystemdBusConnector};

use std::sync::Arc;

use hostspec_core::port::CommandRunner;
use hostspec_core::{HostAdapters, RunConfig};

/// Adapters wired to the real host
pub fn live_adapters(config: &RunConfig) -> HostAdapters {
    let runner: Arc<dyn CommandRunner> = Arc::new(SubprocessRunner::new(config.command_timeout()));
    HostAdapters {
        probe: Arc::new(LiveHostProbe::new()),
        connector: Arc::new(SystemdBusConnector::new(runner.clone())),
        scanner: Arc::new(ProcNetScanner::new()),
        runner,
        database: Arc::new(LiveHostDatabase::new()),
    }
}
