// Port Layer - Interfaces for host facts and host tools

pub mod command_runner;
pub mod control_channel;
pub mod host_database;
pub mod host_probe;
pub mod port_scanner;

// Re-exports
pub use command_runner::{CommandOutput, CommandRunner, ExecutionError};
pub use control_channel::{ChannelConnector, ChannelError, ConnectError, ControlChannel, UnitState};
pub use host_database::{GroupEntry, HostDatabase, LookupError, ProcessEntry, UserEntry};
pub use host_probe::HostProbe;
pub use port_scanner::PortScanner;
