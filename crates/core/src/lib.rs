// Hostspec Core - Environment detection, capability binding, resource checks
// NO infrastructure dependencies: host access goes through the port traits

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
pub mod resource;

pub use application::{HostAdapters, SystemContext};
pub use config::RunConfig;
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
