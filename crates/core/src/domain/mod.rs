// Domain Layer - Host classification and shared facts

pub mod environment;
pub mod error;
pub mod network;
pub mod resource;

// Re-exports
pub use environment::{EnvironmentProfile, InitSystemKind, PackageManagerKind, PackageOverride};
pub use error::DomainError;
pub use network::{PortKey, PortTable, ProcessDescriptor, Protocol};
pub use resource::{Observation, ResourceKind};
