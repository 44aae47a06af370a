// Application Layer - Detection, strategy binding and the per-run context

pub mod constants;
pub mod detector;
pub mod port_cache;
pub mod selector;
pub mod system_context;

// Re-exports
pub use detector::EnvironmentDetector;
pub use port_cache::{CacheState, PortCache};
pub use selector::{Capabilities, CapabilitySelector, PackageStrategy, ServiceStrategy};
pub use system_context::{HostAdapters, SystemContext};
