// Resource checks handed out by the system context
//
// Each check observes one piece of host state and reports what it saw.
// None of them decide pass/fail.

pub mod addr;
pub mod command;
pub mod dns;
pub mod file;
pub mod group;
pub mod include_file;
pub mod package;
pub mod port;
pub mod process;
pub mod service;
pub mod user;

pub use addr::Addr;
pub use command::Command;
pub use dns::Dns;
pub use file::File;
pub use group::Group;
pub use include_file::IncludeFile;
pub use package::Package;
pub use port::Port;
pub use process::Process;
pub use service::Service;
pub use user::User;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Observation, ResourceKind};
use crate::port::{ChannelError, ExecutionError, LookupError};

/// Why a check could not determine host state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The strategy bound for this kind cannot answer on this host
    #[error("{kind} {id}: {reason}")]
    Unavailable {
        kind: ResourceKind,
        id: String,
        reason: String,
    },

    #[error("invalid {kind} identifier {id:?}: {reason}")]
    InvalidId {
        kind: ResourceKind,
        id: String,
        reason: String,
    },

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Control channel error: {0}")]
    ControlChannel(#[from] ChannelError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("IO error on {path}: {reason}")]
    Io { path: String, reason: String },
}

/// A single existence/state query against live host state
#[async_trait]
pub trait Resource: Send + Sync {
    fn kind(&self) -> ResourceKind;

    /// Identifier the check was constructed with
    fn id(&self) -> &str;

    async fn exists(&self) -> Result<Observation, ResourceError>;
}
