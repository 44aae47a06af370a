// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid package manager override: {0:?} (expected \"rpm\" or \"deb\")")]
    InvalidPackageOverride(String),

    #[error("Invalid port identifier: {0}")]
    InvalidPortKey(String),

    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
