// Port Table Domain Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::net::IpAddr;
use std::str::FromStr;

use super::error::DomainError;

/// Socket protocol family, as listed under /proc/net
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Tcp6,
    Udp,
    Udp6,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Tcp6 => "tcp6",
            Protocol::Udp => "udp",
            Protocol::Udp6 => "udp6",
        }
    }

    pub fn is_udp(&self) -> bool {
        matches!(self, Protocol::Udp | Protocol::Udp6)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Protocol::Tcp),
            "tcp6" => Ok(Protocol::Tcp6),
            "udp" => Ok(Protocol::Udp),
            "udp6" => Ok(Protocol::Udp6),
            other => Err(DomainError::InvalidPortKey(other.to_string())),
        }
    }
}

/// Port identity: protocol plus local port number.
///
/// Rendered as `tcp:22`. A bare number parses as TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortKey {
    pub protocol: Protocol,
    pub port: u16,
}

impl PortKey {
    pub fn new(protocol: Protocol, port: u16) -> Self {
        Self { protocol, port }
    }
}

impl std::fmt::Display for PortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.protocol, self.port)
    }
}

impl FromStr for PortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (protocol, port) = match s.split_once(':') {
            Some((proto, port)) => (proto.parse::<Protocol>()?, port),
            None => (Protocol::Tcp, s),
        };
        let port = port
            .parse::<u16>()
            .map_err(|_| DomainError::InvalidPortKey(s.to_string()))?;
        Ok(Self { protocol, port })
    }
}

// Serialized as its string form so it can key JSON maps
impl Serialize for PortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Owner of a listening socket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub pid: Option<u32>,
    pub name: Option<String>,
    pub local_addr: IpAddr,
    pub local_port: u16,
    pub protocol: Protocol,
}

/// One full-host snapshot of listening sockets and their owners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortTable {
    pub scanned_at: DateTime<Utc>,
    entries: HashMap<PortKey, ProcessDescriptor>,
}

impl PortTable {
    /// Build a table from scan output. The first descriptor seen for a key wins.
    pub fn from_descriptors(
        scanned_at: DateTime<Utc>,
        descriptors: impl IntoIterator<Item = ProcessDescriptor>,
    ) -> Self {
        let mut entries = HashMap::new();
        for desc in descriptors {
            entries
                .entry(PortKey::new(desc.protocol, desc.local_port))
                .or_insert(desc);
        }
        Self {
            scanned_at,
            entries,
        }
    }

    pub fn get(&self, key: &PortKey) -> Option<&ProcessDescriptor> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by protocol then port
    pub fn sorted(&self) -> Vec<(&PortKey, &ProcessDescriptor)> {
        let mut all: Vec<_> = self.entries.iter().collect();
        all.sort_by_key(|(k, _)| **k);
        all
    }
}
