// Resource Observation Domain Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use super::error::DomainError;

/// Kinds of host resource a check can be constructed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Package,
    File,
    Addr,
    Port,
    Service,
    User,
    Group,
    Command,
    Dns,
    Process,
    IncludeFile,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Package,
        ResourceKind::File,
        ResourceKind::Addr,
        ResourceKind::Port,
        ResourceKind::Service,
        ResourceKind::User,
        ResourceKind::Group,
        ResourceKind::Command,
        ResourceKind::Dns,
        ResourceKind::Process,
        ResourceKind::IncludeFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Package => "package",
            ResourceKind::File => "file",
            ResourceKind::Addr => "addr",
            ResourceKind::Port => "port",
            ResourceKind::Service => "service",
            ResourceKind::User => "user",
            ResourceKind::Group => "group",
            ResourceKind::Command => "command",
            ResourceKind::Dns => "dns",
            ResourceKind::Process => "process",
            ResourceKind::IncludeFile => "include-file",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::UnknownResourceKind(s.to_string()))
    }
}

/// What a resource check saw on the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub kind: ResourceKind,
    pub id: String,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl Observation {
    pub fn new(kind: ResourceKind, id: impl Into<String>, exists: bool) -> Self {
        Self {
            kind,
            id: id.into(),
            exists,
            properties: Map::new(),
        }
    }

    /// Attach a property (builder style)
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_covers_all() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        assert!("mount".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_observation_json_shape() {
        let obs = Observation::new(ResourceKind::IncludeFile, "/etc/goss.d/web.yaml", true)
            .with("size", 12);
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["kind"], "include-file");
        assert_eq!(json["exists"], true);
        assert_eq!(json["properties"]["size"], 12);

        let bare = serde_json::to_value(Observation::new(ResourceKind::Dns, "x", false)).unwrap();
        assert!(bare.get("properties").is_none());
    }
}
