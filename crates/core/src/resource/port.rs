// Port check - reads the shared port table
use async_trait::async_trait;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, PortKey, ResourceKind};

pub struct Port {
    id: String,
    ctx: Arc<SystemContext>,
}

impl Port {
    pub fn new(id: &str, ctx: &Arc<SystemContext>) -> Self {
        Self {
            id: id.to_string(),
            ctx: ctx.clone(),
        }
    }

    pub fn key(&self) -> Result<PortKey, ResourceError> {
        self.id
            .parse::<PortKey>()
            .map_err(|e| ResourceError::InvalidId {
                kind: ResourceKind::Port,
                id: self.id.clone(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Resource for Port {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Port
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let key = self.key()?;
        let table = self.ctx.ports().await;

        let observation = match table.get(&key) {
            Some(owner) => {
                let mut obs = Observation::new(ResourceKind::Port, &self.id, true)
                    .with("listening", true)
                    .with("address", owner.local_addr.to_string());
                if let Some(pid) = owner.pid {
                    obs = obs.with("pid", pid);
                }
                if let Some(name) = &owner.name {
                    obs = obs.with("process", name.as_str());
                }
                obs
            }
            None => Observation::new(ResourceKind::Port, &self.id, false).with("listening", false),
        };
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::system_context::mocks::mock_adapters;
    use crate::application::HostAdapters;
    use crate::config::RunConfig;
    use crate::domain::{ProcessDescriptor, Protocol};
    use crate::port::host_probe::mocks::MockHostProbe;
    use crate::port::port_scanner::mocks::CountingPortScanner;
    use std::net::{IpAddr, Ipv6Addr};

    #[tokio::test]
    async fn test_port_lookup_shares_one_scan() {
        let scanner = Arc::new(CountingPortScanner::new(vec![ProcessDescriptor {
            pid: Some(4242),
            name: Some("nginx".to_string()),
            local_addr: IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            local_port: 443,
            protocol: Protocol::Tcp6,
        }]));
        let adapters = HostAdapters {
            scanner: scanner.clone(),
            ..mock_adapters(MockHostProbe::new())
        };
        let ctx = SystemContext::build(RunConfig::default(), adapters).unwrap();

        let https = ctx.new_port("tcp6:443").exists().await.unwrap();
        assert!(https.exists);
        assert_eq!(https.property("pid"), Some(&serde_json::json!(4242)));
        assert_eq!(https.property("process"), Some(&serde_json::json!("nginx")));
        assert_eq!(https.property("address"), Some(&serde_json::json!("::")));

        // tcp:443 is a different key from tcp6:443
        let v4 = ctx.new_port("443").exists().await.unwrap();
        assert!(!v4.exists);

        assert_eq!(scanner.scan_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_port_id() {
        let ctx = SystemContext::build(RunConfig::default(), mock_adapters(MockHostProbe::new()))
            .unwrap();
        assert!(matches!(
            ctx.new_port("tcp:http").exists().await,
            Err(ResourceError::InvalidId { .. })
        ));
    }
}
