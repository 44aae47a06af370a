// DNS check - resolves a host name through the system resolver
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

pub struct Dns {
    host: String,
}

impl Dns {
    pub fn new(host: &str, _ctx: &Arc<SystemContext>) -> Self {
        Self {
            host: host.to_string(),
        }
    }
}

#[async_trait]
impl Resource for Dns {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Dns
    }

    fn id(&self) -> &str {
        &self.host
    }

    /// Resolution failure is an observation (not resolvable), not an error
    async fn exists(&self) -> Result<Observation, ResourceError> {
        let addrs: BTreeSet<String> = match tokio::net::lookup_host((self.host.as_str(), 0)).await {
            Ok(found) => found.map(|sa| sa.ip().to_string()).collect(),
            Err(_) => BTreeSet::new(),
        };

        let resolvable = !addrs.is_empty();
        Ok(Observation::new(ResourceKind::Dns, &self.host, resolvable)
            .with("resolvable", resolvable)
            .with("addrs", addrs.into_iter().collect::<Vec<_>>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::system_context::mocks::mock_adapters;
    use crate::config::RunConfig;
    use crate::port::host_probe::mocks::MockHostProbe;

    #[tokio::test]
    async fn test_ip_literal_resolves_to_itself() {
        let ctx =
            SystemContext::build(RunConfig::default(), mock_adapters(MockHostProbe::new())).unwrap();
        let obs = ctx.new_dns("127.0.0.1").exists().await.unwrap();
        assert!(obs.exists);
        assert_eq!(obs.property("addrs"), Some(&serde_json::json!(["127.0.0.1"])));
    }
}
