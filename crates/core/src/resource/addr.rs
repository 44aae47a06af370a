// Addr check - TCP reachability within the configured dial timeout
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

pub struct Addr {
    id: String,
    dial_timeout: Duration,
}

impl Addr {
    pub fn new(id: &str, ctx: &Arc<SystemContext>) -> Self {
        Self {
            id: id.to_string(),
            dial_timeout: ctx.config().dial_timeout(),
        }
    }

    /// `host:port` with an optional `tcp://` scheme
    fn target(&self) -> Result<&str, ResourceError> {
        let target = match self.id.split_once("://") {
            None => self.id.as_str(),
            Some(("tcp", rest)) => rest,
            Some((scheme, _)) => {
                return Err(ResourceError::InvalidId {
                    kind: ResourceKind::Addr,
                    id: self.id.clone(),
                    reason: format!("unsupported scheme {}", scheme),
                })
            }
        };

        if target.rsplit_once(':').is_none() {
            return Err(ResourceError::InvalidId {
                kind: ResourceKind::Addr,
                id: self.id.clone(),
                reason: "expected host:port".to_string(),
            });
        }
        Ok(target)
    }
}

#[async_trait]
impl Resource for Addr {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Addr
    }

    fn id(&self) -> &str {
        &self.id
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let target = self.target()?;
        let reachable = matches!(
            tokio::time::timeout(self.dial_timeout, TcpStream::connect(target)).await,
            Ok(Ok(_))
        );

        Ok(Observation::new(ResourceKind::Addr, &self.id, reachable)
            .with("reachable", reachable)
            .with("timeout_ms", self.dial_timeout.as_millis() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::system_context::mocks::mock_adapters;
    use crate::config::RunConfig;
    use crate::port::host_probe::mocks::MockHostProbe;
    use tokio::net::TcpListener;

    fn ctx() -> Arc<SystemContext> {
        SystemContext::build(RunConfig::default(), mock_adapters(MockHostProbe::new())).unwrap()
    }

    #[tokio::test]
    async fn test_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let ctx = ctx();
        let obs = ctx
            .new_addr(&format!("tcp://127.0.0.1:{}", port))
            .exists()
            .await
            .unwrap();
        assert!(obs.exists);

        drop(listener);
        let obs = ctx.new_addr(&format!("127.0.0.1:{}", port)).exists().await.unwrap();
        assert!(!obs.exists);
    }

    #[tokio::test]
    async fn test_invalid_ids() {
        let ctx = ctx();
        assert!(matches!(
            ctx.new_addr("udp://127.0.0.1:53").exists().await,
            Err(ResourceError::InvalidId { .. })
        ));
        assert!(matches!(
            ctx.new_addr("localhost").exists().await,
            Err(ResourceError::InvalidId { .. })
        ));
    }
}
