// Process check - process table lookup by executable name
use async_trait::async_trait;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

pub struct Process {
    name: String,
    ctx: Arc<SystemContext>,
}

impl Process {
    pub fn new(name: &str, ctx: &Arc<SystemContext>) -> Self {
        Self {
            name: name.to_string(),
            ctx: ctx.clone(),
        }
    }
}

#[async_trait]
impl Resource for Process {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Process
    }

    fn id(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let mut pids: Vec<u32> = self
            .ctx
            .database()
            .processes_named(&self.name)
            .await
            .into_iter()
            .map(|p| p.pid)
            .collect();
        pids.sort_unstable();

        let running = !pids.is_empty();
        Ok(Observation::new(ResourceKind::Process, &self.name, running)
            .with("running", running)
            .with("pids", pids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::system_context::mocks::mock_adapters;
    use crate::application::HostAdapters;
    use crate::config::RunConfig;
    use crate::port::host_database::mocks::StaticHostDatabase;
    use crate::port::host_probe::mocks::MockHostProbe;

    #[tokio::test]
    async fn test_process_pids_sorted() {
        let adapters = HostAdapters {
            database: Arc::new(
                StaticHostDatabase::new()
                    .with_process(900, "nginx")
                    .with_process(12, "nginx")
                    .with_process(1, "init"),
            ),
            ..mock_adapters(MockHostProbe::new())
        };
        let ctx = SystemContext::build(RunConfig::default(), adapters).unwrap();

        let nginx = ctx.new_process("nginx").exists().await.unwrap();
        assert!(nginx.exists);
        assert_eq!(nginx.property("pids"), Some(&serde_json::json!([12, 900])));

        let redis = ctx.new_process("redis-server").exists().await.unwrap();
        assert!(!redis.exists);
        assert_eq!(redis.property("running"), Some(&serde_json::json!(false)));
    }
}
