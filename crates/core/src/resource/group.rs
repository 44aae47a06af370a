// Group check - account database lookup
use async_trait::async_trait;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

pub struct Group {
    name: String,
    ctx: Arc<SystemContext>,
}

impl Group {
    pub fn new(name: &str, ctx: &Arc<SystemContext>) -> Self {
        Self {
            name: name.to_string(),
            ctx: ctx.clone(),
        }
    }
}

#[async_trait]
impl Resource for Group {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Group
    }

    fn id(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let observation = match self.ctx.database().group(&self.name).await? {
            Some(entry) => {
                Observation::new(ResourceKind::Group, &self.name, true).with("gid", entry.gid)
            }
            None => Observation::new(ResourceKind::Group, &self.name, false),
        };
        Ok(observation)
    }
}
