// User check - account database lookup
use async_trait::async_trait;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

pub struct User {
    name: String,
    ctx: Arc<SystemContext>,
}

impl User {
    pub fn new(name: &str, ctx: &Arc<SystemContext>) -> Self {
        Self {
            name: name.to_string(),
            ctx: ctx.clone(),
        }
    }
}

#[async_trait]
impl Resource for User {
    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    fn id(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let observation = match self.ctx.database().user(&self.name).await? {
            Some(entry) => Observation::new(ResourceKind::User, &self.name, true)
                .with("uid", entry.uid)
                .with("gid", entry.gid)
                .with("home", entry.home)
                .with("shell", entry.shell),
            None => Observation::new(ResourceKind::User, &self.name, false),
        };
        Ok(observation)
    }
}
