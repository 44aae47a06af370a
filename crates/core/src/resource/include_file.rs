// Include file - a nested check file referenced from the top-level one
use async_trait::async_trait;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

pub struct IncludeFile {
    path: String,
}

impl IncludeFile {
    pub fn new(path: &str, _ctx: &Arc<SystemContext>) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl Resource for IncludeFile {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IncludeFile
    }

    fn id(&self) -> &str {
        &self.path
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let readable = tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        Ok(Observation::new(ResourceKind::IncludeFile, &self.path, readable))
    }
}
