// Command check - runs a shell command line and reports how it ended
use async_trait::async_trait;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

pub struct Command {
    command_line: String,
    ctx: Arc<SystemContext>,
}

impl Command {
    pub fn new(command_line: &str, ctx: &Arc<SystemContext>) -> Self {
        Self {
            command_line: command_line.to_string(),
            ctx: ctx.clone(),
        }
    }
}

#[async_trait]
impl Resource for Command {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Command
    }

    fn id(&self) -> &str {
        &self.command_line
    }

    /// The command "exists" once it ran to completion, whatever its exit status
    async fn exists(&self) -> Result<Observation, ResourceError> {
        let output = self
            .ctx
            .runner()
            .run("sh", &["-c", self.command_line.as_str()])
            .await?;

        Ok(Observation::new(ResourceKind::Command, &self.command_line, true)
            .with("exit_status", output.exit_code)
            .with("stdout", output.stdout)
            .with("stderr", output.stderr))
    }
}
