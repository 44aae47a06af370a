// File check - symlink-aware metadata of a path
use async_trait::async_trait;
use std::io::ErrorKind;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

pub struct File {
    path: String,
}

impl File {
    pub fn new(path: &str, _ctx: &Arc<SystemContext>) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

fn file_type_name(ft: &std::fs::FileType) -> &'static str {
    if ft.is_symlink() {
        "symlink"
    } else if ft.is_dir() {
        "directory"
    } else if ft.is_file() {
        "file"
    } else {
        "other"
    }
}

#[async_trait]
impl Resource for File {
    fn kind(&self) -> ResourceKind {
        ResourceKind::File
    }

    fn id(&self) -> &str {
        &self.path
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let meta = match tokio::fs::symlink_metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Observation::new(ResourceKind::File, &self.path, false));
            }
            Err(e) => {
                return Err(ResourceError::Io {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let mut obs = Observation::new(ResourceKind::File, &self.path, true)
            .with("filetype", file_type_name(&meta.file_type()))
            .with("size", meta.len());

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            obs = obs
                .with("mode", format!("{:04o}", meta.mode() & 0o7777))
                .with("uid", meta.uid())
                .with("gid", meta.gid());
        }

        if meta.file_type().is_symlink() {
            if let Ok(target) = tokio::fs::read_link(&self.path).await {
                obs = obs.with("linked_to", target.to_string_lossy().into_owned());
            }
        }

        Ok(obs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::system_context::mocks::mock_adapters;
    use crate::config::RunConfig;
    use crate::port::host_probe::mocks::MockHostProbe;

    fn ctx() -> Arc<SystemContext> {
        SystemContext::build(RunConfig::default(), mock_adapters(MockHostProbe::new())).unwrap()
    }

    #[tokio::test]
    async fn test_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motd");
        std::fs::write(&path, "hello").unwrap();

        let ctx = ctx();
        let obs = ctx.new_file(path.to_str().unwrap()).exists().await.unwrap();
        assert!(obs.exists);
        assert_eq!(obs.property("filetype"), Some(&serde_json::json!("file")));
        assert_eq!(obs.property("size"), Some(&serde_json::json!(5)));

        let obs = ctx.new_file(dir.path().to_str().unwrap()).exists().await.unwrap();
        assert_eq!(obs.property("filetype"), Some(&serde_json::json!("directory")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("/nonexistent/target", &link).unwrap();

        let obs = ctx().new_file(link.to_str().unwrap()).exists().await.unwrap();
        assert!(obs.exists);
        assert_eq!(obs.property("filetype"), Some(&serde_json::json!("symlink")));
        assert_eq!(
            obs.property("linked_to"),
            Some(&serde_json::json!("/nonexistent/target"))
        );
    }

    #[tokio::test]
    async fn test_missing_file() {
        let obs = ctx().new_file("/nonexistent/hostspec/file").exists().await.unwrap();
        assert!(!obs.exists);
        assert!(obs.properties.is_empty());
    }
}
