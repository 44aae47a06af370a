// Package check - switches on the package strategy bound at construction
use async_trait::async_trait;
use std::sync::Arc;

use super::{Resource, ResourceError};
use crate::application::selector::PackageStrategy;
use crate::application::SystemContext;
use crate::domain::{Observation, ResourceKind};

/// `rpm --qf` template: one version per installed instance
pub const RPM_QUERY_FORMAT: &str = "%{VERSION}\n";

/// `dpkg-query -f` template: status words followed by the version
pub const DEB_QUERY_FORMAT: &str = "${Status} ${Version}\n";

pub struct Package {
    name: String,
    strategy: PackageStrategy,
    ctx: Arc<SystemContext>,
}

impl Package {
    pub fn new(name: &str, ctx: &Arc<SystemContext>) -> Self {
        Self {
            name: name.to_string(),
            strategy: ctx.capabilities().package,
            ctx: ctx.clone(),
        }
    }

    pub fn strategy(&self) -> PackageStrategy {
        self.strategy
    }

    pub async fn installed(&self) -> Result<bool, ResourceError> {
        Ok(!self.versions().await?.is_empty())
    }

    /// Installed versions; empty when the package is absent
    pub async fn versions(&self) -> Result<Vec<String>, ResourceError> {
        match self.strategy {
            PackageStrategy::Rpm => self.rpm_versions().await,
            PackageStrategy::Deb => self.deb_versions().await,
            PackageStrategy::Null => Err(ResourceError::Unavailable {
                kind: ResourceKind::Package,
                id: self.name.clone(),
                reason: "no package manager available on this host".to_string(),
            }),
        }
    }

    async fn rpm_versions(&self) -> Result<Vec<String>, ResourceError> {
        let output = self
            .ctx
            .runner()
            .run(
                "rpm",
                &[
                    "-q",
                    "--nosignature",
                    "--nohdrchk",
                    "--nodigest",
                    "--qf",
                    RPM_QUERY_FORMAT,
                    self.name.as_str(),
                ],
            )
            .await?;

        // rpm exits non-zero for "package X is not installed"
        if !output.success() {
            return Ok(Vec::new());
        }

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn deb_versions(&self) -> Result<Vec<String>, ResourceError> {
        let output = self
            .ctx
            .runner()
            .run("dpkg-query", &["-f", DEB_QUERY_FORMAT, "-W", self.name.as_str()])
            .await?;

        if !output.success() {
            return Ok(Vec::new());
        }

        Ok(parse_dpkg_status(&output.stdout))
    }
}

/// Versions from `${Status} ${Version}` lines whose status is installed.
///
/// Packages that were removed but not purged report `deinstall ok config-files`
/// and are skipped.
fn parse_dpkg_status(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [want, _, "installed", version] if *want == "install" || *want == "hold" => {
                    Some(version.to_string())
                }
                _ => None,
            }
        })
        .collect()
}

#[async_trait]
impl Resource for Package {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Package
    }

    fn id(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> Result<Observation, ResourceError> {
        let versions = self.versions().await?;
        Ok(Observation::new(ResourceKind::Package, &self.name, !versions.is_empty())
            .with("installed", !versions.is_empty())
            .with("versions", versions)
            .with("strategy", self.strategy.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::system_context::mocks::mock_adapters;
    use crate::application::HostAdapters;
    use crate::config::RunConfig;
    use crate::domain::PackageOverride;
    use crate::port::command_runner::mocks::ScriptedCommandRunner;
    use crate::port::host_probe::mocks::MockHostProbe;

    fn context(package: Option<PackageOverride>, runner: ScriptedCommandRunner) -> Arc<SystemContext> {
        let adapters = HostAdapters {
            runner: Arc::new(runner),
            ..mock_adapters(MockHostProbe::new())
        };
        SystemContext::build(RunConfig::default().with_package(package), adapters).unwrap()
    }

    fn rpm_line(name: &str) -> String {
        format!(
            "rpm -q --nosignature --nohdrchk --nodigest --qf {} {}",
            RPM_QUERY_FORMAT, name
        )
    }

    fn deb_line(name: &str) -> String {
        format!("dpkg-query -f {} -W {}", DEB_QUERY_FORMAT, name)
    }

    #[test]
    fn test_parse_dpkg_status() {
        let out = "install ok installed 1:9.6p1-3\n\
                   deinstall ok config-files 1.0\n\
                   hold ok installed 2.0\n\
                   garbage\n";
        assert_eq!(parse_dpkg_status(out), vec!["1:9.6p1-3", "2.0"]);
    }

    #[tokio::test]
    async fn test_rpm_installed() {
        let runner = ScriptedCommandRunner::new()
            .on(&rpm_line("kernel"), 0, "5.14.0\n5.14.1\n")
            .on(&rpm_line("nope"), 1, "package nope is not installed\n");
        let ctx = context(Some(PackageOverride::Rpm), runner);

        let kernel = ctx.new_package("kernel");
        assert_eq!(kernel.strategy(), PackageStrategy::Rpm);
        assert_eq!(kernel.versions().await.unwrap(), vec!["5.14.0", "5.14.1"]);

        let obs = ctx.new_package("nope").exists().await.unwrap();
        assert!(!obs.exists);
        assert_eq!(obs.property("installed"), Some(&serde_json::json!(false)));
    }

    #[tokio::test]
    async fn test_deb_installed() {
        let runner = ScriptedCommandRunner::new()
            .on(&deb_line("openssh-server"), 0, "install ok installed 1:9.6p1-3\n")
            .on(&deb_line("gone"), 1, "");
        let ctx = context(Some(PackageOverride::Deb), runner);

        let obs = ctx.new_package("openssh-server").exists().await.unwrap();
        assert!(obs.exists);
        assert_eq!(obs.property("versions"), Some(&serde_json::json!(["1:9.6p1-3"])));
        assert!(!ctx.new_package("gone").installed().await.unwrap());
    }

    #[tokio::test]
    async fn test_null_strategy_is_unavailable() {
        let runner = ScriptedCommandRunner::new();
        let ctx = context(None, runner);

        let pkg = ctx.new_package("bash");
        assert_eq!(pkg.strategy(), PackageStrategy::Null);
        assert!(matches!(
            pkg.exists().await,
            Err(ResourceError::Unavailable { .. })
        ));
        assert!(matches!(
            pkg.installed().await,
            Err(ResourceError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_execution_error() {
        let ctx = context(Some(PackageOverride::Rpm), ScriptedCommandRunner::new());
        assert!(matches!(
            ctx.new_package("bash").versions().await,
            Err(ResourceError::Execution(_))
        ));
    }
}
