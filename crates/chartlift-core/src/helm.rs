//! Thin wrapper over the `helm` binary

use std::path::Path;

use tracing::debug;

use crate::chart::ChartRef;
use crate::error::Result;
use crate::runner::{CommandResult, CommandRunner, command_line};

/// Release name used when rendering templates for image discovery
pub const PLACEHOLDER_RELEASE: &str = "release-name-placeholder";

/// Executes `helm` subcommands through a [`CommandRunner`]
pub struct HelmClient<'a> {
    runner: &'a dyn CommandRunner,
    binary: String,
}

impl<'a> HelmClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Runs `helm repo update`; the caller decides what a failure means
    pub fn repo_update(&self) -> Result<CommandResult> {
        self.exec(vec!["repo".to_string(), "update".to_string()])
    }

    /// Runs `helm template <placeholder> <chart> [--version V]` and returns the manifests
    pub fn template(&self, chart: &ChartRef) -> Result<String> {
        let mut args = vec![
            "template".to_string(),
            PLACEHOLDER_RELEASE.to_string(),
            chart.name.clone(),
        ];
        args.extend(chart.version_args());
        self.exec_checked(args)
    }

    /// Runs `helm show values <chart> [--version V]` and returns the document
    pub fn show_values(&self, chart: &ChartRef) -> Result<String> {
        let mut args = vec!["show".to_string(), "values".to_string(), chart.name.clone()];
        args.extend(chart.version_args());
        self.exec_checked(args)
    }

    /// Runs `helm fetch <chart> --destination <dir> [--version V]`
    pub fn fetch(&self, chart: &ChartRef, destination: &Path) -> Result<()> {
        let mut args = vec![
            "fetch".to_string(),
            chart.name.clone(),
            "--destination".to_string(),
            destination.to_string_lossy().to_string(),
        ];
        args.extend(chart.version_args());
        self.exec_checked(args).map(|_| ())
    }

    fn exec(&self, args: Vec<String>) -> Result<CommandResult> {
        debug!(command = %self.binary, ?args, "Helm command");
        self.runner.run(&self.binary, &args)
    }

    fn exec_checked(&self, args: Vec<String>) -> Result<String> {
        let line = command_line(&self.binary, &args);
        let result = self.exec(args)?.ensure_success(&line)?;
        Ok(result.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::runner::MockRunner;

    #[test]
    fn test_template_arguments() {
        let runner = MockRunner::new().on("helm", &["template"], CommandResult::ok("kind: Pod"));
        let helm = HelmClient::new(&runner, "helm");

        let out = helm
            .template(&ChartRef::new("bitnami/redis", Some("18.0.0".into())))
            .unwrap();

        assert_eq!(out, "kind: Pod");
        assert_eq!(
            runner.command_lines(),
            vec!["helm template release-name-placeholder bitnami/redis --version 18.0.0"]
        );
    }

    #[test]
    fn test_fetch_arguments() {
        let runner = MockRunner::new().on("helm3", &["fetch"], CommandResult::ok(""));
        let helm = HelmClient::new(&runner, "helm3");

        helm.fetch(&ChartRef::new("bitnami/redis", None), Path::new("build/redis-offline"))
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec!["helm3 fetch bitnami/redis --destination build/redis-offline"]
        );
    }

    #[test]
    fn test_show_values_failure_is_fatal() {
        let runner = MockRunner::new().on(
            "helm",
            &["show", "values"],
            CommandResult::failed(1, "Error: repo bitnami not found"),
        );
        let helm = HelmClient::new(&runner, "helm");

        let err = helm.show_values(&ChartRef::new("bitnami/redis", None)).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
        assert_eq!(err.captured_output(), Some("Error: repo bitnami not found"));
    }

    #[test]
    fn test_repo_update_failure_is_returned() {
        let runner = MockRunner::new().on("helm", &["repo", "update"], CommandResult::failed(1, "offline"));
        let helm = HelmClient::new(&runner, "helm");

        let result = helm.repo_update().unwrap();
        assert!(!result.success());
    }
}
