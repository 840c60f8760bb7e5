//! Bundle command - mirror a chart's images and package it for offline use

use std::path::PathBuf;

use chartlift_core::{
    BundleOutcome, BundleRequest, ChartRef, PrivateRegistry, ProcessRunner, Tools, run_pipeline,
};
use tracing::info;

use crate::display::{self, ConsoleReporter, EchoingRunner};
use crate::error::Result;

/// Options collected from the command line
#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub chart: String,
    pub registry: String,
    pub version: Option<String>,
    pub namespace: String,
    pub output_root: PathBuf,
    pub helm: String,
    pub docker: String,
}

impl BundleOptions {
    fn into_request(self) -> BundleRequest {
        BundleRequest {
            chart: ChartRef::new(self.chart, self.version),
            registry: PrivateRegistry::new(&self.registry),
            namespace: self.namespace,
            output_root: self.output_root,
            tools: Tools {
                helm: self.helm,
                docker: self.docker,
            },
        }
    }
}

pub fn run(options: BundleOptions) -> Result<()> {
    let request = options.into_request();
    display::print_header(&request.chart, request.registry.as_str());
    info!(chart = %request.chart, registry = %request.registry, "Starting bundle");

    let runner = EchoingRunner::new(ProcessRunner::new());
    let mut reporter = ConsoleReporter;

    match run_pipeline(&runner, &request, &mut reporter)? {
        BundleOutcome::NoImages => display::print_no_images(&request.chart),
        BundleOutcome::Completed(summary) => display::print_summary(&summary),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_normalizes_registry() {
        let request = BundleOptions {
            chart: "foo/bar".to_string(),
            registry: "reg.internal/team/".to_string(),
            version: Some("1.0.0".to_string()),
            namespace: "apps".to_string(),
            output_root: PathBuf::from("out"),
            helm: "helm".to_string(),
            docker: "docker".to_string(),
        }
        .into_request();

        assert_eq!(request.registry.as_str(), "reg.internal/team");
        assert_eq!(request.chart.short_name(), "bar");
        assert_eq!(request.layout().dir(), std::path::Path::new("out/bar-1.0.0-offline"));
    }
}
