//! Chartlift CLI - Turn a public Helm chart into an offline deployment bundle

use std::path::PathBuf;

use chartlift_core::{DEFAULT_NAMESPACE, DEFAULT_OUTPUT_ROOT};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bundle;
mod display;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "chartlift")]
#[command(author = "Chartlift Contributors")]
#[command(version, disable_version_flag = true)]
#[command(
    about = "Mirror every image of a Helm chart into a private registry and package the chart for offline deployment",
    long_about = None
)]
struct Cli {
    /// Helm chart to bundle (e.g. 'kubeshark/kubeshark')
    chart: String,

    /// Private registry to mirror images to (e.g. 'registry.example.com/project')
    registry: String,

    /// Chart version to bundle (recommended)
    #[arg(long)]
    version: Option<String>,

    /// Target namespace used in the printed deployment command
    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Directory the bundle directory is created in
    #[arg(short, long, env = "CHARTLIFT_OUTPUT_ROOT", default_value = DEFAULT_OUTPUT_ROOT)]
    output_root: PathBuf,

    /// Helm binary to invoke
    #[arg(long = "helm", env = "CHARTLIFT_HELM", default_value = "helm", value_name = "BIN")]
    helm: String,

    /// Docker-compatible client to invoke
    #[arg(long = "docker", env = "CHARTLIFT_DOCKER", default_value = "docker", value_name = "BIN")]
    docker: String,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // Setup miette for nice panic display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let options = bundle::BundleOptions {
        chart: cli.chart,
        registry: cli.registry,
        version: cli.version,
        namespace: cli.namespace,
        output_root: cli.output_root,
        helm: cli.helm,
        docker: cli.docker,
    };

    let code = match bundle::run(options) {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            display::print_error(&err);
            err.exit_code()
        }
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["chartlift", "kubeshark/kubeshark", "reg.example.com/proj"])
            .unwrap();
        assert_eq!(cli.chart, "kubeshark/kubeshark");
        assert_eq!(cli.registry, "reg.example.com/proj");
        assert_eq!(cli.version, None);
        assert_eq!(cli.namespace, "default");
        assert!(!cli.debug);
    }

    #[test]
    fn test_version_pin_and_namespace() {
        let cli = Cli::try_parse_from([
            "chartlift",
            "kubeshark/kubeshark",
            "reg.example.com/proj/",
            "--version",
            "52.3.0",
            "-n",
            "observability",
        ])
        .unwrap();
        assert_eq!(cli.version.as_deref(), Some("52.3.0"));
        assert_eq!(cli.namespace, "observability");
    }

    #[test]
    fn test_missing_registry_is_rejected() {
        assert!(Cli::try_parse_from(["chartlift", "kubeshark/kubeshark"]).is_err());
    }
}
