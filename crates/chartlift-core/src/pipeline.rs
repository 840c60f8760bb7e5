//! End-to-end bundling pipeline
//!
//! The pipeline is strictly linear:
//! 1. Refresh helm repositories (failure is only a warning)
//! 2. Discover images (an empty result ends the run successfully)
//! 3. Mirror every image into the private registry
//! 4. Create the bundle directory
//! 5. Write `offline-values.yaml`
//! 6. Fetch the chart archive
//!
//! The first fatal error aborts the run. Nothing is rolled back: images
//! already pushed stay pushed and a partially filled bundle directory is left
//! on disk.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::chart::{BundleLayout, ChartRef, OFFLINE_VALUES_FILE, PrivateRegistry};
use crate::error::Result;
use crate::fetch::fetch_chart;
use crate::helm::HelmClient;
use crate::images::{ImageReference, discover_images};
use crate::mirror::{DockerClient, MirrorOutcome, mirror_all};
use crate::runner::CommandRunner;
use crate::values::generate_offline_values;

/// Default namespace used in the deployment command
pub const DEFAULT_NAMESPACE: &str = "default";

/// Default parent directory of bundle directories
pub const DEFAULT_OUTPUT_ROOT: &str = "build";

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    RefreshRepositories,
    DiscoverImages,
    MirrorImages,
    CreateBundleDir,
    GenerateValues,
    FetchChart,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::RefreshRepositories => "Refreshing chart repositories",
            Step::DiscoverImages => "Discovering container images",
            Step::MirrorImages => "Mirroring images to the private registry",
            Step::CreateBundleDir => "Creating bundle directory",
            Step::GenerateValues => "Generating offline values",
            Step::FetchChart => "Downloading chart archive",
        };
        f.write_str(label)
    }
}

/// Receives progress notifications from the pipeline
///
/// All methods default to doing nothing.
pub trait Reporter {
    fn step(&mut self, _step: Step) {}

    fn images_found(&mut self, _images: &BTreeSet<ImageReference>) {}

    fn image_started(&mut self, _image: &ImageReference, _target: &ImageReference) {}

    fn image_finished(
        &mut self,
        _image: &ImageReference,
        _target: &ImageReference,
        _outcome: MirrorOutcome,
    ) {
    }

    fn bundle_dir_created(&mut self, _dir: &Path) {}

    fn values_written(&mut self, _path: &Path) {}

    fn archive_fetched(&mut self, _archive: &Path) {}

    fn warning(&mut self, _message: &str) {}
}

/// Reporter that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Names of the external binaries to invoke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub helm: String,
    pub docker: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            helm: "helm".to_string(),
            docker: "docker".to_string(),
        }
    }
}

/// Everything needed to build one bundle
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub chart: ChartRef,
    pub registry: PrivateRegistry,
    pub namespace: String,
    pub output_root: PathBuf,
    pub tools: Tools,
}

impl BundleRequest {
    pub fn new(chart: ChartRef, registry: PrivateRegistry) -> Self {
        Self {
            chart,
            registry,
            namespace: DEFAULT_NAMESPACE.to_string(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            tools: Tools::default(),
        }
    }

    pub fn layout(&self) -> BundleLayout {
        BundleLayout::for_chart(&self.output_root, &self.chart)
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct BundleSummary {
    pub bundle_dir: PathBuf,
    pub values_file: PathBuf,
    pub archive: PathBuf,
    pub release_name: String,
    pub namespace: String,
    pub mirrored: Vec<(ImageReference, MirrorOutcome)>,
}

impl BundleSummary {
    /// File name of the fetched archive
    pub fn archive_file_name(&self) -> String {
        self.archive
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.archive.display().to_string())
    }

    /// `helm install` command to run from inside the bundle directory
    pub fn deploy_command(&self) -> String {
        format!(
            "helm install {} ./{} \\\n  -f ./{} \\\n  --namespace {} --create-namespace",
            self.release_name,
            self.archive_file_name(),
            OFFLINE_VALUES_FILE,
            self.namespace
        )
    }
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum BundleOutcome {
    /// The chart references no images; nothing was mirrored or written
    NoImages,
    Completed(BundleSummary),
}

/// Run the whole pipeline for `request`
pub fn run_pipeline(
    runner: &dyn CommandRunner,
    request: &BundleRequest,
    reporter: &mut dyn Reporter,
) -> Result<BundleOutcome> {
    let helm = HelmClient::new(runner, request.tools.helm.as_str());
    let docker = DockerClient::new(runner, request.tools.docker.as_str());
    let chart = &request.chart;

    reporter.step(Step::RefreshRepositories);
    let refreshed = helm.repo_update()?;
    if !refreshed.success() {
        let message = format!(
            "'{} repo update' failed, continuing with cached repository data",
            request.tools.helm
        );
        warn!(stderr = %refreshed.stderr.trim(), "{}", message);
        reporter.warning(&message);
    }

    reporter.step(Step::DiscoverImages);
    let images = discover_images(&helm, chart)?;
    if images.is_empty() {
        info!(chart = %chart, "Chart references no images");
        return Ok(BundleOutcome::NoImages);
    }
    reporter.images_found(&images);

    reporter.step(Step::MirrorImages);
    let mirrored = mirror_all(&docker, &images, &request.registry, reporter)?;

    reporter.step(Step::CreateBundleDir);
    let layout = request.layout();
    std::fs::create_dir_all(layout.dir())?;
    reporter.bundle_dir_created(layout.dir());

    reporter.step(Step::GenerateValues);
    let values_file = generate_offline_values(&helm, chart, &request.registry, &layout)?;
    reporter.values_written(&values_file);

    reporter.step(Step::FetchChart);
    let archive = fetch_chart(&helm, chart, &layout)?;
    reporter.archive_fetched(&archive);

    Ok(BundleOutcome::Completed(BundleSummary {
        bundle_dir: layout.dir().to_path_buf(),
        values_file,
        archive,
        release_name: chart.short_name().to_string(),
        namespace: request.namespace.clone(),
        mirrored,
    }))
}
