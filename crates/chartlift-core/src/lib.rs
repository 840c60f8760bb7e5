//! Chartlift Core - Turn a public Helm chart into an offline bundle
//!
//! This crate provides the building blocks of the bundling pipeline:
//! - `runner`: External process invocation with captured output
//! - `images`: Image discovery from rendered chart templates
//! - `mirror`: Pull, retag and push of images into a private registry
//! - `values`: Rewrite of chart default values towards the private registry
//! - `fetch`: Download of the chart archive
//! - `pipeline`: The end-to-end orchestration

pub mod chart;
pub mod error;
pub mod fetch;
pub mod helm;
pub mod images;
pub mod mirror;
pub mod pipeline;
pub mod runner;
pub mod values;

pub use chart::{BundleLayout, ChartRef, PrivateRegistry};
pub use error::{Error, Result};
pub use fetch::{fetch_chart, find_chart_archive};
pub use helm::HelmClient;
pub use images::{ImageReference, discover_images, extract_images};
pub use mirror::{DockerClient, MirrorOutcome, MirrorStep, mirror_all, mirror_image};
pub use pipeline::{
    BundleOutcome, BundleRequest, BundleSummary, DEFAULT_NAMESPACE, DEFAULT_OUTPUT_ROOT,
    NullReporter, Reporter, Step, Tools, run_pipeline,
};
pub use runner::{CommandResult, CommandRunner, MockRunner, ProcessRunner, command_line};
pub use values::{
    PathSegment, generate_offline_values, is_mirrorable_block, render_values, rewrite_values,
};
