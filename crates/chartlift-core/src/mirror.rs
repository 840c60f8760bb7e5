//! Mirroring images into the private registry
//!
//! Each image goes through `docker pull`, `docker tag` and `docker push`,
//! strictly one after the other. Pull and tag failures are fatal. A push
//! failure is tolerated only when the registry reports that the tag is
//! protected by an immutability rule, which means the content is already there.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{info, warn};

use crate::chart::PrivateRegistry;
use crate::error::{Error, Result};
use crate::images::ImageReference;
use crate::pipeline::Reporter;
use crate::runner::{CommandResult, CommandRunner};

/// Substring of the push error a registry returns for an immutable, existing tag
pub const IMMUTABLE_TAG_MARKER: &str = "configured as immutable";

/// One of the three mirroring steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorStep {
    Pull,
    Tag,
    Push,
}

impl fmt::Display for MirrorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorStep::Pull => write!(f, "pull"),
            MirrorStep::Tag => write!(f, "tag"),
            MirrorStep::Push => write!(f, "push"),
        }
    }
}

/// How a single image ended up in the private registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// The image was pushed
    Pushed,
    /// The registry refused the push because the immutable tag already exists
    AlreadyPresent,
}

/// Executes `docker` image subcommands through a [`CommandRunner`]
pub struct DockerClient<'a> {
    runner: &'a dyn CommandRunner,
    binary: String,
}

impl<'a> DockerClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    pub fn pull(&self, image: &ImageReference) -> Result<CommandResult> {
        self.runner
            .run(&self.binary, &["pull".to_string(), image.to_string()])
    }

    pub fn tag(&self, source: &ImageReference, target: &ImageReference) -> Result<CommandResult> {
        self.runner.run(
            &self.binary,
            &["tag".to_string(), source.to_string(), target.to_string()],
        )
    }

    pub fn push(&self, image: &ImageReference) -> Result<CommandResult> {
        self.runner
            .run(&self.binary, &["push".to_string(), image.to_string()])
    }
}

fn step_failed(step: MirrorStep, image: &ImageReference, result: &CommandResult) -> Error {
    Error::MirrorFailed {
        step,
        image: image.to_string(),
        output: result.combined_output(),
    }
}

/// Copy one image into the private registry
pub fn mirror_image(
    docker: &DockerClient<'_>,
    image: &ImageReference,
    registry: &PrivateRegistry,
) -> Result<MirrorOutcome> {
    let target = image.mirrored_to(registry);

    let pulled = docker.pull(image)?;
    if !pulled.success() {
        return Err(step_failed(MirrorStep::Pull, image, &pulled));
    }

    let tagged = docker.tag(image, &target)?;
    if !tagged.success() {
        return Err(step_failed(MirrorStep::Tag, image, &tagged));
    }

    let pushed = docker.push(&target)?;
    if pushed.success() {
        info!(source = %image, target = %target, "Mirrored image");
        return Ok(MirrorOutcome::Pushed);
    }

    if pushed.combined_output().contains(IMMUTABLE_TAG_MARKER) {
        warn!(target = %target, "Tag is immutable and already present, skipping push");
        return Ok(MirrorOutcome::AlreadyPresent);
    }

    Err(step_failed(MirrorStep::Push, &target, &pushed))
}

/// Mirror every image in lexicographic order, stopping at the first failure
pub fn mirror_all(
    docker: &DockerClient<'_>,
    images: &BTreeSet<ImageReference>,
    registry: &PrivateRegistry,
    reporter: &mut dyn Reporter,
) -> Result<Vec<(ImageReference, MirrorOutcome)>> {
    let mut mirrored = Vec::with_capacity(images.len());

    for image in images {
        let target = image.mirrored_to(registry);
        reporter.image_started(image, &target);
        let outcome = mirror_image(docker, image, registry)?;
        reporter.image_finished(image, &target, outcome);
        mirrored.push((image.clone(), outcome));
    }

    Ok(mirrored)
}
