//! Image discovery from rendered chart manifests

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::chart::{ChartRef, PrivateRegistry, last_segment};
use crate::error::Result;
use crate::helm::HelmClient;

/// Matches `image: <ref>` with optional single or double quotes around the reference
static IMAGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"image:\s*["']?([a-zA-Z0-9\-./_:@]+)["']?"#).expect("valid regex")
});

/// A container image reference as written in a manifest
///
/// Ordering is lexicographic on the reference string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything after the final `/`, tag or digest included
    pub fn short_name(&self) -> &str {
        last_segment(&self.0)
    }

    /// Reference of this image inside the private registry
    pub fn mirrored_to(&self, registry: &PrivateRegistry) -> ImageReference {
        ImageReference(format!("{}/{}", registry.as_str(), self.short_name()))
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the distinct image references from rendered manifest text
pub fn extract_images(manifests: &str) -> BTreeSet<ImageReference> {
    IMAGE_PATTERN
        .captures_iter(manifests)
        .map(|caps| ImageReference::new(&caps[1]))
        .collect()
}

/// Render the chart and collect every image it references
///
/// An empty set is a valid result; rendering failures are not.
pub fn discover_images(helm: &HelmClient<'_>, chart: &ChartRef) -> Result<BTreeSet<ImageReference>> {
    let manifests = helm.template(chart)?;
    let images = extract_images(&manifests);
    info!(chart = %chart, count = images.len(), "Discovered images");
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::runner::{CommandResult, MockRunner};

    fn refs(list: &[&str]) -> BTreeSet<ImageReference> {
        list.iter().map(|s| ImageReference::new(*s)).collect()
    }

    #[test]
    fn test_extract_deduplicates() {
        let text = r#"
spec:
  containers:
    - name: a
      image: "a/b:1"
    - name: again
      image: "a/b:1"
    - name: c
      image: 'c:2'
"#;
        assert_eq!(extract_images(text), refs(&["a/b:1", "c:2"]));
    }

    #[test]
    fn test_extract_unquoted_and_digest() {
        let text = "image: docker.io/library/nginx:1.25\n\
                    image:   ghcr.io/org/tool@sha256:abc123\n";
        assert_eq!(
            extract_images(text),
            refs(&["docker.io/library/nginx:1.25", "ghcr.io/org/tool@sha256:abc123"])
        );
    }

    #[test]
    fn test_extract_is_case_sensitive() {
        let text = "image: \"Repo/App:1\"\nimage: \"repo/app:1\"\nImage: \"other:1\"\n";
        assert_eq!(extract_images(text), refs(&["Repo/App:1", "repo/app:1"]));
    }

    #[test]
    fn test_extract_sequence_items() {
        let text = "initContainers:\n  - image: \"busybox:1.36\"\n    name: init\n";
        assert_eq!(extract_images(text), refs(&["busybox:1.36"]));
    }

    #[test]
    fn test_extract_nothing() {
        assert!(extract_images("kind: ConfigMap\ndata:\n  key: value\n").is_empty());
    }

    #[test]
    fn test_short_name_and_mirror_target() {
        let image = ImageReference::new("registry.io/ns/app:1.0");
        assert_eq!(image.short_name(), "app:1.0");

        let target = image.mirrored_to(&PrivateRegistry::new("myreg.com/proj"));
        assert_eq!(target.as_str(), "myreg.com/proj/app:1.0");

        let bare = ImageReference::new("nginx:latest");
        assert_eq!(
            bare.mirrored_to(&PrivateRegistry::new("myreg.com/")).as_str(),
            "myreg.com/nginx:latest"
        );
    }

    #[test]
    fn test_discover_images() {
        let runner = MockRunner::new().on(
            "helm",
            &["template"],
            CommandResult::ok("image: \"quay.io/foo/bar:v2\"\n"),
        );
        let helm = HelmClient::new(&runner, "helm");

        let images = discover_images(&helm, &ChartRef::new("foo/bar", None)).unwrap();
        assert_eq!(images, refs(&["quay.io/foo/bar:v2"]));
    }

    #[test]
    fn test_discover_images_template_failure() {
        let runner = MockRunner::new().on("helm", &["template"], CommandResult::failed(1, "bad chart"));
        let helm = HelmClient::new(&runner, "helm");

        let err = discover_images(&helm, &ChartRef::new("foo/bar", None)).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
