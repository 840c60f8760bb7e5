//! Chart, registry and bundle naming

use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the generated values file inside a bundle
pub const OFFLINE_VALUES_FILE: &str = "offline-values.yaml";

/// Suffix appended to the bundle directory name
const BUNDLE_DIR_SUFFIX: &str = "-offline";

/// Last `/`-separated segment of a reference, or the whole string
pub(crate) fn last_segment(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// A chart identifier with an optional version pin
///
/// The identifier is passed verbatim to `helm` (e.g. `kubeshark/kubeshark`,
/// `oci://registry-1.docker.io/bitnamicharts/redis`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRef {
    pub name: String,
    pub version: Option<String>,
}

impl ChartRef {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Chart name without repository prefix
    pub fn short_name(&self) -> &str {
        last_segment(&self.name)
    }

    /// `--version <v>` when a version is pinned
    pub fn version_args(&self) -> Vec<String> {
        match &self.version {
            Some(version) => vec!["--version".to_string(), version.clone()],
            None => Vec::new(),
        }
    }
}

impl fmt::Display for ChartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Address of the private registry images are mirrored to
///
/// Trailing slashes are stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateRegistry(String);

impl PrivateRegistry {
    pub fn new(address: &str) -> Self {
        Self(address.trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrivateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-disk layout of an offline bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    dir: PathBuf,
}

impl BundleLayout {
    /// `<root>/<chart short name>[-<version>]-offline`
    pub fn for_chart(root: &Path, chart: &ChartRef) -> Self {
        let mut name = chart.short_name().to_string();
        if let Some(version) = &chart.version {
            name.push('-');
            name.push_str(version);
        }
        name.push_str(BUNDLE_DIR_SUFFIX);

        Self {
            dir: root.join(name),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn values_file(&self) -> PathBuf {
        self.dir.join(OFFLINE_VALUES_FILE)
    }
}
