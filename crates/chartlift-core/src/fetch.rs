//! Download of the chart archive into the bundle directory

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::chart::{BundleLayout, ChartRef};
use crate::error::{Error, Result};
use crate::helm::HelmClient;

/// Download the chart archive and return its path inside the bundle
pub fn fetch_chart(helm: &HelmClient<'_>, chart: &ChartRef, layout: &BundleLayout) -> Result<PathBuf> {
    helm.fetch(chart, layout.dir())?;
    let archive = find_chart_archive(layout.dir(), chart.short_name())?;
    info!(archive = %archive.display(), "Fetched chart archive");
    Ok(archive)
}

/// Locate `<short_name>-*.tgz` in `dir`
///
/// When several files match, the first one in directory listing order wins.
/// That order is whatever the filesystem returns and is not sorted here.
pub fn find_chart_archive(dir: &Path, short_name: &str) -> Result<PathBuf> {
    let pattern = format!("{}-*.tgz", glob::Pattern::escape(short_name));
    let matcher = glob::Pattern::new(&pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if matcher.matches(&file_name) {
            debug!(file = %file_name, %pattern, "Matched chart archive");
            return Ok(entry.path());
        }
    }

    Err(Error::ArchiveNotFound {
        dir: dir.to_path_buf(),
    })
}
