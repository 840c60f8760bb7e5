//! Rewrite of chart default values towards the private registry
//!
//! The chart's `values.yaml` is walked depth-first. Every mapping that has
//! both a `repository` and a `tag` key is treated as an image block, and the
//! path leading to it is reproduced in a fresh output tree carrying only
//! `registry` and the shortened `repository`. Nothing else from the source
//! document is copied.
//!
//! Merge keys are resolved before the walk. Custom tags (`!foo`) are rejected.
//!
//! # Example
//!
//! Source values:
//! ```yaml
//! image:
//!   repository: kubeshark/hub
//!   tag: v52.3.0
//!   pullPolicy: Always
//! ```
//!
//! Rewritten for `reg.internal/team`:
//! ```yaml
//! image:
//!   registry: reg.internal/team
//!   repository: hub
//! global:
//!   imageRegistry: reg.internal/team
//! ```

use std::fmt;
use std::path::PathBuf;

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::chart::{BundleLayout, ChartRef, PrivateRegistry, last_segment};
use crate::error::{Error, Result};
use crate::helm::HelmClient;

/// One step of a path from the document root
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Key of a mapping entry
    Key(Value),
    /// Position in a sequence
    Index(usize),
}

impl PathSegment {
    /// Key used for this segment in the output tree
    ///
    /// Sequence positions become integer keys.
    fn to_key(&self) -> Value {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => Value::Number((*index as u64).into()),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(Value::String(s)) => f.write_str(s),
            PathSegment::Key(Value::Number(n)) => write!(f, "{}", n),
            PathSegment::Key(Value::Bool(b)) => write!(f, "{}", b),
            PathSegment::Key(Value::Null) => f.write_str("~"),
            PathSegment::Key(_) => f.write_str("<complex key>"),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Render a path as `a.b[0].c`
fn format_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        if !out.is_empty() && matches!(segment, PathSegment::Key(_)) {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// Whether a mapping designates an image: it has both `repository` and `tag`
pub fn is_mirrorable_block(block: &Mapping) -> bool {
    block.contains_key("repository") && block.contains_key("tag")
}

struct Rewriter<'a> {
    registry: &'a PrivateRegistry,
    output: Mapping,
}

impl Rewriter<'_> {
    fn walk(&mut self, node: &Value, path: &mut Vec<PathSegment>) -> Result<()> {
        match node {
            Value::Mapping(map) => {
                if is_mirrorable_block(map) {
                    self.record(map, path)?;
                }
                // A match does not stop the descent: blocks may nest
                for (key, child) in map {
                    path.push(PathSegment::Key(key.clone()));
                    self.walk(child, path)?;
                    path.pop();
                }
            }
            Value::Sequence(items) => {
                for (index, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    self.walk(item, path)?;
                    path.pop();
                }
            }
            Value::Tagged(tagged) => {
                return Err(Error::UnsupportedTag {
                    tag: tagged.tag.to_string(),
                    path: format_path(path),
                });
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
        Ok(())
    }

    fn record(&mut self, block: &Mapping, path: &[PathSegment]) -> Result<()> {
        let repository = match block.get("repository") {
            Some(Value::String(repository)) => last_segment(repository).to_string(),
            _ => {
                return Err(Error::InvalidRepository {
                    path: format_path(path),
                });
            }
        };
        debug!(path = %format_path(path), %repository, "Found image block");

        let node = descend(&mut self.output, path)?;
        node.insert(
            Value::String("registry".to_string()),
            Value::String(self.registry.to_string()),
        );
        node.insert(
            Value::String("repository".to_string()),
            Value::String(repository),
        );
        Ok(())
    }
}

/// Walk `path` from `root`, creating missing mappings along the way
fn descend<'m>(root: &'m mut Mapping, path: &[PathSegment]) -> Result<&'m mut Mapping> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        let entry = current
            .entry(segment.to_key())
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        current = match entry {
            Value::Mapping(map) => map,
            _ => {
                return Err(Error::ValuesConflict {
                    path: format_path(&path[..=depth]),
                });
            }
        };
    }
    Ok(current)
}

/// Build the offline values tree for `source`
///
/// The result always contains `global.imageRegistry`.
pub fn rewrite_values(source: &Value, registry: &PrivateRegistry) -> Result<Mapping> {
    let mut rewriter = Rewriter {
        registry,
        output: Mapping::new(),
    };
    rewriter.walk(source, &mut Vec::new())?;

    let global_path = [PathSegment::Key(Value::String("global".to_string()))];
    let global = descend(&mut rewriter.output, &global_path)?;
    global.insert(
        Value::String("imageRegistry".to_string()),
        Value::String(registry.to_string()),
    );

    Ok(rewriter.output)
}

/// Serialize the offline values as block-style YAML, keeping insertion order
pub fn render_values(values: &Mapping) -> Result<String> {
    serde_yaml::to_string(values).map_err(Error::Serialize)
}

/// Parse a values document; an empty document is an empty tree
///
/// Merge keys (`<<: *anchor`) are resolved before the walk.
fn parse_values(document: &str) -> Result<Value> {
    if document.trim().is_empty() {
        return Ok(Value::Null);
    }
    let mut value: Value = serde_yaml::from_str(document).map_err(Error::ValuesParse)?;
    value.apply_merge().map_err(Error::ValuesParse)?;
    Ok(value)
}

/// Fetch the chart's default values, rewrite them and write `offline-values.yaml`
///
/// Returns the path of the written file.
pub fn generate_offline_values(
    helm: &HelmClient<'_>,
    chart: &ChartRef,
    registry: &PrivateRegistry,
    layout: &BundleLayout,
) -> Result<PathBuf> {
    let document = helm.show_values(chart)?;
    let source = parse_values(&document)?;
    let offline = rewrite_values(&source, registry)?;
    let rendered = render_values(&offline)?;

    let path = layout.values_file();
    std::fs::write(&path, rendered)?;
    info!(path = %path.display(), "Wrote offline values");

    Ok(path)
}
