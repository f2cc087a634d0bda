use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod document;
pub mod reader;
pub mod timepoint;

use reader::is_json_resource;
use timepoint::Timepoint;

use crate::model::tree::FacetTree;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Every loaded timepoint, keyed by label, with labels in numeric order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub timepoints: Vec<Timepoint>,
    pub trees: BTreeMap<String, FacetTree>,
    pub sources: Vec<PathBuf>,
}

impl Dataset {
    pub fn tree(&self, label: &str) -> Option<&FacetTree> {
        self.trees.get(label)
    }

    pub fn timepoint(&self, label: &str) -> Option<&Timepoint> {
        self.timepoints.iter().find(|t| t.label == label)
    }

    /// Durations in hours, in timepoint order.
    pub fn timepoint_values(&self) -> Vec<f64> {
        self.timepoints.iter().map(|t| t.value).collect()
    }
}

/// Explicit resources first, then every JSON resource of `data_dir` by name.
pub fn resolve_resources(
    data: &[PathBuf],
    data_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, InputError> {
    let mut out = data.to_vec();
    if let Some(dir) = data_dir {
        let entries = std::fs::read_dir(dir).map_err(|source| InputError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| InputError::Io {
                path: dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_json_resource(&path) {
                found.push(path);
            }
        }
        found.sort();
        if found.is_empty() {
            return Err(InputError::MissingInput(format!(
                "no .json or .json.gz files in {}",
                dir.display()
            )));
        }
        out.extend(found);
    }
    if out.is_empty() {
        return Err(InputError::MissingInput(
            "no data resources given (use --data or --data-dir)".to_string(),
        ));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
