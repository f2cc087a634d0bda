use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::input::document::{ParsedDocument, parse_document};
use crate::input::reader::read_json;
use crate::input::timepoint::{Timepoint, compare_timepoints, infer_label};
use crate::input::{Dataset, InputError};
use crate::model::settings::DashboardSettings;

/// Reads every resource in parallel. Declared order is kept and the first
/// failure fails the whole load.
pub fn load_dataset(
    resources: &[PathBuf],
    settings: &DashboardSettings,
) -> Result<Dataset, InputError> {
    if resources.is_empty() {
        return Err(InputError::MissingInput("no data resources".to_string()));
    }

    let documents = resources
        .par_iter()
        .map(|path| read_resource(path, settings))
        .collect::<Result<Vec<_>, _>>()?;

    let mut timepoints = Vec::new();
    let mut trees = BTreeMap::new();
    for (path, docs) in resources.iter().zip(documents) {
        for doc in docs {
            let label = doc.label.clone().ok_or_else(|| {
                InputError::MissingInput(format!(
                    "no Timepoint in {} and none inferable from its name",
                    path.display()
                ))
            })?;
            let timepoint = Timepoint::parse(&label).ok_or_else(|| {
                InputError::InvalidInput(format!(
                    "timepoint label {label:?} in {} has no numeric duration",
                    path.display()
                ))
            })?;
            if trees.contains_key(&timepoint.label) {
                return Err(InputError::InvalidInput(format!(
                    "duplicate timepoint {} (again in {})",
                    timepoint.label,
                    path.display()
                )));
            }
            tracing::debug!(
                timepoint = %timepoint.label,
                source = %path.display(),
                groups = doc.tree.groups.len(),
                values = doc.tree.n_values(),
                "loaded timepoint"
            );
            trees.insert(timepoint.label.clone(), doc.tree);
            timepoints.push(timepoint);
        }
    }
    timepoints.sort_by(compare_timepoints);

    tracing::info!(
        resources = resources.len(),
        timepoints = timepoints.len(),
        "dataset loaded"
    );

    Ok(Dataset {
        timepoints,
        trees,
        sources: resources.to_vec(),
    })
}

fn read_resource(
    path: &Path,
    settings: &DashboardSettings,
) -> Result<Vec<ParsedDocument>, InputError> {
    let value = read_json(path)?;
    let mut docs = parse_document(&value, settings)?;
    if docs.len() == 1 && docs[0].label.is_none() {
        docs[0].label = infer_label(path);
    }
    Ok(docs)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_load.rs"]
mod tests;
