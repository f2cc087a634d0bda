use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::selection::Selection;
use crate::model::settings::DashboardSettings;
use crate::model::tree::FacetTree;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ColumnKey {
    pub cell_type: String,
    pub cluster: String,
}

/// Contiguous run of indices sharing one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSpan {
    pub label: String,
    pub start: usize,
    pub len: usize,
}

/// Union of `(cell type, cluster)` pairs present under the selected
/// genes x genotypes x cell types, ordered by cell type then cluster.
pub fn enumerate_columns(
    tree: &FacetTree,
    selection: &Selection,
    settings: &DashboardSettings,
) -> Vec<ColumnKey> {
    let Some(group) = selection.group.as_deref() else {
        return Vec::new();
    };

    let mut keys: BTreeSet<ColumnKey> = BTreeSet::new();
    for gene in &selection.genes {
        for genotype in &selection.genotypes {
            for cell_type in &selection.cell_types {
                let Some(clusters) = tree.clusters(group, gene, genotype, cell_type) else {
                    continue;
                };
                for cluster in clusters.keys() {
                    if is_fold_change_cluster(cluster, settings) {
                        keys.insert(ColumnKey {
                            cell_type: cell_type.clone(),
                            cluster: cluster.clone(),
                        });
                    }
                }
            }
        }
    }

    let mut out: Vec<ColumnKey> = keys.into_iter().collect();
    out.sort_by(|a, b| compare_columns(a, b, settings));
    out
}

pub fn compare_columns(a: &ColumnKey, b: &ColumnKey, settings: &DashboardSettings) -> Ordering {
    a.cell_type
        .cmp(&b.cell_type)
        .then_with(|| compare_clusters(&a.cluster, &b.cluster, settings))
}

/// Compares display labels: indexed clusters first, by index; the rest
/// lexicographically. Raw ids break ties.
pub fn compare_clusters(a: &str, b: &str, settings: &DashboardSettings) -> Ordering {
    let (la, lb) = (cluster_label(a, settings), cluster_label(b, settings));
    let by_label = match (cluster_index(la), cluster_index(lb)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| la.cmp(lb)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => la.cmp(lb),
    };
    by_label.then_with(|| a.cmp(b))
}

/// Last run of ASCII digits of a display label, e.g. `Cluster 12` -> 12.
/// Strip the fold-change prefix first; it carries a digit of its own.
pub fn cluster_index(label: &str) -> Option<u64> {
    let bytes = label.as_bytes();
    let end = bytes.iter().rposition(|b| b.is_ascii_digit())? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    label[start..end].parse().ok()
}

pub fn is_fold_change_cluster(id: &str, settings: &DashboardSettings) -> bool {
    if id.starts_with(settings.fold_change_prefix.as_str()) {
        return true;
    }
    !settings
        .excluded_prefixes
        .iter()
        .any(|p| id.starts_with(p.as_str()))
}

pub fn cluster_label<'a>(id: &'a str, settings: &DashboardSettings) -> &'a str {
    id.strip_prefix(settings.fold_change_prefix.as_str())
        .unwrap_or(id)
}

pub fn cell_type_spans(columns: &[ColumnKey]) -> Vec<GroupSpan> {
    spans_by(columns.iter().map(|c| c.cell_type.as_str()))
}

pub fn spans_by<'a, I>(labels: I) -> Vec<GroupSpan>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<GroupSpan> = Vec::new();
    for (idx, label) in labels.into_iter().enumerate() {
        match out.last_mut() {
            Some(span) if span.label == label => span.len += 1,
            _ => out.push(GroupSpan {
                label: label.to_string(),
                start: idx,
                len: 1,
            }),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_columns.rs"]
mod tests;
