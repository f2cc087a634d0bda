use serde::Serialize;

use crate::input::Dataset;
use crate::model::selection::Selection;
use crate::model::settings::DashboardSettings;
use crate::model::tree::{CellValue, FacetTree, max_abs};
use crate::pipeline::stage2_columns::{ColumnKey, cluster_label, enumerate_columns};
use crate::pipeline::stage3_heatmap::{EmptyReason, build_rows, selection_empty_reason};
use crate::report::{ColorScale, format_value, text_color};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterColumn {
    pub key: ColumnKey,
    pub label: String,
}

/// One header group: a cell type over its clusters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnGroup {
    pub cell_type: String,
    pub clusters: Vec<ClusterColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellStyle {
    Scaled {
        background: String,
        foreground: String,
    },
    Masked {
        background: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell {
    pub value: CellValue,
    pub text: String,
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub gene: String,
    pub genotype: String,
    /// Rows in this gene's block; the Gene cell spans them on the first row.
    pub row_span: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTable {
    pub timepoint: String,
    pub groups: Vec<ColumnGroup>,
    pub rows: Vec<TableRow>,
    /// `None` when every cell is masked.
    pub max_abs: Option<f64>,
}

impl GroupedTable {
    pub fn n_columns(&self) -> usize {
        self.groups.iter().map(|g| g.clusters.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableRender {
    Ready(GroupedTable),
    Empty { timepoint: String, reason: EmptyReason },
}

impl TableRender {
    pub fn timepoint(&self) -> &str {
        match self {
            TableRender::Ready(t) => &t.timepoint,
            TableRender::Empty { timepoint, .. } => timepoint,
        }
    }
}

pub fn column_groups(columns: &[ColumnKey], settings: &DashboardSettings) -> Vec<ColumnGroup> {
    let mut groups: Vec<ColumnGroup> = Vec::new();
    for key in columns {
        let column = ClusterColumn {
            key: key.clone(),
            label: cluster_label(&key.cluster, settings).to_string(),
        };
        match groups.last_mut() {
            Some(group) if group.cell_type == key.cell_type => group.clusters.push(column),
            _ => groups.push(ColumnGroup {
                cell_type: key.cell_type.clone(),
                clusters: vec![column],
            }),
        }
    }
    groups
}

pub fn style_cell(value: CellValue, scale: &ColorScale, settings: &DashboardSettings) -> TableCell {
    let masked = || CellStyle::Masked {
        background: settings.masked_color.clone(),
    };
    match value {
        CellValue::Numeric(v) => {
            let background = scale.color_for(v);
            TableCell {
                value,
                text: format_value(v, settings.table_precision),
                style: CellStyle::Scaled {
                    background: background.to_hex(),
                    foreground: text_color(background).to_hex(),
                },
            }
        }
        CellValue::NotSignificant => TableCell {
            value,
            text: settings.ns_label.clone(),
            style: masked(),
        },
        CellValue::NoData => TableCell {
            value,
            text: settings.no_data_label.clone(),
            style: masked(),
        },
    }
}

/// Same rows and columns as the heatmap; all-masked selections still render.
pub fn build_table(
    tree: Option<&FacetTree>,
    timepoint: &str,
    selection: &Selection,
    settings: &DashboardSettings,
) -> TableRender {
    let empty = |reason| TableRender::Empty {
        timepoint: timepoint.to_string(),
        reason,
    };
    if let Some(reason) = selection_empty_reason(selection) {
        return empty(reason);
    }
    let Some(tree) = tree else {
        return empty(EmptyReason::NoTimepointData);
    };
    let columns = enumerate_columns(tree, selection, settings);
    if columns.is_empty() {
        return empty(EmptyReason::NoColumns);
    }

    let matrix = build_rows(tree, selection, &columns);
    let domain = max_abs(matrix.iter().flat_map(|r| r.cells.iter()));
    let scale = ColorScale::diverging(settings, domain.unwrap_or(0.0));

    let block = selection.genotypes.len();
    let rows = matrix
        .into_iter()
        .enumerate()
        .map(|(idx, row)| TableRow {
            gene: row.gene,
            genotype: row.genotype,
            row_span: block,
            is_first: idx % block == 0,
            is_last: idx % block == block - 1,
            cells: row
                .cells
                .into_iter()
                .map(|c| style_cell(c, &scale, settings))
                .collect(),
        })
        .collect::<Vec<_>>();

    tracing::debug!(timepoint, rows = rows.len(), columns = columns.len(), "table built");

    TableRender::Ready(GroupedTable {
        timepoint: timepoint.to_string(),
        groups: column_groups(&columns, settings),
        rows,
        max_abs: domain,
    })
}

pub fn build_tables(
    dataset: &Dataset,
    selection: &Selection,
    settings: &DashboardSettings,
) -> Vec<TableRender> {
    selection
        .timepoints_in_range(&dataset.timepoints)
        .into_iter()
        .map(|tp| build_table(dataset.tree(&tp.label), &tp.label, selection, settings))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_table.rs"]
mod tests;
