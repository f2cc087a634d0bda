use serde::Serialize;

use crate::input::Dataset;
use crate::model::selection::Selection;
use crate::model::settings::DashboardSettings;
use crate::model::tree::{CellValue, FacetTree, max_abs};
use crate::pipeline::stage2_columns::{
    ColumnKey, GroupSpan, cell_type_spans, cluster_label, enumerate_columns, spans_by,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    pub gene: String,
    pub genotype: String,
    pub cells: Vec<CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub timepoint: String,
    pub columns: Vec<ColumnKey>,
    pub rows: Vec<MatrixRow>,
    /// `None` where the cell is masked.
    pub z: Vec<Vec<Option<f64>>>,
    pub mask: Vec<Vec<bool>>,
    pub hover: Vec<Vec<String>>,
    /// Symmetric colour domain is `[-max_abs, max_abs]`.
    pub max_abs: f64,
    pub cell_type_spans: Vec<GroupSpan>,
    pub gene_spans: Vec<GroupSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    NoGroup,
    NoGenes,
    NoGenotypes,
    NoCellTypes,
    NoTimepointData,
    NoColumns,
    NoNumericValues,
}

impl EmptyReason {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyReason::NoGroup => "no organelle/gene list selected",
            EmptyReason::NoGenes => "no genes selected",
            EmptyReason::NoGenotypes => "no genotypes selected",
            EmptyReason::NoCellTypes => "no cell types selected",
            EmptyReason::NoTimepointData => "no data for this timepoint",
            EmptyReason::NoColumns => "no clusters for this selection",
            EmptyReason::NoNumericValues => "no fold-change values for this selection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HeatmapRender {
    Ready(Heatmap),
    Empty { timepoint: String, reason: EmptyReason },
}

pub fn selection_empty_reason(selection: &Selection) -> Option<EmptyReason> {
    if selection.group.is_none() {
        Some(EmptyReason::NoGroup)
    } else if selection.genes.is_empty() {
        Some(EmptyReason::NoGenes)
    } else if selection.genotypes.is_empty() {
        Some(EmptyReason::NoGenotypes)
    } else if selection.cell_types.is_empty() {
        Some(EmptyReason::NoCellTypes)
    } else {
        None
    }
}

/// One row per gene x genotype in selection order, gene outermost.
pub fn build_rows(tree: &FacetTree, selection: &Selection, columns: &[ColumnKey]) -> Vec<MatrixRow> {
    let group = selection.group.as_deref().unwrap_or_default();
    let mut rows = Vec::with_capacity(selection.genes.len() * selection.genotypes.len());
    for gene in &selection.genes {
        for genotype in &selection.genotypes {
            let cells = columns
                .iter()
                .map(|c| tree.lookup(group, gene, genotype, &c.cell_type, &c.cluster))
                .collect();
            rows.push(MatrixRow {
                gene: gene.clone(),
                genotype: genotype.clone(),
                cells,
            });
        }
    }
    rows
}

pub fn build_heatmap(
    tree: Option<&FacetTree>,
    timepoint: &str,
    selection: &Selection,
    settings: &DashboardSettings,
) -> HeatmapRender {
    let empty = |reason| HeatmapRender::Empty {
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
    let rows = build_rows(tree, selection, &columns);
    let Some(domain) = max_abs(rows.iter().flat_map(|r| r.cells.iter())) else {
        return empty(EmptyReason::NoNumericValues);
    };

    let z = rows
        .iter()
        .map(|r| r.cells.iter().map(|c| c.numeric()).collect())
        .collect();
    let mask = rows
        .iter()
        .map(|r| r.cells.iter().map(|c| c.is_masked()).collect())
        .collect();
    let hover = rows
        .iter()
        .map(|r| {
            r.cells
                .iter()
                .zip(&columns)
                .map(|(cell, col)| hover_text(r, col, cell, settings))
                .collect()
        })
        .collect();

    let ct_spans = cell_type_spans(&columns);
    let gene_spans = spans_by(rows.iter().map(|r| r.gene.as_str()));

    tracing::debug!(
        timepoint,
        rows = rows.len(),
        columns = columns.len(),
        max_abs = domain,
        "heatmap built"
    );

    HeatmapRender::Ready(Heatmap {
        timepoint: timepoint.to_string(),
        columns,
        rows,
        z,
        mask,
        hover,
        max_abs: domain,
        cell_type_spans: ct_spans,
        gene_spans,
    })
}

/// One render per timepoint inside the selected range, in timepoint order.
pub fn build_heatmaps(
    dataset: &Dataset,
    selection: &Selection,
    settings: &DashboardSettings,
) -> Vec<HeatmapRender> {
    selection
        .timepoints_in_range(&dataset.timepoints)
        .into_iter()
        .map(|tp| build_heatmap(dataset.tree(&tp.label), &tp.label, selection, settings))
        .collect()
}

fn hover_text(
    row: &MatrixRow,
    column: &ColumnKey,
    cell: &CellValue,
    settings: &DashboardSettings,
) -> String {
    let value = match cell {
        CellValue::Numeric(v) => format!("{:.*}", settings.hover_precision, v),
        CellValue::NotSignificant => "Not Significant".to_string(),
        CellValue::NoData => "No Data".to_string(),
    };
    format!(
        "Gene: {}<br>Genotype: {}<br>Cell type: {}<br>Cluster: {}<br>log2FC: {}",
        row.gene,
        row.genotype,
        column.cell_type,
        cluster_label(&column.cluster, settings),
        value
    )
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_heatmap.rs"]
mod tests;
