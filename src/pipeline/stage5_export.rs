use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::settings::DashboardSettings;
use crate::model::tree::CellValue;
use crate::pipeline::stage4_table::GroupedTable;

pub const GENE_HEADER: &str = "Gene";
pub const GENOTYPE_HEADER: &str = "Genotype";
const LEAD_COLUMNS: usize = 2;
const HEADER_ROWS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("layout JSON error on {path}: {source}")]
    Layout {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid export: {0}")]
    Format(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub gene: String,
    pub genotype: String,
    pub values: Vec<String>,
}

/// Spreadsheet view of one table. `cell_types` is filled for every value
/// column; the file only names a cell type on the first column of its span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportGrid {
    pub cell_types: Vec<String>,
    pub clusters: Vec<String>,
    pub rows: Vec<ExportRow>,
}

/// Inclusive cell range, 0-based over the whole sheet including headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRange {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

/// Merged header cells of an export, stored beside the CSV since CSV has
/// no way to express them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLayout {
    pub header_rows: usize,
    pub merges: Vec<MergeRange>,
}

impl ExportLayout {
    pub fn for_grid(grid: &ExportGrid) -> Self {
        Self {
            header_rows: HEADER_ROWS,
            merges: header_merges(grid),
        }
    }
}

/// `out.csv` -> `out.merges.json`
pub fn layout_path(path: &Path) -> PathBuf {
    path.with_extension("merges.json")
}

pub fn export_grid(table: &GroupedTable, settings: &DashboardSettings) -> ExportGrid {
    let mut cell_types = Vec::with_capacity(table.n_columns());
    let mut clusters = Vec::with_capacity(table.n_columns());
    for group in &table.groups {
        for column in &group.clusters {
            cell_types.push(group.cell_type.clone());
            clusters.push(column.label.clone());
        }
    }
    let rows = table
        .rows
        .iter()
        .map(|row| ExportRow {
            gene: row.gene.clone(),
            genotype: row.genotype.clone(),
            values: row
                .cells
                .iter()
                .map(|cell| export_value(cell.value, settings))
                .collect(),
        })
        .collect();
    ExportGrid {
        cell_types,
        clusters,
        rows,
    }
}

/// Numbers use the shortest representation that parses back to the same f64.
pub fn export_value(value: CellValue, settings: &DashboardSettings) -> String {
    match value {
        CellValue::Numeric(v) => format!("{v}"),
        CellValue::NotSignificant => settings.ns_label.clone(),
        CellValue::NoData => settings.no_data_label.clone(),
    }
}

/// Cell-type spans in the group row, `Gene`/`Genotype` over both header rows
/// and each gene's block of rows in the first column.
pub fn header_merges(grid: &ExportGrid) -> Vec<MergeRange> {
    let mut out = vec![
        MergeRange {
            first_row: 0,
            last_row: 1,
            first_col: 0,
            last_col: 0,
        },
        MergeRange {
            first_row: 0,
            last_row: 1,
            first_col: 1,
            last_col: 1,
        },
    ];

    let mut start = 0usize;
    for idx in 1..=grid.cell_types.len() {
        if idx == grid.cell_types.len() || grid.cell_types[idx] != grid.cell_types[start] {
            if idx - start > 1 {
                out.push(MergeRange {
                    first_row: 0,
                    last_row: 0,
                    first_col: LEAD_COLUMNS + start,
                    last_col: LEAD_COLUMNS + idx - 1,
                });
            }
            start = idx;
        }
    }

    let mut start = 0usize;
    for idx in 1..=grid.rows.len() {
        if idx == grid.rows.len() || grid.rows[idx].gene != grid.rows[start].gene {
            if idx - start > 1 {
                out.push(MergeRange {
                    first_row: 2 + start,
                    last_row: 2 + idx - 1,
                    first_col: 0,
                    last_col: 0,
                });
            }
            start = idx;
        }
    }
    out
}

pub fn write_export<W: Write>(grid: &ExportGrid, writer: W) -> Result<(), ExportError> {
    let mut out = csv::WriterBuilder::new().flexible(false).from_writer(writer);

    let mut group_row = vec![GENE_HEADER.to_string(), GENOTYPE_HEADER.to_string()];
    for (idx, cell_type) in grid.cell_types.iter().enumerate() {
        if idx > 0 && grid.cell_types[idx - 1] == *cell_type {
            group_row.push(String::new());
        } else {
            group_row.push(cell_type.clone());
        }
    }
    out.write_record(&group_row)?;

    let mut leaf_row = vec![String::new(), String::new()];
    leaf_row.extend(grid.clusters.iter().cloned());
    out.write_record(&leaf_row)?;

    for row in &grid.rows {
        if row.values.len() != grid.clusters.len() {
            return Err(ExportError::Format(format!(
                "row {}/{} has {} values for {} columns",
                row.gene,
                row.genotype,
                row.values.len(),
                grid.clusters.len()
            )));
        }
        let mut record = Vec::with_capacity(LEAD_COLUMNS + row.values.len());
        record.push(row.gene.as_str());
        record.push(row.genotype.as_str());
        record.extend(row.values.iter().map(|v| v.as_str()));
        out.write_record(&record)?;
    }

    out.flush().map_err(|source| ExportError::Io {
        path: "<export>".to_string(),
        source,
    })?;
    Ok(())
}

/// Writes the CSV and its merge layout next to it.
pub fn write_export_file(grid: &ExportGrid, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_export(grid, io::BufWriter::new(file))?;

    let layout = ExportLayout::for_grid(grid);
    for merge in &layout.merges {
        tracing::debug!(
            first_row = merge.first_row,
            last_row = merge.last_row,
            first_col = merge.first_col,
            last_col = merge.last_col,
            "export merge range"
        );
    }
    write_layout_file(&layout, &layout_path(path))?;
    tracing::info!(
        path = %path.display(),
        rows = grid.rows.len(),
        columns = grid.clusters.len(),
        merges = layout.merges.len(),
        "export written"
    );
    Ok(())
}

pub fn write_layout_file(layout: &ExportLayout, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, layout).map_err(|source| ExportError::Layout {
        path: path.display().to_string(),
        source,
    })?;
    writer.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_layout_file(path: &Path) -> Result<ExportLayout, ExportError> {
    let file = File::open(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_reader(io::BufReader::new(file)).map_err(|source| ExportError::Layout {
        path: path.display().to_string(),
        source,
    })
}

/// A layout is valid for a sheet only if it holds exactly the merges the
/// sheet's spans imply.
pub fn check_layout(grid: &ExportGrid, layout: &ExportLayout) -> Result<(), ExportError> {
    if layout.header_rows != HEADER_ROWS {
        return Err(ExportError::Format(format!(
            "layout declares {} header rows, expected {HEADER_ROWS}",
            layout.header_rows
        )));
    }
    let expected = header_merges(grid);
    if layout.merges != expected {
        return Err(ExportError::Format(format!(
            "layout has {} merge ranges that do not match the {} implied by the sheet",
            layout.merges.len(),
            expected.len()
        )));
    }
    Ok(())
}

/// Reads an export back, forward-filling the cell-type spans.
pub fn read_export<R: Read>(reader: R) -> Result<ExportGrid, ExportError> {
    let mut input = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(reader);
    let mut records = input.records();

    let group_row = records
        .next()
        .ok_or_else(|| ExportError::Format("missing group header row".to_string()))??;
    let leaf_row = records
        .next()
        .ok_or_else(|| ExportError::Format("missing cluster header row".to_string()))??;

    if group_row.len() < LEAD_COLUMNS
        || &group_row[0] != GENE_HEADER
        || &group_row[1] != GENOTYPE_HEADER
    {
        return Err(ExportError::Format(
            "group header must start with Gene,Genotype".to_string(),
        ));
    }

    let mut cell_types = Vec::with_capacity(group_row.len() - LEAD_COLUMNS);
    let mut current: Option<&str> = None;
    for field in group_row.iter().skip(LEAD_COLUMNS) {
        if !field.is_empty() {
            current = Some(field);
        }
        let Some(cell_type) = current else {
            return Err(ExportError::Format(
                "first value column has no cell type".to_string(),
            ));
        };
        cell_types.push(cell_type.to_string());
    }
    let clusters = leaf_row
        .iter()
        .skip(LEAD_COLUMNS)
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        rows.push(ExportRow {
            gene: record[0].to_string(),
            genotype: record[1].to_string(),
            values: record
                .iter()
                .skip(LEAD_COLUMNS)
                .map(|s| s.to_string())
                .collect(),
        });
    }

    Ok(ExportGrid {
        cell_types,
        clusters,
        rows,
    })
}

/// Reads the CSV and, when present, checks it against its merge layout.
pub fn read_export_file(path: &Path) -> Result<ExportGrid, ExportError> {
    let file = File::open(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let grid = read_export(io::BufReader::new(file))?;

    let sidecar = layout_path(path);
    if sidecar.is_file() {
        check_layout(&grid, &read_layout_file(&sidecar)?)?;
    } else {
        tracing::debug!(path = %path.display(), "no merge layout beside export");
    }
    Ok(grid)
}

/// `gene_expression_<timepoint>_<YYYYMMDD_HHMMSS>.csv`
pub fn default_export_name<Tz: TimeZone>(timepoint: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let safe: String = timepoint
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "gene_expression_{}_{}.csv",
        safe,
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Prompts for a file name; an empty answer keeps the default.
pub fn confirm_filename<R: BufRead, W: Write>(
    default_name: &str,
    mut input: R,
    mut output: W,
) -> io::Result<String> {
    write!(output, "Save export as [{default_name}]: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim();
    if answer.is_empty() {
        return Ok(default_name.to_string());
    }
    if answer.to_ascii_lowercase().ends_with(".csv") {
        Ok(answer.to_string())
    } else {
        Ok(format!("{answer}.csv"))
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_export.rs"]
mod tests;
