use crate::facets::Facets;
use crate::facets::search::SearchHit;
use crate::pipeline::stage4_table::{GroupedTable, TableRender};

/// With `describe`, each gene's description follows on an indented line.
pub fn render_facets_text(facets: &Facets, describe: bool) -> String {
    let mut out = String::new();

    out.push_str("Fold-change dataset facets\n");
    out.push_str("==========================\n\n");

    let labels: Vec<&str> = facets.timepoints.iter().map(|t| t.label.as_str()).collect();
    out.push_str(&format!("Timepoints: {}\n", join_or_none(&labels)));
    out.push_str(&format!("Genotypes: {}\n", join_or_none(&facets.genotypes)));
    out.push_str(&format!("Cell types: {}\n\n", join_or_none(&facets.cell_types)));

    out.push_str("Organelles / gene lists:\n");
    if facets.groups.is_empty() {
        out.push_str("  (none)\n");
    }
    for group in &facets.groups {
        let genes = facets.gene_options(group);
        out.push_str(&format!("  {} ({} genes)\n", group, genes.len()));
        for gene in genes {
            match facets.gene_name(gene) {
                Some(name) => out.push_str(&format!("    {gene}  {name}\n")),
                None => out.push_str(&format!("    {gene}\n")),
            }
            if describe {
                push_description(&mut out, facets.gene_description(gene));
            }
        }
    }
    out
}

/// Column-aligned table; the Gene cell is printed on the first row of its block.
pub fn render_table_text(table: &GroupedTable) -> String {
    let mut group_row = vec!["Gene".to_string(), "Genotype".to_string()];
    let mut leaf_row = vec![String::new(), String::new()];
    for group in &table.groups {
        for (idx, column) in group.clusters.iter().enumerate() {
            group_row.push(if idx == 0 {
                group.cell_type.clone()
            } else {
                String::new()
            });
            leaf_row.push(column.label.clone());
        }
    }

    let mut lines = vec![group_row, leaf_row];
    for row in &table.rows {
        let mut line = Vec::with_capacity(2 + row.cells.len());
        line.push(if row.is_first {
            row.gene.clone()
        } else {
            String::new()
        });
        line.push(row.genotype.clone());
        line.extend(row.cells.iter().map(|c| c.text.clone()));
        lines.push(line);
    }

    let n_cols = lines.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut widths = vec![0usize; n_cols];
    for line in &lines {
        for (i, field) in line.iter().enumerate() {
            widths[i] = widths[i].max(field.chars().count());
        }
    }

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut text = String::new();
        for (j, field) in line.iter().enumerate() {
            if j > 0 {
                text.push_str("  ");
            }
            text.push_str(&format!("{:<width$}", field, width = widths[j]));
        }
        out.push_str(text.trim_end());
        out.push('\n');
        if i == 1 {
            let total = widths.iter().sum::<usize>() + 2 * n_cols.saturating_sub(1);
            out.push_str(&"-".repeat(total));
            out.push('\n');
        }
    }
    out
}

pub fn render_tables_text(renders: &[TableRender]) -> String {
    let mut out = String::new();
    for (i, render) in renders.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("Timepoint {}\n\n", render.timepoint()));
        match render {
            TableRender::Ready(table) => out.push_str(&render_table_text(table)),
            TableRender::Empty { reason, .. } => {
                out.push_str(&format!("({})\n", reason.message()));
            }
        }
    }
    out
}

pub fn render_search_text(hits: &[SearchHit], describe: bool) -> String {
    if hits.is_empty() {
        return "No matching genes.\n".to_string();
    }
    let mut out = String::new();
    for hit in hits {
        out.push_str(&format!(
            "{:.3}  {}{}\n",
            hit.score,
            hit.gene,
            hit.name
                .as_deref()
                .map(|n| format!("  {n}"))
                .unwrap_or_default()
        ));
        if describe {
            push_description(&mut out, hit.description.as_deref());
        }
    }
    out
}

fn push_description(out: &mut String, description: Option<&str>) {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(text) => out.push_str(&format!("        {text}\n")),
        None => out.push_str("        (no description)\n"),
    }
}

fn join_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/text.rs"]
mod tests;
