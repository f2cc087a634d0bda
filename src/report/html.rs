use std::fmt::Write;

use crate::pipeline::stage4_table::{CellStyle, GroupedTable, TableRender};

const BORDER: &str = "2px solid black";
const THIN_BORDER: &str = "1px solid #999";

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_table_html(table: &GroupedTable) -> String {
    let mut out = String::new();
    out.push_str("<table style=\"border-collapse: collapse\">\n<thead>\n<tr>");
    let _ = write!(
        out,
        "<th rowspan=\"2\" scope=\"col\" style=\"border: {BORDER}\">Gene</th>\
         <th rowspan=\"2\" scope=\"col\" style=\"border: {BORDER}\">Genotype</th>"
    );
    for group in &table.groups {
        let _ = write!(
            out,
            "<th colspan=\"{}\" scope=\"colgroup\" style=\"border: {BORDER}\">{}</th>",
            group.clusters.len(),
            escape_html(&group.cell_type)
        );
    }
    out.push_str("</tr>\n<tr>");
    for group in &table.groups {
        for column in &group.clusters {
            let _ = write!(
                out,
                "<th scope=\"col\" style=\"border: {BORDER}\">{}</th>",
                escape_html(&column.label)
            );
        }
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    // Last column index of each group gets the heavy right border.
    let mut group_ends = Vec::with_capacity(table.groups.len());
    let mut acc = 0usize;
    for group in &table.groups {
        acc += group.clusters.len();
        group_ends.push(acc - 1);
    }

    for row in &table.rows {
        let bottom = if row.is_last { BORDER } else { THIN_BORDER };
        out.push_str("<tr>");
        if row.is_first {
            let _ = write!(
                out,
                "<td rowspan=\"{}\" style=\"border: {BORDER}; font-weight: bold; background-color: #f0f0f0\">{}</td>",
                row.row_span,
                escape_html(&row.gene)
            );
        }
        let _ = write!(
            out,
            "<td style=\"border-bottom: {bottom}; border-right: {BORDER}; font-style: italic\">{}</td>",
            escape_html(&row.genotype)
        );
        for (idx, cell) in row.cells.iter().enumerate() {
            let right = if group_ends.contains(&idx) {
                BORDER
            } else {
                THIN_BORDER
            };
            let colors = match &cell.style {
                CellStyle::Scaled {
                    background,
                    foreground,
                } => format!("background-color: {background}; color: {foreground}"),
                CellStyle::Masked { background } => {
                    format!("background-color: {background}; color: #555555; font-style: italic")
                }
            };
            let _ = write!(
                out,
                "<td style=\"{colors}; border-bottom: {bottom}; border-right: {right}; text-align: center\">{}</td>",
                escape_html(&cell.text)
            );
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Standalone page with one section per timepoint.
pub fn render_tables_html(renders: &[TableRender], title: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_html(title));
    out.push_str("<style>body { font-family: sans-serif; } td, th { padding: 4px 8px; }</style>\n");
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h2>{}</h2>", escape_html(title));
    for render in renders {
        let _ = writeln!(out, "<section>\n<h3>{}</h3>", escape_html(render.timepoint()));
        match render {
            TableRender::Ready(table) => out.push_str(&render_table_html(table)),
            TableRender::Empty { reason, .. } => {
                let _ = writeln!(out, "<p class=\"empty\">{}</p>", escape_html(reason.message()));
            }
        }
        out.push_str("</section>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}
