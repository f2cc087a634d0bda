use serde_json::{Value, json};

use crate::model::settings::DashboardSettings;
use crate::pipeline::stage2_columns::{GroupSpan, cluster_label};
use crate::pipeline::stage3_heatmap::{Heatmap, HeatmapRender};
use crate::report::ColorScale;

pub const CLUSTER_WIDTH_PX: usize = 40;
pub const CHAR_WIDTH_PX: usize = 7;
const HEADER_FILL: &str = "#e6e6e6";
const LINE_COLOR: &str = "black";

/// Cell-type label that fits `n_clusters` columns, and its font size.
pub fn fit_label(label: &str, n_clusters: usize) -> (String, u32) {
    let box_px = n_clusters * CLUSTER_WIDTH_PX;
    let n_chars = label.chars().count();
    if n_chars * CHAR_WIDTH_PX <= box_px {
        return (label.to_string(), 12);
    }
    let keep = (box_px / CHAR_WIDTH_PX).saturating_sub(3);
    let mut short: String = label.chars().take(keep).collect();
    short.push('…');
    (short, 10)
}

pub fn heatmap_figure(heatmap: &Heatmap, settings: &DashboardSettings) -> Value {
    let n_cols = heatmap.columns.len();
    let n_rows = heatmap.rows.len();
    let x: Vec<usize> = (0..n_cols).collect();
    let y: Vec<usize> = (0..n_rows).collect();
    let scale = ColorScale::diverging(settings, heatmap.max_abs);
    let colorscale: Vec<Value> = scale
        .stops()
        .iter()
        .map(|(at, color)| json!([at, color]))
        .collect();

    let masked_z: Vec<Vec<Option<u8>>> = heatmap
        .mask
        .iter()
        .map(|row| row.iter().map(|&m| m.then_some(1)).collect())
        .collect();

    let value_trace = json!({
        "type": "heatmap",
        "name": "log2FC",
        "x": x,
        "y": y,
        "z": heatmap.z,
        "text": heatmap.hover,
        "hoverinfo": "text",
        "zmin": -heatmap.max_abs,
        "zmax": heatmap.max_abs,
        "zmid": 0.0,
        "colorscale": colorscale,
        "showscale": true,
        "xgap": 1,
        "ygap": 1,
    });
    let masked_trace = json!({
        "type": "heatmap",
        "name": "masked",
        "x": x,
        "y": y,
        "z": masked_z,
        "text": heatmap.hover,
        "hoverinfo": "text",
        "colorscale": [[0.0, settings.masked_color], [1.0, settings.masked_color]],
        "showscale": false,
        "xgap": 1,
        "ygap": 1,
    });

    let tick_text: Vec<&str> = heatmap
        .columns
        .iter()
        .map(|c| cluster_label(&c.cluster, settings))
        .collect();
    let row_text: Vec<&str> = heatmap.rows.iter().map(|r| r.genotype.as_str()).collect();

    let mut annotations = cell_type_annotations(&heatmap.cell_type_spans);
    annotations.extend(gene_annotations(&heatmap.gene_spans));

    json!({
        "timepoint": heatmap.timepoint,
        "data": [value_trace, masked_trace],
        "layout": {
            "title": {"text": format!("log2FC, {}", heatmap.timepoint)},
            "margin": {"l": 100, "b": 100, "t": 40},
            "xaxis": {
                "tickmode": "array",
                "tickvals": x,
                "ticktext": tick_text,
                "tickangle": -45,
            },
            "yaxis": {
                "tickmode": "array",
                "tickvals": y,
                "ticktext": row_text,
                "autorange": "reversed",
            },
            "shapes": shapes(heatmap),
            "annotations": annotations,
        },
    })
}

fn cell_type_annotations(spans: &[GroupSpan]) -> Vec<Value> {
    spans
        .iter()
        .map(|span| {
            let (text, size) = fit_label(&span.label, span.len);
            json!({
                "x": span.start as f64 + span.len as f64 / 2.0 - 0.5,
                "y": 1.1,
                "xref": "x",
                "yref": "paper",
                "text": text,
                "hovertext": span.label,
                "showarrow": false,
                "font": {"size": size, "color": LINE_COLOR},
                "xanchor": "center",
                "yanchor": "middle",
            })
        })
        .collect()
}

fn gene_annotations(spans: &[GroupSpan]) -> Vec<Value> {
    spans
        .iter()
        .map(|span| {
            json!({
                "x": 0.0,
                "y": span.start as f64 + span.len as f64 / 2.0 - 0.5,
                "xref": "paper",
                "yref": "y",
                "xshift": -90,
                "text": format!("<b>{}</b>", span.label),
                "showarrow": false,
                "xanchor": "right",
            })
        })
        .collect()
}

fn line(x0: f64, x1: f64, y0: f64, y1: f64) -> Value {
    json!({
        "type": "line",
        "xref": "x",
        "yref": "y",
        "x0": x0,
        "x1": x1,
        "y0": y0,
        "y1": y1,
        "line": {"color": LINE_COLOR, "width": 2},
    })
}

fn shapes(heatmap: &Heatmap) -> Vec<Value> {
    let top = -0.5;
    let bottom = heatmap.rows.len() as f64 - 0.5;
    let right = heatmap.columns.len() as f64 - 0.5;
    let mut out = Vec::new();

    for (idx, span) in heatmap.cell_type_spans.iter().enumerate() {
        let left = span.start as f64 - 0.5;
        if idx > 0 {
            out.push(line(left, left, top, bottom));
        }
        out.push(json!({
            "type": "rect",
            "xref": "x",
            "yref": "paper",
            "x0": left,
            "x1": left + span.len as f64,
            "y0": 0.97,
            "y1": 1.25,
            "fillcolor": HEADER_FILL,
            "layer": "below",
            "line": {"color": LINE_COLOR, "width": 2},
        }));
    }
    for span in heatmap.gene_spans.iter().skip(1) {
        let y = span.start as f64 - 0.5;
        out.push(line(-0.5, right, y, y));
    }

    out.push(line(-0.5, -0.5, top, bottom));
    out.push(line(right, right, top, bottom));
    out
}

pub fn render_json(render: &HeatmapRender, settings: &DashboardSettings) -> Value {
    match render {
        HeatmapRender::Ready(h) => heatmap_figure(h, settings),
        HeatmapRender::Empty { timepoint, reason } => json!({
            "timepoint": timepoint,
            "empty": reason,
            "message": reason.message(),
        }),
    }
}

pub fn render_figures_json(renders: &[HeatmapRender], settings: &DashboardSettings) -> String {
    let figures: Vec<Value> = renders.iter().map(|r| render_json(r, settings)).collect();
    serde_json::to_string_pretty(&Value::Array(figures)).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/json.rs"]
mod tests;
