use super::*;
use crate::fixtures::{fixture_dataset, strings};

fn scenario_selection() -> Selection {
    Selection {
        group: Some("SPD".to_string()),
        genes: strings(&["G1", "G2"]),
        genotypes: strings(&["wild type", "mutant"]),
        cell_types: strings(&["CT1"]),
        tp_range: Some((1.0, 1.0)),
    }
}

fn ready(render: HeatmapRender) -> Heatmap {
    match render {
        HeatmapRender::Ready(h) => h,
        HeatmapRender::Empty { reason, .. } => panic!("unexpected empty render: {reason:?}"),
    }
}

#[test]
fn test_two_gene_scenario() {
    let dataset = fixture_dataset();
    let settings = DashboardSettings::default_v1();
    let hm = ready(build_heatmap(
        dataset.tree("1h"),
        "1h",
        &scenario_selection(),
        &settings,
    ));

    assert_eq!(hm.rows.len(), 4);
    assert_eq!(hm.columns.len(), 2);
    let labels: Vec<(&str, &str)> = hm
        .rows
        .iter()
        .map(|r| (r.gene.as_str(), r.genotype.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("G1", "wild type"),
            ("G1", "mutant"),
            ("G2", "wild type"),
            ("G2", "mutant")
        ]
    );
    assert_eq!(
        hm.rows[0].cells,
        vec![CellValue::Numeric(2.0), CellValue::NotSignificant]
    );
    for row in &hm.rows[1..] {
        assert!(row.cells.iter().all(|c| *c == CellValue::NoData));
    }
    assert_eq!(hm.max_abs, 2.0);
    assert_eq!(hm.z[0], vec![Some(2.0), None]);
    assert_eq!(hm.mask[0], vec![false, true]);
    assert!(hm.hover[0][1].ends_with("log2FC: Not Significant"));
    assert!(hm.hover[1][0].ends_with("log2FC: No Data"));
    assert!(hm.hover[0][0].contains("Cluster: Cluster 1"));
    assert!(hm.hover[0][0].ends_with("log2FC: 2.0"));
}

#[test]
fn test_masked_cells_never_reach_domain() {
    let dataset = fixture_dataset();
    let settings = DashboardSettings::default_v1();
    let selection = Selection {
        group: Some("SPD".to_string()),
        genes: strings(&["G1", "G2", "G3"]),
        genotypes: strings(&["wild type", "mutant"]),
        cell_types: strings(&["CT1", "CT2"]),
        tp_range: None,
    };
    for render in build_heatmaps(&dataset, &selection, &settings) {
        let hm = ready(render);
        let mut expected = 0.0f64;
        for (row, mask_row) in hm.rows.iter().zip(&hm.mask) {
            for (cell, masked) in row.cells.iter().zip(mask_row) {
                assert_eq!(*masked, cell.is_masked());
                if let CellValue::Numeric(v) = cell {
                    expected = expected.max(v.abs());
                }
            }
        }
        assert_eq!(hm.max_abs, expected);
    }
}

#[test]
fn test_domain_is_per_render() {
    let dataset = fixture_dataset();
    let settings = DashboardSettings::default_v1();
    let mut selection = scenario_selection();
    selection.tp_range = None;
    let renders = build_heatmaps(&dataset, &selection, &settings);
    assert_eq!(renders.len(), 2);
    let domains: Vec<f64> = renders.into_iter().map(|r| ready(r).max_abs).collect();
    assert_eq!(domains, vec![2.0, 4.0]);
}

#[test]
fn test_build_is_idempotent() {
    let dataset = fixture_dataset();
    let settings = DashboardSettings::default_v1();
    let a = build_heatmaps(&dataset, &scenario_selection(), &settings);
    let b = build_heatmaps(&dataset, &scenario_selection(), &settings);
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_empty_selections_render_nothing() {
    let dataset = fixture_dataset();
    let settings = DashboardSettings::default_v1();
    let tree = dataset.tree("1h");

    let mut sel = scenario_selection();
    sel.genes.clear();
    assert!(matches!(
        build_heatmap(tree, "1h", &sel, &settings),
        HeatmapRender::Empty { reason: EmptyReason::NoGenes, .. }
    ));

    let mut sel = scenario_selection();
    sel.genotypes.clear();
    assert!(matches!(
        build_heatmap(tree, "1h", &sel, &settings),
        HeatmapRender::Empty { reason: EmptyReason::NoGenotypes, .. }
    ));

    let mut sel = scenario_selection();
    sel.cell_types.clear();
    assert!(matches!(
        build_heatmap(tree, "1h", &sel, &settings),
        HeatmapRender::Empty { reason: EmptyReason::NoCellTypes, .. }
    ));

    assert!(matches!(
        build_heatmap(None, "9h", &scenario_selection(), &settings),
        HeatmapRender::Empty { reason: EmptyReason::NoTimepointData, .. }
    ));
}

#[test]
fn test_only_ns_values_is_empty_state() {
    let dataset = fixture_dataset();
    let settings = DashboardSettings::default_v1();
    let selection = Selection {
        group: Some("ER".to_string()),
        genes: strings(&["E2"]),
        genotypes: strings(&["mutant"]),
        cell_types: strings(&["CT3"]),
        tp_range: None,
    };
    let render = build_heatmap(dataset.tree("3h"), "3h", &selection, &settings);
    assert!(matches!(
        render,
        HeatmapRender::Empty { reason: EmptyReason::NoNumericValues, .. }
    ));
}

#[test]
fn test_decoration_spans() {
    let dataset = fixture_dataset();
    let settings = DashboardSettings::default_v1();
    let selection = Selection {
        group: Some("SPD".to_string()),
        genes: strings(&["G3", "G1"]),
        genotypes: strings(&["mutant", "wild type"]),
        cell_types: strings(&["CT1", "CT2"]),
        tp_range: None,
    };
    let hm = ready(build_heatmap(dataset.tree("1h"), "1h", &selection, &settings));
    let ct: Vec<(&str, usize, usize)> = hm
        .cell_type_spans
        .iter()
        .map(|s| (s.label.as_str(), s.start, s.len))
        .collect();
    assert_eq!(ct, vec![("CT1", 0, 4), ("CT2", 4, 1)]);
    let genes: Vec<(&str, usize, usize)> = hm
        .gene_spans
        .iter()
        .map(|s| (s.label.as_str(), s.start, s.len))
        .collect();
    assert_eq!(genes, vec![("G3", 0, 2), ("G1", 2, 2)]);
}
