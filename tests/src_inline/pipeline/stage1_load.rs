use serde_json::json;

use super::*;
use crate::fixtures::{doc_1h, doc_3h, make_temp_dir, write_json};
use crate::model::tree::CellValue;

#[test]
fn test_load_sorts_timepoints_numerically() {
    let dir = make_temp_dir("load");
    let a = dir.join("late.json");
    let b = dir.join("early.json");
    write_json(&a, &doc_3h());
    write_json(&b, &doc_1h());

    let dataset = load_dataset(&[a, b], &DashboardSettings::default_v1()).unwrap();
    let labels: Vec<&str> = dataset.timepoints.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["1h", "3h"]);
    assert_eq!(dataset.timepoint_values(), vec![1.0, 3.0]);
    assert_eq!(
        dataset
            .tree("1h")
            .unwrap()
            .lookup("SPD", "G1", "wild type", "CT1", "Cluster 1"),
        CellValue::Numeric(2.0)
    );
}

#[test]
fn test_label_inferred_from_file_name() {
    let dir = make_temp_dir("infer");
    let path = dir.join("expression_6h.json");
    write_json(&path, &json!({"SPD": {"G1": {"wild type": {"CT1": {"Cluster 1": 1.0}}}}}));

    let dataset = load_dataset(&[path], &DashboardSettings::default_v1()).unwrap();
    assert_eq!(dataset.timepoints.len(), 1);
    assert_eq!(dataset.timepoints[0].label, "6h");
    assert_eq!(dataset.timepoints[0].value, 6.0);
}

#[test]
fn test_missing_label_fails_load() {
    let dir = make_temp_dir("nolabel");
    let path = dir.join("expression.json");
    write_json(&path, &json!({"SPD": {}}));
    let err = load_dataset(&[path], &DashboardSettings::default_v1()).unwrap_err();
    assert!(matches!(err, InputError::MissingInput(_)));
}

#[test]
fn test_any_failure_fails_whole_load() {
    let dir = make_temp_dir("failfast");
    let good = dir.join("good_1h.json");
    write_json(&good, &doc_1h());
    let missing = dir.join("missing_3h.json");

    let err = load_dataset(&[good, missing], &DashboardSettings::default_v1()).unwrap_err();
    assert!(matches!(err, InputError::Io { .. }));
}

#[test]
fn test_duplicate_timepoint_rejected() {
    let dir = make_temp_dir("dup");
    let a = dir.join("a.json");
    let b = dir.join("b.json");
    write_json(&a, &doc_1h());
    write_json(&b, &doc_1h());
    let err = load_dataset(&[a, b], &DashboardSettings::default_v1()).unwrap_err();
    assert!(matches!(err, InputError::InvalidInput(_)));
}

#[test]
fn test_combined_document_loads_every_timepoint() {
    let dir = make_temp_dir("combined");
    let path = dir.join("test_data.json");
    write_json(
        &path,
        &json!({
            "3": {"SPD": {"G1": {"wild type": {"CT1": {"Cluster 1": 1.0}}}}},
            "1": {"SPD": {"G1": {"wild type": {"CT1": {"Cluster 1": 2.0}}}}}
        }),
    );
    let dataset = load_dataset(&[path], &DashboardSettings::default_v1()).unwrap();
    let labels: Vec<&str> = dataset.timepoints.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["1", "3"]);
}
