use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use crate::input::Dataset;
use crate::input::document::parse_document;
use crate::input::timepoint::{Timepoint, compare_timepoints};
use crate::model::settings::DashboardSettings;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn make_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_foldchange_{}_{}_{}", prefix, std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_json(path: &Path, value: &Value) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(value.to_string().as_bytes()).unwrap();
}

pub fn doc_1h() -> Value {
    json!({
        "Timepoint": "1h",
        "SPD": {
            "G1": {
                "Gene Info": {"Name": "Alpha", "Description": "first gene"},
                "wild type": {"CT1": {"Cluster 1": 2.0, "Cluster 2": "ns"}}
            },
            "G2": {"wild type": {"CT2": {"Cluster 1": -1.0}}},
            "G3": {
                "mutant": {
                    "CT1": {"Cluster 10": 0.5, "Cluster 3": -3.0, "pval_Cluster 3": 0.01},
                    "CT2": {"log2FC_Cluster 2": 1.5}
                }
            }
        },
        "ER": {
            "E1": {
                "Gene Info": {"Name": "Epsilon"},
                "wild type": {"CT3": {"Cluster 1": 0.25}}
            }
        }
    })
}

pub fn doc_3h() -> Value {
    json!({
        "Timepoint": "3h",
        "SPD": {
            "G1": {
                "Gene Info": {"Name": "Alpha (3h)"},
                "wild type": {"CT1": {"Cluster 1": -4.0}},
                "mutant": {"CT1": {"Cluster 2": 1.0}}
            }
        },
        "ER": {
            "E2": {"mutant": {"CT3": {"Cluster 1": "ns"}}}
        }
    })
}

pub fn dataset_from_values(docs: &[Value]) -> Dataset {
    let settings = DashboardSettings::default_v1();
    let mut timepoints = Vec::new();
    let mut trees = BTreeMap::new();
    for value in docs {
        for doc in parse_document(value, &settings).unwrap() {
            let tp = Timepoint::parse(doc.label.as_deref().unwrap()).unwrap();
            trees.insert(tp.label.clone(), doc.tree);
            timepoints.push(tp);
        }
    }
    timepoints.sort_by(compare_timepoints);
    Dataset {
        timepoints,
        trees,
        sources: Vec::new(),
    }
}

pub fn fixture_dataset() -> Dataset {
    dataset_from_values(&[doc_3h(), doc_1h()])
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
