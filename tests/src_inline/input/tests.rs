use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::reader::{is_json_resource, read_json};
use super::{InputError, resolve_resources};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_foldchange_input_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &str) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(contents.as_bytes()).unwrap();
}

fn write_gz(path: &Path, contents: &str) {
    let file = File::create(path).unwrap();
    let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

#[test]
fn test_read_plain_and_gz_json() {
    let dir = make_temp_dir();
    let plain = dir.join("a_1h.json");
    let gz = dir.join("b_3h.json.gz");
    write_file(&plain, r#"{"SPD": {}}"#);
    write_gz(&gz, r#"{"Timepoint": "3h", "SPD": {}}"#);

    let a = read_json(&plain).unwrap();
    assert!(a.get("SPD").is_some());
    let b = read_json(&gz).unwrap();
    assert_eq!(b.get("Timepoint").and_then(|v| v.as_str()), Some("3h"));
}

#[test]
fn test_invalid_json_is_reported_with_path() {
    let dir = make_temp_dir();
    let path = dir.join("broken_1h.json");
    write_file(&path, "{not json");
    let err = read_json(&path).unwrap_err();
    match err {
        InputError::Json { path: p, .. } => assert!(p.ends_with("broken_1h.json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_resolve_resources_from_dir_sorted() {
    let dir = make_temp_dir();
    write_file(&dir.join("tp_3h.json"), "{}");
    write_file(&dir.join("tp_1h.json"), "{}");
    write_file(&dir.join("notes.txt"), "ignore me");
    let explicit = vec![PathBuf::from("/elsewhere/extra_6h.json")];

    let resolved = resolve_resources(&explicit, Some(&dir)).unwrap();
    assert_eq!(resolved.len(), 3);
    assert_eq!(resolved[0], PathBuf::from("/elsewhere/extra_6h.json"));
    assert!(resolved[1].ends_with("tp_1h.json"));
    assert!(resolved[2].ends_with("tp_3h.json"));
}

#[test]
fn test_resolve_resources_requires_input() {
    assert!(matches!(
        resolve_resources(&[], None),
        Err(InputError::MissingInput(_))
    ));
    let dir = make_temp_dir();
    assert!(resolve_resources(&[], Some(&dir)).is_err());
}

#[test]
fn test_json_resource_detection() {
    assert!(is_json_resource(Path::new("x.json")));
    assert!(is_json_resource(Path::new("x.JSON.gz")));
    assert!(!is_json_resource(Path::new("x.tsv")));
}
