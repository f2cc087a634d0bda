use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::input::InputError;

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead + Send>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn read_json(path: &Path) -> Result<serde_json::Value, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        })?;
    serde_json::from_str(&buf).map_err(|source| InputError::Json {
        path: path.display().to_string(),
        source,
    })
}

pub fn is_json_resource(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    name.ends_with(".json") || name.ends_with(".json.gz")
}
