use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timepoint {
    pub label: String,
    /// Duration in hours.
    pub value: f64,
}

impl Timepoint {
    pub fn parse(label: &str) -> Option<Self> {
        let value = parse_duration_hours(label)?;
        Some(Self {
            label: label.trim().to_string(),
            value,
        })
    }

    pub fn in_range(&self, lo: f64, hi: f64) -> bool {
        self.value >= lo && self.value <= hi
    }
}

pub fn compare_timepoints(a: &Timepoint, b: &Timepoint) -> Ordering {
    a.value
        .partial_cmp(&b.value)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.label.cmp(&b.label))
}

/// `"3h"` -> 3.0, `"30min"` -> 0.5, `"2d"` -> 48.0, `"3"` -> 3.0.
pub fn parse_duration_hours(label: &str) -> Option<f64> {
    let s = label.trim();
    let split = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    if num.is_empty() {
        return None;
    }
    let n: f64 = num.parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    let factor = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "h" | "hr" | "hrs" | "hour" | "hours" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 1.0 / 60.0,
        "d" | "day" | "days" => 24.0,
        _ => return None,
    };
    Some(n * factor)
}

/// Last `_`, `-` or space separated token of the file stem that reads as a
/// duration, e.g. `data_3h.json.gz` -> `3h`.
pub fn infer_label(resource: &Path) -> Option<String> {
    let name = resource.file_name()?.to_string_lossy().to_string();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let stem = name.strip_suffix(".json").unwrap_or(name);
    stem.split(['_', '-', ' '])
        .filter(|t| !t.is_empty())
        .rev()
        .find(|t| parse_duration_hours(t).is_some())
        .map(|t| t.to_string())
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/timepoint.rs"]
mod tests;
