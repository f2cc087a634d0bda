use std::path::Path;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error reading settings {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid settings {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub gene_limit: usize,
    pub table_precision: usize,
    pub hover_precision: usize,
    pub ns_sentinel: String,
    pub gene_info_key: String,
    pub cell_type_wrapper_key: String,
    pub fold_change_prefix: String,
    pub excluded_prefixes: Vec<String>,
    pub negative_color: String,
    pub midpoint_color: String,
    pub positive_color: String,
    pub masked_color: String,
    pub ns_label: String,
    pub no_data_label: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::default_v1()
    }
}

impl DashboardSettings {
    pub fn default_v1() -> Self {
        Self {
            gene_limit: 10,
            table_precision: 2,
            hover_precision: 1,
            ns_sentinel: "ns".to_string(),
            gene_info_key: "Gene Info".to_string(),
            cell_type_wrapper_key: "Cell type".to_string(),
            fold_change_prefix: "log2FC_".to_string(),
            excluded_prefixes: vec![
                "pval_".to_string(),
                "padj_".to_string(),
                "pvals_adj_".to_string(),
                "pct_".to_string(),
                "mean_".to_string(),
                "se_".to_string(),
            ],
            negative_color: "#008ae5".to_string(),
            midpoint_color: "#ffffff".to_string(),
            positive_color: "#e50000".to_string(),
            masked_color: "#d9d9d9".to_string(),
            ns_label: "ns".to_string(),
            no_data_label: "no data".to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|source| SettingsError::Json {
            path: path.display().to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.gene_limit == 0 {
            return Err(SettingsError::Invalid(
                "gene_limit must be at least 1".to_string(),
            ));
        }
        if self.ns_sentinel.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "ns_sentinel must not be empty".to_string(),
            ));
        }
        for color in [
            &self.negative_color,
            &self.midpoint_color,
            &self.positive_color,
            &self.masked_color,
        ] {
            if crate::report::Rgb::from_hex(color).is_none() {
                return Err(SettingsError::Invalid(format!("invalid color {color}")));
            }
        }
        Ok(())
    }

    pub fn is_ns(&self, raw: &str) -> bool {
        raw.trim().eq_ignore_ascii_case(&self.ns_sentinel)
    }
}
