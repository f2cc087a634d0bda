use std::collections::HashMap;

use url::form_urlencoded;

use crate::facets::Facets;
use crate::model::selection::{Selection, SelectionWarning, dedup_ordered};
use crate::model::settings::DashboardSettings;

pub const KEY_ORGANELLE: &str = "organelle";
pub const KEY_GENE_LIST: &str = "geneList";
pub const KEY_GENES: &str = "genes";
pub const KEY_GENOTYPES: &str = "genotypes";
pub const KEY_CELL_TYPES: &str = "cellTypes";
pub const KEY_TP_RANGE: &str = "tpRange";

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub selection: Selection,
    pub warnings: Vec<SelectionWarning>,
}

impl Selection {
    /// Derives the whole selection from a shareable URL or bare query string.
    /// Anything missing or invalid falls back to [`Selection::defaults`].
    pub fn from_query(query: &str, facets: &Facets, settings: &DashboardSettings) -> QueryOutcome {
        let params = parse_params(query);
        let defaults = Selection::defaults(facets);
        let mut warnings = Vec::new();

        let requested_group = params
            .get(KEY_ORGANELLE)
            .or_else(|| params.get(KEY_GENE_LIST));
        let group = match requested_group {
            Some(g) if facets.has_group(g) => Some(g.clone()),
            Some(g) => {
                warnings.push(SelectionWarning::UnknownOption {
                    kind: "organelle/gene list",
                    value: g.clone(),
                });
                defaults.group.clone()
            }
            None => defaults.group.clone(),
        };

        let gene_options = group
            .as_deref()
            .map(|g| facets.gene_options(g))
            .unwrap_or(&[]);
        let mut genes = filter_known(
            params.get(KEY_GENES),
            gene_options,
            "gene",
            &mut warnings,
        );
        if genes.len() > settings.gene_limit {
            warnings.push(SelectionWarning::GeneLimit {
                limit: settings.gene_limit,
                requested: genes.len(),
            });
            genes.truncate(settings.gene_limit);
        }
        if genes.is_empty() {
            genes = gene_options.first().cloned().into_iter().collect();
        }

        let mut genotypes = filter_known(
            params.get(KEY_GENOTYPES),
            &facets.genotypes,
            "genotype",
            &mut warnings,
        );
        if genotypes.is_empty() {
            genotypes = defaults.genotypes.clone();
        }

        let mut cell_types = filter_known(
            params.get(KEY_CELL_TYPES),
            &facets.cell_types,
            "cell type",
            &mut warnings,
        );
        if cell_types.is_empty() {
            cell_types = defaults.cell_types.clone();
        }

        let tp_range = match params.get(KEY_TP_RANGE) {
            Some(raw) => match parse_range(raw) {
                Some(range) => Some(range),
                None => {
                    warnings.push(SelectionWarning::InvalidRange);
                    defaults.tp_range
                }
            },
            None => defaults.tp_range,
        };

        for warning in &warnings {
            tracing::warn!(%warning, "query parameter ignored");
        }

        QueryOutcome {
            selection: Selection {
                group,
                genes,
                genotypes,
                cell_types,
                tp_range,
            },
            warnings,
        }
    }

    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(group) = &self.group {
            out.append_pair(KEY_ORGANELLE, group);
        }
        out.append_pair(KEY_GENES, &self.genes.join(","));
        out.append_pair(KEY_GENOTYPES, &self.genotypes.join(","));
        out.append_pair(KEY_CELL_TYPES, &self.cell_types.join(","));
        if let Some((lo, hi)) = self.tp_range {
            out.append_pair(KEY_TP_RANGE, &format!("{lo},{hi}"));
        }
        out.finish()
    }
}

fn parse_params(query: &str) -> HashMap<String, String> {
    let query = query.split_once('?').map(|(_, q)| q).unwrap_or(query);
    let query = query.split_once('#').map(|(q, _)| q).unwrap_or(query);
    let mut params = HashMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params.insert(key.into_owned(), value.into_owned());
    }
    params
}

fn split_list(raw: &str) -> Vec<String> {
    dedup_ordered(raw.split(',').map(|s| s.to_string()).collect())
}

fn filter_known(
    raw: Option<&String>,
    options: &[String],
    kind: &'static str,
    warnings: &mut Vec<SelectionWarning>,
) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for value in split_list(raw) {
        if options.contains(&value) {
            out.push(value);
        } else {
            warnings.push(SelectionWarning::UnknownOption { kind, value });
        }
    }
    out
}

fn parse_range(raw: &str) -> Option<(f64, f64)> {
    let (lo, hi) = raw.split_once(',')?;
    let lo: f64 = lo.trim().parse().ok()?;
    let hi: f64 = hi.trim().parse().ok()?;
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    Some(if lo <= hi { (lo, hi) } else { (hi, lo) })
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/query.rs"]
mod tests;
