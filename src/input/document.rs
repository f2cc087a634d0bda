use serde_json::{Map, Value};

use crate::input::InputError;
use crate::input::timepoint::parse_duration_hours;
use crate::model::settings::DashboardSettings;
use crate::model::tree::{CellTypeValues, CellValue, ClusterValues, FacetTree, GeneInfo, GeneNode};

pub const TIMEPOINT_KEY: &str = "Timepoint";
const WRAPPER_KEYS: [&str; 3] = ["Organelle", "GeneList", "Gene List"];
const GENES_KEY: &str = "Genes";

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub label: Option<String>,
    pub tree: FacetTree,
}

/// Accepts a wrapped document, a bare facet tree, or a combined document
/// keyed by timepoint label.
pub fn parse_document(
    value: &Value,
    settings: &DashboardSettings,
) -> Result<Vec<ParsedDocument>, InputError> {
    let obj = value
        .as_object()
        .ok_or_else(|| InputError::Parse("document root is not a JSON object".to_string()))?;

    if !obj.contains_key(TIMEPOINT_KEY) && is_combined(obj) {
        let mut out = Vec::with_capacity(obj.len());
        for (label, inner) in obj {
            let inner = inner.as_object().ok_or_else(|| {
                InputError::Parse(format!("timepoint {label} is not a JSON object"))
            })?;
            let mut doc = parse_single(inner, settings)?;
            if doc.label.is_none() {
                doc.label = Some(label.trim().to_string());
            }
            out.push(doc);
        }
        return Ok(out);
    }

    Ok(vec![parse_single(obj, settings)?])
}

fn is_combined(obj: &Map<String, Value>) -> bool {
    !obj.is_empty()
        && obj
            .iter()
            .all(|(k, v)| parse_duration_hours(k).is_some() && v.is_object())
}

fn parse_single(
    obj: &Map<String, Value>,
    settings: &DashboardSettings,
) -> Result<ParsedDocument, InputError> {
    let label = match obj.get(TIMEPOINT_KEY) {
        None => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => {
            return Err(InputError::Parse(
                "Timepoint must be a string or a number".to_string(),
            ));
        }
    };

    let mut tree = FacetTree::default();
    let wrapper = WRAPPER_KEYS
        .iter()
        .find_map(|k| obj.get(*k).map(|v| (*k, v)));

    match wrapper {
        Some((_, Value::Object(groups))) => {
            for (group, genes) in groups {
                parse_group(group, genes, &mut tree, settings);
            }
        }
        Some((key, Value::String(group))) => {
            // Single named group; genes live under "Genes" or beside the wrapper keys.
            if let Some(genes) = obj.get(GENES_KEY) {
                parse_group(group, genes, &mut tree, settings);
            } else {
                let mut genes = Map::new();
                for (k, v) in obj {
                    if k != TIMEPOINT_KEY && k != key {
                        genes.insert(k.clone(), v.clone());
                    }
                }
                parse_group(group, &Value::Object(genes), &mut tree, settings);
            }
        }
        Some((key, _)) => {
            return Err(InputError::Parse(format!(
                "{key} must be an object of groups or a group name"
            )));
        }
        None => {
            for (group, genes) in obj {
                if group == TIMEPOINT_KEY {
                    continue;
                }
                parse_group(group, genes, &mut tree, settings);
            }
        }
    }

    Ok(ParsedDocument { label, tree })
}

fn parse_group(group: &str, value: &Value, tree: &mut FacetTree, settings: &DashboardSettings) {
    let Some(genes) = value.as_object() else {
        tracing::warn!(group, "group node is not an object; skipping");
        return;
    };
    let transposed;
    let genes = if is_genotype_outer(genes, settings) {
        tracing::debug!(group, "genotype-outer layout; transposing to gene-outer");
        transposed = transpose_genotype_outer(group, genes, settings);
        &transposed
    } else {
        genes
    };
    let entry = tree.groups.entry(group.to_string()).or_default();
    for (gene, node) in genes {
        match parse_gene(group, gene, node, settings) {
            Some(parsed) => {
                entry.insert(gene.clone(), parsed);
            }
            None => tracing::warn!(group, gene, "gene node is not an object; skipping"),
        }
    }
}

/// `group -> genotype -> gene -> {Gene Info, Cell type}`: gene info sits two
/// levels below the group instead of one.
fn is_genotype_outer(genes: &Map<String, Value>, settings: &DashboardSettings) -> bool {
    genes.values().any(|child| {
        child.as_object().is_some_and(|child| {
            child.values().any(|grandchild| {
                grandchild
                    .as_object()
                    .is_some_and(|g| g.contains_key(&settings.gene_info_key))
            })
        })
    })
}

fn transpose_genotype_outer(
    group: &str,
    genotypes: &Map<String, Value>,
    settings: &DashboardSettings,
) -> Map<String, Value> {
    let mut genes: Map<String, Value> = Map::new();
    for (genotype, by_gene) in genotypes {
        let Some(by_gene) = by_gene.as_object() else {
            tracing::warn!(group, genotype = %genotype, "genotype node is not an object; skipping");
            continue;
        };
        for (gene, node) in by_gene {
            let Some(node) = node.as_object() else {
                tracing::warn!(group, gene = %gene, genotype = %genotype, "gene node is not an object; skipping");
                continue;
            };
            let Value::Object(target) = genes
                .entry(gene.clone())
                .or_insert_with(|| Value::Object(Map::new()))
            else {
                continue;
            };
            let mut values = node.clone();
            if let Some(info) = values.remove(&settings.gene_info_key) {
                target.entry(settings.gene_info_key.clone()).or_insert(info);
            }
            target.insert(genotype.clone(), Value::Object(values));
        }
    }
    genes
}

fn parse_gene(
    group: &str,
    gene: &str,
    value: &Value,
    settings: &DashboardSettings,
) -> Option<GeneNode> {
    let obj = value.as_object()?;
    let mut node = GeneNode::default();
    for (key, child) in obj {
        if *key == settings.gene_info_key {
            match serde_json::from_value::<GeneInfo>(child.clone()) {
                Ok(info) => node.info = Some(info),
                Err(err) => tracing::warn!(group, gene, %err, "unreadable gene info; ignoring"),
            }
            continue;
        }
        match parse_genotype(group, gene, key, child, settings) {
            Some(cell_types) => {
                node.genotypes.insert(key.clone(), cell_types);
            }
            None => tracing::warn!(group, gene, genotype = %key, "genotype node is not an object; skipping"),
        }
    }
    Some(node)
}

fn parse_genotype(
    group: &str,
    gene: &str,
    genotype: &str,
    value: &Value,
    settings: &DashboardSettings,
) -> Option<CellTypeValues> {
    let mut obj = value.as_object()?;
    if obj.len() == 1 {
        if let Some(Value::Object(inner)) = obj.get(&settings.cell_type_wrapper_key) {
            obj = inner;
        }
    }

    let mut out = CellTypeValues::new();
    for (cell_type, clusters) in obj {
        let Some(clusters) = clusters.as_object() else {
            tracing::warn!(group, gene, genotype, cell_type = %cell_type, "cell type node is not an object; skipping");
            continue;
        };
        let mut values = ClusterValues::new();
        for (cluster, raw) in clusters {
            if let Some(v) = classify_raw(raw, settings) {
                values.insert(cluster.clone(), v);
            } else if !raw.is_null() {
                tracing::warn!(
                    group,
                    gene,
                    genotype,
                    cell_type = %cell_type,
                    cluster = %cluster,
                    value = %raw,
                    "unreadable fold-change value; treating as no data"
                );
            }
        }
        out.insert(cell_type.clone(), values);
    }
    Some(out)
}

/// `None` means no data.
pub fn classify_raw(raw: &Value, settings: &DashboardSettings) -> Option<CellValue> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(CellValue::Numeric),
        Value::String(s) => {
            if settings.is_ns(s) {
                Some(CellValue::NotSignificant)
            } else {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(CellValue::Numeric)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/document.rs"]
mod tests;
