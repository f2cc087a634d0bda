use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Classified value of one `(gene, genotype, cell type, cluster)` cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Numeric(f64),
    NotSignificant,
    NoData,
}

impl CellValue {
    pub fn numeric(&self) -> Option<f64> {
        match self {
            CellValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_masked(&self) -> bool {
        !matches!(self, CellValue::Numeric(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneInfo {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

/// Cluster id -> value. Only `Numeric` and `NotSignificant` are stored; an
/// absent key is no-data.
pub type ClusterValues = BTreeMap<String, CellValue>;

/// Cell type -> clusters.
pub type CellTypeValues = BTreeMap<String, ClusterValues>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneNode {
    pub info: Option<GeneInfo>,
    pub genotypes: BTreeMap<String, CellTypeValues>,
}

/// One timepoint worth of `group -> gene -> genotype -> cell type -> cluster`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetTree {
    pub groups: BTreeMap<String, BTreeMap<String, GeneNode>>,
}

impl FacetTree {
    pub fn gene(&self, group: &str, gene: &str) -> Option<&GeneNode> {
        self.groups.get(group)?.get(gene)
    }

    pub fn clusters(
        &self,
        group: &str,
        gene: &str,
        genotype: &str,
        cell_type: &str,
    ) -> Option<&ClusterValues> {
        self.gene(group, gene)?.genotypes.get(genotype)?.get(cell_type)
    }

    pub fn lookup(
        &self,
        group: &str,
        gene: &str,
        genotype: &str,
        cell_type: &str,
        cluster: &str,
    ) -> CellValue {
        self.clusters(group, gene, genotype, cell_type)
            .and_then(|clusters| clusters.get(cluster))
            .copied()
            .unwrap_or(CellValue::NoData)
    }

    pub fn n_values(&self) -> usize {
        let mut n = 0usize;
        for genes in self.groups.values() {
            for node in genes.values() {
                for cell_types in node.genotypes.values() {
                    for clusters in cell_types.values() {
                        n += clusters.len();
                    }
                }
            }
        }
        n
    }
}

/// Largest absolute numeric value; masked cells never take part.
pub fn max_abs<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let mut out: Option<f64> = None;
    for value in values {
        if let Some(v) = value.numeric() {
            let a = v.abs();
            out = Some(match out {
                Some(cur) if cur >= a => cur,
                _ => a,
            });
        }
    }
    out
}
