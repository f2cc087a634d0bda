pub mod search;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::input::Dataset;
use crate::input::timepoint::Timepoint;
use crate::model::tree::GeneInfo;

/// Option lists for every filter control, deduplicated and sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    pub groups: Vec<String>,
    pub genes_by_group: BTreeMap<String, Vec<String>>,
    pub cell_types: Vec<String>,
    pub genotypes: Vec<String>,
    pub gene_info: BTreeMap<String, GeneInfo>,
    pub timepoints: Vec<Timepoint>,
}

impl Facets {
    pub fn gene_options(&self, group: &str) -> &[String] {
        self.genes_by_group
            .get(group)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.genes_by_group.contains_key(group)
    }

    pub fn timepoint_bounds(&self) -> Option<(f64, f64)> {
        let first = self.timepoints.first()?;
        let last = self.timepoints.last()?;
        Some((first.value, last.value))
    }

    pub fn gene_name(&self, gene: &str) -> Option<&str> {
        self.gene_info.get(gene)?.name.as_deref()
    }

    pub fn gene_description(&self, gene: &str) -> Option<&str> {
        self.gene_info.get(gene)?.description.as_deref()
    }
}

pub fn extract_facets(dataset: &Dataset) -> Facets {
    let mut groups: BTreeSet<String> = BTreeSet::new();
    let mut genes_by_group: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut cell_types: BTreeSet<String> = BTreeSet::new();
    let mut genotypes: BTreeSet<String> = BTreeSet::new();
    let mut gene_info: BTreeMap<String, GeneInfo> = BTreeMap::new();

    // Timepoint order decides which timepoint's gene info wins.
    for tp in &dataset.timepoints {
        let Some(tree) = dataset.tree(&tp.label) else {
            continue;
        };
        for (group, genes) in &tree.groups {
            groups.insert(group.clone());
            let group_genes = genes_by_group.entry(group.clone()).or_default();
            for (gene, node) in genes {
                group_genes.insert(gene.clone());
                if let Some(info) = &node.info {
                    gene_info
                        .entry(gene.clone())
                        .or_insert_with(|| info.clone());
                }
                for (genotype, by_cell_type) in &node.genotypes {
                    genotypes.insert(genotype.clone());
                    for cell_type in by_cell_type.keys() {
                        cell_types.insert(cell_type.clone());
                    }
                }
            }
        }
    }

    Facets {
        groups: groups.into_iter().collect(),
        genes_by_group: genes_by_group
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
        cell_types: cell_types.into_iter().collect(),
        genotypes: genotypes.into_iter().collect(),
        gene_info,
        timepoints: dataset.timepoints.clone(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/facets/tests.rs"]
mod tests;
