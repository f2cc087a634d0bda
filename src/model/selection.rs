use std::fmt;

use serde::Serialize;

use crate::facets::Facets;
use crate::input::timepoint::Timepoint;
use crate::model::settings::DashboardSettings;

/// The active filter state. Never mutated in place; every change goes
/// through [`Selection::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub group: Option<String>,
    pub genes: Vec<String>,
    pub genotypes: Vec<String>,
    pub cell_types: Vec<String>,
    pub tp_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionAction {
    SelectGroup(String),
    AddGene(String),
    RemoveGene(String),
    SetGenes(Vec<String>),
    SetGenotypes(Vec<String>),
    SetCellTypes(Vec<String>),
    SetTimepointRange(f64, f64),
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionWarning {
    GeneLimit { limit: usize, requested: usize },
    UnknownOption { kind: &'static str, value: String },
    NoGroupSelected,
    InvalidRange,
}

impl fmt::Display for SelectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionWarning::GeneLimit { limit, requested } => write!(
                f,
                "at most {limit} genes can be selected ({requested} requested)"
            ),
            SelectionWarning::UnknownOption { kind, value } => {
                write!(f, "unknown {kind}: {value}")
            }
            SelectionWarning::NoGroupSelected => write!(f, "select an organelle/gene list first"),
            SelectionWarning::InvalidRange => write!(f, "timepoint range must be two finite numbers"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub selection: Selection,
    pub warning: Option<SelectionWarning>,
}

impl Transition {
    fn accepted(selection: Selection) -> Self {
        Self {
            selection,
            warning: None,
        }
    }

    fn rejected(previous: &Selection, warning: SelectionWarning) -> Self {
        Self {
            selection: previous.clone(),
            warning: Some(warning),
        }
    }
}

impl Selection {
    /// First group, its first gene, every genotype and cell type, full range.
    pub fn defaults(facets: &Facets) -> Self {
        let group = facets.groups.first().cloned();
        let genes = group
            .as_deref()
            .and_then(|g| facets.gene_options(g).first().cloned())
            .into_iter()
            .collect();
        Self {
            group,
            genes,
            genotypes: facets.genotypes.clone(),
            cell_types: facets.cell_types.clone(),
            tp_range: facets.timepoint_bounds(),
        }
    }

    pub fn apply(
        &self,
        action: SelectionAction,
        facets: &Facets,
        settings: &DashboardSettings,
    ) -> Transition {
        match action {
            SelectionAction::SelectGroup(group) => {
                if !facets.has_group(&group) {
                    return Transition::rejected(
                        self,
                        SelectionWarning::UnknownOption {
                            kind: "organelle/gene list",
                            value: group,
                        },
                    );
                }
                let mut next = self.clone();
                next.group = Some(group);
                next.genes.clear();
                Transition::accepted(next)
            }
            SelectionAction::AddGene(gene) => {
                let Some(group) = self.group.as_deref() else {
                    return Transition::rejected(self, SelectionWarning::NoGroupSelected);
                };
                if !facets.gene_options(group).contains(&gene) {
                    return Transition::rejected(
                        self,
                        SelectionWarning::UnknownOption { kind: "gene", value: gene },
                    );
                }
                if self.genes.contains(&gene) {
                    return Transition::accepted(self.clone());
                }
                if self.genes.len() >= settings.gene_limit {
                    return Transition::rejected(
                        self,
                        SelectionWarning::GeneLimit {
                            limit: settings.gene_limit,
                            requested: self.genes.len() + 1,
                        },
                    );
                }
                let mut next = self.clone();
                next.genes.push(gene);
                Transition::accepted(next)
            }
            SelectionAction::RemoveGene(gene) => {
                let mut next = self.clone();
                next.genes.retain(|g| *g != gene);
                Transition::accepted(next)
            }
            SelectionAction::SetGenes(genes) => {
                let Some(group) = self.group.as_deref() else {
                    return Transition::rejected(self, SelectionWarning::NoGroupSelected);
                };
                let genes = dedup_ordered(genes);
                if let Some(unknown) = first_unknown(&genes, facets.gene_options(group)) {
                    return Transition::rejected(
                        self,
                        SelectionWarning::UnknownOption {
                            kind: "gene",
                            value: unknown,
                        },
                    );
                }
                if genes.len() > settings.gene_limit {
                    return Transition::rejected(
                        self,
                        SelectionWarning::GeneLimit {
                            limit: settings.gene_limit,
                            requested: genes.len(),
                        },
                    );
                }
                let mut next = self.clone();
                next.genes = genes;
                Transition::accepted(next)
            }
            SelectionAction::SetGenotypes(genotypes) => {
                let genotypes = dedup_ordered(genotypes);
                if let Some(unknown) = first_unknown(&genotypes, &facets.genotypes) {
                    return Transition::rejected(
                        self,
                        SelectionWarning::UnknownOption {
                            kind: "genotype",
                            value: unknown,
                        },
                    );
                }
                let mut next = self.clone();
                next.genotypes = genotypes;
                Transition::accepted(next)
            }
            SelectionAction::SetCellTypes(cell_types) => {
                let cell_types = dedup_ordered(cell_types);
                if let Some(unknown) = first_unknown(&cell_types, &facets.cell_types) {
                    return Transition::rejected(
                        self,
                        SelectionWarning::UnknownOption {
                            kind: "cell type",
                            value: unknown,
                        },
                    );
                }
                let mut next = self.clone();
                next.cell_types = cell_types;
                Transition::accepted(next)
            }
            SelectionAction::SetTimepointRange(lo, hi) => {
                if !lo.is_finite() || !hi.is_finite() {
                    return Transition::rejected(self, SelectionWarning::InvalidRange);
                }
                let mut next = self.clone();
                next.tp_range = Some(if lo <= hi { (lo, hi) } else { (hi, lo) });
                Transition::accepted(next)
            }
            SelectionAction::Reset => Transition::accepted(Self::defaults(facets)),
        }
    }

    /// True when nothing can be rendered.
    pub fn is_empty(&self) -> bool {
        self.group.is_none()
            || self.genes.is_empty()
            || self.genotypes.is_empty()
            || self.cell_types.is_empty()
    }

    pub fn timepoints_in_range<'a>(&self, timepoints: &'a [Timepoint]) -> Vec<&'a Timepoint> {
        match self.tp_range {
            Some((lo, hi)) => timepoints.iter().filter(|t| t.in_range(lo, hi)).collect(),
            None => timepoints.iter().collect(),
        }
    }
}

pub fn dedup_ordered(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        let v = v.trim().to_string();
        if !v.is_empty() && !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

fn first_unknown(values: &[String], options: &[String]) -> Option<String> {
    values.iter().find(|v| !options.contains(v)).cloned()
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/selection.rs"]
mod tests;
