use super::*;
use crate::facets::extract_facets;
use crate::fixtures::{fixture_dataset, strings};

fn setup() -> (Facets, DashboardSettings) {
    (
        extract_facets(&fixture_dataset()),
        DashboardSettings::default_v1(),
    )
}

#[test]
fn test_defaults() {
    let (facets, _) = setup();
    let sel = Selection::defaults(&facets);
    assert_eq!(sel.group.as_deref(), Some("ER"));
    assert_eq!(sel.genes, strings(&["E1"]));
    assert_eq!(sel.genotypes, strings(&["mutant", "wild type"]));
    assert_eq!(sel.cell_types, strings(&["CT1", "CT2", "CT3"]));
    assert_eq!(sel.tp_range, Some((1.0, 3.0)));
}

#[test]
fn test_select_group_clears_genes_and_scopes_options() {
    let (facets, settings) = setup();
    let sel = Selection::defaults(&facets);
    assert!(!sel.genes.is_empty());

    let t = sel.apply(SelectionAction::SelectGroup("SPD".to_string()), &facets, &settings);
    assert!(t.warning.is_none());
    assert_eq!(t.selection.group.as_deref(), Some("SPD"));
    assert!(t.selection.genes.is_empty());
    assert_eq!(
        facets.gene_options("SPD"),
        strings(&["G1", "G2", "G3"]).as_slice()
    );
    // The previous record is untouched.
    assert_eq!(sel.genes, strings(&["E1"]));
}

#[test]
fn test_add_gene_respects_limit_with_warning() {
    let (facets, mut settings) = setup();
    settings.gene_limit = 2;
    let sel = Selection::defaults(&facets)
        .apply(SelectionAction::SelectGroup("SPD".to_string()), &facets, &settings)
        .selection;

    let sel = sel
        .apply(SelectionAction::AddGene("G2".to_string()), &facets, &settings)
        .selection;
    let sel = sel
        .apply(SelectionAction::AddGene("G1".to_string()), &facets, &settings)
        .selection;
    assert_eq!(sel.genes, strings(&["G2", "G1"]));

    let t = sel.apply(SelectionAction::AddGene("G3".to_string()), &facets, &settings);
    assert_eq!(
        t.warning,
        Some(SelectionWarning::GeneLimit {
            limit: 2,
            requested: 3
        })
    );
    assert_eq!(t.selection, sel);

    let again = sel.apply(SelectionAction::AddGene("G1".to_string()), &facets, &settings);
    assert!(again.warning.is_none());
    assert_eq!(again.selection.genes, strings(&["G2", "G1"]));
}

#[test]
fn test_set_genes_over_limit_rejected() {
    let (facets, mut settings) = setup();
    settings.gene_limit = 1;
    let sel = Selection::defaults(&facets)
        .apply(SelectionAction::SelectGroup("SPD".to_string()), &facets, &settings)
        .selection;
    let t = sel.apply(
        SelectionAction::SetGenes(strings(&["G1", "G2"])),
        &facets,
        &settings,
    );
    assert!(matches!(t.warning, Some(SelectionWarning::GeneLimit { .. })));
    assert!(t.selection.genes.is_empty());
}

#[test]
fn test_gene_outside_group_rejected() {
    let (facets, settings) = setup();
    let sel = Selection::defaults(&facets);
    let t = sel.apply(SelectionAction::AddGene("G1".to_string()), &facets, &settings);
    assert_eq!(
        t.warning,
        Some(SelectionWarning::UnknownOption {
            kind: "gene",
            value: "G1".to_string()
        })
    );
    assert_eq!(t.selection, sel);
}

#[test]
fn test_set_lists_dedup_and_keep_order() {
    let (facets, settings) = setup();
    let sel = Selection::defaults(&facets);
    let t = sel.apply(
        SelectionAction::SetGenotypes(strings(&["wild type", "mutant", "wild type"])),
        &facets,
        &settings,
    );
    assert_eq!(t.selection.genotypes, strings(&["wild type", "mutant"]));

    let t = t.selection.apply(
        SelectionAction::SetCellTypes(strings(&["CT9"])),
        &facets,
        &settings,
    );
    assert!(t.warning.is_some());
    assert_eq!(t.selection.cell_types, strings(&["CT1", "CT2", "CT3"]));
}

#[test]
fn test_range_and_timepoint_filter() {
    let (facets, settings) = setup();
    let sel = Selection::defaults(&facets);
    let t = sel.apply(SelectionAction::SetTimepointRange(3.0, 2.0), &facets, &settings);
    assert_eq!(t.selection.tp_range, Some((2.0, 3.0)));
    let in_range = t.selection.timepoints_in_range(&facets.timepoints);
    assert_eq!(in_range.len(), 1);
    assert_eq!(in_range[0].label, "3h");

    let bad = sel.apply(
        SelectionAction::SetTimepointRange(f64::NAN, 1.0),
        &facets,
        &settings,
    );
    assert_eq!(bad.warning, Some(SelectionWarning::InvalidRange));
}

#[test]
fn test_remove_and_reset() {
    let (facets, settings) = setup();
    let sel = Selection::defaults(&facets);
    let t = sel.apply(SelectionAction::RemoveGene("E1".to_string()), &facets, &settings);
    assert!(t.selection.genes.is_empty());
    assert!(t.selection.is_empty());
    let reset = t.selection.apply(SelectionAction::Reset, &facets, &settings);
    assert_eq!(reset.selection, Selection::defaults(&facets));
}
