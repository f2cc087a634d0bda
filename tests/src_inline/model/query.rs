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
fn test_full_url_is_parsed() {
    let (facets, settings) = setup();
    let out = Selection::from_query(
        "https://example.org/dash?organelle=SPD&genes=G3,G1&genotypes=mutant&cellTypes=CT1%2CCT2&tpRange=1,1#top",
        &facets,
        &settings,
    );
    assert!(out.warnings.is_empty());
    let sel = out.selection;
    assert_eq!(sel.group.as_deref(), Some("SPD"));
    assert_eq!(sel.genes, strings(&["G3", "G1"]));
    assert_eq!(sel.genotypes, strings(&["mutant"]));
    assert_eq!(sel.cell_types, strings(&["CT1", "CT2"]));
    assert_eq!(sel.tp_range, Some((1.0, 1.0)));
}

#[test]
fn test_missing_params_fall_back_to_defaults() {
    let (facets, settings) = setup();
    let out = Selection::from_query("", &facets, &settings);
    assert!(out.warnings.is_empty());
    assert_eq!(out.selection, Selection::defaults(&facets));
}

#[test]
fn test_invalid_params_fall_back_with_warnings() {
    let (facets, settings) = setup();
    let out = Selection::from_query(
        "?organelle=Golgi&genes=G1&genotypes=alien&tpRange=abc",
        &facets,
        &settings,
    );
    // Golgi is unknown so the first group (ER) is used, and G1 is not in ER.
    assert_eq!(out.selection.group.as_deref(), Some("ER"));
    assert_eq!(out.selection.genes, strings(&["E1"]));
    assert_eq!(out.selection.genotypes, facets.genotypes);
    assert_eq!(out.selection.tp_range, Some((1.0, 3.0)));
    assert_eq!(out.warnings.len(), 4);
}

#[test]
fn test_gene_list_alias_and_truncation() {
    let (facets, mut settings) = setup();
    settings.gene_limit = 2;
    let out = Selection::from_query("geneList=SPD&genes=G1,G2,G3", &facets, &settings);
    assert_eq!(out.selection.group.as_deref(), Some("SPD"));
    assert_eq!(out.selection.genes, strings(&["G1", "G2"]));
    assert_eq!(
        out.warnings,
        vec![SelectionWarning::GeneLimit {
            limit: 2,
            requested: 3
        }]
    );
}

#[test]
fn test_query_round_trip() {
    let (facets, settings) = setup();
    let sel = Selection {
        group: Some("SPD".to_string()),
        genes: strings(&["G2", "G1"]),
        genotypes: strings(&["wild type"]),
        cell_types: strings(&["CT2", "CT1"]),
        tp_range: Some((0.5, 3.0)),
    };
    let query = sel.to_query();
    assert!(query.contains("organelle=SPD"));
    let back = Selection::from_query(&query, &facets, &settings);
    assert!(back.warnings.is_empty());
    assert_eq!(back.selection, sel);
}
