use std::cmp::Ordering;

use serde::Serialize;

use crate::facets::Facets;

pub const DEFAULT_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub gene: String,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub score: f64,
}

/// Fuzzy lookup over gene ids and display names of one group. Score 0 is an
/// exact (case-insensitive) substring match; hits above `threshold` are dropped.
pub fn search_genes(facets: &Facets, group: &str, query: &str, threshold: f64) -> Vec<SearchHit> {
    let q = query.trim().to_lowercase();
    let mut hits = Vec::new();
    for gene in facets.gene_options(group) {
        let name = facets.gene_name(gene);
        let score = if q.is_empty() {
            0.0
        } else {
            let by_id = substring_score(&q, &gene.to_lowercase());
            match name {
                Some(n) => by_id.min(substring_score(&q, &n.to_lowercase())),
                None => by_id,
            }
        };
        if score <= threshold {
            hits.push(SearchHit {
                gene: gene.clone(),
                name: name.map(|n| n.to_string()),
                description: facets.gene_description(gene).map(|d| d.to_string()),
                score,
            });
        }
    }
    hits.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.gene.cmp(&b.gene))
    });
    hits
}

/// Smallest edit distance between `pattern` and any substring of `text`,
/// divided by the pattern length.
pub fn substring_score(pattern: &str, text: &str) -> f64 {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    if p.is_empty() {
        return 0.0;
    }

    // Row 0 is all zeros so a match may start anywhere in `text`.
    let mut prev = vec![0usize; t.len() + 1];
    let mut cur = vec![0usize; t.len() + 1];
    for i in 1..=p.len() {
        cur[0] = i;
        for j in 1..=t.len() {
            let cost = usize::from(p[i - 1] != t[j - 1]);
            cur[j] = (prev[j - 1] + cost).min(prev[j] + 1).min(cur[j - 1] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    let best = prev.iter().copied().min().unwrap_or(p.len());
    best as f64 / p.len() as f64
}

#[cfg(test)]
#[path = "../../tests/src_inline/facets/search.rs"]
mod tests;
