use std::collections::HashMap;

use crate::{
    database::{Id, ReactionsDatabase},
    hits::Hit,
};

/// Gene -> relative abundance
pub type GeneScores = HashMap<Id, f64>;

/// (reaction, abundance) pairs, in reaction order.  All abundances are > 0
pub type ReactionScores = Vec<(Id, f64)>;

/// Aggregate the hits of one organism into gene scores.
///
/// Each query distributes a total weight of 1 across the known genes it hits,
/// proportionally to exp(-evalue).  Hits to genes not in the database are ignored,
/// as are queries whose total weight is zero (or not finite).
pub fn gene_scores(hits: &[Hit], rdb: &ReactionsDatabase) -> GeneScores {
    let mut by_query: HashMap<&str, Vec<&Hit>> = HashMap::new();
    for h in hits.iter() {
        by_query.entry(h.query()).or_default().push(h)
    }
    trace!("Total reads mapped: {}", by_query.len());

    let mut scores = GeneScores::new();
    for (query, v) in by_query.iter() {
        let genes: Vec<_> = v
            .iter()
            .filter(|h| rdb.gene_present(h.reference()))
            .map(|h| (h.reference(), (-h.evalue()).exp()))
            .collect();
        if genes.is_empty() {
            continue;
        }
        let total: f64 = genes.iter().map(|(_, w)| w).sum();
        if !(total > 0.0 && total.is_finite()) {
            debug!("Skipping query {} with total hit weight {}", query, total);
            continue;
        }
        for (g, w) in genes {
            // Key on the database's id so the allocation is shared
            let gene = rdb
                .gene_id(g)
                .cloned()
                .unwrap_or_else(|| Id::from(g));
            *scores.entry(gene).or_insert(0.0) += w / total;
        }
    }
    scores
}

/// Convert gene scores to reaction scores.  The abundance of a reaction is the sum of the
/// scores of its genes; only reactions with a positive abundance are returned
pub fn reaction_scores(genes: &GeneScores, rdb: &ReactionsDatabase) -> ReactionScores {
    rdb.list_reactions()
        .filter_map(|r| {
            let abundance: f64 = rdb
                .find_genes(r)
                .iter()
                .map(|g| genes.get(g).copied().unwrap_or(0.0))
                .sum();
            if abundance > 0.0 {
                Some((r.clone(), abundance))
            } else {
                None
            }
        })
        .collect()
}
