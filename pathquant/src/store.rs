use std::collections::{BTreeMap, HashMap};

use crate::{
    database::{Id, PathwaysDatabase},
    solver::PathwayMap,
};

/// Reaction scores for each pathway found for one organism
#[derive(Debug)]
pub struct PathwayStore {
    bug: String,
    pathways: BTreeMap<String, HashMap<Id, f64>>,
}

impl PathwayStore {
    pub fn new(bug: &str) -> Self {
        Self {
            bug: bug.to_owned(),
            pathways: BTreeMap::new(),
        }
    }

    /// Build the store from the reaction abundances and the pathways assigned to each
    /// reaction.  Reactions without a pathway are dropped
    pub fn from_reactions(bug: &str, reactions: &[(Id, f64)], pathways: &PathwayMap) -> Self {
        let mut store = Self::new(bug);
        for (r, a) in reactions.iter() {
            for p in pathways
                .get(&**r)
                .into_iter()
                .flatten()
                .filter(|p| !p.is_empty())
            {
                store.add(r, p, *a)
            }
        }
        store
    }

    pub fn add(&mut self, reaction: &Id, pathway: &str, score: f64) {
        if let Some(h) = self.pathways.get_mut(pathway) {
            h.insert(reaction.clone(), score);
        } else {
            let mut h = HashMap::new();
            h.insert(reaction.clone(), score);
            self.pathways.insert(pathway.to_owned(), h);
        }
    }

    pub fn bug(&self) -> &str {
        &self.bug
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    /// Iterate over (pathway, reaction scores) in pathway order
    pub fn items(&self) -> impl Iterator<Item = (&str, &HashMap<Id, f64>)> {
        self.pathways.iter().map(|(p, h)| (p.as_str(), h))
    }

    /// Median over all stored (pathway, reaction) scores.  0 for an empty store
    pub fn median_score(&self) -> f64 {
        let mut v: Vec<f64> = self
            .pathways
            .values()
            .flat_map(|h| h.values().copied())
            .collect();
        utils::median(&mut v).unwrap_or(0.0)
    }
}

/// The scores of all reactions of a pathway: the stored scores plus a zero for each
/// reaction the database lists for the pathway that is not in the store
pub fn completed_scores(
    pathway: &str,
    scores: &HashMap<Id, f64>,
    pdb: &PathwaysDatabase,
) -> Vec<f64> {
    let mut v: Vec<f64> = scores.values().copied().collect();
    for r in pdb.find_reactions(pathway) {
        if !scores.contains_key(r) {
            v.push(0.0)
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_keeps_only_named_pathways() {
        let reactions = vec![
            (Id::from("RXN-1"), 2.0),
            (Id::from("RXN-2"), 4.0),
            (Id::from("RXN-3"), 8.0),
        ];
        let mut pm = PathwayMap::new();
        pm.insert("RXN-1".to_string(), vec!["PWY-1".to_string(), "PWY-2".to_string()]);
        pm.insert("RXN-2".to_string(), vec!["".to_string()]);
        pm.insert("RXN-9".to_string(), vec!["PWY-3".to_string()]);
        let store = PathwayStore::from_reactions("ecoli", &reactions, &pm);
        assert_eq!(store.bug(), "ecoli");
        assert_eq!(store.len(), 2);
        let items: Vec<_> = store.items().map(|(p, h)| (p, h.len())).collect();
        assert_eq!(items, vec![("PWY-1", 1), ("PWY-2", 1)]);
        assert_eq!(store.median_score(), 2.0);
    }

    #[test]
    fn median_over_all_entries() {
        let mut store = PathwayStore::new("all");
        assert_eq!(store.median_score(), 0.0);
        store.add(&Id::from("RXN-1"), "PWY-1", 1.0);
        store.add(&Id::from("RXN-2"), "PWY-1", 3.0);
        store.add(&Id::from("RXN-1"), "PWY-2", 1.0);
        store.add(&Id::from("RXN-3"), "PWY-2", 10.0);
        assert_eq!(store.median_score(), 2.0);
    }

    #[test]
    fn missing_reactions_are_zero_filled() {
        let input = "PWY-1\tRXN-1\tRXN-2\tRXN-3\n";
        let pdb = PathwaysDatabase::from_reader(&mut input.as_bytes(), "test").unwrap();
        let mut h = HashMap::new();
        h.insert(Id::from("RXN-2"), 5.0);
        h.insert(Id::from("RXN-7"), 1.0);
        let mut v = completed_scores("PWY-1", &h, &pdb);
        v.sort_unstable_by(|a, b| a.total_cmp(b));
        assert_eq!(v, vec![0.0, 0.0, 1.0, 5.0]);
    }
}
