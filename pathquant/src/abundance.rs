use crate::{
    database::PathwaysDatabase,
    report::BugResult,
    store::{completed_scores, PathwayStore},
};

/// Pathway abundance for one organism
///
/// After filling in zeros for the pathway reactions that were not found, the abundance
/// of a pathway is the mean of the upper half of its sorted reaction scores
pub fn pathway_abundance(store: &PathwayStore, pdb: &PathwaysDatabase) -> BugResult {
    debug!("Compute pathway abundance for {}", store.bug());
    let mut res = BugResult::new(store.bug());
    for (pathway, scores) in store.items() {
        let mut v = completed_scores(pathway, scores, pdb);
        if let Some(a) = utils::upper_half_mean(&mut v) {
            res.insert(pathway, a)
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Id;
    use approx::assert_abs_diff_eq;

    #[test]
    fn upper_half_of_zero_filled_scores() {
        let input = "PWY-1\tRXN-1\tRXN-2\tRXN-3\tRXN-4\n\
                     PWY-2\tRXN-1\tRXN-5\tRXN-6\n";
        let pdb = PathwaysDatabase::from_reader(&mut input.as_bytes(), "test").unwrap();
        let mut store = PathwayStore::new("ecoli");
        store.add(&Id::from("RXN-3"), "PWY-1", 4.0);
        store.add(&Id::from("RXN-4"), "PWY-1", 8.0);
        store.add(&Id::from("RXN-1"), "PWY-2", 3.0);
        store.add(&Id::from("RXN-5"), "PWY-2", 1.0);
        let res = pathway_abundance(&store, &pdb);
        assert_eq!(res.bug(), "ecoli");
        // [0, 0, 4, 8] -> mean of [4, 8]
        assert_abs_diff_eq!(res.get("PWY-1").unwrap(), 6.0);
        // [0, 1, 3] -> mean of [1, 3]
        assert_abs_diff_eq!(res.get("PWY-2").unwrap(), 2.0);
    }

    #[test]
    fn pathway_unknown_to_database_uses_stored_scores() {
        let pdb = PathwaysDatabase::from_reader(&mut "".as_bytes(), "test").unwrap();
        let mut store = PathwayStore::new("all");
        store.add(&Id::from("RXN-1"), "PWY-X", 5.0);
        let res = pathway_abundance(&store, &pdb);
        assert_abs_diff_eq!(res.get("PWY-X").unwrap(), 5.0);
    }
}
