use std::fs;

use anyhow::Context;

use crate::{
    abundance::pathway_abundance,
    config::Config,
    coverage::{coverage_for_bug, PruneParams, SignificanceTest, Xipe},
    database::{PathwaysDatabase, ReactionsDatabase},
    hits::{read_hits_file, Hit, HitStore},
    pool::run_pool,
    report::{output_table, BugResult},
    scoring::{gene_scores, reaction_scores},
    solver::{assign_pathways, MinPath, PathwaySolver},
    store::PathwayStore,
};

/// Identify the reactions and pathways for one organism
pub fn pathways_for_bug<S: PathwaySolver + ?Sized>(
    bug: &str,
    hits: &[Hit],
    rdb: &ReactionsDatabase,
    solver: &S,
) -> anyhow::Result<PathwayStore> {
    debug!("Identify reactions for {}", bug);
    let genes = gene_scores(hits, rdb);
    let reactions = reaction_scores(&genes, rdb);
    debug!(
        "{}: {} hits, {} genes, {} reactions",
        bug,
        hits.len(),
        genes.len(),
        reactions.len()
    );
    let pathways = assign_pathways(solver, &reactions)
        .with_context(|| format!("Pathway assignment failed for {}", bug))?;
    let store = PathwayStore::from_reactions(bug, &reactions, &pathways);
    if store.is_empty() {
        debug!("{}: no pathways found", bug)
    } else {
        debug!("{}: {} pathways", bug, store.len())
    }
    Ok(store)
}

/// Collect successful results from the pool.  Failures abort if strict is set,
/// otherwise they are logged and the organism is dropped
fn collect_results<T>(
    res: Vec<(String, anyhow::Result<T>)>,
    strict: bool,
    stage: &str,
) -> anyhow::Result<Vec<T>> {
    let mut v = Vec::with_capacity(res.len());
    for (bug, r) in res {
        match r {
            Ok(x) => v.push(x),
            Err(e) if strict => return Err(e.context(format!("{} failed for {}", stage, bug))),
            Err(e) => error!("{} failed for {}: {:#}", stage, bug, e),
        }
    }
    Ok(v)
}

pub fn pathway_stores<S: PathwaySolver + ?Sized>(
    nt: usize,
    hits: &HitStore,
    rdb: &ReactionsDatabase,
    solver: &S,
    strict: bool,
) -> anyhow::Result<Vec<PathwayStore>> {
    let jobs: Vec<&str> = hits.bug_list().collect();
    info!("Identifying pathways for {} organisms", jobs.len());
    let res = run_pool(nt, jobs, |bug| {
        (
            bug.to_owned(),
            pathways_for_bug(bug, hits.hits_for_bug(bug), rdb, solver),
        )
    })?;
    collect_results(res, strict, "Pathway identification")
}

pub fn pathway_abundances(
    nt: usize,
    stores: &[PathwayStore],
    pdb: &PathwaysDatabase,
) -> anyhow::Result<Vec<BugResult>> {
    info!("Computing pathway abundance");
    run_pool(nt, stores.iter().collect(), |s: &PathwayStore| {
        pathway_abundance(s, pdb)
    })
}

pub fn pathway_coverages<T: SignificanceTest + ?Sized>(
    nt: usize,
    stores: &[PathwayStore],
    pdb: &PathwaysDatabase,
    test: &T,
    params: &PruneParams,
    strict: bool,
) -> anyhow::Result<Vec<BugResult>> {
    info!("Computing pathway coverage");
    let res = run_pool(nt, stores.iter().collect(), |s: &PathwayStore| {
        (
            s.bug().to_owned(),
            coverage_for_bug(s, pdb, test, params),
        )
    })?;
    collect_results(res, strict, "Pathway coverage")
}

fn setup_output(cfg: &Config) -> anyhow::Result<()> {
    if let Some(d) = cfg.output_dir() {
        if !d.exists() {
            fs::create_dir_all(d)
                .with_context(|| format!("Error creating output directory {}", d.display()))?;
        }
    }
    Ok(())
}

/// Strategy
///
/// Load the reference databases once; these are shared read only by all workers.
/// Then, in a first pass over the worker pool, go from hits to pathway stores for each
/// organism (including the aggregate over all organisms).  The stores are then used for
/// a pass computing abundance and a pass computing coverage, and the results for each
/// are written out
pub fn process_hits(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");
    setup_output(cfg)?;

    let rdb = ReactionsDatabase::from_file(cfg.gene_reactions())
        .with_context(|| "Could not read gene to reaction mapping")?;
    let pdb = PathwaysDatabase::from_file(cfg.reactions_pathways())
        .with_context(|| "Could not read pathway to reaction mapping")?;
    info!("Loaded {} pathways", pdb.n_pathways());
    let hits = read_hits_file(cfg.hits_file()).with_context(|| "Could not read hits file")?;
    if hits.is_empty() {
        warn!("No alignment hits found in {}", cfg.hits_file().display())
    }

    let solver = MinPath::new(
        cfg.minpath(),
        cfg.reactions_pathways(),
        cfg.tmp_dir(),
        cfg.details_format().clone(),
    );
    let stores = pathway_stores(cfg.threads(), &hits, &rdb, &solver, cfg.strict())?;
    // Hits are no longer needed
    drop(hits);

    let abundance = pathway_abundances(cfg.threads(), &stores, &pdb)?;
    output_table(
        &cfg.abundance_path(),
        &abundance,
        "Abundance",
        cfg.category_delimiter(),
    )?;

    let xipe = Xipe::new(cfg.xipe(), cfg.xipe_percent());
    let coverage = pathway_coverages(
        cfg.threads(),
        &stores,
        &pdb,
        &xipe,
        cfg.prune(),
        cfg.strict(),
    )?;
    output_table(
        &cfg.coverage_path(),
        &coverage,
        "Coverage",
        cfg.category_delimiter(),
    )?;

    debug!("Processing complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        coverage::SignificanceOutput, database::Id, hits::ALL_BUGS, report::write_table,
        solver::PathwayMap,
    };

    const GENE_REACTIONS: &str = "RXN-1\tgA\nRXN-2\tgB\nRXN-3\tgC\n";
    const PATHWAYS: &str = "PWY-1\tRXN-1\tRXN-2\nPWY-2\tRXN-3\tRXN-4\n";

    /// Assigns each reaction to every pathway containing it
    struct TableSolver {
        pathways: Vec<(&'static str, Vec<&'static str>)>,
        fail_on: Option<&'static str>,
    }

    impl TableSolver {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                pathways: vec![
                    ("PWY-1", vec!["RXN-1", "RXN-2"]),
                    ("PWY-2", vec!["RXN-3", "RXN-4"]),
                ],
                fail_on,
            }
        }
    }

    impl PathwaySolver for TableSolver {
        fn solve(&self, reactions: &[(Id, f64)]) -> anyhow::Result<PathwayMap> {
            let mut m = PathwayMap::new();
            for (r, _) in reactions {
                if Some(&**r) == self.fail_on {
                    return Err(anyhow!("solver failed on {}", r));
                }
                for (p, v) in self.pathways.iter() {
                    if v.iter().any(|x| *x == &**r) {
                        m.entry(r.to_string()).or_default().push(p.to_string())
                    }
                }
            }
            Ok(m)
        }
    }

    struct KeepAll;

    impl SignificanceTest for KeepAll {
        fn run(&self, _input: &str) -> anyhow::Result<SignificanceOutput> {
            Ok(SignificanceOutput::default())
        }
    }

    fn setup() -> (ReactionsDatabase, PathwaysDatabase, HitStore) {
        let rdb =
            ReactionsDatabase::from_reader(&mut GENE_REACTIONS.as_bytes(), "genes").unwrap();
        let pdb = PathwaysDatabase::from_reader(&mut PATHWAYS.as_bytes(), "pathways").unwrap();
        let mut hits = HitStore::default();
        hits.add(Hit::new("r1", "gA", 0.0), Some("ecoli"));
        hits.add(Hit::new("r2", "gA", 0.0), Some("ecoli"));
        hits.add(Hit::new("r3", "gB", 0.0), Some("ecoli"));
        hits.add(Hit::new("r4", "gC", 0.0), Some("bsub"));
        hits.add(Hit::new("r5", "gX", 0.0), Some("bsub"));
        (rdb, pdb, hits)
    }

    fn table(results: &[BugResult], header: &str) -> String {
        let mut wrt = Vec::new();
        write_table(&mut wrt, results, header, "|").unwrap();
        String::from_utf8(wrt).unwrap()
    }

    #[test]
    fn hits_to_tables() {
        let (rdb, pdb, hits) = setup();
        let stores = pathway_stores(2, &hits, &rdb, &TableSolver::new(None), true).unwrap();
        assert_eq!(stores.len(), 3);
        let all = stores.iter().find(|s| s.bug() == ALL_BUGS).unwrap();
        assert_eq!(all.len(), 2);

        let abundance = pathway_abundances(2, &stores, &pdb).unwrap();
        assert_eq!(
            table(&abundance, "Abundance"),
            "Pathway\tAbundance\nPWY-1\t2\nPWY-1|ecoli\t2\nPWY-2\t1\nPWY-2|bsub\t1\n"
        );

        let coverage = pathway_coverages(
            2,
            &stores,
            &pdb,
            &KeepAll,
            &PruneParams::new(0.9, 2),
            true,
        )
        .unwrap();
        assert_eq!(
            table(&coverage, "Coverage"),
            "Pathway\tCoverage\nPWY-1\t0.5\nPWY-1|ecoli\t0.5\n"
        );
    }

    #[test]
    fn organism_without_reactions_has_empty_store() {
        let (rdb, _, _) = setup();
        let hits = vec![Hit::new("r1", "gX", 0.0)];
        let store = pathways_for_bug("lost", &hits, &rdb, &TableSolver::new(Some("RXN-1")))
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn failures_are_isolated_to_organism() {
        let (rdb, _, hits) = setup();
        let solver = TableSolver::new(Some("RXN-3"));
        let stores = pathway_stores(3, &hits, &rdb, &solver, false).unwrap();
        // bsub and all both contain RXN-3
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].bug(), "ecoli");
        assert_eq!(stores[0].len(), 1);

        assert!(pathway_stores(3, &hits, &rdb, &solver, true).is_err());
    }
}
