use std::{collections::BTreeMap, io::Write, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;

use crate::hits::ALL_BUGS;

/// Per pathway values (abundance or coverage) for one organism
#[derive(Debug, Clone)]
pub struct BugResult {
    bug: String,
    values: BTreeMap<String, f64>,
}

impl BugResult {
    pub fn new(bug: &str) -> Self {
        Self {
            bug: bug.to_owned(),
            values: BTreeMap::new(),
        }
    }

    pub fn bug(&self) -> &str {
        &self.bug
    }

    pub fn insert(&mut self, pathway: &str, x: f64) {
        self.values.insert(pathway.to_owned(), x);
    }

    pub fn get(&self, pathway: &str) -> Option<f64> {
        self.values.get(pathway).copied()
    }

    pub fn remove(&mut self, pathway: &str) -> Option<f64> {
        self.values.remove(pathway)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate over (pathway, value) in pathway order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(p, x)| (p.as_str(), *x))
    }
}

/// Write the table for one metric.
///
/// For each pathway of the aggregate over all organisms there is a line with the aggregate
/// value, followed by a line for each organism with the pathway, labelled
/// `pathway<category delimiter>organism`.  Only positive values are written
pub fn write_table<W: Write>(
    wrt: &mut W,
    results: &[BugResult],
    header: &str,
    category_delimiter: &str,
) -> anyhow::Result<()> {
    let mut all = None;
    let mut bugs: Vec<&BugResult> = Vec::with_capacity(results.len());
    for r in results.iter() {
        trace!("{} {} values for {}", r.len(), header, r.bug());
        if r.bug() == ALL_BUGS {
            all = Some(r)
        } else {
            bugs.push(r)
        }
    }
    bugs.sort_unstable_by(|a, b| a.bug().cmp(b.bug()));

    writeln!(wrt, "Pathway\t{}", header)?;
    match all {
        Some(all) => {
            for (pathway, x) in all.iter() {
                if x > 0.0 {
                    writeln!(wrt, "{}\t{}", pathway, x)?
                }
                for b in bugs.iter() {
                    if let Some(y) = b.get(pathway).filter(|y| *y > 0.0) {
                        writeln!(
                            wrt,
                            "{}{}{}\t{}",
                            pathway,
                            category_delimiter,
                            b.bug(),
                            y
                        )?
                    }
                }
            }
        }
        None => warn!("No results for {}; {} table is empty", ALL_BUGS, header),
    }
    Ok(())
}

pub fn output_table(
    path: &Path,
    results: &[BugResult],
    header: &str,
    category_delimiter: &str,
) -> anyhow::Result<()> {
    info!("Writing pathway {} to {}", header.to_lowercase(), path.display());
    let mut wrt = CompressIo::new()
        .path(path)
        .bufwriter()
        .with_context(|| format!("Failed to open output file {}", path.display()))?;
    write_table(&mut wrt, results, header, category_delimiter)
        .with_context(|| format!("Error writing to {}", path.display()))?;
    wrt.flush()
        .with_context(|| format!("Error writing to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(bug: &str, values: &[(&str, f64)]) -> BugResult {
        let mut res = BugResult::new(bug);
        for (p, x) in values {
            res.insert(p, *x)
        }
        res
    }

    fn table(results: &[BugResult]) -> String {
        let mut wrt = Vec::new();
        write_table(&mut wrt, results, "Abundance", "|").unwrap();
        String::from_utf8(wrt).unwrap()
    }

    #[test]
    fn rows_follow_aggregate_and_skip_non_positive() {
        let results = vec![
            result("ecoli", &[("PWY-1", 2.0), ("PWY-2", 0.0), ("PWY-4", 9.0)]),
            result(ALL_BUGS, &[("PWY-1", 3.0), ("PWY-2", 1.5), ("PWY-3", 0.0)]),
            result("bsub", &[("PWY-1", 1.0), ("PWY-2", -1.0), ("PWY-3", 0.5)]),
        ];
        let expected = "Pathway\tAbundance\n\
                        PWY-1\t3\n\
                        PWY-1|bsub\t1\n\
                        PWY-1|ecoli\t2\n\
                        PWY-2\t1.5\n\
                        PWY-3|bsub\t0.5\n";
        assert_eq!(table(&results), expected);
    }

    #[test]
    fn aggregate_row_written_without_organisms() {
        let results = vec![result(ALL_BUGS, &[("PWY-1", 0.25)])];
        assert_eq!(table(&results), "Pathway\tAbundance\nPWY-1\t0.25\n");
    }

    #[test]
    fn missing_aggregate_gives_header_only() {
        let results = vec![result("ecoli", &[("PWY-1", 1.0)])];
        assert_eq!(table(&results), "Pathway\tAbundance\n");
    }

    #[test]
    fn table_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("pathcoverage.tsv");
        let results = vec![result(ALL_BUGS, &[("PWY-1", 1.0)])];
        output_table(&p, &results, "Coverage", "|").unwrap();
        let s = std::fs::read_to_string(&p).unwrap();
        assert_eq!(s, "Pathway\tCoverage\nPWY-1\t1\n");
    }
}
