use std::{
    collections::HashSet,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use anyhow::Context;

use crate::{
    database::PathwaysDatabase,
    report::BugResult,
    store::{completed_scores, PathwayStore},
};

/// Thresholds for keeping pathways that the significance test nominates for removal
#[derive(Debug, Clone, Copy)]
pub struct PruneParams {
    probability: f64,
    bin: i64,
}

impl PruneParams {
    pub fn new(probability: f64, bin: i64) -> Self {
        Self { probability, bin }
    }
}

/// Raw output streams of the significance test
///
/// detail - lines `pathway<TAB>(score, bin)`
/// excluded - lines `prefix<TAB>pathway` nominating pathways for removal
#[derive(Debug, Default)]
pub struct SignificanceOutput {
    pub detail: String,
    pub excluded: String,
}

pub trait SignificanceTest: Sync {
    /// Run the test on `pathway<TAB>coverage` lines
    fn run(&self, input: &str) -> anyhow::Result<SignificanceOutput>;
}

/// xipe run as an external process reading from stdin
pub struct Xipe {
    exe: PathBuf,
    percent: String,
}

impl Xipe {
    pub fn new(exe: &Path, percent: &str) -> Self {
        Self {
            exe: exe.to_owned(),
            percent: percent.to_owned(),
        }
    }
}

impl SignificanceTest for Xipe {
    fn run(&self, input: &str) -> anyhow::Result<SignificanceOutput> {
        trace!("Running {}", self.exe.display());
        let mut child = Command::new(&self.exe)
            .arg("--file2")
            .arg(&self.percent)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Could not run {}", self.exe.display()))?;

        // stdin is written while the output pipes are drained
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Could not open stdin for {}", self.exe.display()))?;
        let input = input.to_owned();
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .with_context(|| format!("Error waiting for {}", self.exe.display()))?;
        let write_res = writer
            .join()
            .map_err(|_| anyhow!("Writer thread for {} panicked", self.exe.display()))?;

        if !output.status.success() {
            return Err(anyhow!(
                "{} failed ({}): {}",
                self.exe.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        write_res.with_context(|| format!("Error writing to {}", self.exe.display()))?;

        Ok(SignificanceOutput {
            detail: String::from_utf8(output.stdout)
                .with_context(|| format!("Invalid output from {}", self.exe.display()))?,
            excluded: String::from_utf8(output.stderr)
                .with_context(|| format!("Invalid output from {}", self.exe.display()))?,
        })
    }
}

/// Coverage of each pathway in the store.  The fraction of a pathway's reactions (with
/// zeros for those not found) whose score is above the median score of the store
pub fn pathway_coverage(store: &PathwayStore, pdb: &PathwaysDatabase) -> BugResult {
    let median = store.median_score();
    trace!("Median reaction score for {}: {}", store.bug(), median);
    let mut res = BugResult::new(store.bug());
    for (pathway, scores) in store.items() {
        let v = completed_scores(pathway, scores, pdb);
        if !v.is_empty() {
            let n = v.iter().filter(|x| **x > median).count();
            res.insert(pathway, (n as f64) / (v.len() as f64))
        }
    }
    res
}

fn parse_detail(s: &str) -> anyhow::Result<(f64, i64)> {
    let t = s.trim().trim_start_matches('(').trim_end_matches(')');
    let mut it = t.split(',').map(|x| x.trim());
    match (it.next(), it.next(), it.next()) {
        (Some(a), Some(b), None) => Ok((
            a.parse::<f64>()
                .with_context(|| format!("Error reading score from {}", s))?,
            b.parse::<i64>()
                .with_context(|| format!("Error reading bin from {}", s))?,
        )),
        _ => Err(anyhow!("Malformed significance detail {}", s)),
    }
}

/// Remove the pathways nominated for exclusion, except those whose detail score is at
/// least the probability threshold and whose bin matches the target bin
pub fn prune(
    res: &mut BugResult,
    out: &SignificanceOutput,
    params: &PruneParams,
) -> anyhow::Result<()> {
    let mut to_remove: HashSet<&str> = out
        .excluded
        .lines()
        .filter_map(|l| {
            let fields: Vec<_> = l.trim().split('\t').collect();
            if fields.len() == 2 {
                Some(fields[1])
            } else {
                None
            }
        })
        .collect();

    for l in out.detail.lines() {
        let fields: Vec<_> = l.trim().split('\t').collect();
        if fields.len() == 2 && to_remove.contains(fields[0]) {
            let (score, bin) = parse_detail(fields[1])?;
            if score >= params.probability && bin == params.bin {
                trace!("Keeping pathway {} (score {}, bin {})", fields[0], score, bin);
                to_remove.remove(fields[0]);
            }
        }
    }

    for p in to_remove {
        if res.remove(p).is_some() {
            trace!("Removing pathway {} from {}", p, res.bug())
        }
    }
    Ok(())
}

/// Pathway coverage for one organism, pruned by the significance test.
/// The test is not run if there are no pathways
pub fn coverage_for_bug<T: SignificanceTest + ?Sized>(
    store: &PathwayStore,
    pdb: &PathwaysDatabase,
    test: &T,
    params: &PruneParams,
) -> anyhow::Result<BugResult> {
    debug!("Compute pathway coverage for {}", store.bug());
    let mut res = pathway_coverage(store, pdb);
    if !res.is_empty() {
        let input: String = res
            .iter()
            .map(|(p, c)| format!("{}\t{}\n", p, c))
            .collect();
        let out = test
            .run(&input)
            .with_context(|| format!("Significance test failed for {}", store.bug()))?;
        prune(&mut res, &out, params)
            .with_context(|| format!("Error processing significance test for {}", store.bug()))?;
    }
    Ok(res)
}
