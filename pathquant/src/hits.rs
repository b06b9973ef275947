use std::{collections::BTreeMap, io::BufRead, path::Path, sync::Arc};

use anyhow::Context;
use compress_io::compress::CompressIo;
use utils::get_next_line;

/// Name of the synthetic organism that receives every hit
pub const ALL_BUGS: &str = "all";

/// A single alignment of a read (query) against a reference gene
#[derive(Debug, Clone)]
pub struct Hit {
    query: Arc<str>,
    reference: Arc<str>,
    evalue: f64,
}

impl Hit {
    pub fn new(query: &str, reference: &str, evalue: f64) -> Self {
        Self {
            query: Arc::from(query),
            reference: Arc::from(reference),
            evalue,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn evalue(&self) -> f64 {
        self.evalue
    }
}

/// Hits grouped by organism (bug)
///
/// Every hit is also filed under ALL_BUGS so that the aggregate over all
/// organisms is processed as just another organism
#[derive(Default)]
pub struct HitStore {
    hits: BTreeMap<String, Vec<Hit>>,
}

impl HitStore {
    pub fn add(&mut self, hit: Hit, bug: Option<&str>) {
        if let Some(b) = bug.filter(|b| *b != ALL_BUGS) {
            self.hits.entry(b.to_owned()).or_default().push(hit.clone());
        }
        self.hits.entry(ALL_BUGS.to_owned()).or_default().push(hit)
    }

    pub fn bug_list(&self) -> impl Iterator<Item = &str> {
        self.hits.keys().map(|s| s.as_str())
    }

    pub fn hits_for_bug(&self, bug: &str) -> &[Hit] {
        self.hits.get(bug).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Read hits from a tab delimited file.
/// Each line has the fields query, reference, evalue and (optionally) bug.
/// Lines starting with '#' and lines with fewer than 3 fields are skipped
pub fn read_hits_file<P: AsRef<Path>>(fname: P) -> anyhow::Result<HitStore> {
    let fname = fname.as_ref();
    debug!("Reading in alignment hits from {}", fname.display());
    let mut rdr = CompressIo::new()
        .path(fname)
        .bufreader()
        .with_context(|| format!("Could not open {} for input", fname.display()))?;
    read_hits(&mut rdr, &fname.display().to_string())
}

pub fn read_hits<R: BufRead>(rdr: &mut R, name: &str) -> anyhow::Result<HitStore> {
    let mut buf = String::new();
    let mut line = 0;
    let mut n_hits = 0;
    let mut store = HitStore::default();

    while let Some(fields) = get_next_line(rdr, &mut buf)
        .with_context(|| format!("Error after reading {} lines from {}", line, name))?
    {
        line += 1;
        if fields.len() >= 3 && !fields[0].starts_with('#') {
            let evalue = fields[2]
                .parse::<f64>()
                .with_context(|| format!("{}:{} Error reading evalue", name, line))?;
            let bug = fields.get(3).copied().filter(|s| !s.is_empty());
            store.add(Hit::new(fields[0], fields[1], evalue), bug);
            n_hits += 1;
        }
    }

    debug!(
        "Finished reading in {} lines; found {} hits for {} organisms",
        line,
        n_hits,
        store.hits.len().saturating_sub(1)
    );
    Ok(store)
}
