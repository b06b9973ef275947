//! Pathway assignment by an external minimal pathway solver (MinPath)
//!
//! The solver is given a reactions file with lines `reaction<TAB>abundance` and the
//! pathway map file.  Of its outputs only the details file is used; this has pathway
//! header lines (identified by a fixed pattern) each followed by the lines for the
//! reactions assigned to that pathway.
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::Context;
use regex::Regex;
use tempfile::NamedTempFile;

use crate::database::Id;

/// Reaction -> pathways selected by the solver
pub type PathwayMap = HashMap<String, Vec<String>>;

/// Layout of the solver details output
#[derive(Debug, Clone)]
pub struct DetailsFormat {
    header: Regex,
    delimiter: String,
    pathway_idx: usize,
    reaction_idx: usize,
}

impl DetailsFormat {
    pub fn new(
        header: &str,
        delimiter: String,
        pathway_idx: usize,
        reaction_idx: usize,
    ) -> anyhow::Result<Self> {
        if delimiter.is_empty() {
            return Err(anyhow!("Empty delimiter for solver details"));
        }
        let header = Regex::new(header)
            .with_context(|| format!("Invalid pathway header pattern {}", header))?;
        Ok(Self {
            header,
            delimiter,
            pathway_idx,
            reaction_idx,
        })
    }
}

pub trait PathwaySolver: Sync {
    /// Find the pathways explaining a (non empty) list of reaction abundances
    fn solve(&self, reactions: &[(Id, f64)]) -> anyhow::Result<PathwayMap>;
}

/// Assign pathways to reactions.  An empty reaction list gives an empty map
/// without calling the solver
pub fn assign_pathways<S: PathwaySolver + ?Sized>(
    solver: &S,
    reactions: &[(Id, f64)],
) -> anyhow::Result<PathwayMap> {
    if reactions.is_empty() {
        debug!("No reactions found; skipping pathway solver");
        Ok(PathwayMap::new())
    } else {
        solver.solve(reactions)
    }
}

pub fn write_reactions<W: Write>(wrt: &mut W, reactions: &[(Id, f64)]) -> anyhow::Result<()> {
    for (r, a) in reactions.iter() {
        writeln!(wrt, "{}\t{}", r, a)?
    }
    Ok(())
}

/// Parse solver details output into a map from reaction to pathways
pub fn parse_details<R: BufRead>(
    rdr: &mut R,
    fmt: &DetailsFormat,
    name: &str,
) -> anyhow::Result<PathwayMap> {
    let mut buf = String::new();
    let mut line = 0;
    let mut current: Option<String> = None;
    let mut pathways = PathwayMap::new();

    loop {
        buf.clear();
        if rdr
            .read_line(&mut buf)
            .with_context(|| format!("Error after reading {} lines from {}", line, name))?
            == 0
        {
            break;
        }
        line += 1;
        let l = buf.trim();
        if l.is_empty() {
            continue;
        }
        let fields: Vec<_> = l.split(fmt.delimiter.as_str()).collect();
        if fmt.header.is_match(l) {
            let p = fields.get(fmt.pathway_idx).ok_or_else(|| {
                anyhow!("{}:{} Missing pathway in header line: {}", name, line, l)
            })?;
            trace!("Solver pathway {}", p);
            current = Some(p.trim().to_owned())
        } else if let Some(p) = current.as_ref() {
            let r = fields.get(fmt.reaction_idx).ok_or_else(|| {
                anyhow!("{}:{} Missing reaction in line: {}", name, line, l)
            })?;
            let v = pathways.entry(r.trim().to_owned()).or_default();
            if !v.contains(p) {
                v.push(p.clone())
            }
        } else {
            warn!("{}:{} Reaction line before first pathway; skipping", name, line)
        }
    }
    Ok(pathways)
}

/// MinPath run as an external process
pub struct MinPath {
    exe: PathBuf,
    map_file: PathBuf,
    tmp_dir: Option<PathBuf>,
    format: DetailsFormat,
}

impl MinPath {
    pub fn new(
        exe: &Path,
        map_file: &Path,
        tmp_dir: Option<&Path>,
        format: DetailsFormat,
    ) -> Self {
        Self {
            exe: exe.to_owned(),
            map_file: map_file.to_owned(),
            tmp_dir: tmp_dir.map(|p| p.to_owned()),
            format,
        }
    }

    // Temporary files are removed when dropped
    fn tmp_file(&self, suffix: &str) -> anyhow::Result<NamedTempFile> {
        let mut b = tempfile::Builder::new();
        b.prefix("pathquant_").suffix(suffix);
        let f = match self.tmp_dir.as_ref() {
            Some(d) => b.tempfile_in(d),
            None => b.tempfile(),
        };
        f.with_context(|| "Could not create temporary file")
    }
}

impl PathwaySolver for MinPath {
    fn solve(&self, reactions: &[(Id, f64)]) -> anyhow::Result<PathwayMap> {
        let reactions_file = self.tmp_file(".reactions")?;
        {
            let mut wrt = BufWriter::new(reactions_file.as_file());
            write_reactions(&mut wrt, reactions).with_context(|| {
                format!(
                    "Error writing reactions to {}",
                    reactions_file.path().display()
                )
            })?;
            wrt.flush()?;
        }
        let details = self.tmp_file(".details")?;
        let report = self.tmp_file(".report")?;
        let mps = self.tmp_file(".mps")?;

        debug!(
            "Running {} on {} reactions",
            self.exe.display(),
            reactions.len()
        );
        let output = Command::new(&self.exe)
            .arg("-any")
            .arg(reactions_file.path())
            .arg("-map")
            .arg(&self.map_file)
            .arg("-report")
            .arg(report.path())
            .arg("-details")
            .arg(details.path())
            .arg("-mps")
            .arg(mps.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Could not run {}", self.exe.display()))?;

        if !output.status.success() {
            return Err(anyhow!(
                "{} failed ({}): {}",
                self.exe.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let mut rdr = BufReader::new(File::open(details.path()).with_context(|| {
            format!("Could not open solver output {}", details.path().display())
        })?);
        parse_details(&mut rdr, &self.format, &details.path().display().to_string())
    }
}
