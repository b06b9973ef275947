use std::{
    collections::{BTreeMap, HashMap},
    io::BufRead,
    path::Path,
    sync::Arc,
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use regex::Regex;
use utils::get_next_line;

/// Shared identifier for genes, reactions and pathways
pub type Id = Arc<str>;

/// Look up an id in hash, inserting it if not already present
fn intern(hash: &mut HashMap<Id, ()>, s: &str) -> Id {
    if let Some((k, _)) = hash.get_key_value(s) {
        k.clone()
    } else {
        let k: Id = Arc::from(s);
        hash.insert(k.clone(), ());
        k
    }
}

fn open_reference<P: AsRef<Path>>(fname: P) -> anyhow::Result<impl BufRead> {
    CompressIo::new()
        .path(&fname)
        .bufreader()
        .with_context(|| format!("Could not open {} for input", fname.as_ref().display()))
}

/// Genes and the reactions they catalyze.
/// Read only once loaded
pub struct ReactionsDatabase {
    gene_to_reactions: HashMap<Id, Vec<Id>>,
    reaction_to_genes: BTreeMap<Id, Vec<Id>>,
}

impl ReactionsDatabase {
    pub fn from_file<P: AsRef<Path>>(fname: P) -> anyhow::Result<Self> {
        debug!(
            "Reading in gene to reaction mapping from {}",
            fname.as_ref().display()
        );
        let mut rdr = open_reference(&fname)?;
        Self::from_reader(&mut rdr, &fname.as_ref().display().to_string())
    }

    /// Each line has a reaction id followed by gene ids.  EC numbers mixed in with the genes
    /// are skipped, as are lines starting with '#'.  Lines for the same reaction are merged
    pub fn from_reader<R: BufRead>(rdr: &mut R, name: &str) -> anyhow::Result<Self> {
        let ec = Regex::new(r"^[0-9]+\.[0-9-]+\.[0-9-]+\.[0-9-]+$")?;
        let mut ids = HashMap::new();
        let mut gene_to_reactions: HashMap<Id, Vec<Id>> = HashMap::new();
        let mut reaction_to_genes: BTreeMap<Id, Vec<Id>> = BTreeMap::new();
        let mut buf = String::new();
        let mut line = 0;

        while let Some(fields) = get_next_line(rdr, &mut buf)
            .with_context(|| format!("Error after reading {} lines from {}", line, name))?
        {
            line += 1;
            if fields.len() < 2 || fields[0].is_empty() || fields[0].starts_with('#') {
                continue;
            }
            let reaction = intern(&mut ids, fields[0]);
            let genes = reaction_to_genes.entry(reaction.clone()).or_default();
            for g in fields[1..].iter().filter(|s| !s.is_empty() && !ec.is_match(s)) {
                let gene = intern(&mut ids, g);
                if !genes.contains(&gene) {
                    genes.push(gene.clone());
                    gene_to_reactions
                        .entry(gene)
                        .or_default()
                        .push(reaction.clone());
                }
            }
        }

        debug!(
            "Finished reading in {} lines from {}; found {} reactions and {} genes",
            line,
            name,
            reaction_to_genes.len(),
            gene_to_reactions.len()
        );
        Ok(Self {
            gene_to_reactions,
            reaction_to_genes,
        })
    }

    pub fn gene_present(&self, gene: &str) -> bool {
        self.gene_to_reactions.contains_key(gene)
    }

    pub fn gene_id(&self, gene: &str) -> Option<&Id> {
        self.gene_to_reactions.get_key_value(gene).map(|(k, _)| k)
    }

    pub fn find_genes(&self, reaction: &str) -> &[Id] {
        self.reaction_to_genes
            .get(reaction)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Reactions in sorted order
    pub fn list_reactions(&self) -> impl Iterator<Item = &Id> {
        self.reaction_to_genes.keys()
    }
}

/// Pathways and their constituent reactions.
/// Read only once loaded
pub struct PathwaysDatabase {
    pathway_to_reactions: HashMap<Id, Vec<Id>>,
}

impl PathwaysDatabase {
    pub fn from_file<P: AsRef<Path>>(fname: P) -> anyhow::Result<Self> {
        debug!(
            "Reading in pathway to reaction mapping from {}",
            fname.as_ref().display()
        );
        let mut rdr = open_reference(&fname)?;
        Self::from_reader(&mut rdr, &fname.as_ref().display().to_string())
    }

    /// Each line has a pathway id followed by one or more reaction ids.
    /// Lines for the same pathway are merged; lines starting with '#' are skipped
    pub fn from_reader<R: BufRead>(rdr: &mut R, name: &str) -> anyhow::Result<Self> {
        let mut ids = HashMap::new();
        let mut pathway_to_reactions: HashMap<Id, Vec<Id>> = HashMap::new();
        let mut buf = String::new();
        let mut line = 0;

        while let Some(fields) = get_next_line(rdr, &mut buf)
            .with_context(|| format!("Error after reading {} lines from {}", line, name))?
        {
            line += 1;
            if fields.len() < 2 || fields[0].is_empty() || fields[0].starts_with('#') {
                continue;
            }
            let pathway = intern(&mut ids, fields[0]);
            let reactions = pathway_to_reactions.entry(pathway).or_default();
            for r in fields[1..].iter().filter(|s| !s.is_empty()) {
                reactions.push(intern(&mut ids, r))
            }
        }
        for v in pathway_to_reactions.values_mut() {
            v.sort_unstable();
            v.dedup();
        }

        debug!(
            "Finished reading in {} lines from {}; found {} pathways",
            line,
            name,
            pathway_to_reactions.len()
        );
        Ok(Self {
            pathway_to_reactions,
        })
    }

    pub fn find_reactions(&self, pathway: &str) -> &[Id] {
        self.pathway_to_reactions
            .get(pathway)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn n_pathways(&self) -> usize {
        self.pathway_to_reactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reactions_database_lookups() {
        let input = "#reaction\tgenes\n\
                     RXN-1\t1.1.1.1\tgA\tgB\n\
                     RXN-2\t2.7.-.-\tgB\n\
                     RXN-1\tgC\tgA\n\
                     RXN-3\n";
        let db = ReactionsDatabase::from_reader(&mut input.as_bytes(), "test").unwrap();
        assert!(db.gene_present("gA"));
        assert!(db.gene_present("gC"));
        assert!(!db.gene_present("1.1.1.1"));
        assert!(!db.gene_present("2.7.-.-"));
        assert!(!db.gene_present("genes"));
        assert!(db.find_genes("#reaction").is_empty());
        let genes: Vec<&str> = db.find_genes("RXN-1").iter().map(|g| &**g).collect();
        assert_eq!(genes, vec!["gA", "gB", "gC"]);
        assert_eq!(db.gene_id("gB").map(|g| &**g), Some("gB"));
        assert!(db.gene_id("gZ").is_none());
        assert!(db.find_genes("RXN-9").is_empty());
        let all: Vec<&str> = db.list_reactions().map(|r| &**r).collect();
        assert_eq!(all, vec!["RXN-1", "RXN-2"]);
    }

    #[test]
    fn pathways_database_merges_lines() {
        let input = "#pathway\treactions\n\
                     PWY-1\tRXN-2\n\
                     PWY-1\tRXN-1\n\
                     PWY-2\tRXN-1\tRXN-3\tRXN-1\n";
        let db = PathwaysDatabase::from_reader(&mut input.as_bytes(), "test").unwrap();
        assert_eq!(db.n_pathways(), 2);
        let r: Vec<&str> = db.find_reactions("PWY-1").iter().map(|r| &**r).collect();
        assert_eq!(r, vec!["RXN-1", "RXN-2"]);
        assert_eq!(db.find_reactions("PWY-2").len(), 2);
        assert!(db.find_reactions("PWY-9").is_empty());
        assert!(db.find_reactions("#pathway").is_empty());
    }
}
