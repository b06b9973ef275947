use std::path::{Path, PathBuf};

use crate::{coverage::PruneParams, solver::DetailsFormat};

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
/// hits_file - alignment hits (query, reference, evalue, bug)
/// gene_reactions - reference file mapping reactions to genes
/// reactions_pathways - reference file mapping pathways to reactions (also the MinPath map file)
/// output_dir - output directory for the abundance and coverage tables
/// minpath - MinPath executable and the layout of its details output
/// xipe - xipe executable, its percent option and the pruning thresholds
/// tmp_dir - directory for temporary files (system default if not set)
/// threads - number of worker threads
/// strict - abort on the first failed organism
///
pub struct Config {
    hits_file: PathBuf,
    gene_reactions: PathBuf,
    reactions_pathways: PathBuf,
    output_dir: Option<PathBuf>,
    abundance_file: String,
    coverage_file: String,
    category_delimiter: String,
    minpath: PathBuf,
    details_format: DetailsFormat,
    xipe: PathBuf,
    xipe_percent: String,
    prune: PruneParams,
    tmp_dir: Option<PathBuf>,
    threads: usize,
    strict: bool,
}

impl Config {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hits_file: PathBuf,
        gene_reactions: PathBuf,
        reactions_pathways: PathBuf,
        minpath: PathBuf,
        details_format: DetailsFormat,
        xipe: PathBuf,
        xipe_percent: String,
        prune: PruneParams,
    ) -> Self {
        Self {
            hits_file,
            gene_reactions,
            reactions_pathways,
            output_dir: None,
            abundance_file: "pathabundance.tsv".to_string(),
            coverage_file: "pathcoverage.tsv".to_string(),
            category_delimiter: "|".to_string(),
            minpath,
            details_format,
            xipe,
            xipe_percent,
            prune,
            tmp_dir: None,
            threads: 1,
            strict: false,
        }
    }

    pub fn set_output_dir(&mut self, d: PathBuf) {
        self.output_dir = Some(d)
    }

    pub fn set_output_files(&mut self, abundance: String, coverage: String) {
        self.abundance_file = abundance;
        self.coverage_file = coverage;
    }

    pub fn set_category_delimiter(&mut self, s: String) {
        self.category_delimiter = s
    }

    pub fn set_tmp_dir(&mut self, d: PathBuf) {
        self.tmp_dir = Some(d)
    }

    pub fn set_threads(&mut self, nt: usize) {
        self.threads = nt.max(1)
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict
    }

    pub fn hits_file(&self) -> &Path {
        &self.hits_file
    }

    pub fn gene_reactions(&self) -> &Path {
        &self.gene_reactions
    }

    pub fn reactions_pathways(&self) -> &Path {
        &self.reactions_pathways
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    fn output_path(&self, name: &str) -> PathBuf {
        let mut p = self.output_dir.clone().unwrap_or_default();
        p.push(name);
        p
    }

    pub fn abundance_path(&self) -> PathBuf {
        self.output_path(&self.abundance_file)
    }

    pub fn coverage_path(&self) -> PathBuf {
        self.output_path(&self.coverage_file)
    }

    pub fn category_delimiter(&self) -> &str {
        &self.category_delimiter
    }

    pub fn minpath(&self) -> &Path {
        &self.minpath
    }

    pub fn details_format(&self) -> &DetailsFormat {
        &self.details_format
    }

    pub fn xipe(&self) -> &Path {
        &self.xipe
    }

    pub fn xipe_percent(&self) -> &str {
        &self.xipe_percent
    }

    pub fn prune(&self) -> &PruneParams {
        &self.prune
    }

    pub fn tmp_dir(&self) -> Option<&Path> {
        self.tmp_dir.as_deref()
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn strict(&self) -> bool {
        self.strict
    }
}
