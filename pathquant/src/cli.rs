use std::{num::NonZeroUsize, path::PathBuf};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    Command,
};

use anyhow::Context;

use utils::{init_log, LogLevel};

use crate::{config::*, coverage::PruneParams, solver::DetailsFormat};

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .help("Set number of worker threads [default: available cores]"),
        )
        .arg(
            Arg::new("strict")
                .action(ArgAction::SetTrue)
                .long("strict")
                .help("Abort if processing fails for any organism"),
        )
        .arg(
            Arg::new("gene_reactions")
                .short('g')
                .long("gene-reactions")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .required(true)
                .help("Reference file mapping reactions to genes"),
        )
        .arg(
            Arg::new("reactions_pathways")
                .short('r')
                .long("reactions-pathways")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .required(true)
                .help("Reference file mapping pathways to reactions"),
        )
        .arg(
            Arg::new("output_dir")
                .short('d')
                .long("output-dir")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Set output directory [default: current directory]"),
        )
        .arg(
            Arg::new("abundance_file")
                .long("abundance-file")
                .value_parser(value_parser!(String))
                .value_name("NAME")
                .default_value("pathabundance.tsv")
                .help("Set name of pathway abundance output file"),
        )
        .arg(
            Arg::new("coverage_file")
                .long("coverage-file")
                .value_parser(value_parser!(String))
                .value_name("NAME")
                .default_value("pathcoverage.tsv")
                .help("Set name of pathway coverage output file"),
        )
        .arg(
            Arg::new("category_delimiter")
                .long("category-delimiter")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value("|")
                .help("Set delimiter between pathway and organism in output rows"),
        )
        .arg(
            Arg::new("tmp_dir")
                .long("tmp-dir")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Set directory for temporary files [default: system temp directory]"),
        )
        .arg(
            Arg::new("minpath")
                .long("minpath")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value("MinPath12hmp.py")
                .help("MinPath executable"),
        )
        .arg(
            Arg::new("minpath_header")
                .long("minpath-header")
                .value_parser(value_parser!(String))
                .value_name("REGEX")
                .default_value("minpath 1")
                .help("Pattern identifying pathway lines in MinPath details output"),
        )
        .arg(
            Arg::new("minpath_delimiter")
                .long("minpath-delimiter")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value("  ")
                .help("Field delimiter of MinPath details output"),
        )
        .arg(
            Arg::new("minpath_pathway_index")
                .long("minpath-pathway-index")
                .value_parser(value_parser!(usize))
                .value_name("INT")
                .default_value("3")
                .help("Field index of the pathway in MinPath pathway lines"),
        )
        .arg(
            Arg::new("minpath_reaction_index")
                .long("minpath-reaction-index")
                .value_parser(value_parser!(usize))
                .value_name("INT")
                .default_value("0")
                .help("Field index of the reaction in MinPath reaction lines"),
        )
        .arg(
            Arg::new("xipe")
                .long("xipe")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value("xipe.py")
                .help("xipe executable"),
        )
        .arg(
            Arg::new("xipe_percent")
                .long("xipe-percent")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT")
                .default_value("0.1")
                .help("Percent option passed to xipe"),
        )
        .arg(
            Arg::new("xipe_probability")
                .long("xipe-probability")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT")
                .default_value("0.9")
                .help("Minimum xipe score for keeping a pathway nominated for removal"),
        )
        .arg(
            Arg::new("xipe_bin")
                .long("xipe-bin")
                .value_parser(value_parser!(i64))
                .value_name("INT")
                .default_value("2")
                .help("xipe bin required for keeping a pathway nominated for removal"),
        )
        .arg(
            Arg::new("hits")
                .value_parser(value_parser!(PathBuf))
                .value_name("HITS_FILE")
                .required(true)
                .help("Input file with alignment hits (query, reference, evalue, organism)"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m);

    debug!("Processing command line options");

    let nt = m
        .get_one::<NonZeroUsize>("threads")
        .map(|x| usize::from(*x))
        .unwrap_or_else(num_cpus::get);

    let get_path = |s: &str| {
        m.get_one::<PathBuf>(s)
            .cloned()
            .ok_or_else(|| anyhow!("Missing option {}", s))
    };
    let get_string = |s: &str| {
        m.get_one::<String>(s)
            .cloned()
            .ok_or_else(|| anyhow!("Missing option {}", s))
    };

    let details_format = DetailsFormat::new(
        &get_string("minpath_header")?,
        get_string("minpath_delimiter")?,
        *m.get_one::<usize>("minpath_pathway_index")
            .expect("Missing default pathway index"),
        *m.get_one::<usize>("minpath_reaction_index")
            .expect("Missing default reaction index"),
    )
    .with_context(|| "Invalid MinPath details format")?;

    let percent = *m
        .get_one::<f64>("xipe_percent")
        .expect("Missing default xipe percent");
    let prune = PruneParams::new(
        *m.get_one::<f64>("xipe_probability")
            .expect("Missing default xipe probability"),
        *m.get_one::<i64>("xipe_bin")
            .expect("Missing default xipe bin"),
    );

    let mut cfg = Config::new(
        get_path("hits")?,
        get_path("gene_reactions")?,
        get_path("reactions_pathways")?,
        get_path("minpath")?,
        details_format,
        get_path("xipe")?,
        percent.to_string(),
        prune,
    );

    if let Some(p) = m.get_one::<PathBuf>("output_dir") {
        cfg.set_output_dir(p.to_owned())
    }
    if let Some(p) = m.get_one::<PathBuf>("tmp_dir") {
        cfg.set_tmp_dir(p.to_owned())
    }

    let abundance = get_string("abundance_file")?;
    let coverage = get_string("coverage_file")?;
    if abundance == coverage {
        return Err(anyhow!(
            "Abundance and coverage output files must have different names"
        ));
    }
    cfg.set_output_files(abundance, coverage);
    cfg.set_category_delimiter(get_string("category_delimiter")?);
    cfg.set_threads(nt);
    cfg.set_strict(m.get_flag("strict"));

    debug!("Number of worker threads: {}", nt);
    Ok(cfg)
}
