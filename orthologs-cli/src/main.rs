use anyhow::{anyhow, Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use orthologs::{open_input, AssociationWriter, EdgeReport, OutputFormat, ReferenceMap, Resolver, TransformConfig};
use std::convert::TryFrom;
use std::fs::File;
use std::io::BufWriter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn app<'a, 'b>() -> clap::App<'a, 'b> {
    App::new("orthologs")
        .about("Builds Biolink orthology edges from Panther ortholog pairs")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("verbose")
            .long("verbose")
            .short("v")
            .global(true)
            .help("Log skipped rows and other debug output"))
        .subcommand(SubCommand::with_name("build-map")
            .about("Builds the composite key to NCBIGene map from gene_info")
            .arg(Arg::with_name("gene_info")
                .long("gene-info")
                .required(true)
                .takes_value(true)
                .help("NCBI gene_info file, optionally gzipped"))
            .arg(Arg::with_name("output")
                .long("output")
                .short("o")
                .required(true)
                .takes_value(true)))
        .subcommand(SubCommand::with_name("transform")
            .about("Resolves ortholog pairs into homology associations")
            .arg(Arg::with_name("orthologs")
                .long("orthologs")
                .required(true)
                .takes_value(true)
                .help("Panther ortholog pair file, optionally gzipped"))
            .arg(Arg::with_name("gene_map")
                .long("gene-map")
                .required(true)
                .takes_value(true)
                .help("Map written by build-map"))
            .arg(Arg::with_name("output")
                .long("output")
                .short("o")
                .required(true)
                .takes_value(true))
            .arg(Arg::with_name("format")
                .long("format")
                .possible_values(&["tsv", "jsonl"])
                .default_value("tsv")
                .takes_value(true))
            .arg(Arg::with_name("report")
                .long("report")
                .takes_value(true)
                .help("Also write edge counts grouped by namespace"))
            .arg(Arg::with_name("row_limit")
                .long("row-limit")
                .env("ORTHOLOGS_ROW_LIMIT")
                .takes_value(true))
            .arg(Arg::with_name("primary_knowledge_source")
                .long("primary-knowledge-source")
                .env("ORTHOLOGS_PRIMARY_KNOWLEDGE_SOURCE")
                .takes_value(true))
            .arg(Arg::with_name("aggregator_knowledge_source")
                .long("aggregator-knowledge-source")
                .env("ORTHOLOGS_AGGREGATOR_KNOWLEDGE_SOURCE")
                .multiple(true)
                .use_delimiter(true)
                .takes_value(true)))
}

fn main() {
    let matches = app().get_matches();
    let verbose = matches.is_present("verbose")
        || matches.subcommand().1.map(|sub| sub.is_present("verbose")).unwrap_or(false);
    init_logging(verbose);

    if let Err(e) = run(&matches) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins when set; otherwise `--verbose` picks debug output.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        ("build-map", Some(sub)) => build_map(sub),
        ("transform", Some(sub)) => transform(sub),
        (other, _) => Err(anyhow!("unknown command {:?}", other)),
    }
}

fn build_map(args: &ArgMatches) -> Result<()> {
    let gene_info_path = args.value_of("gene_info").context("missing --gene-info")?;
    let out_path = args.value_of("output").context("missing --output")?;

    info!(input = gene_info_path, "building gene map");
    let gene_info = open_input(gene_info_path)
        .with_context(|| format!("failed to open gene info file {}", gene_info_path))?;
    let (map, stats) = ReferenceMap::build_from(gene_info)
        .with_context(|| format!("failed to build gene map from {}", gene_info_path))?;

    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create {}", out_path))?;
    map.write_to(BufWriter::new(out_file))
        .with_context(|| format!("failed to write gene map to {}", out_path))?;

    info!(
        output = out_path,
        entries = map.len(),
        ambiguous = stats.ambiguous_keys,
        invalid = stats.invalid_keys,
        "gene map written"
    );
    Ok(())
}

fn transform_config(args: &ArgMatches) -> Result<TransformConfig> {
    let mut config = TransformConfig::default();

    if let Some(limit) = args.value_of("row_limit") {
        let limit = limit.parse::<usize>()
            .with_context(|| format!("invalid row limit {:?}", limit))?;
        config.row_limit = Some(limit);
    }
    if let Some(source) = args.value_of("primary_knowledge_source") {
        config.primary_knowledge_source = source.to_string();
    }
    if let Some(sources) = args.values_of("aggregator_knowledge_source") {
        config.aggregator_knowledge_sources = sources.map(str::to_string).collect();
    }

    Ok(config)
}

fn transform(args: &ArgMatches) -> Result<()> {
    let orthologs_path = args.value_of("orthologs").context("missing --orthologs")?;
    let map_path = args.value_of("gene_map").context("missing --gene-map")?;
    let out_path = args.value_of("output").context("missing --output")?;
    let format = args.value_of("format").unwrap_or("tsv");
    let format = OutputFormat::try_from(format)
        .map_err(|_| anyhow!("unsupported output format {:?}", format))?;
    let config = transform_config(args)?;

    let map_file = open_input(map_path)
        .with_context(|| format!("failed to open gene map {}", map_path))?;
    let map = ReferenceMap::read_from(map_file)
        .with_context(|| format!("failed to load gene map {}", map_path))?;

    let orthologs = open_input(orthologs_path)
        .with_context(|| format!("failed to open ortholog file {}", orthologs_path))?;
    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create {}", out_path))?;
    let mut writer = AssociationWriter::new(BufWriter::new(out_file), format)?;
    let mut report = EdgeReport::new();

    let mut resolver = Resolver::new(&map, config);
    resolver.run(orthologs, |association| {
        report.add(association);
        writer.write(association)
    }).with_context(|| format!("failed to transform {}", orthologs_path))?;
    writer.finish().with_context(|| format!("failed to write {}", out_path))?;

    if let Some(report_path) = args.value_of("report") {
        let report_file = File::create(report_path)
            .with_context(|| format!("failed to create {}", report_path))?;
        report.write_to(BufWriter::new(report_file))
            .with_context(|| format!("failed to write report to {}", report_path))?;
        info!(report = report_path, "edge report written");
    }

    let stats = resolver.stats();
    info!(
        output = out_path,
        associations = stats.associations,
        skipped = stats.skipped(),
        direct = stats.direct,
        reference_map = stats.reference_map,
        protein = stats.protein,
        "transform complete"
    );
    Ok(())
}
