use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use redlist_core::{
    CsvOptions, DEFAULT_LOOKUP_LIMIT, DEFAULT_THRESHOLD, MatchEngine, ReferenceCatalog,
    ScorerKind, load_catalog_csv, normalize_input, normalize_name,
};
use redlist_gbif::http::GBIF_OCCURRENCE_SEARCH;
use redlist_gbif::{DEFAULT_MAX_RECORDS, GbifClient, GbifConfig, OccurrenceFetcher};
use tracing_subscriber::EnvFilter;

mod display;

#[derive(Parser)]
#[command(
    name = "redlist",
    version,
    about = "Check pasted species lists against a red-list catalog"
)]
struct Cli {
    /// Debug logging on stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    catalog: CatalogArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CatalogArgs {
    /// Reference catalog file
    #[arg(long, global = true, env = "REDLIST_CATALOG", default_value = "species_list.csv")]
    catalog: PathBuf,

    /// Field delimiter of the catalog file
    #[arg(long, global = true, env = "REDLIST_DELIMITER", default_value_t = ';')]
    delimiter: char,

    /// Column holding vernacular names
    #[arg(long, global = true, env = "REDLIST_VERNACULAR_COLUMN", default_value = "FinnishName")]
    vernacular_column: String,

    /// Column holding scientific names
    #[arg(long, global = true, env = "REDLIST_SCIENTIFIC_COLUMN", default_value = "ScientificName")]
    scientific_column: String,

    /// Minimum similarity score (0-100, inclusive)
    #[arg(long, global = true, env = "REDLIST_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Similarity scorer: token-sort or jaro-winkler
    #[arg(long, global = true, default_value_t = ScorerKind::TokenSort)]
    scorer: ScorerKind,
}

#[derive(Subcommand)]
enum Command {
    /// Match a pasted species list against the catalog
    Check {
        /// File with the pasted list ("-" or omitted for stdin)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Fetch geocoded occurrences for every matched species
        #[arg(long)]
        occurrences: bool,

        /// Cap on occurrence points per species
        #[arg(long, default_value_t = DEFAULT_MAX_RECORDS)]
        max_records: usize,

        /// Species fetched in parallel
        #[arg(long, default_value_t = 4)]
        concurrency: usize,

        /// Occurrence search endpoint
        #[arg(long, env = "REDLIST_GBIF_URL", default_value = GBIF_OCCURRENCE_SEARCH)]
        gbif_url: String,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Emit a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Rank catalog names for a single species name
    Lookup {
        name: String,

        /// Number of names to show
        #[arg(long, default_value_t = DEFAULT_LOOKUP_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    tracing::info!("redlist v{}", env!("CARGO_PKG_VERSION"));

    let catalog = load_catalog(&cli.catalog)?;
    let engine = MatchEngine::new(&catalog, cli.catalog.scorer, cli.catalog.threshold)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Check {
            input,
            occurrences,
            max_records,
            concurrency,
            gbif_url,
            timeout_secs,
            json,
        } => {
            let text = read_input(input.as_deref())?;
            if text.trim().is_empty() {
                eprintln!("Please paste species data first.");
                return Ok(());
            }

            let candidates = normalize_input(&text);
            let set = engine.match_all(&candidates);

            let fetches = if occurrences && !set.is_empty() {
                let client = GbifClient::new(GbifConfig {
                    base_url: gbif_url,
                    timeout: Duration::from_secs(timeout_secs),
                    ..GbifConfig::default()
                })
                .context("building occurrence client")?;
                let fetcher = OccurrenceFetcher::new(client).with_max_records(max_records);
                fetcher
                    .fetch_many(set.matched_scientific_names(), concurrency)
                    .await
            } else {
                Vec::new()
            };

            if json {
                serde_json::to_writer_pretty(&mut out, &display::Report::new(&set, &fetches))?;
                writeln!(out)?;
            } else {
                display::print_summary(&mut out, &set.summary())?;
                display::print_matches(&mut out, &set)?;
                if occurrences && !fetches.is_empty() {
                    display::print_occurrences(&mut out, &fetches)?;
                }
            }
        }
        Command::Lookup { name, limit } => {
            let query = normalize_name(&name);
            let hits: Vec<_> = engine
                .top_matches(&query, limit)
                .into_iter()
                .map(|scored| {
                    let records = catalog.records_for_normalized_name(&scored.name);
                    (scored, records)
                })
                .collect();
            display::print_lookup(&mut out, &name, &hits)?;
        }
    }

    Ok(())
}

fn load_catalog(args: &CatalogArgs) -> anyhow::Result<ReferenceCatalog> {
    if !args.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got '{}'", args.delimiter);
    }
    let opts = CsvOptions {
        delimiter: args.delimiter as u8,
        vernacular_column: args.vernacular_column.clone(),
        scientific_column: args.scientific_column.clone(),
    };
    let catalog = load_catalog_csv(&args.catalog, &opts)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;
    let summary = catalog.summary();
    tracing::info!(
        records = summary.records,
        names = summary.normalized_names,
        "catalog ready"
    );
    Ok(catalog)
}

/// Read pasted text from a file, or stdin for `None` / `-`.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}
