use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sales_etl::{
    EnrichedSales,
    config::{EtlConfig, load_config_path},
    filter::{FilterConfig, quarter_options},
    geo::Region,
    load::{JsonLinesSink, SalesSink},
    pipeline::CachedPipeline,
};
use sales_extract::sources::json_dir::JsonDirSource;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "SALES_ETL_LOG";

#[derive(Parser)]
#[command(version, about = "Northwind sales ETL: fact table, RFM segments, enriched output")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args)]
struct Common {
    /// Directory of `<table>.json` exports (overrides config and NORTHWIND_DATA_DIR).
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,
    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the pipeline and write the enriched table as JSON lines.
    Run {
        #[command(flatten)]
        common: Common,
        /// Output file; stdout when omitted.
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Keep only these regions (repeatable).
        #[arg(long = "region", value_name = "REGION")]
        regions: Vec<Region>,
        /// Keep only these countries (repeatable).
        #[arg(long = "country", value_name = "COUNTRY")]
        countries: Vec<String>,
        /// Keep only these categories (repeatable).
        #[arg(long = "category", value_name = "CATEGORY")]
        categories: Vec<String>,
        /// Keep orders placed in this quarter (e.g. 1997Q3).
        #[arg(long, conflicts_with_all = ["from", "to"])]
        quarter: Option<String>,
        /// Keep orders placed on or after this date.
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Keep orders placed on or before this date.
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Print each customer's segment.
    Segments {
        #[command(flatten)]
        common: Common,
    },
    /// List the quarter options of the enriched table.
    Quarters {
        #[command(flatten)]
        common: Common,
    },
}

impl Cmd {
    fn common(&self) -> &Common {
        match self {
            Cmd::Run { common, .. } | Cmd::Segments { common } | Cmd::Quarters { common } => common,
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

/// Load `path` into the environment. A missing file is fine; a malformed one
/// is an error.
fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Err(e) if !e.not_found() => {
            Err(e).with_context(|| format!("load {}", path.display()))
        }
        _ => Ok(()),
    }
}

fn main() -> Result<()> {
    load_env_file(Path::new(".env"))?;
    let cli = Cli::parse();

    let common = cli.cmd.common();
    let config = match &common.config {
        Some(path) => load_config_path(path)?,
        None => EtlConfig::default(),
    };
    init_tracing(&config.logging.filter);

    let dir = config.resolve_source_dir(common.source.clone())?;
    let source = JsonDirSource::new(&dir)
        .with_context(|| format!("open data directory {}", dir.display()))?;
    let pipeline = CachedPipeline::from_config(source, &config);
    let sales = pipeline.get()?;
    if !sales.report.is_clean() {
        eprint!("{}", sales.report);
    }

    match cli.cmd {
        Cmd::Run {
            output,
            regions,
            countries,
            categories,
            quarter,
            from,
            to,
            ..
        } => {
            let mut filter = FilterConfig {
                regions: non_empty(regions),
                countries: non_empty(countries),
                categories: non_empty(categories),
                ..Default::default()
            };
            filter.date_range = match (quarter, from, to) {
                (Some(label), _, _) => Some(quarter_range(&sales, &label)?),
                (None, None, None) => None,
                (None, from, to) => Some((
                    from.unwrap_or(NaiveDate::MIN),
                    to.unwrap_or(NaiveDate::MAX),
                )),
            };
            let lines = filter.apply(&sales.lines);

            let written = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("create {}", path.display()))?;
                    JsonLinesSink::new(BufWriter::new(file)).write(&lines)?
                }
                None => JsonLinesSink::new(io::stdout().lock()).write(&lines)?,
            };
            info!(written, total = sales.lines.len(), "run finished");
            eprintln!(
                "SUMMARY: {written} of {} lines written, snapshot date {}",
                sales.lines.len(),
                sales.snapshot_date.date()
            );
        }
        Cmd::Segments { .. } => {
            let segments: BTreeMap<&str, String> = sales
                .lines
                .iter()
                .filter_map(|l| {
                    let id = l.fact.customer_id.as_deref()?;
                    let seg = l.segment.map_or_else(|| "-".to_string(), |s| s.to_string());
                    Some((id, seg))
                })
                .collect();
            let mut out = io::stdout().lock();
            writeln!(out, "CustomerID\tSegment")?;
            for (id, seg) in segments {
                writeln!(out, "{id}\t{seg}")?;
            }
        }
        Cmd::Quarters { .. } => {
            let mut out = io::stdout().lock();
            for (label, (start, end)) in quarter_options(&sales.lines) {
                writeln!(out, "{label}\t{start}\t{end}")?;
            }
        }
    }

    Ok(())
}

fn non_empty<T: Ord>(values: Vec<T>) -> Option<BTreeSet<T>> {
    (!values.is_empty()).then(|| values.into_iter().collect())
}

fn quarter_range(sales: &EnrichedSales, label: &str) -> Result<(NaiveDate, NaiveDate)> {
    let options = quarter_options(&sales.lines);
    match options.get(label) {
        Some(range) => Ok(*range),
        None => {
            let known: Vec<&str> = options.keys().map(String::as_str).collect();
            bail!("unknown quarter {label:?}; available: {}", known.join(", "))
        }
    }
}
