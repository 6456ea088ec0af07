use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use oecdflat::{
    fetch::{self, DataQuery, Detail, DEFAULT_BASE_URL},
    flatten::{self, NormalizeOptions},
    output, sdmx,
};
use reqwest::Client;
use std::{fs, path::PathBuf};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Download an OECD SDMX-JSON dataset and flatten it to a tabular file"
)]
struct Args {
    /// Dataset code to download, e.g. QNA.
    #[arg(short, long, required_unless_present = "input")]
    dataset: Option<String>,

    /// Dimension member filter, e.g. "AUS+FRA.GDP"; `all` selects everything.
    #[arg(long, default_value = "all")]
    filter: String,

    /// Earliest period to include, e.g. 2005 or 2005-Q1.
    #[arg(long)]
    start_time: Option<String>,

    /// Latest period to include.
    #[arg(long)]
    end_time: Option<String>,

    /// How much payload to request from the API.
    #[arg(long, value_enum, default_value = "dataonly")]
    detail: DetailArg,

    /// Ask the API for the flat layout, one full key per observation.
    #[arg(long)]
    all_dimensions: bool,

    /// API root to query.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Read an SDMX-JSON payload from disk instead of the network.
    #[arg(long, conflicts_with = "dataset")]
    input: Option<PathBuf>,

    /// Where to write the flattened records.
    #[arg(short, long, default_value = "out.csv")]
    output: PathBuf,

    #[arg(long, value_enum, default_value = "csv")]
    format: FormatArg,

    /// Skip observations whose keys cannot be resolved instead of failing.
    #[arg(long)]
    lenient: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DetailArg {
    Dataonly,
    Full,
}

impl From<DetailArg> for Detail {
    fn from(arg: DetailArg) -> Self {
        match arg {
            DetailArg::Dataonly => Detail::DataOnly,
            DetailArg::Full => Detail::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,oecdflat=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let start = Instant::now();

    // ─── 2) obtain the SDMX-JSON payload ─────────────────────────────
    let response: sdmx::SdmxResponse = match &args.input {
        Some(path) => {
            info!(path = %path.display(), "reading payload from disk");
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing SDMX-JSON in {}", path.display()))?
        }
        None => {
            // clap guarantees --dataset whenever --input is absent
            let dataset = args.dataset.as_deref().expect("--dataset enforced by clap");
            let mut query = DataQuery::new(dataset)
                .base_url(args.base_url.as_str())
                .dimension_filter(args.filter.as_str())
                .detail(args.detail.into())
                .all_dimensions(args.all_dimensions);
            if let Some(start_time) = &args.start_time {
                query = query.start_time(start_time.as_str());
            }
            if let Some(end_time) = &args.end_time {
                query = query.end_time(end_time.as_str());
            }

            let client = Client::new();
            fetch::fetch_dataset(&client, &query).await?
        }
    };

    // ─── 3) decode into dimensions + observations ────────────────────
    let dataset = sdmx::decode(&response)?;
    info!(
        dimensions = dataset.dimensions.len(),
        observations = dataset.observations.len(),
        "decoded dataset"
    );

    // ─── 4) flatten to records ───────────────────────────────────────
    let options = NormalizeOptions {
        strict: !args.lenient,
    };
    let normalized = flatten::normalize(&dataset, &options)?;
    if normalized.skipped > 0 {
        warn!(
            skipped = normalized.skipped,
            "dropped observations with unresolvable keys"
        );
    }

    // ─── 5) write output ─────────────────────────────────────────────
    match args.format {
        FormatArg::Csv => output::write_csv_path(&normalized.records, &args.output)?,
        FormatArg::Json => output::write_json_path(&normalized.records, &args.output)?,
    }

    info!(
        records = normalized.records.len(),
        skipped = normalized.skipped,
        output = %args.output.display(),
        elapsed = ?start.elapsed(),
        "done"
    );
    Ok(())
}
