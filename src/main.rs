//! CLI entry point: fetch one GTFS-RT snapshot and list the next arrivals
//! for a route at a stop.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use gtfs_rt_arrivals::{
    arrivals::{ArrivalPrediction, ArrivalQuery, extract_arrivals},
    config::{self, FeedConfig},
    fetch::{BasicClient, auth::ApiKey, load_source},
    gtfs_rt::FeedMessage,
    output::{dump_json, dump_text, write_json, write_report},
    parser::parse_feed,
};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "gtfs_rt_arrivals")]
#[command(
    about = "Decode a GTFS-RT feed and list the next arrivals for one route at one stop",
    long_about = None
)]
struct Cli {
    /// GTFS-RT feed URL, or a path to a saved protobuf file
    #[arg(long, value_name = "URL_OR_FILE", default_value = config::FEED_URL_DEFAULT)]
    url: String,

    /// Route ID to filter on
    #[arg(long, default_value = config::DEFAULT_ROUTE)]
    route: String,

    /// Stop ID to filter on (A12N = 145 St uptown)
    #[arg(long, default_value = config::DEFAULT_STOP)]
    stop: String,

    /// Maximum number of arrivals to print
    #[arg(short, long, default_value_t = config::DEFAULT_LIMIT)]
    limit: usize,

    /// Only list arrivals that have not happened yet
    #[arg(long, default_value_t = false)]
    future_only: bool,

    /// How the arrivals are printed
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Network deadline for the feed request, in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Write the entire decoded feed as JSON to this path
    #[arg(long, value_name = "PATH")]
    dump_json: Option<PathBuf>,

    /// Write the entire decoded feed in text form to this path
    #[arg(long, value_name = "PATH")]
    dump_text: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // Load .env file

    let _guard = match init_tracing() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error setting up logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path = config::log_file_path();
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_rt_arrivals.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(guard)
}

async fn run(cli: Cli) -> Result<()> {
    let feed_config = FeedConfig::new(&cli.url)
        .with_api_key(config::api_key_from_env())
        .with_timeout(Duration::from_secs(cli.timeout));

    let bytes = load(&feed_config).await.context("fetching feed")?;
    let feed = parse_feed(&bytes).context("parsing feed")?;
    info!(entities = feed.entity.len(), "Feed snapshot loaded");

    write_dumps(&feed, &cli)?;

    let query = ArrivalQuery::new(cli.route, cli.stop)
        .with_limit(cli.limit)
        .future_only(cli.future_only);
    let arrivals = extract_arrivals(&feed, &query, Utc::now());
    info!(count = arrivals.len(), "Arrivals ready");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(&mut out, cli.format, &query, &arrivals)?;
    out.flush()?;

    Ok(())
}

/// Writes the requested feed dumps. Confirmations go to the log, never to
/// stdout, so a JSON report stays parseable.
fn write_dumps(feed: &FeedMessage, cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.dump_json {
        dump_json(feed, path)?;
        info!(path = %path.display(), "Wrote full feed JSON");
    }
    if let Some(path) = &cli.dump_text {
        dump_text(feed, path)?;
        info!(path = %path.display(), "Wrote full feed text");
    }
    Ok(())
}

fn render<W: Write>(
    out: &mut W,
    format: OutputFormat,
    query: &ArrivalQuery,
    arrivals: &[ArrivalPrediction],
) -> Result<()> {
    match format {
        OutputFormat::Text => write_report(out, query, arrivals),
        OutputFormat::Json => write_json(out, query, arrivals),
    }
}

/// Loads the raw feed, sending the API key header only when one is configured.
async fn load(feed_config: &FeedConfig) -> Result<bytes::Bytes> {
    let client = BasicClient::with_timeout(feed_config.timeout)?;
    let bytes = match &feed_config.api_key {
        Some(key) if feed_config.is_remote() => {
            load_source(&ApiKey::mta(client, key)?, &feed_config.source).await?
        }
        _ => load_source(&client, &feed_config.source).await?,
    };
    Ok(bytes)
}
