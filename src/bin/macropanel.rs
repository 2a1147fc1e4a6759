use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use macropanel_rs::{Client, ClientConfig, CsvLayout, Dataset, LabelMode, PayloadFormat, TidyTable};
use macropanel_rs::storage;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "macropanel",
    version,
    about = "Fetch SDMX-JSON / JSON-stat / SDMX-CSV statistics and decode them into tidy tables"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a dataset, decode it, and optionally save it.
    Fetch(FetchArgs),
    /// List the dimensions and codes of a JSON dataset.
    Describe(DescribeArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum InFormat {
    Auto,
    Sdmx,
    Jsonstat,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct ConnArgs {
    /// Fully-qualified request URL.
    #[arg(short, long)]
    url: String,
    /// Cache directory. Defaults to $MACROPANEL_CACHE_DIR, then the user cache dir.
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Bypass the cache for this request.
    #[arg(long, default_value_t = false)]
    no_cache: bool,
    /// Per-attempt timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
    /// Attempts in total for transient failures.
    #[arg(long)]
    retries: Option<u32>,
    /// Geometric backoff factor between attempts.
    #[arg(long)]
    backoff: Option<f64>,
}

#[derive(Args, Debug)]
struct FetchArgs {
    #[command(flatten)]
    conn: ConnArgs,
    /// Payload format.
    #[arg(long, value_enum, default_value_t = InFormat::Auto)]
    format: InFormat,
    /// Emit category codes instead of labels.
    #[arg(long, default_value_t = false)]
    codes: bool,
    /// CSV time column (default TIME_PERIOD).
    #[arg(long)]
    time_column: Option<String>,
    /// CSV value column (default OBS_VALUE).
    #[arg(long)]
    value_column: Option<String>,
    /// Save results to file (format inferred by --out-format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    out_format: Option<OutFormat>,
}

#[derive(Args, Debug)]
struct DescribeArgs {
    #[command(flatten)]
    conn: ConnArgs,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Fetch(args) => cmd_fetch(args),
        Command::Describe(args) => cmd_describe(args),
    }
}

fn build_client(conn: &ConnArgs) -> Result<Client> {
    let mut cfg = ClientConfig::from_env().context("read MACROPANEL_* environment")?;
    if let Some(dir) = &conn.cache_dir {
        cfg = cfg.with_cache_dir(dir);
    } else if cfg.cache_dir.is_none() {
        if let Some(dir) = dirs::cache_dir() {
            cfg = cfg.with_cache_dir(dir.join("macropanel"));
        }
    }
    if let Some(secs) = conn.timeout {
        cfg = cfg.with_timeout(Duration::from_secs(secs));
    }
    if let Some(n) = conn.retries {
        cfg = cfg.with_max_retries(n);
    }
    if let Some(f) = conn.backoff {
        cfg = cfg.with_backoff_factor(f);
    }
    Client::new(cfg).context("build HTTP client")
}

fn use_cache(conn: &ConnArgs) -> Option<bool> {
    if conn.no_cache { Some(false) } else { None }
}

fn cmd_fetch(args: FetchArgs) -> Result<()> {
    let client = build_client(&args.conn)?;
    let url = args.conn.url.as_str();
    let cache = use_cache(&args.conn);

    let table: TidyTable = match args.format {
        InFormat::Csv => {
            let sdmx = CsvLayout::sdmx();
            let layout = CsvLayout::new(
                args.time_column.clone().unwrap_or(sdmx.time_column),
                args.value_column.clone().unwrap_or(sdmx.value_column),
            );
            client
                .fetch_csv_table(url, &layout, cache)
                .with_context(|| format!("GET {url}"))?
        }
        json => {
            let format = match json {
                InFormat::Sdmx => PayloadFormat::SdmxJson,
                InFormat::Jsonstat => PayloadFormat::JsonStat,
                _ => PayloadFormat::Dataset,
            };
            let payload = client
                .fetch_with(url, format, cache)
                .with_context(|| format!("GET {url}"))?;
            let mode = if args.codes { LabelMode::Code } else { LabelMode::Label };
            Dataset::from_payload(&payload)?.decode_with(mode)?
        }
    };

    eprintln!("Decoded {} rows ({})", table.len(), table.columns().join(", "));

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.out_format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_table_csv(&table, path)?,
            "json" => storage::save_table_json(&table, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", table.len(), path.display());
    }
    Ok(())
}

fn cmd_describe(args: DescribeArgs) -> Result<()> {
    let client = build_client(&args.conn)?;
    let url = args.conn.url.as_str();
    let dataset = client
        .fetch_dataset(url, use_cache(&args.conn))
        .with_context(|| format!("GET {url}"))?;
    println!("dimension | code | label");
    for e in dataset.dimensions.describe() {
        println!(
            "{} | {} | {}",
            e.dimension,
            e.code,
            e.label.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
