//! CLI entry point for the repeat-purchase prediction pipeline.

use anyhow::{anyhow, Result};
use clap::Parser;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use repurchase_pipeline::schema::{RAW_HEADER_ALIASES, WILL_PURCHASE};
use repurchase_pipeline::{Pipeline, PipelineConfig, PipelineOutput};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Repeat-purchase prediction feature pipeline",
    long_about = "Builds per-customer feature matrices and future-purchase labels\n\
                  from raw retail transaction logs.\n\n\
                  EXAMPLES:\n  \
                  # Default horizon (2011-09-01), 30-day window\n  \
                  repurchase-pipeline -i transactions.csv\n\n  \
                  # Custom cutoff and split\n  \
                  repurchase-pipeline -i transactions.csv --cutoff-date 2011-06-01 \\\n      \
                  --prediction-window-days 60 --test-fraction 0.3 -o results/"
)]
struct Args {
    /// Path to the raw transaction CSV
    #[arg(short, long)]
    input: String,

    /// Output directory for feature and label tables
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// "Data as of" date; transactions after it are discarded
    #[arg(long, default_value = "2011-09-01")]
    cutoff_date: String,

    /// Anchor for recency/momentum windows
    ///
    /// Defaults to the cutoff date
    #[arg(long)]
    reference_date: Option<String>,

    /// Days of future activity that define a positive label
    #[arg(long, default_value = "30")]
    prediction_window_days: i64,

    /// Share of customers held out for the test set
    #[arg(long, default_value = "0.2")]
    test_fraction: f64,

    /// Seed for the customer split
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Output the run summary as JSON to stdout
    ///
    /// Disables all progress logs; only the JSON summary is printed.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunSummary {
    raw_rows: usize,
    train_customers: usize,
    test_customers: usize,
    feature_columns: usize,
    train_positive_rate: f64,
    test_positive_rate: f64,
    output_dir: String,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }
    if !Path::new(&args.output).exists() {
        std::fs::create_dir_all(&args.output)?;
        info!("Created output directory: {}", args.output);
    }

    info!("Loading transactions from: {}", args.input);
    let mut raw = load_csv_with_fallbacks(&args.input)?;
    canonicalize_headers(&mut raw)?;
    info!("Transactions loaded: {:?}", raw.shape());

    let reference_date = args.reference_date.as_deref().unwrap_or(&args.cutoff_date);
    let config = PipelineConfig::builder()
        .cutoff_date(&args.cutoff_date)
        .reference_date(reference_date)
        .prediction_window_days(args.prediction_window_days)
        .test_fraction(args.test_fraction)
        .seed(args.seed)
        .build()?;

    let output = Pipeline::new(config)?.run(&raw)?;
    let summary = write_outputs(&args, &raw, output)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

/// Map the Online Retail export header spellings onto canonical names.
fn canonicalize_headers(df: &mut DataFrame) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    for (alias, canonical) in RAW_HEADER_ALIASES {
        if present.iter().any(|c| c == alias) {
            df.rename(alias, canonical.into())?;
            debug!("Renamed column {} -> {}", alias, canonical);
        }
    }
    Ok(())
}

fn write_outputs(args: &Args, raw: &DataFrame, mut output: PipelineOutput) -> Result<RunSummary> {
    let dir = PathBuf::from(&args.output);

    let tables = [
        ("train_features.csv", &mut output.train_features),
        ("test_features.csv", &mut output.test_features),
        ("train_labels.csv", &mut output.train_labels),
        ("test_labels.csv", &mut output.test_labels),
    ];

    let mut heights = [0usize; 4];
    let mut feature_columns = 0usize;
    for (i, (name, table)) in tables.into_iter().enumerate() {
        heights[i] = table.height();
        if i == 0 {
            feature_columns = table.width() - 1;
        }
        let path = dir.join(name);
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(table)?;
        info!("Saved: {}", path.display());
    }

    let schema_path = dir.join("feature_schema.json");
    let schema_json = serde_json::to_string_pretty(output.schema.columns())?;
    std::fs::write(&schema_path, schema_json)?;
    info!("Saved: {}", schema_path.display());

    Ok(RunSummary {
        raw_rows: raw.height(),
        train_customers: heights[0],
        test_customers: heights[1],
        feature_columns,
        train_positive_rate: positive_rate(&output.train_labels)?,
        test_positive_rate: positive_rate(&output.test_labels)?,
        output_dir: args.output.clone(),
    })
}

fn positive_rate(labels: &DataFrame) -> Result<f64> {
    if labels.height() == 0 {
        return Ok(0.0);
    }
    let will = labels.column(WILL_PURCHASE)?.i32()?;
    let positives = will.into_no_null_iter().filter(|&v| v == 1).count();
    Ok(positives as f64 / labels.height() as f64)
}

/// Human-readable run summary; intentionally `println!`, not logging.
fn print_summary(summary: &RunSummary) {
    println!("\n{}", "=".repeat(60));
    println!("PIPELINE SUMMARY");
    println!("{}", "=".repeat(60));
    println!("  Raw rows:            {}", summary.raw_rows);
    println!("  Train customers:     {}", summary.train_customers);
    println!("  Test customers:      {}", summary.test_customers);
    println!("  Feature columns:     {}", summary.feature_columns);
    println!(
        "  Train positive rate: {:.1}%",
        summary.train_positive_rate * 100.0
    );
    println!(
        "  Test positive rate:  {:.1}%",
        summary.test_positive_rate * 100.0
    );
    println!("  Outputs:             {}", summary.output_dir);
    println!("{}", "=".repeat(60));
}

fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    // Strategy 3: Pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cleaned = clean_csv_content(&content);
            use std::io::Cursor;
            let cursor = Cursor::new(cleaned);

            CsvReadOptions::default()
                .with_infer_schema_length(Some(100))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()
                .map_err(|e| e.into())
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Strip doubled quotes and blank lines from a misquoted CSV export.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
