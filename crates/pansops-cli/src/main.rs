//! Compute PANS-OPS protection surfaces from a JSON request file.

use anyhow::{Context, Result};
use clap::Parser;
use pansops_cli::{run, Config, Input};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Compute protection surfaces for one procedure
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Request JSON file, or "-" for stdin
    #[arg(long, default_value = "-")]
    request: String,

    /// CSV with an "OAS constants" section (overrides PANSOPS_OAS_TABLE)
    #[arg(long)]
    oas_table: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();

    // Logs go to stderr so stdout stays clean for the result.
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("pansops_cli=info".parse()?);
    let (text_layer, json_layer) = if config.log_json {
        (None, Some(tracing_subscriber::fmt::layer().json().with_writer(io::stderr)))
    } else {
        (Some(tracing_subscriber::fmt::layer().with_writer(io::stderr)), None)
    };
    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(filter)
        .init();

    let text = read_request(&args.request)?;
    let input = Input::from_json(&text)
        .with_context(|| format!("parsing request {}", args.request))?;

    let oas_table = args.oas_table.or(config.oas_table);
    let output = run(input, oas_table.as_deref())?;

    let rendered = if args.pretty || config.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match args.output {
        Some(path) => {
            fs::write(&path, rendered + "\n")
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{rendered}")?;
        }
    }
    Ok(())
}

fn read_request(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading request from stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(source).with_context(|| format!("reading request {source}"))
    }
}
