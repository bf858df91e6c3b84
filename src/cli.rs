use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::ExtractConfig;
use crate::engine::{ArchiveInput, Engine, EngineOptions, JsonLinesSink};
use crate::runtime;
use crate::ApiResponse;

#[derive(Parser)]
#[command(name = "adsnap", version, about = "Ad records from archived ad-library snapshots (JSON only)")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Command,
    /// Debug-level logs on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Extract records from one or more .mhtml snapshots
    Extract(ExtractArgs),
    /// Print the default extraction config
    Config,
}

#[derive(Args)]
struct ExtractArgs {
    /// Snapshot files, processed and reported in the given order
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// JSON config; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Archives decoded at once
    #[arg(long, default_value_t = 4)]
    concurrency: usize,
    /// Include per-archive diagnostics in the summary
    #[arg(long)]
    diagnostics: bool,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Command::Extract(args) => extract_cmd(args),
        Command::Config => {
            let json = ExtractConfig::default().to_json_pretty()?;
            println!("{json}");
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "adsnap=debug" } else { "adsnap=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn extract_cmd(args: ExtractArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ExtractConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExtractConfig::default(),
    };
    let engine = match Engine::new(
        &config,
        EngineOptions {
            concurrency: args.concurrency,
            keep_diagnostics: args.diagnostics,
        },
    ) {
        Ok(engine) => engine,
        Err(e) => {
            print_json(ApiResponse::<()>::err(e.to_string()));
            return Err(e).context("building extraction pipeline");
        }
    };

    let mut inputs = Vec::new();
    let mut unreadable: Vec<(String, String)> = Vec::new();
    for path in &args.files {
        match ArchiveInput::from_path(path) {
            Ok(input) => inputs.push(input),
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "cannot read archive");
                unreadable.push((path.display().to_string(), e.to_string()));
            }
        }
    }

    let mut sink = JsonLinesSink::new(std::io::stdout());
    let summary = runtime::block_on(engine.run(inputs, &mut sink));

    print_json(ApiResponse::ok(serde_json::json!({
        "summary": summary,
        "unreadable": unreadable,
    })));
    Ok(())
}

fn print_json<T: serde::Serialize>(val: T) {
    // one line, so it can follow the record lines
    match serde_json::to_string(&val) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!(error = %e, "summary did not serialize"),
    }
}
