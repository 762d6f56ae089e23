//! sparse-search-benchmark - benchmark driver for the sparse-index engine
//!
//! Streams the training dataset into the engine (build phase), then streams
//! the query dataset through top-k search with recall evaluation (search
//! phase). The dataset loader runs in constant memory regardless of file
//! size; the engine sits behind an FFI boundary.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sparse_search_benchmark::benchmark::{PhaseResult, Runner};
use sparse_search_benchmark::config::{BenchmarkConfig, CliArgs};
#[cfg(feature = "ffi")]
use sparse_search_benchmark::engine::FfiEngine;
#[cfg(not(feature = "ffi"))]
use sparse_search_benchmark::engine::NullEngine;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn print_banner(config: &BenchmarkConfig) {
    if config.quiet {
        return;
    }

    println!("sparse-search-benchmark v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("Index path: {:?}", config.index_path);
    if let Some(ref train) = config.dataset.train_file {
        println!("Train file: {:?} (limit: {:?})", train, config.train_rows_limit);
    }
    if let Some(ref query) = config.dataset.query_file {
        println!("Query file: {:?} (limit: {:?})", query, config.query_rows_limit);
    }
    println!("Top-k: {}", config.top_k);
    if config.skip_build_index {
        println!("Build phase: skipped");
    }
    println!("====================================\n");
}

fn print_summary(results: &[PhaseResult]) {
    println!("\n====================================");
    println!("BENCHMARK COMPLETE");
    println!("====================================");
    for result in results {
        println!(
            "{}: {} rows in {:.2}s ({:.0} rows/s), p50={}us p99={}us max={}us, errors={}",
            result.phase,
            result.operations,
            result.elapsed_secs,
            result.ops_per_sec,
            result.p50_us,
            result.p99_us,
            result.max_us,
            result.errors,
        );
        if let Some(recall) = result.recall {
            println!("{}: mean recall@k = {:.4}", result.phase, recall);
        }
    }
}

fn export_json(results: &[PhaseResult], path: &std::path::Path) -> Result<()> {
    let json = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "results": results,
    });
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    writeln!(file, "{}", serde_json::to_string_pretty(&json)?)?;
    Ok(())
}

fn run() -> Result<()> {
    let args = CliArgs::parse_args();

    setup_logging(args.verbose, args.quiet);

    let config = BenchmarkConfig::from_cli(&args)?;

    print_banner(&config);

    #[cfg(feature = "ffi")]
    let engine = FfiEngine::new(
        config
            .index_path
            .to_str()
            .context("index path is not valid UTF-8")?,
    )?;
    #[cfg(not(feature = "ffi"))]
    let engine = {
        info!("Engine FFI not linked; running against the counting NullEngine");
        NullEngine::new()
    };

    let runner = Runner::new(&config, &engine);
    let mut results = Vec::new();

    if config.skip_build_index {
        info!("Skipping index build phase");
    } else {
        results.push(runner.run_build()?);
    }

    if config.dataset.query_file.is_some() {
        results.push(runner.run_search()?);
    } else {
        info!("No query file configured; skipping search phase");
    }

    if let Some(ref output) = config.output {
        info!("Writing results to: {:?}", output);
        export_json(&results, output)?;
    }

    print_summary(&results);

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
