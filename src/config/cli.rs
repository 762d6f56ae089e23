//! Command-line argument parsing
//!
//! Index location, the two dataset files, row limits, and phase
//! selection. `BenchmarkConfig` validates the combination afterwards.

use clap::Parser;
use std::path::PathBuf;

/// Benchmark tool for the sparse-index engine over sparse-vector datasets
#[derive(Parser, Debug, Clone)]
#[command(name = "sparse-search-benchmark")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Directory holding the engine's index files
    #[arg(
        long = "index-path",
        default_value = "/tmp/sparse_index/benchmark/index_path"
    )]
    pub index_path: PathBuf,

    /// Training dataset: JSON array of rows to index
    #[arg(long = "train-file")]
    pub train_file: Option<PathBuf>,

    /// Query dataset: JSON array of queries with ground-truth neighbors
    #[arg(long = "query-file")]
    pub query_file: Option<PathBuf>,

    /// Cap on training rows to index (default: all)
    #[arg(long = "train-rows-limit")]
    pub train_rows_limit: Option<u64>,

    /// Cap on query rows to search (default: all)
    #[arg(long = "query-rows-limit")]
    pub query_rows_limit: Option<u64>,

    /// Skip the index build phase and reuse an existing index
    #[arg(long = "skip-build-index")]
    pub skip_build_index: bool,

    /// Number of results to request per search
    #[arg(long = "top-k", default_value_t = 5)]
    pub top_k: usize,

    /// Write phase results as JSON to this path
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(long)]
    pub verbose: bool,

    /// Quiet output (errors only, no progress bar)
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
