//! Benchmark configuration derived from CLI arguments

use std::path::PathBuf;

use crate::dataset::{DatasetConfig, RowLimit};
use crate::utils::{BenchmarkError, Result};

use super::cli::CliArgs;

/// Complete benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub index_path: PathBuf,
    pub dataset: DatasetConfig,
    pub train_rows_limit: RowLimit,
    pub query_rows_limit: RowLimit,
    pub skip_build_index: bool,
    pub top_k: usize,
    pub output: Option<PathBuf>,
    pub quiet: bool,
}

impl BenchmarkConfig {
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        if args.top_k == 0 {
            return Err(BenchmarkError::Config("--top-k must be at least 1".into()));
        }
        if !args.skip_build_index && args.train_file.is_none() {
            return Err(BenchmarkError::Config(
                "--train-file is required unless --skip-build-index is set".into(),
            ));
        }
        if args.train_file.is_none() && args.query_file.is_none() {
            return Err(BenchmarkError::Config(
                "at least one of --train-file or --query-file is required".into(),
            ));
        }

        Ok(Self {
            index_path: args.index_path.clone(),
            dataset: DatasetConfig {
                train_file: args.train_file.clone(),
                query_file: args.query_file.clone(),
            },
            train_rows_limit: args.train_rows_limit.into(),
            query_rows_limit: args.query_rows_limit.into(),
            skip_build_index: args.skip_build_index,
            top_k: args.top_k,
            output: args.output.clone(),
            quiet: args.quiet,
        })
    }
}
