//! Benchmark phase runner
//!
//! Drives the two phases of the benchmark: build (stream training rows into
//! the engine, then commit) and search (load the index, stream query rows,
//! search top-k, compute recall against ground truth). Rows flow straight
//! from the loader callback into the engine; nothing is buffered.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::BenchmarkConfig;
use crate::dataset::{DatasetLoader, QueryRow, TrainingRow};
use crate::engine::{to_tuples, SearchHit, SparseIndexEngine};
use crate::utils::Result;

use super::stats::{PhaseResult, PhaseStats};

pub struct Runner<'a, E: SparseIndexEngine> {
    config: &'a BenchmarkConfig,
    engine: &'a E,
    loader: DatasetLoader,
}

impl<'a, E: SparseIndexEngine> Runner<'a, E> {
    pub fn new(config: &'a BenchmarkConfig, engine: &'a E) -> Self {
        Self {
            config,
            engine,
            loader: DatasetLoader::new(config.dataset.clone()),
        }
    }

    /// Build phase: create the index, insert every training row, commit
    pub fn run_build(&self) -> Result<PhaseResult> {
        info!("Creating index at {:?}", self.config.index_path);
        self.engine.create_index("{}")?;

        info!("Building index from training rows...");
        let bar = spinner(self.config.quiet);
        let mut stats = PhaseStats::start("build");
        let mut errors = 0u64;
        let delivered = self.loader.iterate_train_rows(
            |row: TrainingRow| {
                let tuples = to_tuples(&row.dim_ids, &row.weights);
                let begin = Instant::now();
                if let Err(e) = self.engine.insert(row.row_id, &tuples) {
                    if errors == 0 {
                        warn!("insert failed for row {}: {}", row.row_id, e);
                    }
                    errors += 1;
                }
                stats.record(begin.elapsed());
                bar.inc(1);
            },
            self.config.train_rows_limit,
        )?;
        bar.finish_and_clear();

        info!("Committing index ({} rows)", delivered);
        self.engine.commit()?;
        Ok(stats.finish(delivered, errors))
    }

    /// Search phase: load the index, run every query, report mean recall@k
    pub fn run_search(&self) -> Result<PhaseResult> {
        info!("Loading index at {:?}", self.config.index_path);
        self.engine.load()?;

        info!("Searching with query rows...");
        let bar = spinner(self.config.quiet);
        let top_k = self.config.top_k;
        let mut stats = PhaseStats::start("search");
        let mut errors = 0u64;
        let mut recall_sum = 0.0f64;
        let mut recall_count = 0u64;
        let delivered = self.loader.iterate_query_rows(
            |row: QueryRow| {
                let tuples = to_tuples(&row.dim_ids, &row.weights);
                let begin = Instant::now();
                match self.engine.search(&tuples, &[], top_k) {
                    Ok(hits) => {
                        stats.record(begin.elapsed());
                        if !hits.is_empty() && !row.neighbors.is_empty() {
                            recall_sum += recall_at_k(&hits, &row.neighbors, top_k);
                            recall_count += 1;
                        }
                    }
                    Err(e) => {
                        stats.record(begin.elapsed());
                        if errors == 0 {
                            warn!("search failed for query {}: {}", row.id, e);
                        }
                        errors += 1;
                    }
                }
                bar.inc(1);
            },
            self.config.query_rows_limit,
        )?;
        bar.finish_and_clear();

        let mut result = stats.finish(delivered, errors);
        if recall_count > 0 {
            result.recall = Some(recall_sum / recall_count as f64);
        }
        Ok(result)
    }
}

/// Fraction of the first k ground-truth neighbors present in the hits
fn recall_at_k(hits: &[SearchHit], neighbors: &[u32], k: usize) -> f64 {
    let truth = &neighbors[..neighbors.len().min(k)];
    if truth.is_empty() {
        return 0.0;
    }
    let found = truth
        .iter()
        .filter(|&&id| hits.iter().any(|hit| hit.row_id == u64::from(id)))
        .count();
    found as f64 / truth.len() as f64
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} rows | {per_sec}")
            .unwrap(),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliArgs;
    use crate::engine::NullEngine;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn config_for(train: &NamedTempFile, query: &NamedTempFile, extra: &[&str]) -> BenchmarkConfig {
        let mut argv = vec![
            "sparse-search-benchmark".to_string(),
            "--train-file".to_string(),
            train.path().to_str().unwrap().to_string(),
            "--query-file".to_string(),
            query.path().to_str().unwrap().to_string(),
            "--quiet".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        let args = CliArgs::parse_from(argv);
        BenchmarkConfig::from_cli(&args).unwrap()
    }

    #[test]
    fn test_build_phase_inserts_every_row() {
        let train = write_temp(
            r#"[{"row_id": 0, "dim_ids": [1], "weights": [0.5]},
                {"row_id": 1, "dim_ids": [2], "weights": [0.6]}]"#,
        );
        let query = write_temp("[]");
        let config = config_for(&train, &query, &[]);
        let engine = NullEngine::new();
        let runner = Runner::new(&config, &engine);

        let result = runner.run_build().unwrap();
        assert_eq!(result.operations, 2);
        assert_eq!(result.errors, 0);
        assert_eq!(engine.inserted(), 2);
    }

    #[test]
    fn test_build_phase_honors_row_limit() {
        let train = write_temp(
            r#"[{"row_id": 0, "dim_ids": [], "weights": []},
                {"row_id": 1, "dim_ids": [], "weights": []},
                {"row_id": 2, "dim_ids": [], "weights": []}]"#,
        );
        let query = write_temp("[]");
        let config = config_for(&train, &query, &["--train-rows-limit", "2"]);
        let engine = NullEngine::new();
        let runner = Runner::new(&config, &engine);

        let result = runner.run_build().unwrap();
        assert_eq!(result.operations, 2);
        assert_eq!(engine.inserted(), 2);
    }

    #[test]
    fn test_search_phase_runs_all_queries() {
        let train = write_temp("[]");
        let query = write_temp(
            r#"[{"id": 5, "dim_ids": [1], "weights": [0.5],
                 "neighbors": [0], "distances": [0.1]}]"#,
        );
        let config = config_for(&train, &query, &[]);
        let engine = NullEngine::new();
        let runner = Runner::new(&config, &engine);

        let result = runner.run_search().unwrap();
        assert_eq!(result.operations, 1);
        assert_eq!(engine.searched(), 1);
        // NullEngine returns no hits, so recall is unavailable
        assert!(result.recall.is_none());
    }

    #[test]
    fn test_recall_at_k() {
        let hits = [
            SearchHit { row_id: 3, score: 0.9 },
            SearchHit { row_id: 7, score: 0.8 },
            SearchHit { row_id: 9, score: 0.7 },
        ];
        assert_eq!(recall_at_k(&hits, &[3, 7, 100], 3), 2.0 / 3.0);
        assert_eq!(recall_at_k(&hits, &[3], 3), 1.0);
        assert_eq!(recall_at_k(&hits, &[100, 200], 2), 0.0);
        // Only the first k ground-truth ids count
        assert_eq!(recall_at_k(&hits, &[3, 100], 1), 1.0);
        assert_eq!(recall_at_k(&hits, &[], 3), 0.0);
    }
}
