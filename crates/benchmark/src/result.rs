//! Benchmark result collection and reporting.

use crate::runner::LocalSearchResult;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Metadata about the benchmark run.
#[derive(Debug, Default, Serialize)]
pub struct BenchmarkMetadata {
    /// rbp version
    pub version: String,
    /// Source file of the instances
    pub source: String,
    /// Configuration used
    pub config: String,
}

/// Collection of local search results.
#[derive(Debug, Default, Serialize)]
pub struct BenchmarkResult {
    /// Individual runs
    pub runs: Vec<LocalSearchResult>,
    /// Additional metadata
    pub metadata: BenchmarkMetadata,
}

impl BenchmarkResult {
    /// Creates an empty result for instances read from `source`.
    pub fn new(source: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            runs: Vec::new(),
            metadata: BenchmarkMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                source: source.into(),
                config: config.into(),
            },
        }
    }

    /// Adds a run result.
    pub fn add_run(&mut self, result: LocalSearchResult) {
        self.runs.push(result);
    }

    /// Total number of bins over all runs.
    pub fn total_bins(&self) -> usize {
        self.runs.iter().map(|r| r.best_bins).sum()
    }

    /// Total of the lower bounds over all runs.
    pub fn total_lower_bound(&self) -> usize {
        self.runs.iter().map(|r| r.lower_bound).sum()
    }

    /// Saves results to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    /// Saves results to a CSV file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let mut file = File::create(path)?;

        writeln!(
            file,
            "instance,heuristic,items,lower_bound,initial_bins,best_bins,used_bins,initial_value,best_value,iterations,accepted,improvements,time_ms"
        )?;

        for run in &self.runs {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{:.4},{:.4},{},{},{},{}",
                run.instance,
                run.heuristic,
                run.items,
                run.lower_bound,
                run.initial_bins,
                run.best_bins,
                run.used_bins,
                run.initial_value,
                run.best_value,
                run.iterations,
                run.accepted,
                run.improvements,
                run.time_ms,
            )?;
        }

        Ok(())
    }

    /// Prints a summary table to stdout.
    pub fn print_summary(&self) {
        println!("\n{:=<84}", "");
        println!("BENCHMARK RESULTS");
        println!("{:=<84}", "");
        println!(
            "{:<10} {:<28} {:>6} {:>6} {:>8} {:>6} {:>8} {:>8}",
            "Instance", "Heuristic", "Items", "LB", "Initial", "Best", "Value", "Time(ms)"
        );
        println!("{:-<84}", "");

        for run in &self.runs {
            println!(
                "{:<10} {:<28} {:>6} {:>6} {:>8} {:>6} {:>8.4} {:>8}",
                run.instance,
                run.heuristic,
                run.items,
                run.lower_bound,
                run.initial_bins,
                run.best_bins,
                run.best_value,
                run.time_ms
            );
        }

        println!("{:-<84}", "");
        println!(
            "Total bins: {} (lower bounds: {})",
            self.total_bins(),
            self.total_lower_bound()
        );
    }
}
