//! 2BP Benchmark Suite for RBP
//!
//! This crate provides:
//! - A parser for the 2BP rectangle bin packing instance format
//! - A ruin-and-recreate local search driver
//! - Result recording and reporting

mod parser;
mod result;
mod runner;

pub use parser::{InstanceParser, ParseError};
pub use result::{BenchmarkMetadata, BenchmarkResult};
pub use runner::{LocalSearch, LocalSearchConfig, LocalSearchResult, PlacementInfo};
