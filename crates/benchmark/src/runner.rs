//! Ruin-and-recreate local search over packing solutions.

use rand::prelude::*;
use rand::rngs::StdRng;
use rbp_core::{BinStrategy, Instance, PackingHeuristic, PackingSolution, SolutionConfig};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Configuration for a local search run.
#[derive(Debug, Clone)]
pub struct LocalSearchConfig {
    /// Placement heuristic used for every repack.
    pub heuristic: PackingHeuristic,
    /// Number of ruin-and-recreate moves.
    pub iterations: usize,
    /// Smallest fraction of items removed per move.
    pub min_fraction: f64,
    /// Largest fraction of items removed per move.
    pub max_fraction: f64,
    /// Probability that a move sorts the removed items instead of perturbing
    /// them.
    pub sort_probability: f64,
    /// Sort the initial queue by area instead of shuffling it.
    pub sort_initial: bool,
    /// Allow 90 degree rotation.
    pub allow_rotation: bool,
    /// Random seed (None = from entropy).
    pub seed: Option<u64>,
    /// Maximum time limit (None = unlimited).
    pub time_limit: Option<Duration>,
    /// Record item placements in the result.
    pub record_placements: bool,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            heuristic: PackingHeuristic::BestAreaFit,
            iterations: 200,
            min_fraction: 0.05,
            max_fraction: 0.4,
            sort_probability: 0.2,
            sort_initial: true,
            allow_rotation: false,
            seed: None,
            time_limit: None,
            record_placements: false,
        }
    }
}

impl LocalSearchConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the placement heuristic.
    pub fn with_heuristic(mut self, heuristic: PackingHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Sets the number of moves.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the removal fraction range. Both ends are clamped to `[0, 1]`.
    pub fn with_fraction_range(mut self, min: f64, max: f64) -> Self {
        let min = min.clamp(0.0, 1.0);
        self.min_fraction = min;
        self.max_fraction = max.clamp(min, 1.0);
        self
    }

    /// Sets the probability of a sorted repack.
    pub fn with_sort_probability(mut self, probability: f64) -> Self {
        self.sort_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Sets whether the initial queue is sorted.
    pub fn with_sorted_initial(mut self, sort: bool) -> Self {
        self.sort_initial = sort;
        self
    }

    /// Sets whether items may be rotated.
    pub fn with_rotation(mut self, allow: bool) -> Self {
        self.allow_rotation = allow;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets whether placements are recorded.
    pub fn with_placements(mut self, record: bool) -> Self {
        self.record_placements = record;
        self
    }
}

/// One packed item in a result.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementInfo {
    /// Bin index.
    pub bin: usize,
    /// Identity index of the item within its instance.
    pub item: Option<usize>,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub rotated: bool,
}

/// Summary of a local search run.
#[derive(Debug, Clone, Serialize)]
pub struct LocalSearchResult {
    /// Index of the instance within its file.
    pub instance: usize,
    /// Placement heuristic.
    pub heuristic: PackingHeuristic,
    /// Number of items.
    pub items: usize,
    /// Area lower bound on the number of bins.
    pub lower_bound: usize,
    /// Bins of the initial solution.
    pub initial_bins: usize,
    /// Bins of the best solution.
    pub best_bins: usize,
    /// Bins of the best solution holding at least one item.
    pub used_bins: usize,
    /// Solution value of the initial solution.
    pub initial_value: f64,
    /// Solution value of the best solution.
    pub best_value: f64,
    /// Moves performed.
    pub iterations: usize,
    /// Moves accepted.
    pub accepted: usize,
    /// Moves that improved the best value.
    pub improvements: usize,
    /// Computation time in milliseconds.
    pub time_ms: u64,
    /// Item placements of the best solution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placements: Option<Vec<PlacementInfo>>,
    /// Best solution found.
    #[serde(skip)]
    pub solution: PackingSolution,
}

/// Hill climbing over ruin-and-recreate moves.
///
/// Each move clones the current solution, removes a random fraction of its
/// items from the head or tail of the packing order, and repacks. A move is
/// accepted when the solution value does not get worse.
pub struct LocalSearch {
    config: LocalSearchConfig,
}

impl LocalSearch {
    /// Creates a new local search.
    pub fn new(config: LocalSearchConfig) -> Self {
        Self { config }
    }

    /// Configuration of this search.
    pub fn config(&self) -> &LocalSearchConfig {
        &self.config
    }

    /// Runs the search on one instance.
    pub fn run(&self, index: usize, instance: &Instance) -> rbp_core::Result<LocalSearchResult> {
        let start = Instant::now();
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let heuristic = self.config.heuristic;

        let solution_config = SolutionConfig::new()
            .with_rotation(self.config.allow_rotation)
            .with_seed(rng.gen());
        instance.validate(self.config.allow_rotation)?;
        let mut current =
            instance.initial_solution(heuristic, self.config.sort_initial, solution_config)?;
        let mut current_value = current.solution_value()?;
        let initial_bins = current.number_of_bins();
        let initial_value = current_value;

        let mut best = current.clone();
        let mut best_value = current_value;
        let mut accepted = 0;
        let mut improvements = 0;
        let mut performed = 0;

        for iteration in 0..self.config.iterations {
            if let Some(limit) = self.config.time_limit {
                if start.elapsed() >= limit {
                    log::debug!("time limit reached after {} moves", iteration);
                    break;
                }
            }
            performed += 1;

            let fraction = if self.config.max_fraction > self.config.min_fraction {
                rng.gen_range(self.config.min_fraction..=self.config.max_fraction)
            } else {
                self.config.min_fraction
            };
            let from_end = rng.gen_bool(0.5);
            let sort = rng.gen_bool(self.config.sort_probability);

            let mut candidate = current.clone();
            candidate.seed(rng.gen());
            candidate.remove_and_repack(heuristic, fraction, from_end, sort, false)?;
            let value = candidate.solution_value()?;

            if value <= current_value {
                accepted += 1;
                current = candidate;
                current_value = value;
                if value < best_value {
                    improvements += 1;
                    best_value = value;
                    best = current.clone();
                    log::debug!(
                        "instance {}: move {} improved to {:.4} ({} bins)",
                        index,
                        iteration,
                        value,
                        best.number_of_bins()
                    );
                }
            }
        }

        let placements = self.config.record_placements.then(|| placements_of(&best));

        Ok(LocalSearchResult {
            instance: index,
            heuristic,
            items: instance.len(),
            lower_bound: best.lower_bound().unwrap_or(0),
            initial_bins,
            best_bins: best.number_of_bins(),
            used_bins: best.number_of_used_bins(),
            initial_value,
            best_value,
            iterations: performed,
            accepted,
            improvements,
            time_ms: start.elapsed().as_millis() as u64,
            placements,
            solution: best,
        })
    }
}

fn placements_of(solution: &PackingSolution) -> Vec<PlacementInfo> {
    let mut placements = Vec::new();
    for (bin_idx, bin) in solution.bins().iter().enumerate() {
        for item in bin.packed_items() {
            if let Some((x, y)) = item.position() {
                placements.push(PlacementInfo {
                    bin: bin_idx,
                    item: item.id(),
                    x,
                    y,
                    width: item.width(),
                    height: item.height(),
                    rotated: item.is_rotated(),
                });
            }
        }
    }
    placements
}
