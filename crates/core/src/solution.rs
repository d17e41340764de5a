//! Multi-bin packing solution.

use crate::bin::{BinOptions, BinStrategy};
use crate::error::{Error, Result};
use crate::geometry::Item;
use crate::heuristic::PackingHeuristic;
use crate::maxspace::MaxSpaceBin;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a packing solution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolutionConfig {
    /// Allow items to be rotated by 90 degrees.
    pub allow_rotation: bool,
    /// Coalesce aligned free spaces after each insert.
    pub merge_free_spaces: bool,
    /// Evaluate candidate bins in parallel.
    pub parallel_evaluation: bool,
    /// Seed of the solution's random generator (None = from entropy).
    pub seed: Option<u64>,
}

impl Default for SolutionConfig {
    fn default() -> Self {
        Self {
            allow_rotation: false,
            merge_free_spaces: false,
            parallel_evaluation: false,
            seed: None,
        }
    }
}

impl SolutionConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether items may be rotated.
    pub fn with_rotation(mut self, allow: bool) -> Self {
        self.allow_rotation = allow;
        self
    }

    /// Sets whether free spaces are merged after each insert.
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge_free_spaces = merge;
        self
    }

    /// Sets whether open bins are evaluated in parallel.
    pub fn with_parallel_evaluation(mut self, parallel: bool) -> Self {
        self.parallel_evaluation = parallel;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Options passed to every opened bin.
    pub fn bin_options(&self) -> BinOptions {
        BinOptions {
            allow_rotation: self.allow_rotation,
            merge_free_spaces: self.merge_free_spaces,
        }
    }
}

/// A set of same-size bins holding every item of a working list.
///
/// The working list keeps the unplaced items; bins own the placed copies.
/// Ruin-and-recreate reorders the working list and rebuilds every bin from
/// it.
#[derive(Debug, Clone)]
pub struct PackingSolution<B: BinStrategy = MaxSpaceBin> {
    bin_width: i64,
    bin_height: i64,
    config: SolutionConfig,
    bins: Vec<B>,
    items: Vec<Item>,
    num_items: Option<usize>,
    lower_bound: Option<usize>,
    rng: StdRng,
}

impl PackingSolution {
    /// Creates an empty solution using maximal-space bins and the default
    /// configuration.
    pub fn new(bin_width: i64, bin_height: i64) -> Self {
        Self::with_config(bin_width, bin_height, SolutionConfig::default())
    }

    /// Creates an empty solution using maximal-space bins.
    pub fn with_config(bin_width: i64, bin_height: i64, config: SolutionConfig) -> Self {
        PackingSolution::<MaxSpaceBin>::with_strategy(bin_width, bin_height, config)
    }
}

impl<B: BinStrategy> PackingSolution<B> {
    /// Creates an empty solution for any bin strategy.
    pub fn with_strategy(bin_width: i64, bin_height: i64, config: SolutionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            bin_width,
            bin_height,
            config,
            bins: Vec::new(),
            items: Vec::new(),
            num_items: None,
            lower_bound: None,
            rng,
        }
    }

    /// Reseeds the random generator.
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Random generator owned by this solution.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Configuration of this solution.
    pub fn config(&self) -> &SolutionConfig {
        &self.config
    }

    /// Bin width.
    pub fn bin_width(&self) -> i64 {
        self.bin_width
    }

    /// Bin height.
    pub fn bin_height(&self) -> i64 {
        self.bin_height
    }

    /// Area lower bound on the number of bins: `floor(total / bin) + 1`.
    ///
    /// An exact multiple of the bin area still gets the extra bin. Fails with
    /// `InvalidArgument` if either bin dimension is not positive.
    pub fn compute_lower_bound(&self, items: &[Item]) -> Result<usize> {
        self.check_bin_dimensions()?;
        let total: i64 = items.iter().map(Item::area).sum();
        Ok((total / (self.bin_width * self.bin_height)) as usize + 1)
    }

    fn check_bin_dimensions(&self) -> Result<()> {
        if self.bin_width <= 0 || self.bin_height <= 0 {
            return Err(Error::InvalidArgument(format!(
                "bin dimensions must be positive, got {}x{}",
                self.bin_width, self.bin_height
            )));
        }
        Ok(())
    }

    /// Packs `items` in order, replacing any previous packing.
    ///
    /// The first call fixes the lower bound and item count. Each item goes
    /// to the open bin offering the best candidate; when no bin fits, a new
    /// bin is opened. Starts from a single bin if `open_first_only`, from
    /// `lower_bound` bins otherwise.
    pub fn pack(
        &mut self,
        items: Vec<Item>,
        heuristic: PackingHeuristic,
        open_first_only: bool,
    ) -> Result<()> {
        self.check_bin_dimensions()?;
        if let Some(item) = items.iter().find(|i| i.width() <= 0 || i.height() <= 0) {
            return Err(Error::InvalidArgument(format!(
                "item dimensions must be positive, got {}x{}",
                item.width(),
                item.height()
            )));
        }

        if self.lower_bound.is_none() {
            self.num_items = Some(items.len());
            self.lower_bound = Some(self.compute_lower_bound(&items)?);
        }
        self.items = items;
        self.repack(heuristic, open_first_only)
    }

    /// Ruin-and-recreate move.
    ///
    /// Takes `max(2, floor(fraction * n) + 1)` items (at most `n`) from the
    /// tail of the working list if `from_end`, from the head otherwise. The
    /// range is sorted by decreasing area if `sort_before_repack`, randomly
    /// perturbed otherwise, and the whole list is packed again.
    pub fn remove_and_repack(
        &mut self,
        heuristic: PackingHeuristic,
        fraction: f64,
        from_end: bool,
        sort_before_repack: bool,
        open_first_only: bool,
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidArgument(format!(
                "fraction {} is outside [0, 1]",
                fraction
            )));
        }
        if self.lower_bound.is_none() {
            return Err(Error::PreconditionViolated(
                "remove_and_repack called before pack".to_string(),
            ));
        }

        let n = self.items.len();
        let count = removal_count(fraction, n);
        let range = if from_end { n - count..n } else { 0..count };
        log::debug!(
            "repacking {} of {} items ({}, {})",
            count,
            n,
            if from_end { "tail" } else { "head" },
            if sort_before_repack { "sorted" } else { "perturbed" }
        );

        let removed = &mut self.items[range];
        if sort_before_repack {
            removed.sort_by(|a, b| b.cmp_area(a));
        } else {
            perturb(removed, &mut self.rng);
        }

        self.repack(heuristic, open_first_only)
    }

    fn repack(&mut self, heuristic: PackingHeuristic, open_first_only: bool) -> Result<()> {
        let result = self.pack_items(heuristic, open_first_only);
        if result.is_err() {
            self.bins.clear();
        }
        result
    }

    fn pack_items(&mut self, heuristic: PackingHeuristic, open_first_only: bool) -> Result<()> {
        let initial = if open_first_only {
            1
        } else {
            self.lower_bound.unwrap_or(1)
        };

        self.bins.clear();
        for _ in 0..initial {
            let bin = self.open_bin();
            self.bins.push(bin);
        }
        log::debug!(
            "packing {} items into {} pre-opened {}x{} bins",
            self.items.len(),
            initial,
            self.bin_width,
            self.bin_height
        );

        for idx in 0..self.items.len() {
            let mut item = self.items[idx].clone();
            item.remove_packing_info();

            if let Some((bin_idx, candidate)) = self.best_candidate(&item, heuristic) {
                if !self.bins[bin_idx].insert(candidate, heuristic)? {
                    return Err(Error::InternalInconsistency(format!(
                        "bin {} rejected its own candidate for {}",
                        bin_idx, item
                    )));
                }
                continue;
            }

            let mut bin = self.open_bin();
            if !bin.insert(item.clone(), heuristic)? {
                log::warn!(
                    "{} does not fit an empty {}x{} bin",
                    item,
                    self.bin_width,
                    self.bin_height
                );
                return Err(Error::InfeasibleInstance(format!(
                    "item {}x{} does not fit an empty {}x{} bin",
                    item.width(),
                    item.height(),
                    self.bin_width,
                    self.bin_height
                )));
            }
            self.bins.push(bin);
            log::debug!("opened bin {}", self.bins.len());
        }

        Ok(())
    }

    fn open_bin(&self) -> B {
        B::open(self.bin_width, self.bin_height, self.config.bin_options())
    }

    /// Best candidate over all open bins. Ties go to the lower bin index.
    fn best_candidate(&self, item: &Item, heuristic: PackingHeuristic) -> Option<(usize, Item)> {
        let candidates: Vec<Option<Item>> = if self.config.parallel_evaluation {
            self.bins
                .par_iter()
                .map(|bin| bin.evaluate(item, heuristic))
                .collect()
        } else {
            self.bins
                .iter()
                .map(|bin| bin.evaluate(item, heuristic))
                .collect()
        };

        let mut best: Option<(usize, Item)> = None;
        for (idx, candidate) in candidates.into_iter().enumerate() {
            let Some(candidate) = candidate else {
                continue;
            };
            let better = match &best {
                Some((_, current)) => candidate.score().is_better_than(&current.score()),
                None => true,
            };
            if better {
                best = Some((idx, candidate));
            }
        }
        best
    }

    /// True if the bin count respects the lower bound and every bin is
    /// feasible.
    pub fn feasible(&self) -> bool {
        self.bins.len() >= self.lower_bound.unwrap_or(0) && self.bins.iter().all(B::feasible)
    }

    /// Number of open bins, including pre-opened bins left empty.
    pub fn number_of_bins(&self) -> usize {
        self.bins.len()
    }

    /// Number of bins holding at least one item.
    pub fn number_of_used_bins(&self) -> usize {
        self.bins.iter().filter(|bin| !bin.is_empty()).count()
    }

    /// Bin with the lowest occupancy. The first one wins ties.
    pub fn least_filled_bin(&self) -> Result<&B> {
        let mut least: Option<(&B, f64)> = None;
        for bin in &self.bins {
            let occupancy = if bin.is_empty() {
                0.0
            } else {
                bin.state().checked_occupancy()?
            };
            if least.map_or(true, |(_, lowest)| occupancy < lowest) {
                least = Some((bin, occupancy));
            }
        }
        least
            .map(|(bin, _)| bin)
            .ok_or_else(|| Error::PreconditionViolated("solution has no bins".to_string()))
    }

    /// Number of bins plus the occupancy of the least filled one.
    ///
    /// Smaller is better: among solutions with equal bin counts, the one
    /// that concentrates its slack in a single bin scores lower.
    pub fn solution_value(&self) -> Result<f64> {
        let least = self.least_filled_bin()?;
        Ok(self.bins.len() as f64 + least.occupancy())
    }

    /// Sum of the unoccupied fractions of all bins.
    pub fn wasted_area(&self) -> f64 {
        self.bins.iter().map(|bin| 1.0 - bin.occupancy()).sum()
    }

    /// Absolute difference of wasted area between two solutions.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.wasted_area() - other.wasted_area()).abs()
    }

    /// Item count fixed by the first `pack`.
    pub fn size(&self) -> Option<usize> {
        self.num_items
    }

    /// Lower bound fixed by the first `pack`.
    pub fn lower_bound(&self) -> Option<usize> {
        self.lower_bound
    }

    /// Open bins in opening order.
    pub fn bins(&self) -> &[B] {
        &self.bins
    }

    /// Working list in current packing order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All packed items, bin by bin.
    pub fn packed_items(&self) -> impl Iterator<Item = &Item> {
        self.bins.iter().flat_map(|bin| bin.packed_items().iter())
    }
}

/// Items taken by a ruin-and-recreate move over `n` items.
pub(crate) fn removal_count(fraction: f64, n: usize) -> usize {
    ((fraction * n as f64).floor() as usize + 1).max(2).min(n)
}

/// Swaps random pairs of distinct positions. Slices of two items or fewer
/// are left unchanged.
fn perturb<R: Rng + ?Sized>(items: &mut [Item], rng: &mut R) {
    let len = items.len();
    if len <= 2 {
        return;
    }
    let strength = 0.025 + 0.125 * rng.gen::<f64>();
    let swaps = ((strength * len as f64).round() as usize).max(1);
    for _ in 0..swaps {
        let i = rng.gen_range(0..len);
        let mut j = rng.gen_range(0..len);
        while j == i {
            j = rng.gen_range(0..len);
        }
        items.swap(i, j);
    }
}

impl<B: BinStrategy> fmt::Display for PackingSolution<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bin) in self.bins.iter().enumerate() {
            writeln!(
                f,
                "Bin {}: n = {} occupancy = {}",
                i,
                bin.packed_items().len(),
                bin.occupancy()
            )?;
        }
        Ok(())
    }
}
