//! Problem instances: bin dimensions and the items to pack.

use crate::error::{Error, Result};
use crate::geometry::Item;
use crate::heuristic::PackingHeuristic;
use crate::solution::{PackingSolution, SolutionConfig};
use rand::seq::SliceRandom;
use std::fmt;

/// Bin dimensions and an ordered list of items.
///
/// Items receive identity indices `0..n` in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    bin_width: i64,
    bin_height: i64,
    items: Vec<Item>,
}

impl Instance {
    /// Creates an instance without items.
    pub fn new(bin_width: i64, bin_height: i64) -> Self {
        Self {
            bin_width,
            bin_height,
            items: Vec::new(),
        }
    }

    /// Replaces the items, assigning identity indices in order.
    pub fn load_items(&mut self, items: Vec<Item>) {
        self.items = items;
        for (id, item) in self.items.iter_mut().enumerate() {
            item.set_id(id);
        }
    }

    /// Appends one item with the next identity index.
    pub fn push(&mut self, mut item: Item) {
        item.set_id(self.items.len());
        self.items.push(item);
    }

    /// Sets the bin dimensions.
    pub fn set_bin_dimensions(&mut self, width: i64, height: i64) {
        self.bin_width = width;
        self.bin_height = height;
    }

    /// Bin width.
    pub fn bin_width(&self) -> i64 {
        self.bin_width
    }

    /// Bin height.
    pub fn bin_height(&self) -> i64 {
        self.bin_height
    }

    /// True once at least one item has been loaded.
    pub fn is_initialized(&self) -> bool {
        !self.items.is_empty()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the instance has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in load order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Sum of the item areas.
    pub fn total_area(&self) -> i64 {
        self.items.iter().map(Item::area).sum()
    }

    /// A fresh copy of the items, ready to be reordered and packed.
    pub fn packing_queue(&self) -> Vec<Item> {
        self.items.clone()
    }

    /// Checks dimensions, and that every item fits an empty bin in some
    /// allowed orientation.
    pub fn validate(&self, allow_rotation: bool) -> Result<()> {
        if self.bin_width <= 0 || self.bin_height <= 0 {
            return Err(Error::InvalidArgument(format!(
                "bin dimensions must be positive, got {}x{}",
                self.bin_width, self.bin_height
            )));
        }

        for (idx, item) in self.items.iter().enumerate() {
            let (w, h) = (item.width(), item.height());
            if w <= 0 || h <= 0 {
                return Err(Error::InvalidArgument(format!(
                    "item {} has non-positive dimensions {}x{}",
                    idx, w, h
                )));
            }
            let upright = w <= self.bin_width && h <= self.bin_height;
            let rotated = allow_rotation && h <= self.bin_width && w <= self.bin_height;
            if !upright && !rotated {
                return Err(Error::InvalidArgument(format!(
                    "item {} ({}x{}) does not fit a {}x{} bin",
                    idx, w, h, self.bin_width, self.bin_height
                )));
            }
        }
        Ok(())
    }

    /// A solution for this instance's bins with nothing packed yet.
    pub fn empty_solution(&self, config: SolutionConfig) -> PackingSolution {
        PackingSolution::with_config(self.bin_width, self.bin_height, config)
    }

    /// Packs all items into a new solution.
    ///
    /// Items are sorted by decreasing area if `sort`, shuffled with the
    /// solution's random generator otherwise.
    pub fn initial_solution(
        &self,
        heuristic: PackingHeuristic,
        sort: bool,
        config: SolutionConfig,
    ) -> Result<PackingSolution> {
        let mut solution = self.empty_solution(config);
        let mut queue = self.packing_queue();
        if sort {
            queue.sort_by(|a, b| b.cmp_area(a));
        } else {
            queue.shuffle(solution.rng());
        }

        solution.pack(queue, heuristic, false)?;
        if !solution.feasible() {
            return Err(Error::InternalInconsistency(
                "initial solution is not feasible".to_string(),
            ));
        }
        log::debug!(
            "initial solution for {} items uses {} bins",
            self.items.len(),
            solution.number_of_bins()
        );
        Ok(solution)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance size: {}", self.items.len())
    }
}
