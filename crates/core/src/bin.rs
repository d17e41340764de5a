//! Bin contract shared by all free-space strategies.
//!
//! [`BinState`] holds everything that does not depend on how free space is
//! tracked: the packed items, the occupied-area accumulator and the metrics
//! derived from them. [`BinStrategy`] is the capability interface the
//! solution orchestrator works against.

use crate::error::{Error, Result};
use crate::geometry::{common_length, Item, Rect};
use crate::heuristic::PackingHeuristic;
use std::cmp::Ordering;
use std::fmt;

/// Options applied to every bin a solution opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinOptions {
    /// Allow items to be rotated by 90 degrees.
    pub allow_rotation: bool,
    /// Coalesce aligned free spaces after each insert.
    pub merge_free_spaces: bool,
}

/// A bin packing strategy: tracks free space and decides where items go.
pub trait BinStrategy: Clone + Send + Sync {
    /// Opens an empty bin.
    fn open(width: i64, height: i64, options: BinOptions) -> Self;

    /// Finds the best placement of `item` under `heuristic` without changing
    /// the bin. Returns the placed candidate, or `None` if the item does not
    /// fit anywhere.
    fn evaluate(&self, item: &Item, heuristic: PackingHeuristic) -> Option<Item>;

    /// Packs `item`, evaluating it first unless it already carries a
    /// position. Returns `Ok(false)` without changing the bin when the item
    /// does not fit.
    fn insert(&mut self, item: Item, heuristic: PackingHeuristic) -> Result<bool>;

    /// Shared bin state.
    fn state(&self) -> &BinState;

    /// True if all packed items are inside the bin and pairwise disjoint.
    fn feasible(&self) -> bool {
        self.state().feasible()
    }

    /// Fraction of the bin area covered by packed items.
    fn occupancy(&self) -> f64 {
        self.state().occupancy()
    }

    /// Packed items in insertion order.
    fn packed_items(&self) -> &[Item] {
        self.state().packed_items()
    }

    /// True if nothing has been packed.
    fn is_empty(&self) -> bool {
        self.state().is_empty()
    }
}

/// Packed items and occupancy bookkeeping of one bin.
#[derive(Debug, Clone)]
pub struct BinState {
    width: i64,
    height: i64,
    allow_rotation: bool,
    packed: Vec<Item>,
    occupied_area: i64,
}

impl BinState {
    /// Creates the state of an empty bin.
    pub fn new(width: i64, height: i64, allow_rotation: bool) -> Self {
        Self {
            width,
            height,
            allow_rotation,
            packed: Vec::new(),
            occupied_area: 0,
        }
    }

    /// Removes all packed items.
    pub fn reset(&mut self) {
        self.packed.clear();
        self.occupied_area = 0;
    }

    /// Bin width.
    pub fn width(&self) -> i64 {
        self.width
    }

    /// Bin height.
    pub fn height(&self) -> i64 {
        self.height
    }

    /// Bin area.
    pub fn area(&self) -> i64 {
        self.width * self.height
    }

    /// Extent of the whole bin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// True if items may be rotated by 90 degrees.
    pub fn allows_rotation(&self) -> bool {
        self.allow_rotation
    }

    /// Appends a placed item and accounts for its area.
    ///
    /// Free space is left untouched; keeping it consistent is the
    /// strategy's job.
    pub fn commit_item(&mut self, item: Item) {
        self.occupied_area += item.area();
        self.packed.push(item);
    }

    /// Packed items in insertion order.
    pub fn packed_items(&self) -> &[Item] {
        &self.packed
    }

    /// Number of packed items.
    pub fn len(&self) -> usize {
        self.packed.len()
    }

    /// True if nothing has been packed.
    pub fn is_empty(&self) -> bool {
        self.packed.is_empty()
    }

    /// Sum of the areas of the packed items.
    pub fn packed_area(&self) -> i64 {
        self.occupied_area
    }

    /// Fraction of the bin area covered by packed items.
    pub fn occupancy(&self) -> f64 {
        self.occupied_area as f64 / self.area() as f64
    }

    /// Occupancy, checked to lie in `(0, 1]`.
    pub fn checked_occupancy(&self) -> Result<f64> {
        let occupancy = self.occupancy();
        if occupancy <= 0.0 || occupancy > 1.0 {
            return Err(Error::InternalInconsistency(format!(
                "bin occupancy {} is outside (0, 1]",
                occupancy
            )));
        }
        Ok(occupancy)
    }

    /// Checks that every packed item lies within the bin, that no two packed
    /// items overlap, and that the area accumulator matches the items.
    pub fn feasible(&self) -> bool {
        let bounds = self.bounds();
        let mut rects = Vec::with_capacity(self.packed.len());
        for item in &self.packed {
            match item.rect() {
                Some(rect) if rect.contained_in(&bounds) => rects.push(rect),
                _ => return false,
            }
        }

        for (i, a) in rects.iter().enumerate() {
            if rects[i + 1..].iter().any(|b| a.overlaps(b)) {
                return false;
            }
        }

        self.occupied_area == self.packed.iter().map(Item::area).sum::<i64>()
    }

    /// Length of the boundary of the rectangle `(x, y, width, height)` that
    /// would be shared with the bin edges and with packed items.
    pub fn touching_perimeter(&self, x: i64, y: i64, width: i64, height: i64) -> i64 {
        let mut perimeter = 0;
        if x == 0 {
            perimeter += height;
        }
        if x + width == self.width {
            perimeter += height;
        }
        if y == 0 {
            perimeter += width;
        }
        if y + height == self.height {
            perimeter += width;
        }

        for rect in self.packed.iter().filter_map(Item::rect) {
            if rect.right() == x || x + width == rect.x {
                perimeter += common_length(y, y + height, rect.y, rect.top());
            }
            if rect.y == y + height || rect.top() == y {
                perimeter += common_length(x, x + width, rect.x, rect.right());
            }
        }

        perimeter
    }

    /// Ratio of the touching perimeter of all packed items to their total
    /// perimeter. 0 for an empty bin.
    pub fn touching_ratio(&self) -> f64 {
        if self.packed.is_empty() {
            return 0.0;
        }
        let mut touching = 0;
        let mut total = 0;
        for item in &self.packed {
            if let Some((x, y)) = item.position() {
                touching += self.touching_perimeter(x, y, item.width(), item.height());
            }
            total += item.perimeter();
        }
        touching as f64 / total as f64
    }
}

/// Euclidean distance between two points.
pub(crate) fn distance(x1: i64, y1: i64, x2: i64, y2: i64) -> f64 {
    let dx = (x1 - x2) as f64;
    let dy = (y1 - y2) as f64;
    (dx * dx + dy * dy).sqrt()
}

impl PartialEq for BinState {
    /// Bins are equal when their packed items match positionally by
    /// dimensions.
    fn eq(&self, other: &Self) -> bool {
        self.packed.len() == other.packed.len()
            && self
                .packed
                .iter()
                .zip(&other.packed)
                .all(|(a, b)| a.same_dimensions(b))
    }
}

impl PartialOrd for BinState {
    /// Bins are ordered by occupancy.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.occupancy().partial_cmp(&other.occupancy())
    }
}

impl fmt::Display for BinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bin: {}", self.occupancy())
    }
}
