//! Rectangle geometry: free spaces and items.
//!
//! All coordinates are integers. The origin is the bottom-left corner of the
//! bin, `x` grows to the right and `y` grows upward.

use crate::heuristic::Score;
use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length of the overlap of the intervals `[start1, end1]` and `[start2, end2]`.
///
/// Returns 0 when the intervals are disjoint or only touch at an endpoint.
#[inline]
pub fn common_length(start1: i64, end1: i64, start2: i64, end2: i64) -> i64 {
    if start2 >= end1 || end2 <= start1 {
        return 0;
    }
    end1.min(end2) - start1.max(start2)
}

/// An axis-aligned rectangle with a position, used for free spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    /// Left edge.
    pub x: i64,
    /// Bottom edge.
    pub y: i64,
    /// Extent along x.
    pub width: i64,
    /// Extent along y.
    pub height: i64,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    #[inline]
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    /// Top edge (`y + height`).
    #[inline]
    pub fn top(&self) -> i64 {
        self.y + self.height
    }

    /// Area of the rectangle.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width * self.height
    }

    /// True if the rectangle has collapsed to a line or a point.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if the interiors of `self` and `other` intersect.
    ///
    /// Rectangles that only share an edge or a corner do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        common_length(self.x, self.right(), other.x, other.right()) > 0
            && common_length(self.y, self.top(), other.y, other.top()) > 0
    }

    /// True if the closed extent of `self` lies within the closed extent of
    /// `other`. Equal rectangles are contained in each other.
    pub fn contained_in(&self, other: &Rect) -> bool {
        self.x >= other.x
            && self.y >= other.y
            && self.right() <= other.right()
            && self.top() <= other.top()
    }

    /// True if an item of the given dimensions fits inside without rotation.
    #[inline]
    pub fn fits(&self, width: i64, height: i64) -> bool {
        width <= self.width && height <= self.height
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect: ({}, {}, {}, {})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// A rectangular item to be packed.
///
/// The shape is fixed at construction. Placement fields (position,
/// orientation, score) are filled in by bin evaluation; an item handed out by
/// a bin as packed is never modified again.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item {
    id: Option<usize>,
    width: i64,
    height: i64,
    rotated: bool,
    position: Option<(i64, i64)>,
    score: Score,
}

impl Item {
    /// Creates an unplaced item with the given dimensions.
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            id: None,
            width,
            height,
            rotated: false,
            position: None,
            score: Score::worst(),
        }
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = Some(id);
    }

    /// Identity index assigned when the item was loaded into an instance.
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    /// Current width (after any rotation).
    #[inline]
    pub fn width(&self) -> i64 {
        self.width
    }

    /// Current height (after any rotation).
    #[inline]
    pub fn height(&self) -> i64 {
        self.height
    }

    /// Area of the item. Invariant under rotation.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width * self.height
    }

    /// Perimeter of the item.
    pub fn perimeter(&self) -> i64 {
        2 * (self.width + self.height)
    }

    /// True if the item is rotated relative to its loaded orientation.
    pub fn is_rotated(&self) -> bool {
        self.rotated
    }

    /// Position of the bottom-left corner, if placed.
    pub fn position(&self) -> Option<(i64, i64)> {
        self.position
    }

    /// Score pair of the last evaluation.
    pub fn score(&self) -> Score {
        self.score
    }

    /// True if a position has been found for this item.
    pub fn is_ready_for_packing(&self) -> bool {
        self.position.is_some()
    }

    /// Clears position and scores, keeping shape and orientation.
    pub fn remove_packing_info(&mut self) {
        self.position = None;
        self.score = Score::worst();
    }

    /// Swaps width and height.
    ///
    /// Only meaningful on candidates and unplaced items; packed items are
    /// only ever exposed by shared reference.
    pub fn rotate(&mut self) {
        std::mem::swap(&mut self.width, &mut self.height);
        self.rotated = !self.rotated;
    }

    /// Extent occupied by the item, if placed.
    pub fn rect(&self) -> Option<Rect> {
        self.position
            .map(|(x, y)| Rect::new(x, y, self.width, self.height))
    }

    /// Returns a copy of this item placed at `(x, y)` with the given score.
    pub(crate) fn placed(&self, x: i64, y: i64, rotated: bool, score: Score) -> Self {
        let mut candidate = self.clone();
        if rotated {
            candidate.rotate();
        }
        candidate.position = Some((x, y));
        candidate.score = score;
        candidate
    }

    /// True if both items have the same current dimensions.
    pub fn same_dimensions(&self, other: &Item) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Orders items by area, smaller first.
    pub fn cmp_area(&self, other: &Item) -> Ordering {
        self.area().cmp(&other.area())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item: ({}, {}", self.width, self.height)?;
        if let Some((x, y)) = self.position {
            write!(f, " at {}, {}", x, y)?;
        }
        write!(f, ", {})", self.score.primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_length() {
        assert_eq!(common_length(0, 10, 5, 15), 5);
        assert_eq!(common_length(0, 10, 2, 4), 2);
        // touching
        assert_eq!(common_length(0, 10, 10, 20), 0);
        // disjoint
        assert_eq!(common_length(0, 10, 11, 20), 0);
        assert_eq!(common_length(5, 15, 0, 10), 5);
    }

    #[test]
    fn test_overlaps() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        let c = Rect::new(10, 0, 5, 5);
        let d = Rect::new(10, 10, 5, 5);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // edge contact
        assert!(!a.overlaps(&c));
        // corner contact
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn test_overlaps_contained() {
        let outer = Rect::new(0, 0, 10, 10);
        let inner = Rect::new(2, 2, 3, 3);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_contained_in() {
        let outer = Rect::new(0, 0, 10, 10);
        let inner = Rect::new(0, 5, 10, 5);
        let outside = Rect::new(5, 5, 10, 10);

        assert!(inner.contained_in(&outer));
        assert!(!outer.contained_in(&inner));
        assert!(!outside.contained_in(&outer));
        // equality counts as contained
        assert!(outer.contained_in(&outer));
    }

    #[test]
    fn test_degenerate() {
        assert!(Rect::new(0, 0, 0, 5).is_degenerate());
        assert!(Rect::new(0, 0, 5, 0).is_degenerate());
        assert!(!Rect::new(0, 0, 1, 1).is_degenerate());
    }

    #[test]
    fn test_item_rotate() {
        let mut item = Item::new(6, 4);
        item.rotate();
        assert_eq!((item.width(), item.height()), (4, 6));
        assert!(item.is_rotated());
        assert_eq!(item.area(), 24);

        item.rotate();
        assert!(!item.is_rotated());
    }

    #[test]
    fn test_item_packing_info() {
        let item = Item::new(3, 2);
        assert!(!item.is_ready_for_packing());
        assert!(item.rect().is_none());
        assert!(item.score().primary.is_infinite());

        let mut placed = item.placed(1, 2, true, Score::new(5.0, 1.0));
        assert!(placed.is_ready_for_packing());
        assert_eq!(placed.rect(), Some(Rect::new(1, 2, 2, 3)));
        assert_eq!(placed.score(), Score::new(5.0, 1.0));

        placed.remove_packing_info();
        assert!(!placed.is_ready_for_packing());
        assert_eq!(placed.score(), Score::worst());
        // orientation is kept
        assert!(placed.is_rotated());
    }

    #[test]
    fn test_item_cmp_area() {
        let small = Item::new(2, 2);
        let large = Item::new(3, 2);
        assert_eq!(small.cmp_area(&large), Ordering::Less);
        assert_eq!(large.cmp_area(&large.clone()), Ordering::Equal);
    }
}
