//! Maximal-space bin.
//!
//! Free space is tracked as a set of maximal empty rectangles: each one is
//! inside the bin, disjoint from every packed item and not contained in any
//! other member of the set. The rectangles may overlap each other.
//!
//! # Algorithm Overview
//!
//! Placing an item splits every free space it overlaps into up to four
//! residual spaces (below, above, left and right of the item, each spanning
//! the full extent of the parent along the other axis). The new set is then
//! pruned of spaces contained in other spaces, which restores maximality.
//!
//! # References
//!
//! - Parreño, F., Alvarez-Valdes, R., Oliveira, J. F., & Tamarit, J. M.
//!   (2008). A maximal-space algorithm for the container loading problem.

use crate::bin::{distance, BinOptions, BinState, BinStrategy};
use crate::error::{Error, Result};
use crate::geometry::{Item, Rect};
use crate::heuristic::{PackingHeuristic, Score};
use std::fmt;

/// A bin that keeps its free space as a set of maximal rectangles.
#[derive(Debug, Clone)]
pub struct MaxSpaceBin {
    state: BinState,
    free_spaces: Vec<Rect>,
    merge: bool,
}

impl MaxSpaceBin {
    /// Creates an empty bin with one free space covering it entirely.
    pub fn new(width: i64, height: i64, allow_rotation: bool) -> Self {
        let mut bin = Self {
            state: BinState::new(width, height, allow_rotation),
            free_spaces: Vec::new(),
            merge: false,
        };
        bin.setup();
        bin
    }

    /// Enables coalescing of edge-sharing free spaces after each insert.
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// Empties the bin and resets its free space to the whole bin.
    pub fn setup(&mut self) {
        self.state.reset();
        self.free_spaces.clear();
        self.free_spaces.push(self.state.bounds());
    }

    /// Current free spaces.
    pub fn free_spaces(&self) -> &[Rect] {
        &self.free_spaces
    }

    fn score(&self, space: &Rect, width: i64, height: i64, heuristic: PackingHeuristic) -> Score {
        match heuristic {
            PackingHeuristic::BestAreaFit => {
                let wasted = space.area() - width * height;
                let short_side = (space.width - width).min(space.height - height);
                Score::new(wasted as f64, short_side as f64)
            }
            PackingHeuristic::TouchingPerimeter => {
                let perimeter = self
                    .state
                    .touching_perimeter(space.x, space.y, width, height);
                Score::primary_only(-(perimeter as f64))
            }
            PackingHeuristic::TopRightCornerDistance => {
                let dist = distance(
                    space.x + width,
                    space.y + height,
                    self.state.width(),
                    self.state.height(),
                );
                Score::primary_only(-dist)
            }
        }
    }

    /// Replaces every free space overlapping `placed` by its non-degenerate
    /// residuals. Untouched spaces keep their order and residuals follow
    /// them.
    fn split_free_spaces(&mut self, placed: &Rect) {
        let mut kept = Vec::with_capacity(self.free_spaces.len());
        let mut residuals = Vec::new();

        for space in &self.free_spaces {
            if !space.overlaps(placed) {
                kept.push(*space);
                continue;
            }

            if placed.y > space.y {
                residuals.push(Rect::new(
                    space.x,
                    space.y,
                    space.width,
                    placed.y - space.y,
                ));
            }
            if placed.top() < space.top() {
                residuals.push(Rect::new(
                    space.x,
                    placed.top(),
                    space.width,
                    space.top() - placed.top(),
                ));
            }
            if placed.x > space.x {
                residuals.push(Rect::new(
                    space.x,
                    space.y,
                    placed.x - space.x,
                    space.height,
                ));
            }
            if placed.right() < space.right() {
                residuals.push(Rect::new(
                    placed.right(),
                    space.y,
                    space.right() - placed.right(),
                    space.height,
                ));
            }
        }

        kept.extend(residuals);
        self.free_spaces = kept;
    }

    /// Coalesces free spaces that are aligned on one axis and touch or
    /// overlap on the other, until no such pair is left.
    fn merge_free_spaces(&mut self) {
        let mut spaces = std::mem::take(&mut self.free_spaces);
        loop {
            let mut consumed = vec![false; spaces.len()];
            let mut next = Vec::with_capacity(spaces.len());
            let mut changed = false;

            for i in 0..spaces.len() {
                if consumed[i] {
                    continue;
                }
                let mut current = spaces[i];
                for j in (i + 1)..spaces.len() {
                    if consumed[j] {
                        continue;
                    }
                    if let Some(union) = aligned_union(&current, &spaces[j]) {
                        current = union;
                        consumed[j] = true;
                        changed = true;
                    }
                }
                next.push(current);
            }

            spaces = next;
            if !changed {
                break;
            }
        }
        self.free_spaces = spaces;
    }

    /// Drops degenerate spaces and spaces contained in another space. Of two
    /// equal spaces the later one is dropped.
    fn prune_free_spaces(&mut self) -> Result<()> {
        let spaces = &self.free_spaces;
        let mut pruned = Vec::with_capacity(spaces.len());

        for (i, space) in spaces.iter().enumerate() {
            if space.is_degenerate() {
                continue;
            }
            let dominated = spaces.iter().enumerate().any(|(j, other)| {
                j != i && space.contained_in(other) && (space != other || j < i)
            });
            if !dominated {
                pruned.push(*space);
            }
        }

        self.free_spaces = pruned;

        if self.free_spaces.is_empty() && self.state.occupancy() < 1.0 {
            return Err(Error::InternalInconsistency(format!(
                "free space exhausted at occupancy {:.4}",
                self.state.occupancy()
            )));
        }
        Ok(())
    }
}

/// Union of two rectangles that share their extent on one axis and touch or
/// overlap on the other.
fn aligned_union(a: &Rect, b: &Rect) -> Option<Rect> {
    if a.x == b.x && a.width == b.width && b.y <= a.top() && a.y <= b.top() {
        let y = a.y.min(b.y);
        return Some(Rect::new(a.x, y, a.width, a.top().max(b.top()) - y));
    }
    if a.y == b.y && a.height == b.height && b.x <= a.right() && a.x <= b.right() {
        let x = a.x.min(b.x);
        return Some(Rect::new(x, a.y, a.right().max(b.right()) - x, a.height));
    }
    None
}

impl BinStrategy for MaxSpaceBin {
    fn open(width: i64, height: i64, options: BinOptions) -> Self {
        MaxSpaceBin::new(width, height, options.allow_rotation).with_merge(options.merge_free_spaces)
    }

    fn evaluate(&self, item: &Item, heuristic: PackingHeuristic) -> Option<Item> {
        let orientations = [
            (item.width(), item.height(), false),
            (item.height(), item.width(), true),
        ];
        let tried = if self.state.allows_rotation() { 2 } else { 1 };

        let mut best: Option<(usize, bool, Score)> = None;
        for (idx, space) in self.free_spaces.iter().enumerate() {
            for &(width, height, rotated) in &orientations[..tried] {
                if !space.fits(width, height) {
                    continue;
                }
                let score = self.score(space, width, height, heuristic);
                let better = match &best {
                    Some((_, _, best_score)) => score.is_better_than(best_score),
                    None => true,
                };
                if better {
                    best = Some((idx, rotated, score));
                }
            }
        }

        best.map(|(idx, rotated, score)| {
            let space = &self.free_spaces[idx];
            item.placed(space.x, space.y, rotated, score)
        })
    }

    fn insert(&mut self, item: Item, heuristic: PackingHeuristic) -> Result<bool> {
        let candidate = if item.is_ready_for_packing() {
            item
        } else {
            match self.evaluate(&item, heuristic) {
                Some(candidate) => candidate,
                None => return Ok(false),
            }
        };

        let placed = match candidate.rect() {
            Some(rect) => rect,
            None => return Ok(false),
        };
        if !self.free_spaces.iter().any(|space| placed.contained_in(space)) {
            log::debug!("{} does not lie in any free space of this bin", placed);
            return Ok(false);
        }

        self.state.commit_item(candidate);
        self.split_free_spaces(&placed);
        if self.merge {
            self.merge_free_spaces();
        }
        self.prune_free_spaces()?;
        Ok(true)
    }

    fn state(&self) -> &BinState {
        &self.state
    }
}

impl PartialEq for MaxSpaceBin {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl PartialOrd for MaxSpaceBin {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.state.partial_cmp(&other.state)
    }
}

impl fmt::Display for MaxSpaceBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.state, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Checks the free-space invariants against the packed items.
    fn assert_free_space_invariants(bin: &MaxSpaceBin) {
        let bounds = bin.state().bounds();
        let spaces = bin.free_spaces();
        for (i, space) in spaces.iter().enumerate() {
            assert!(!space.is_degenerate(), "degenerate space {}", space);
            assert!(space.contained_in(&bounds), "{} outside bin", space);
            for item in bin.packed_items() {
                let rect = item.rect().unwrap();
                assert!(!space.overlaps(&rect), "{} overlaps {}", space, rect);
            }
            for (j, other) in spaces.iter().enumerate() {
                if i != j {
                    assert!(
                        !space.contained_in(other),
                        "{} is contained in {}",
                        space,
                        other
                    );
                }
            }
        }
    }

    #[test]
    fn test_new_bin_has_single_space() {
        let bin = MaxSpaceBin::new(10, 8, false);
        assert_eq!(bin.free_spaces(), &[Rect::new(0, 0, 10, 8)]);
        assert!(bin.is_empty());
    }

    #[test]
    fn test_split_after_first_insert() {
        let mut bin = MaxSpaceBin::new(10, 10, false);
        assert!(bin
            .insert(Item::new(6, 4), PackingHeuristic::BestAreaFit)
            .unwrap());

        assert_eq!(
            bin.free_spaces(),
            &[Rect::new(0, 4, 10, 6), Rect::new(6, 0, 4, 10)]
        );
        assert_free_space_invariants(&bin);
    }

    #[test]
    fn test_three_items_single_bin() {
        let mut bin = MaxSpaceBin::new(10, 10, false);
        for (w, h) in [(6, 4), (4, 6), (5, 5)] {
            assert!(bin
                .insert(Item::new(w, h), PackingHeuristic::BestAreaFit)
                .unwrap());
            assert_free_space_invariants(&bin);
        }

        assert_eq!(bin.packed_items()[1].position(), Some((6, 0)));
        assert_eq!(bin.packed_items()[2].position(), Some((0, 4)));
        assert_relative_eq!(bin.occupancy(), 0.73);
        assert!(bin.feasible());
    }

    #[test]
    fn test_no_room_for_second_square() {
        let mut bin = MaxSpaceBin::new(4, 4, false);
        assert!(bin
            .insert(Item::new(3, 3), PackingHeuristic::BestAreaFit)
            .unwrap());
        assert!(bin
            .evaluate(&Item::new(3, 3), PackingHeuristic::BestAreaFit)
            .is_none());
        assert!(!bin
            .insert(Item::new(3, 3), PackingHeuristic::BestAreaFit)
            .unwrap());
        assert_eq!(bin.packed_items().len(), 1);
    }

    #[test]
    fn test_evaluate_does_not_mutate() {
        let mut bin = MaxSpaceBin::new(10, 10, true);
        bin.insert(Item::new(3, 7), PackingHeuristic::BestAreaFit)
            .unwrap();
        let spaces = bin.free_spaces().to_vec();

        for heuristic in PackingHeuristic::ALL {
            let item = Item::new(4, 2);
            let first = bin.evaluate(&item, heuristic);
            let second = bin.evaluate(&item, heuristic);
            assert_eq!(first, second);
            assert!(first.is_some());
        }
        assert_eq!(bin.free_spaces(), spaces.as_slice());
        assert_eq!(bin.packed_items().len(), 1);
    }

    #[test]
    fn test_rotation_enables_fit() {
        let item = Item::new(8, 3);

        let fixed = MaxSpaceBin::new(4, 10, false);
        assert!(fixed.evaluate(&item, PackingHeuristic::BestAreaFit).is_none());

        let rotating = MaxSpaceBin::new(4, 10, true);
        let candidate = rotating
            .evaluate(&item, PackingHeuristic::BestAreaFit)
            .unwrap();
        assert!(candidate.is_rotated());
        assert_eq!((candidate.width(), candidate.height()), (3, 8));
    }

    #[test]
    fn test_best_area_fit_scores() {
        let mut bin = MaxSpaceBin::new(10, 10, false);
        bin.insert(Item::new(6, 4), PackingHeuristic::BestAreaFit)
            .unwrap();

        let candidate = bin
            .evaluate(&Item::new(4, 6), PackingHeuristic::BestAreaFit)
            .unwrap();
        // space (6, 0, 4, 10): 40 - 24 wasted, margins 0 and 4
        assert_eq!(candidate.position(), Some((6, 0)));
        assert_eq!(candidate.score(), Score::new(16.0, 0.0));
    }

    #[test]
    fn test_touching_perimeter_prefers_corner() {
        let mut bin = MaxSpaceBin::new(10, 10, false);
        bin.insert(Item::new(5, 5), PackingHeuristic::TouchingPerimeter)
            .unwrap();

        let candidate = bin
            .evaluate(&Item::new(5, 5), PackingHeuristic::TouchingPerimeter)
            .unwrap();
        // both residual origins touch two bin edges and one item side
        assert_relative_eq!(candidate.score().primary, -15.0);
        assert!(candidate.score().secondary.is_infinite());
        // first space in set order wins the tie
        assert_eq!(candidate.position(), Some((0, 5)));
    }

    #[test]
    fn test_top_right_corner_distance() {
        let bin = MaxSpaceBin::new(10, 10, false);
        let candidate = bin
            .evaluate(&Item::new(6, 2), PackingHeuristic::TopRightCornerDistance)
            .unwrap();
        assert_eq!(candidate.position(), Some((0, 0)));
        // far corner (6, 2) to (10, 10)
        assert_relative_eq!(candidate.score().primary, -(80.0_f64).sqrt());
    }

    #[test]
    fn test_full_bin_has_no_free_space() {
        let mut bin = MaxSpaceBin::new(4, 4, false);
        for _ in 0..4 {
            assert!(bin
                .insert(Item::new(2, 2), PackingHeuristic::BestAreaFit)
                .unwrap());
        }
        assert!(bin.free_spaces().is_empty());
        assert_relative_eq!(bin.occupancy(), 1.0);
        assert!(bin.feasible());
    }

    #[test]
    fn test_preplaced_item_outside_free_space_rejected() {
        let mut bin = MaxSpaceBin::new(10, 10, false);
        bin.insert(Item::new(5, 5), PackingHeuristic::BestAreaFit)
            .unwrap();

        let other = MaxSpaceBin::new(10, 10, false);
        let candidate = other
            .evaluate(&Item::new(3, 3), PackingHeuristic::BestAreaFit)
            .unwrap();
        // (0, 0) is taken in `bin`
        assert!(!bin.insert(candidate, PackingHeuristic::BestAreaFit).unwrap());
        assert_eq!(bin.packed_items().len(), 1);
    }

    #[test]
    fn test_exhausted_free_space_is_inconsistent() {
        let mut bin = MaxSpaceBin::new(10, 10, false);
        // the only free space is exactly the item, so the split leaves nothing
        bin.free_spaces = vec![Rect::new(0, 0, 3, 3)];
        let result = bin.insert(Item::new(3, 3), PackingHeuristic::BestAreaFit);
        assert!(matches!(result, Err(Error::InternalInconsistency(_))));
    }

    #[test]
    fn test_aligned_union() {
        let a = Rect::new(0, 0, 4, 3);
        let b = Rect::new(0, 3, 4, 2);
        assert_eq!(aligned_union(&a, &b), Some(Rect::new(0, 0, 4, 5)));

        let c = Rect::new(4, 0, 2, 3);
        assert_eq!(aligned_union(&a, &c), Some(Rect::new(0, 0, 6, 3)));

        let d = Rect::new(1, 3, 4, 2);
        assert_eq!(aligned_union(&a, &d), None);
    }

    #[test]
    fn test_merge_free_spaces() {
        let mut bin = MaxSpaceBin::new(10, 10, false);
        bin.free_spaces = vec![
            Rect::new(0, 0, 5, 5),
            Rect::new(5, 0, 5, 5),
            Rect::new(0, 5, 10, 5),
        ];
        bin.merge_free_spaces();
        assert_eq!(bin.free_spaces(), &[Rect::new(0, 0, 10, 10)]);
    }

    #[test]
    fn test_setup_resets_bin() {
        let mut bin = MaxSpaceBin::new(10, 10, false);
        bin.insert(Item::new(5, 5), PackingHeuristic::BestAreaFit)
            .unwrap();
        bin.setup();
        assert!(bin.is_empty());
        assert_eq!(bin.free_spaces(), &[Rect::new(0, 0, 10, 10)]);
    }

    #[test]
    fn test_random_inserts_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        for heuristic in PackingHeuristic::ALL {
            for merge in [false, true] {
                let mut bin = MaxSpaceBin::new(30, 20, true).with_merge(merge);
                for _ in 0..60 {
                    let item = Item::new(rng.gen_range(1..=8), rng.gen_range(1..=8));
                    bin.insert(item, heuristic).unwrap();
                    assert_free_space_invariants(&bin);
                }
                assert!(bin.feasible());
                let area: i64 = bin.packed_items().iter().map(Item::area).sum();
                assert_eq!(bin.state().packed_area(), area);
            }
        }
    }
}
