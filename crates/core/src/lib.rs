//! # RBP Core
//!
//! Two-dimensional rectangular bin packing engine.
//!
//! Items are packed one at a time into same-size bins. Each bin tracks its
//! free space as a set of maximal empty rectangles and scores candidate
//! placements with a [`PackingHeuristic`]. A [`PackingSolution`] sends every
//! item to the bin offering the best candidate, opens bins on demand, and
//! supports a ruin-and-recreate move for local search drivers.
//!
//! ## Core Components
//!
//! - **Geometry**: [`Rect`] free spaces and [`Item`]s to pack
//! - **Bin contract**: [`BinStrategy`] trait and the shared [`BinState`]
//! - **Maximal-space bin**: [`MaxSpaceBin`]
//! - **Solution**: [`PackingSolution`] and [`SolutionConfig`]
//! - **Instances**: [`Instance`]
//!
//! ## Example
//!
//! ```
//! use rbp_core::{Item, PackingHeuristic, PackingSolution};
//!
//! let mut solution = PackingSolution::new(10, 10);
//! let items = vec![Item::new(6, 4), Item::new(4, 6), Item::new(5, 5)];
//! solution.pack(items, PackingHeuristic::BestAreaFit, false).unwrap();
//!
//! assert_eq!(solution.number_of_bins(), 1);
//! assert!(solution.feasible());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod bin;
pub mod error;
pub mod geometry;
pub mod heuristic;
pub mod instance;
pub mod maxspace;
pub mod solution;

// Re-exports
pub use bin::{BinOptions, BinState, BinStrategy};
pub use error::{Error, Result};
pub use geometry::{common_length, Item, Rect};
pub use heuristic::{PackingHeuristic, Score};
pub use instance::Instance;
pub use maxspace::MaxSpaceBin;
pub use solution::{PackingSolution, SolutionConfig};
