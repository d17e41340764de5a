//! Placement heuristics and candidate scoring.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rule used to choose a free space (and orientation) for the next item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PackingHeuristic {
    /// Minimize wasted area, tiebreak on the shorter leftover side.
    #[default]
    BestAreaFit,
    /// Maximize the perimeter shared with bin edges and packed items.
    TouchingPerimeter,
    /// Keep the placement's far corner as far as possible from the bin's
    /// top-right corner.
    TopRightCornerDistance,
}

impl PackingHeuristic {
    /// All heuristics, in declaration order.
    pub const ALL: [PackingHeuristic; 3] = [
        PackingHeuristic::BestAreaFit,
        PackingHeuristic::TouchingPerimeter,
        PackingHeuristic::TopRightCornerDistance,
    ];

    /// True if the heuristic defines a secondary (tiebreak) score.
    pub fn has_tiebreak(&self) -> bool {
        match self {
            PackingHeuristic::BestAreaFit => true,
            PackingHeuristic::TouchingPerimeter | PackingHeuristic::TopRightCornerDistance => {
                false
            }
        }
    }

    /// Short name used on the command line.
    pub fn short_name(&self) -> &'static str {
        match self {
            PackingHeuristic::BestAreaFit => "baf",
            PackingHeuristic::TouchingPerimeter => "tp",
            PackingHeuristic::TopRightCornerDistance => "trcd",
        }
    }
}

impl fmt::Display for PackingHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackingHeuristic::BestAreaFit => "best-area-fit",
            PackingHeuristic::TouchingPerimeter => "touching-perimeter",
            PackingHeuristic::TopRightCornerDistance => "top-right-corner-distance",
        };
        f.pad(name)
    }
}

impl FromStr for PackingHeuristic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "best-area-fit" | "bestareafit" | "baf" => Ok(PackingHeuristic::BestAreaFit),
            "touching-perimeter" | "touchingperimeter" | "tp" => {
                Ok(PackingHeuristic::TouchingPerimeter)
            }
            "top-right-corner-distance" | "toprightcornerdistance" | "trcd" => {
                Ok(PackingHeuristic::TopRightCornerDistance)
            }
            _ => Err(Error::InvalidArgument(format!(
                "unknown packing heuristic '{}'",
                s
            ))),
        }
    }
}

/// Score pair of a candidate placement. Smaller is better on both fields.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Score {
    /// Primary score.
    pub primary: f64,
    /// Tiebreak score, `+inf` for heuristics without one.
    pub secondary: f64,
}

impl Score {
    /// Creates a score pair.
    pub fn new(primary: f64, secondary: f64) -> Self {
        Self { primary, secondary }
    }

    /// Score without a tiebreak component.
    pub fn primary_only(primary: f64) -> Self {
        Self::new(primary, f64::INFINITY)
    }

    /// The score of an item that has not been evaluated.
    pub fn worst() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY)
    }

    /// True if `self` should replace `other` as best-so-far: a strictly
    /// smaller primary, or an equal primary and a strictly smaller
    /// secondary.
    pub fn is_better_than(&self, other: &Score) -> bool {
        self.primary < other.primary
            || (self.primary == other.primary && self.secondary < other.secondary)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::worst()
    }
}
