//! One-dimensional binners.
//!
//! A binner partitions a numeric axis into `N` ordered half-open intervals
//! `[a_i, a_{i+1})`. Two roles use the same binners differently:
//!
//! - **Axis binning** ([`Binner::index`]): values below the first boundary and
//!   values at or above the last boundary are both excluded.
//! - **Level binning** ([`Binner::level_index`]): values below the first
//!   boundary are excluded, but values at or above the last boundary land in
//!   the overflow bucket `N`.
//!
//! The two policies decide which histogram cells are dropped and which are
//! reported as overflow, so they are kept separate.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::fmt;

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a value falls relative to a binner's intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinPosition {
    /// Below the first boundary (NaN is also reported here).
    Below,
    /// Inside interval `i`.
    Within(usize),
    /// At or above the last boundary.
    Above,
}

/// Partition of one numeric axis into ordered half-open intervals.
pub trait Binner: Send + Sync + fmt::Debug {
    /// Number of intervals.
    fn num_bins(&self) -> usize;

    /// First boundary.
    fn min_val(&self) -> f64;

    /// Last boundary.
    fn max_val(&self) -> f64;

    /// Lower boundary of interval `index`.
    ///
    /// # Panics
    /// May panic if `index >= num_bins()`.
    fn min_of(&self, index: usize) -> f64;

    /// Upper boundary of interval `index`.
    ///
    /// # Panics
    /// May panic if `index >= num_bins()`.
    fn max_of(&self, index: usize) -> f64;

    /// Classifies `value` against the intervals.
    fn position(&self, value: f64) -> BinPosition;

    /// Midpoint of interval `index`.
    fn center(&self, index: usize) -> f64 {
        0.5 * (self.min_of(index) + self.max_of(index))
    }

    /// Axis role: the covering interval, or `None` outside the range.
    #[inline]
    fn index(&self, value: f64) -> Option<usize> {
        match self.position(value) {
            BinPosition::Within(i) => Some(i),
            BinPosition::Below | BinPosition::Above => None,
        }
    }

    /// Level role: the covering interval, `num_bins()` for overflow, or
    /// `None` below the range.
    #[inline]
    fn level_index(&self, value: f64) -> Option<usize> {
        match self.position(value) {
            BinPosition::Below => None,
            BinPosition::Within(i) => Some(i),
            BinPosition::Above => Some(self.num_bins()),
        }
    }

    /// All `num_bins() + 1` boundaries in ascending order.
    fn boundaries(&self) -> Vec<f64> {
        let n = self.num_bins();
        let mut edges: Vec<f64> = (0..n).map(|i| self.min_of(i)).collect();
        edges.push(self.max_val());
        edges
    }
}

/// `N` equal-width intervals covering `[min, max)`.
///
/// Deserialization goes through [`UniformBinner::new`]; the step is never
/// stored in serialized form.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "UniformBinnerRepr", into = "UniformBinnerRepr")
)]
pub struct UniformBinner {
    min: f64,
    max: f64,
    num_bins: usize,
    step: f64,
}

impl UniformBinner {
    /// Creates a uniform binner.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBoundaries`] if `num_bins == 0`, a bound is not
    /// finite, or `min >= max`.
    pub fn new(min: f64, max: f64, num_bins: usize) -> Result<Self> {
        if num_bins == 0 {
            return Err(Error::InvalidBoundaries(
                "uniform binner needs at least one bin".to_string(),
            ));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::InvalidBoundaries(format!(
                "uniform binner bounds must be finite, got [{min}, {max})"
            )));
        }
        if min >= max {
            return Err(Error::InvalidBoundaries(format!(
                "uniform binner bounds not ascending: [{min}, {max})"
            )));
        }
        Ok(Self {
            min,
            max,
            num_bins,
            step: (max - min) / num_bins as f64,
        })
    }

    /// Width of every interval.
    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct UniformBinnerRepr {
    min: f64,
    max: f64,
    num_bins: usize,
}

#[cfg(feature = "serde")]
impl From<UniformBinner> for UniformBinnerRepr {
    fn from(binner: UniformBinner) -> Self {
        Self {
            min: binner.min,
            max: binner.max,
            num_bins: binner.num_bins,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<UniformBinnerRepr> for UniformBinner {
    type Error = Error;

    fn try_from(repr: UniformBinnerRepr) -> Result<Self> {
        Self::new(repr.min, repr.max, repr.num_bins)
    }
}

impl Binner for UniformBinner {
    fn num_bins(&self) -> usize {
        self.num_bins
    }

    fn min_val(&self) -> f64 {
        self.min
    }

    fn max_val(&self) -> f64 {
        self.max
    }

    fn min_of(&self, index: usize) -> f64 {
        assert!(index < self.num_bins, "bin index {index} out of range");
        self.min + index as f64 * self.step
    }

    fn max_of(&self, index: usize) -> f64 {
        assert!(index < self.num_bins, "bin index {index} out of range");
        if index + 1 == self.num_bins {
            self.max
        } else {
            self.min + (index + 1) as f64 * self.step
        }
    }

    #[inline]
    fn position(&self, value: f64) -> BinPosition {
        // Negated comparison so NaN classifies as below.
        if !(value >= self.min) {
            return BinPosition::Below;
        }
        if value >= self.max {
            return BinPosition::Above;
        }
        // Rounding can push values just under `max` to `num_bins`.
        let index = ((value - self.min) / self.step) as usize;
        BinPosition::Within(index.min(self.num_bins - 1))
    }
}

/// Intervals given by an explicit strictly ascending boundary list.
///
/// Infinite outer boundaries are allowed, e.g. `[0, +inf)` as a single
/// intensity level covering every non-negative count.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "EdgeBinnerRepr", into = "EdgeBinnerRepr")
)]
pub struct EdgeBinner {
    edges: Vec<f64>,
}

impl EdgeBinner {
    /// Creates a binner from `N + 1` boundaries.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBoundaries`] if fewer than two boundaries are
    /// given, any boundary is NaN, or the list is not strictly ascending.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidBoundaries(format!(
                "need at least 2 boundaries, got {}",
                edges.len()
            )));
        }
        if let Some(i) = edges.iter().position(|e| e.is_nan()) {
            return Err(Error::InvalidBoundaries(format!("boundary {i} is NaN")));
        }
        if let Some(i) = edges.windows(2).position(|w| w[0] >= w[1]) {
            return Err(Error::InvalidBoundaries(format!(
                "boundaries not strictly ascending at {i}: {} >= {}",
                edges[i],
                edges[i + 1]
            )));
        }
        Ok(Self { edges })
    }

    /// Boundary slice.
    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct EdgeBinnerRepr {
    edges: Vec<f64>,
}

#[cfg(feature = "serde")]
impl From<EdgeBinner> for EdgeBinnerRepr {
    fn from(binner: EdgeBinner) -> Self {
        Self {
            edges: binner.edges,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<EdgeBinnerRepr> for EdgeBinner {
    type Error = Error;

    fn try_from(repr: EdgeBinnerRepr) -> Result<Self> {
        Self::new(repr.edges)
    }
}

impl Binner for EdgeBinner {
    fn num_bins(&self) -> usize {
        self.edges.len() - 1
    }

    fn min_val(&self) -> f64 {
        self.edges[0]
    }

    fn max_val(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    fn min_of(&self, index: usize) -> f64 {
        self.edges[index]
    }

    fn max_of(&self, index: usize) -> f64 {
        self.edges[index + 1]
    }

    #[inline]
    fn position(&self, value: f64) -> BinPosition {
        if !(value >= self.edges[0]) {
            return BinPosition::Below;
        }
        let upper = self.edges.partition_point(|&e| e <= value);
        if upper == self.edges.len() {
            BinPosition::Above
        } else {
            BinPosition::Within(upper - 1)
        }
    }

    fn boundaries(&self) -> Vec<f64> {
        self.edges.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_positions() {
        let binner = UniformBinner::new(0.0, 4.0, 2).unwrap();
        assert_eq!(binner.num_bins(), 2);
        assert_eq!(binner.position(-0.1), BinPosition::Below);
        assert_eq!(binner.position(0.0), BinPosition::Within(0));
        assert_eq!(binner.position(1.999), BinPosition::Within(0));
        assert_eq!(binner.position(2.0), BinPosition::Within(1));
        assert_eq!(binner.position(4.0), BinPosition::Above);
        assert_eq!(binner.position(f64::NAN), BinPosition::Below);
    }

    #[test]
    fn test_uniform_value_just_below_max() {
        let binner = UniformBinner::new(0.1, 0.7, 3).unwrap();
        let below_max = 0.7 - f64::EPSILON;
        assert_eq!(binner.index(below_max), Some(2));
    }

    #[test]
    fn test_uniform_centers_and_boundaries() {
        let binner = UniformBinner::new(-1.0, 2.0, 3).unwrap();
        assert_relative_eq!(binner.center(0), -0.5);
        assert_relative_eq!(binner.center(2), 1.5);
        assert_eq!(binner.max_of(2), 2.0);
        assert_eq!(binner.boundaries(), vec![-1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_uniform_rejects_bad_bounds() {
        assert!(matches!(
            UniformBinner::new(1.0, 1.0, 4),
            Err(Error::InvalidBoundaries(_))
        ));
        assert!(UniformBinner::new(2.0, 1.0, 4).is_err());
        assert!(UniformBinner::new(0.0, 1.0, 0).is_err());
        assert!(UniformBinner::new(0.0, f64::INFINITY, 2).is_err());
    }

    #[test]
    fn test_edge_binner_positions() {
        let binner = EdgeBinner::new(vec![0.0, 1.0, 5.0, 10.0]).unwrap();
        assert_eq!(binner.num_bins(), 3);
        assert_eq!(binner.position(-3.0), BinPosition::Below);
        assert_eq!(binner.position(0.0), BinPosition::Within(0));
        assert_eq!(binner.position(1.0), BinPosition::Within(1));
        assert_eq!(binner.position(9.99), BinPosition::Within(2));
        assert_eq!(binner.position(10.0), BinPosition::Above);
        assert_relative_eq!(binner.center(1), 3.0);
    }

    #[test]
    fn test_edge_binner_rejects_unordered() {
        assert!(matches!(
            EdgeBinner::new(vec![0.0, 2.0, 2.0]),
            Err(Error::InvalidBoundaries(_))
        ));
        assert!(EdgeBinner::new(vec![3.0, 1.0]).is_err());
        assert!(EdgeBinner::new(vec![1.0]).is_err());
        assert!(EdgeBinner::new(vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_axis_and_level_roles_differ_only_above() {
        let binner = EdgeBinner::new(vec![10.0, 20.0, 30.0]).unwrap();

        assert_eq!(binner.index(5.0), None);
        assert_eq!(binner.level_index(5.0), None);

        assert_eq!(binner.index(25.0), Some(1));
        assert_eq!(binner.level_index(25.0), Some(1));

        assert_eq!(binner.index(30.0), None);
        assert_eq!(binner.level_index(30.0), Some(2));
        assert_eq!(binner.level_index(1.0e9), Some(2));
    }

    #[test]
    fn test_open_ended_level() {
        let binner = EdgeBinner::new(vec![0.0, f64::INFINITY]).unwrap();
        assert_eq!(binner.level_index(0.0), Some(0));
        assert_eq!(binner.level_index(1.0e30), Some(0));
        assert_eq!(binner.level_index(-1.0), None);
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_uniform_json_round_trip_omits_step() {
        let binner = UniformBinner::new(-1.0, 2.0, 3).unwrap();
        let json = serde_json::to_string(&binner).unwrap();
        assert!(!json.contains("step"));

        let back: UniformBinner = serde_json::from_str(&json).unwrap();
        assert_eq!(back, binner);
    }

    #[test]
    fn test_uniform_json_rejects_bad_bounds() {
        let zero_bins = r#"{"min":0.0,"max":1.0,"num_bins":0}"#;
        assert!(serde_json::from_str::<UniformBinner>(zero_bins).is_err());

        let inverted = r#"{"min":2.0,"max":1.0,"num_bins":4}"#;
        assert!(serde_json::from_str::<UniformBinner>(inverted).is_err());
    }

    #[test]
    fn test_edge_json_rejects_bad_edges() {
        assert!(serde_json::from_str::<EdgeBinner>(r#"{"edges":[5.0,1.0]}"#).is_err());
        assert!(serde_json::from_str::<EdgeBinner>(r#"{"edges":[1.0]}"#).is_err());

        let binner: EdgeBinner = serde_json::from_str(r#"{"edges":[0.0,1.0,5.0]}"#).unwrap();
        assert_eq!(binner.position(3.0), BinPosition::Within(1));
    }
}
