//! Bin-Events worker: accumulates an event list into one page slab.
//!
//! Every worker scans the whole event list and keeps only the events whose
//! page falls inside its own slab. The redundant scanning buys a trivial
//! partition: slabs never share a cell, so workers run without locks.
#![allow(clippy::cast_precision_loss)]

use log::trace;
use qhist_core::event::EventList;
use qhist_core::projection::ProjectionBinner;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pages::PageSlab;

/// How much each event adds to its cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Weighting {
    /// Add the event's code.
    #[default]
    Codes,
    /// Add one per event.
    Unit,
}

/// Weighted total plus running cell extrema.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinSummary {
    /// Weighted total of the events added.
    pub sum: f64,
    /// Smallest cell value seen.
    pub min: f32,
    /// Largest cell value seen.
    pub max: f32,
}

impl BinSummary {
    /// Creates a summary.
    #[must_use]
    pub fn new(sum: f64, min: f32, max: f32) -> Self {
        Self { sum, min, max }
    }

    /// Combines two partial results: sums add, extrema fold.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Bins events into a page slab using three axis binners.
#[derive(Debug, Clone, Copy)]
pub struct BinEvents<'a> {
    x: &'a ProjectionBinner,
    y: &'a ProjectionBinner,
    z: &'a ProjectionBinner,
    weighting: Weighting,
}

impl<'a> BinEvents<'a> {
    /// Creates a worker binning columns by `x`, rows by `y`, pages by `z`.
    #[must_use]
    pub fn new(x: &'a ProjectionBinner, y: &'a ProjectionBinner, z: &'a ProjectionBinner) -> Self {
        Self {
            x,
            y,
            z,
            weighting: Weighting::default(),
        }
    }

    /// Set the weighting mode.
    #[must_use]
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Adds every event of `events` that lands in `slab`.
    ///
    /// Events outside the slab's pages, or outside the histogram's rows and
    /// columns, are skipped silently. `min` and `max` are the histogram's
    /// running extrema; each touched cell's new value is folded into them.
    pub fn run(
        &self,
        slab: &mut PageSlab<'_>,
        events: &dyn EventList,
        min: f32,
        max: f32,
    ) -> BinSummary {
        let range = slab.range();
        let shape = slab.shape();
        trace!(
            "binning {} events into pages {}..={}",
            events.len(),
            range.first,
            range.last
        );

        let mut summary = BinSummary::new(0.0, min, max);
        for i in 0..events.len() {
            let event = events.event(i);
            let (x, y, z) = (
                f64::from(event.x),
                f64::from(event.y),
                f64::from(event.z),
            );

            let Some(page) = self.z.index(x, y, z) else {
                continue;
            };
            if !range.contains(page) {
                continue;
            }
            let Some(row) = self.y.index(x, y, z).filter(|&r| r < shape.rows) else {
                continue;
            };
            let Some(col) = self.x.index(x, y, z).filter(|&c| c < shape.cols) else {
                continue;
            };

            let weight = match self.weighting {
                Weighting::Codes => event.code,
                Weighting::Unit => 1,
            };
            let cell = slab.cell_mut(page, row, col);
            *cell += weight as f32;
            let value = *cell;

            summary.sum += f64::from(weight);
            if value < summary.min {
                summary.min = value;
            }
            if value > summary.max {
                summary.max = value;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::pages::{split_slabs, HistogramShape, PageRange};
    use qhist_core::binner::UniformBinner;
    use qhist_core::event::Event;
    use qhist_core::vector::Vector3;

    fn axes() -> [ProjectionBinner; 3] {
        [Vector3::X, Vector3::Y, Vector3::Z].map(|dir| {
            ProjectionBinner::from_binner(UniformBinner::new(0.0, 4.0, 2).unwrap(), dir).unwrap()
        })
    }

    #[test]
    fn test_two_by_two_by_two_scenario() {
        let [x, y, z] = axes();
        let shape = HistogramShape::new(2, 2, 2);
        let mut hist = vec![0.0f32; shape.cell_count()];
        let events = vec![
            Event::new(0.5, 0.5, 0.5, 3),
            Event::new(3.0, 3.0, 3.0, 5),
        ];

        let mut slabs = split_slabs(&mut hist, shape, &[PageRange::new(0, 1)]).unwrap();
        let summary = BinEvents::new(&x, &y, &z).run(&mut slabs[0], &events, 0.0, 0.0);
        drop(slabs);

        assert_eq!(summary.sum, 8.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.min, 0.0);
        assert_eq!(hist[shape.offset(0, 0, 0)], 3.0);
        assert_eq!(hist[shape.offset(1, 1, 1)], 5.0);
        assert_eq!(hist.iter().filter(|&&v| v != 0.0).count(), 2);
    }

    #[test]
    fn test_events_outside_slab_are_skipped() {
        let [x, y, z] = axes();
        let shape = HistogramShape::new(2, 2, 2);
        let mut hist = vec![0.0f32; shape.cell_count()];
        let events = vec![
            Event::new(0.5, 0.5, 0.5, 3),
            Event::new(3.0, 3.0, 3.0, 5),
        ];

        let ranges = [PageRange::new(0, 0), PageRange::new(1, 1)];
        let mut slabs = split_slabs(&mut hist, shape, &ranges).unwrap();
        let worker = BinEvents::new(&x, &y, &z);
        let upper = worker.run(&mut slabs[1], &events, 0.0, 0.0);
        drop(slabs);

        assert_eq!(upper.sum, 5.0);
        assert_eq!(hist[shape.offset(0, 0, 0)], 0.0);
        assert_eq!(hist[shape.offset(1, 1, 1)], 5.0);
    }

    #[test]
    fn test_out_of_extent_events_dropped() {
        let [x, y, z] = axes();
        let shape = HistogramShape::new(2, 2, 2);
        let mut hist = vec![0.0f32; shape.cell_count()];
        let events = vec![
            Event::new(-1.0, 0.5, 0.5, 1),
            Event::new(0.5, 4.0, 0.5, 1),
            Event::new(0.5, 0.5, 9.0, 1),
            Event::new(f32::NAN, 0.5, 0.5, 1),
        ];

        let mut slabs = split_slabs(&mut hist, shape, &[PageRange::new(0, 1)]).unwrap();
        let summary = BinEvents::new(&x, &y, &z).run(&mut slabs[0], &events, 0.0, 0.0);
        drop(slabs);

        assert_eq!(summary.sum, 0.0);
        assert!(hist.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_unit_weighting_and_negative_codes() {
        let [x, y, z] = axes();
        let shape = HistogramShape::new(2, 2, 2);
        let mut hist = vec![0.0f32; shape.cell_count()];
        let events = vec![
            Event::new(0.5, 0.5, 0.5, 7),
            Event::new(0.6, 0.6, 0.6, -2),
        ];

        let mut slabs = split_slabs(&mut hist, shape, &[PageRange::new(0, 1)]).unwrap();
        let unit = BinEvents::new(&x, &y, &z)
            .with_weighting(Weighting::Unit)
            .run(&mut slabs[0], &events, 0.0, 0.0);
        assert_eq!(unit.sum, 2.0);

        let coded = BinEvents::new(&x, &y, &z).run(&mut slabs[0], &events[1..].to_vec(), 0.0, 0.0);
        drop(slabs);

        assert_eq!(coded.sum, -2.0);
        assert_eq!(coded.min, 0.0);
        assert_eq!(hist[0], 0.0);
    }

    #[test]
    fn test_summary_merge() {
        let a = BinSummary::new(3.0, -1.0, 4.0);
        let b = BinSummary::new(5.0, 0.0, 9.0);
        assert_eq!(a.merge(b), BinSummary::new(8.0, -1.0, 9.0));
    }
}
