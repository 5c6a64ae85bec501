//! Dense 3D histogram driven by parallel page workers.
//!
//! [`Histogram3D`] owns the flat cell buffer and the axis binners. Every bulk
//! operation splits the page dimension into segments, hands each segment to a
//! worker on the rayon pool, and merges the per-segment results.

use log::debug;
use qhist_core::binner::Binner;
use qhist_core::dual::DualBinnerSet;
use qhist_core::error::{Error, Result};
use qhist_core::event::EventList;
use qhist_core::projection::ProjectionBinner;
use qhist_core::vector::Vector3;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bin_events::{BinEvents, BinSummary, Weighting};
use crate::extract_events::{merge_level_lists, ExtractEvents, LevelLists};
use crate::pages::{split_slabs_evenly, split_views_evenly, HistogramShape};
use crate::scan::{clear_pages, scan_pages};

/// Configuration for [`Histogram3D`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistogramConfig {
    /// Number of page segments processed in parallel; at least 1, and
    /// capped at the page count when splitting.
    pub segments: usize,
    /// How events are weighted when added.
    pub weighting: Weighting,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            segments: 4,
            weighting: Weighting::Codes,
        }
    }
}

impl HistogramConfig {
    /// Set the number of page segments.
    #[must_use]
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    /// Set the event weighting.
    #[must_use]
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if `segments` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.segments == 0 {
            return Err(Error::ConfigError(
                "segments must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A 3D histogram over a parallelepiped region of space.
///
/// Columns, rows and pages are binned by the x, y and z projection binners.
/// The binner directions need not be orthogonal; cell centers are recovered
/// through the dual binner set.
#[derive(Debug)]
pub struct Histogram3D {
    x: ProjectionBinner,
    y: ProjectionBinner,
    z: ProjectionBinner,
    duals: DualBinnerSet,
    shape: HistogramShape,
    data: Vec<f32>,
    min: f32,
    max: f32,
    sum: f64,
    num_added: u64,
    config: HistogramConfig,
}

impl Histogram3D {
    /// Creates an empty histogram.
    ///
    /// # Errors
    /// - [`Error::ConfigError`] for an invalid configuration.
    /// - [`Error::SingularBasis`] if the three binner directions are
    ///   linearly dependent.
    /// - [`Error::HistogramTooLarge`] if the cell buffer cannot be allocated.
    pub fn new(
        x: ProjectionBinner,
        y: ProjectionBinner,
        z: ProjectionBinner,
        config: HistogramConfig,
    ) -> Result<Self> {
        config.validate()?;
        let duals = DualBinnerSet::new(&x, &y, &z)?;
        let shape = HistogramShape::try_new(z.num_bins(), y.num_bins(), x.num_bins())?;
        debug!(
            "allocating histogram {}x{}x{} (pages x rows x cols)",
            shape.pages, shape.rows, shape.cols
        );
        Ok(Self {
            x,
            y,
            z,
            duals,
            shape,
            data: vec![0.0; shape.cell_count()],
            min: 0.0,
            max: 0.0,
            sum: 0.0,
            num_added: 0,
            config,
        })
    }

    /// Moves the histogram to new axes and clears it.
    ///
    /// The buffer is reused when the shape is unchanged. On error the
    /// histogram is left untouched.
    ///
    /// # Errors
    /// Returns [`Error::SingularBasis`] for dependent directions and
    /// [`Error::HistogramTooLarge`] for an unallocatable shape.
    pub fn set_position(
        &mut self,
        x: ProjectionBinner,
        y: ProjectionBinner,
        z: ProjectionBinner,
    ) -> Result<()> {
        let duals = DualBinnerSet::new(&x, &y, &z)?;
        let shape = HistogramShape::try_new(z.num_bins(), y.num_bins(), x.num_bins())?;

        self.x = x;
        self.y = y;
        self.z = z;
        self.duals = duals;
        if shape == self.shape {
            self.clear();
        } else {
            debug!(
                "reallocating histogram {}x{}x{} (pages x rows x cols)",
                shape.pages, shape.rows, shape.cols
            );
            self.shape = shape;
            self.data = vec![0.0; shape.cell_count()];
            self.reset_stats();
        }
        Ok(())
    }

    fn reset_stats(&mut self) {
        self.min = 0.0;
        self.max = 0.0;
        self.sum = 0.0;
        self.num_added = 0;
    }

    /// Sets every cell to zero and resets the statistics.
    pub fn clear(&mut self) {
        let slabs = split_slabs_evenly(&mut self.data, self.shape, self.config.segments);
        slabs.into_par_iter().for_each(|mut slab| clear_pages(&mut slab));
        self.reset_stats();
    }

    /// Adds every event that falls inside the histogram.
    ///
    /// Events outside the covered region are ignored. Returns the weighted
    /// total that was added.
    pub fn add_events(&mut self, events: &dyn EventList) -> f64 {
        if events.is_empty() {
            return 0.0;
        }

        let worker =
            BinEvents::new(&self.x, &self.y, &self.z).with_weighting(self.config.weighting);
        let (min, max) = (self.min, self.max);
        let slabs = split_slabs_evenly(&mut self.data, self.shape, self.config.segments);
        debug!(
            "binning {} events over {} page segments",
            events.len(),
            slabs.len()
        );

        let merged = slabs
            .into_par_iter()
            .map(|mut slab| worker.run(&mut slab, events, min, max))
            .reduce(|| BinSummary::new(0.0, min, max), BinSummary::merge);

        self.sum += merged.sum;
        self.min = merged.min;
        self.max = merged.max;
        self.num_added += events.len() as u64;
        merged.sum
    }

    /// Recomputes total, minimum and maximum from the cells.
    ///
    /// Only needed if the statistics are suspected to be stale; the other
    /// operations keep them current.
    pub fn scan(&mut self) {
        let views = split_views_evenly(&self.data, self.shape, self.config.segments);
        let merged = views
            .par_iter()
            .map(scan_pages)
            .reduce(
                || BinSummary::new(0.0, f32::INFINITY, f32::NEG_INFINITY),
                BinSummary::merge,
            );
        self.sum = merged.sum;
        self.min = merged.min;
        self.max = merged.max;
    }

    /// Extracts level-classified events, one inner vector per page segment.
    ///
    /// Each inner vector has `levels.num_bins() + 1` entries, the last being
    /// the overflow level.
    #[must_use]
    pub fn event_lists(&self, levels: &dyn Binner) -> Vec<LevelLists> {
        let worker = ExtractEvents::new(levels, &self.duals);
        let views = split_views_evenly(&self.data, self.shape, self.config.segments);
        debug!(
            "extracting {} levels over {} page segments",
            worker.num_lists(),
            views.len()
        );
        views.par_iter().map(|view| worker.run(view)).collect()
    }

    /// Extracts level-classified events merged across segments in page order.
    #[must_use]
    pub fn merged_event_lists(&self, levels: &dyn Binner) -> LevelLists {
        merge_level_lists(&self.event_lists(levels))
    }

    fn cell_index(&self, x: f64, y: f64, z: f64) -> Option<(usize, usize, usize)> {
        let page = self.z.index(x, y, z)?;
        let row = self.y.index(x, y, z)?;
        let col = self.x.index(x, y, z)?;
        Some((page, row, col))
    }

    /// Value of the cell containing `(x, y, z)`, or zero outside.
    #[must_use]
    pub fn value_at(&self, x: f64, y: f64, z: f64) -> f32 {
        self.cell_index(x, y, z)
            .map_or(0.0, |(page, row, col)| self.data[self.shape.offset(page, row, col)])
    }

    /// Returns true if `(x, y, z)` lies inside the histogram.
    #[must_use]
    pub fn is_point_in(&self, x: f64, y: f64, z: f64) -> bool {
        self.cell_index(x, y, z).is_some()
    }

    /// Total of the cells within `n_bins` of the cell containing `(x, y, z)`
    /// along every axis.
    ///
    /// Returns zero unless the whole `(2 n_bins + 1)^3` block lies inside the
    /// histogram.
    #[must_use]
    pub fn total_near(&self, x: f64, y: f64, z: f64, n_bins: usize) -> f32 {
        let Some((page, row, col)) = self.cell_index(x, y, z) else {
            return 0.0;
        };
        let inside = |index: usize, len: usize| index >= n_bins && index + n_bins < len;
        if !inside(page, self.shape.pages)
            || !inside(row, self.shape.rows)
            || !inside(col, self.shape.cols)
        {
            return 0.0;
        }

        let mut total = 0.0;
        for p in page - n_bins..=page + n_bins {
            for r in row - n_bins..=row + n_bins {
                let start = self.shape.offset(p, r, col - n_bins);
                total += self.data[start..=start + 2 * n_bins].iter().sum::<f32>();
            }
        }
        total
    }

    /// Physical center of the cell at `(col, row, page)`.
    ///
    /// # Panics
    /// Panics if an index is outside the histogram.
    #[must_use]
    pub fn bin_location(&self, col: usize, row: usize, page: usize) -> Vector3 {
        self.duals.center_point(col, row, page)
    }

    /// Cells of one page, `rows x cols` in row-major order.
    ///
    /// # Panics
    /// Panics if `page` is outside the histogram.
    #[must_use]
    pub fn page_slice(&self, page: usize) -> &[f32] {
        let len = self.shape.page_len();
        &self.data[page * len..(page + 1) * len]
    }

    /// Copy of the cells with the given row, indexed `[col][page]`.
    ///
    /// # Panics
    /// Panics if `row` is outside the histogram.
    #[must_use]
    pub fn row_slice(&self, row: usize) -> Vec<Vec<f32>> {
        assert!(row < self.shape.rows, "row {row} out of range");
        (0..self.shape.cols)
            .map(|col| {
                (0..self.shape.pages)
                    .map(|page| self.data[self.shape.offset(page, row, col)])
                    .collect()
            })
            .collect()
    }

    /// Copy of the cells with the given column, indexed `[page][row]`.
    ///
    /// # Panics
    /// Panics if `col` is outside the histogram.
    #[must_use]
    pub fn col_slice(&self, col: usize) -> Vec<Vec<f32>> {
        assert!(col < self.shape.cols, "column {col} out of range");
        (0..self.shape.pages)
            .map(|page| {
                (0..self.shape.rows)
                    .map(|row| self.data[self.shape.offset(page, row, col)])
                    .collect()
            })
            .collect()
    }

    /// Histogram dimensions.
    #[must_use]
    pub fn shape(&self) -> HistogramShape {
        self.shape
    }

    /// All cells in page-row-column order.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Column axis binner.
    #[must_use]
    pub fn x_binner(&self) -> &ProjectionBinner {
        &self.x
    }

    /// Row axis binner.
    #[must_use]
    pub fn y_binner(&self) -> &ProjectionBinner {
        &self.y
    }

    /// Page axis binner.
    #[must_use]
    pub fn z_binner(&self) -> &ProjectionBinner {
        &self.z
    }

    /// Dual binners used to place cell centers.
    #[must_use]
    pub fn dual_binners(&self) -> &DualBinnerSet {
        &self.duals
    }

    /// Smallest cell value.
    #[must_use]
    pub fn min_val(&self) -> f32 {
        self.min
    }

    /// Largest cell value.
    #[must_use]
    pub fn max_val(&self) -> f32 {
        self.max
    }

    /// Weighted total of all events added.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.sum
    }

    /// Number of events passed to [`Histogram3D::add_events`], counting those
    /// that fell outside.
    #[must_use]
    pub fn num_added(&self) -> u64 {
        self.num_added
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }
}
