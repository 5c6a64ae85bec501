//! Per-slab maintenance workers: clearing and rescanning pages.

use crate::bin_events::BinSummary;
use crate::pages::{PageSlab, PageView};

/// Sets every cell of `slab` to zero.
pub fn clear_pages(slab: &mut PageSlab<'_>) {
    slab.cells_mut().fill(0.0);
}

/// Recomputes the total and extrema of the cells in `view`.
///
/// An empty view returns `sum = 0`, `min = +inf`, `max = -inf`, which is the
/// identity for [`BinSummary::merge`].
#[must_use]
pub fn scan_pages(view: &PageView<'_>) -> BinSummary {
    view.cells().iter().fold(
        BinSummary::new(0.0, f32::INFINITY, f32::NEG_INFINITY),
        |acc, &value| BinSummary {
            sum: acc.sum + f64::from(value),
            min: acc.min.min(value),
            max: acc.max.max(value),
        },
    )
}
