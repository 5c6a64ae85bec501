//! Extract-Events worker: turns histogram cells back into events.
//!
//! Each cell of a page view is classified by its value against a level
//! binner. Cells in level `i` become one event at the cell's physical center
//! with code `i`; cells at or above the top boundary go to the overflow level
//! `N`; cells below the bottom boundary and empty cells are ignored.
//!
//! Output buffers are sized exactly: a first pass counts cells per level, the
//! buffers are allocated once, and a second pass over the same cells in the
//! same order fills them.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use log::trace;
use qhist_core::binner::Binner;
use qhist_core::dual::DualBinnerSet;
use qhist_core::event::FloatArrayEventList;

use crate::pages::PageView;

/// One optional event list per level, index `N` being overflow.
pub type LevelLists = Vec<Option<FloatArrayEventList>>;

/// Extracts level-classified events from a page view.
#[derive(Debug, Clone, Copy)]
pub struct ExtractEvents<'a> {
    levels: &'a dyn Binner,
    duals: &'a DualBinnerSet,
}

impl<'a> ExtractEvents<'a> {
    /// Creates a worker classifying cell values with `levels` and placing
    /// events with `duals`.
    #[must_use]
    pub fn new(levels: &'a dyn Binner, duals: &'a DualBinnerSet) -> Self {
        Self { levels, duals }
    }

    /// Number of lists [`ExtractEvents::run`] returns: one per level plus
    /// overflow.
    #[must_use]
    pub fn num_lists(&self) -> usize {
        self.levels.num_bins() + 1
    }

    // Both passes go through here so they visit cells in the same order.
    fn for_each_classified(&self, view: &PageView<'_>, mut visit: impl FnMut(usize, usize, usize, usize)) {
        let range = view.range();
        let shape = view.shape();
        let mut cells = view.cells().iter();
        for page in range.first..=range.last {
            for row in 0..shape.rows {
                for col in 0..shape.cols {
                    let Some(&value) = cells.next() else {
                        return;
                    };
                    if value == 0.0 {
                        continue;
                    }
                    if let Some(level) = self.levels.level_index(f64::from(value)) {
                        visit(level, page, row, col);
                    }
                }
            }
        }
    }

    /// Extracts one event list per level from `view`.
    ///
    /// Entry `i` holds the events of level `i` (code `i`) in page-row-column
    /// order, or `None` if no cell fell in that level.
    ///
    /// # Panics
    /// Panics if the fill pass writes a different number of events than the
    /// count pass allotted; that can only happen through a broken traversal.
    #[must_use]
    pub fn run(&self, view: &PageView<'_>) -> LevelLists {
        let n_lists = self.num_lists();

        let mut counts = vec![0usize; n_lists];
        self.for_each_classified(view, |level, _, _, _| counts[level] += 1);

        let mut buffers: Vec<Vec<f32>> = counts.iter().map(|&n| vec![0.0f32; 3 * n]).collect();
        let mut cursors = vec![0usize; n_lists];

        self.for_each_classified(view, |level, page, row, col| {
            let center = self.duals.center_point(col, row, page);
            let slot = 3 * cursors[level];
            let buffer = &mut buffers[level];
            buffer[slot] = center.x as f32;
            buffer[slot + 1] = center.y as f32;
            buffer[slot + 2] = center.z as f32;
            cursors[level] += 1;
        });

        assert_eq!(
            cursors, counts,
            "fill pass visited cells differently from count pass"
        );

        let range = view.range();
        trace!(
            "extracted {} events from pages {}..={}",
            counts.iter().sum::<usize>(),
            range.first,
            range.last
        );

        buffers
            .into_iter()
            .enumerate()
            .map(|(level, xyz)| {
                if xyz.is_empty() {
                    None
                } else {
                    Some(FloatArrayEventList::with_shared_code(level as i32, xyz))
                }
            })
            .collect()
    }
}

/// Concatenates per-segment level lists, level by level, in segment order.
///
/// Segments must be ordered by page so that lower pages contribute earlier
/// events.
#[must_use]
pub fn merge_level_lists(segments: &[LevelLists]) -> LevelLists {
    let n_lists = segments.iter().map(Vec::len).max().unwrap_or(0);
    (0..n_lists)
        .map(|level| {
            let parts: Vec<&FloatArrayEventList> = segments
                .iter()
                .filter_map(|lists| lists.get(level).and_then(Option::as_ref))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(FloatArrayEventList::concat(parts))
            }
        })
        .collect()
}
