//! Page partitioning of the flat histogram buffer.
//!
//! The histogram is one contiguous `[page][row][col]` buffer. Parallel
//! workers each receive a slab of whole pages; the slabs are carved out with
//! `split_at_mut`, so no two workers can alias a cell and no locking is
//! needed while they run.

use qhist_core::error::{Error, Result};

/// Dimensions of a 3D histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramShape {
    /// Number of pages (z bins).
    pub pages: usize,
    /// Number of rows (y bins).
    pub rows: usize,
    /// Number of columns (x bins).
    pub cols: usize,
}

impl HistogramShape {
    /// Creates a shape without checking its size.
    ///
    /// Use [`HistogramShape::try_new`] for dimensions that come from
    /// user-supplied binners.
    #[must_use]
    pub fn new(pages: usize, rows: usize, cols: usize) -> Self {
        Self { pages, rows, cols }
    }

    /// Creates a shape whose `f32` cell buffer can be allocated.
    ///
    /// # Errors
    /// Returns [`Error::HistogramTooLarge`] if the cell count or the buffer
    /// size in bytes overflows.
    pub fn try_new(pages: usize, rows: usize, cols: usize) -> Result<Self> {
        let bytes = rows
            .checked_mul(cols)
            .and_then(|page_len| page_len.checked_mul(pages))
            .and_then(|cells| cells.checked_mul(std::mem::size_of::<f32>()));
        match bytes {
            Some(bytes) if isize::try_from(bytes).is_ok() => Ok(Self { pages, rows, cols }),
            _ => Err(Error::HistogramTooLarge { pages, rows, cols }),
        }
    }

    /// Cells in one page.
    #[inline]
    #[must_use]
    pub fn page_len(&self) -> usize {
        self.rows * self.cols
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.pages * self.page_len()
    }

    /// Flat offset of `(page, row, col)`.
    #[inline]
    #[must_use]
    pub fn offset(&self, page: usize, row: usize, col: usize) -> usize {
        (page * self.rows + row) * self.cols + col
    }
}

/// Inclusive range of pages `[first, last]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// First page.
    pub first: usize,
    /// Last page (inclusive).
    pub last: usize,
}

impl PageRange {
    /// Creates a range.
    #[must_use]
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// Number of pages in the range; zero if inverted.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.last - self.first + 1
        }
    }

    /// Returns true for an inverted range (`first > last`).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    /// Returns true if `page` lies in the range.
    #[inline]
    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        page >= self.first && page <= self.last
    }
}

/// Splits `pages` into at most `segments` contiguous ranges.
///
/// The segment count is clamped to `1..=pages`. Ranges have equal length
/// except the last, which also takes the remainder.
#[must_use]
pub fn split_pages(pages: usize, segments: usize) -> Vec<PageRange> {
    if pages == 0 {
        return Vec::new();
    }
    let segments = segments.clamp(1, pages);
    let step = pages / segments;

    let mut ranges: Vec<PageRange> = (0..segments)
        .map(|i| PageRange::new(i * step, (i + 1) * step - 1))
        .collect();
    if let Some(last) = ranges.last_mut() {
        last.last = pages - 1;
    }
    ranges
}

/// Checks that `ranges` tile `[0, pages - 1]` exactly once, in order.
///
/// # Errors
/// Returns [`Error::InvalidPartition`] on a gap, an overlap, an inverted
/// range, or a range past the last page.
pub fn validate_tiling(ranges: &[PageRange], pages: usize) -> Result<()> {
    let mut next = 0usize;
    for (i, range) in ranges.iter().enumerate() {
        if range.first > range.last {
            return Err(Error::InvalidPartition(format!(
                "range {i} is inverted: [{}, {}]",
                range.first, range.last
            )));
        }
        if range.first != next {
            return Err(Error::InvalidPartition(format!(
                "range {i} starts at page {} but page {next} is next",
                range.first
            )));
        }
        next = range.last + 1;
    }
    if next != pages {
        return Err(Error::InvalidPartition(format!(
            "ranges cover {next} of {pages} pages"
        )));
    }
    Ok(())
}

/// Exclusive, mutable view of a range of whole pages.
#[derive(Debug)]
pub struct PageSlab<'a> {
    range: PageRange,
    shape: HistogramShape,
    data: &'a mut [f32],
}

impl PageSlab<'_> {
    /// Pages owned by this slab.
    #[inline]
    #[must_use]
    pub fn range(&self) -> PageRange {
        self.range
    }

    /// Shape of the full histogram.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> HistogramShape {
        self.shape
    }

    /// Cells of the slab in page-row-column order.
    #[must_use]
    pub fn cells(&self) -> &[f32] {
        &*self.data
    }

    /// Mutable cells of the slab in page-row-column order.
    pub fn cells_mut(&mut self) -> &mut [f32] {
        &mut *self.data
    }

    /// Mutable cell at an absolute page index.
    ///
    /// # Panics
    /// Panics if the cell is outside the slab.
    #[inline]
    pub fn cell_mut(&mut self, page: usize, row: usize, col: usize) -> &mut f32 {
        let local = self.shape.offset(page - self.range.first, row, col);
        &mut self.data[local]
    }
}

/// Shared, read-only view of a range of whole pages.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    range: PageRange,
    shape: HistogramShape,
    data: &'a [f32],
}

impl<'a> PageView<'a> {
    /// Pages covered by this view.
    #[inline]
    #[must_use]
    pub fn range(&self) -> PageRange {
        self.range
    }

    /// Shape of the full histogram.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> HistogramShape {
        self.shape
    }

    /// Cells of the view in page-row-column order.
    #[must_use]
    pub fn cells(&self) -> &'a [f32] {
        self.data
    }

    /// Cell at an absolute page index.
    ///
    /// # Panics
    /// Panics if the cell is outside the view.
    #[inline]
    #[must_use]
    pub fn cell(&self, page: usize, row: usize, col: usize) -> f32 {
        self.data[self.shape.offset(page - self.range.first, row, col)]
    }
}

fn check_buffer(len: usize, shape: HistogramShape) -> Result<()> {
    HistogramShape::try_new(shape.pages, shape.rows, shape.cols)?;
    if len == shape.cell_count() {
        Ok(())
    } else {
        Err(Error::InvalidPartition(format!(
            "buffer holds {len} cells but shape {}x{}x{} needs {}",
            shape.pages,
            shape.rows,
            shape.cols,
            shape.cell_count()
        )))
    }
}

// Callers guarantee the buffer length and tiling.
fn carve_slabs<'a>(
    buffer: &'a mut [f32],
    shape: HistogramShape,
    ranges: &[PageRange],
) -> Vec<PageSlab<'a>> {
    let mut rest = buffer;
    let mut slabs = Vec::with_capacity(ranges.len());
    for &range in ranges {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * shape.page_len());
        slabs.push(PageSlab {
            range,
            shape,
            data: head,
        });
        rest = tail;
    }
    slabs
}

fn carve_views<'a>(
    buffer: &'a [f32],
    shape: HistogramShape,
    ranges: &[PageRange],
) -> Vec<PageView<'a>> {
    let mut rest = buffer;
    let mut views = Vec::with_capacity(ranges.len());
    for &range in ranges {
        let (head, tail) = rest.split_at(range.len() * shape.page_len());
        views.push(PageView {
            range,
            shape,
            data: head,
        });
        rest = tail;
    }
    views
}

/// Splits a buffer into one mutable slab per range.
///
/// # Errors
/// Returns [`Error::HistogramTooLarge`] if `shape` overflows, and
/// [`Error::InvalidPartition`] if the buffer length does not match `shape`
/// or the ranges do not tile the pages exactly once.
pub fn split_slabs<'a>(
    buffer: &'a mut [f32],
    shape: HistogramShape,
    ranges: &[PageRange],
) -> Result<Vec<PageSlab<'a>>> {
    check_buffer(buffer.len(), shape)?;
    validate_tiling(ranges, shape.pages)?;
    Ok(carve_slabs(buffer, shape, ranges))
}

/// Splits a buffer into one read-only view per range.
///
/// # Errors
/// Same conditions as [`split_slabs`].
pub fn split_views<'a>(
    buffer: &'a [f32],
    shape: HistogramShape,
    ranges: &[PageRange],
) -> Result<Vec<PageView<'a>>> {
    check_buffer(buffer.len(), shape)?;
    validate_tiling(ranges, shape.pages)?;
    Ok(carve_views(buffer, shape, ranges))
}

/// Splits a buffer into at most `segments` mutable slabs using
/// [`split_pages`].
///
/// # Panics
/// Panics if the buffer length does not match `shape`.
#[must_use]
pub fn split_slabs_evenly(
    buffer: &mut [f32],
    shape: HistogramShape,
    segments: usize,
) -> Vec<PageSlab<'_>> {
    assert_eq!(buffer.len(), shape.cell_count(), "buffer does not match shape");
    carve_slabs(buffer, shape, &split_pages(shape.pages, segments))
}

/// Splits a buffer into at most `segments` read-only views using
/// [`split_pages`].
///
/// # Panics
/// Panics if the buffer length does not match `shape`.
#[must_use]
pub fn split_views_evenly(buffer: &[f32], shape: HistogramShape, segments: usize) -> Vec<PageView<'_>> {
    assert_eq!(buffer.len(), shape.cell_count(), "buffer does not match shape");
    carve_views(buffer, shape, &split_pages(shape.pages, segments))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_split_pages_even_and_remainder() {
        let ranges = split_pages(10, 4);
        assert_eq!(
            ranges,
            vec![
                PageRange::new(0, 1),
                PageRange::new(2, 3),
                PageRange::new(4, 5),
                PageRange::new(6, 9),
            ]
        );
        assert!(validate_tiling(&ranges, 10).is_ok());
    }

    #[test]
    fn test_split_pages_clamps_segments() {
        assert_eq!(split_pages(3, 8).len(), 3);
        assert_eq!(split_pages(3, 0), vec![PageRange::new(0, 2)]);
        assert!(split_pages(0, 4).is_empty());
    }

    #[test]
    fn test_validate_tiling_rejects_gaps_and_overlaps() {
        let gap = [PageRange::new(0, 1), PageRange::new(3, 4)];
        assert!(matches!(
            validate_tiling(&gap, 5),
            Err(Error::InvalidPartition(_))
        ));

        let overlap = [PageRange::new(0, 2), PageRange::new(2, 4)];
        assert!(validate_tiling(&overlap, 5).is_err());

        let short = [PageRange::new(0, 3)];
        assert!(validate_tiling(&short, 5).is_err());

        let inverted = [PageRange::new(0, 2), PageRange::new(4, 3)];
        assert!(validate_tiling(&inverted, 5).is_err());
    }

    #[test]
    fn test_slabs_are_disjoint_pages() {
        let shape = HistogramShape::new(3, 2, 2);
        let mut buffer = vec![0.0f32; shape.cell_count()];
        let ranges = [PageRange::new(0, 0), PageRange::new(1, 2)];

        let mut slabs = split_slabs(&mut buffer, shape, &ranges).unwrap();
        assert_eq!(slabs[0].cells().len(), 4);
        assert_eq!(slabs[1].cells().len(), 8);

        *slabs[0].cell_mut(0, 1, 1) = 1.0;
        *slabs[1].cell_mut(2, 0, 1) = 2.0;
        drop(slabs);

        assert_eq!(buffer[shape.offset(0, 1, 1)], 1.0);
        assert_eq!(buffer[shape.offset(2, 0, 1)], 2.0);
        assert_eq!(buffer.iter().sum::<f32>(), 3.0);
    }

    #[test]
    fn test_split_rejects_wrong_buffer_length() {
        let shape = HistogramShape::new(2, 2, 2);
        let mut buffer = vec![0.0f32; 7];
        let ranges = split_pages(2, 1);
        assert!(split_slabs(&mut buffer, shape, &ranges).is_err());
        assert!(split_views(&buffer, shape, &ranges).is_err());
    }

    #[test]
    fn test_views_read_absolute_pages() {
        let shape = HistogramShape::new(4, 1, 2);
        let buffer: Vec<f32> = (0..8u8).map(f32::from).collect();
        let views = split_views_evenly(&buffer, shape, 2);
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].range(), PageRange::new(2, 3));
        assert_eq!(views[1].cell(3, 0, 1), 7.0);
    }

    #[test]
    fn test_try_new_rejects_overflowing_shape() {
        let side = 1usize << 22;
        assert!(matches!(
            HistogramShape::try_new(side, side, side),
            Err(Error::HistogramTooLarge { .. })
        ));
        assert!(HistogramShape::try_new(usize::MAX, 1, 2).is_err());

        let shape = HistogramShape::try_new(3, 4, 5).unwrap();
        assert_eq!(shape.cell_count(), 60);
    }

    #[test]
    fn test_split_rejects_overflowing_shape() {
        let side = 1usize << 22;
        let shape = HistogramShape::new(side, side, side);
        let buffer = vec![0.0f32; 4];
        let ranges = [PageRange::new(0, side - 1)];
        assert!(matches!(
            split_views(&buffer, shape, &ranges),
            Err(Error::HistogramTooLarge { .. })
        ));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let range = PageRange::new(5, 2);
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert!(!range.contains(3));

        let single = PageRange::new(4, 4);
        assert!(!single.is_empty());
        assert_eq!(single.len(), 1);
    }
}
