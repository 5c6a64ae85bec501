//! qhist-algorithms: Parallel page workers for 3D event histograms.
//!
//! This crate provides:
//! - **Page partitioning** - tiling the page dimension and splitting the flat
//!   buffer into non-overlapping slabs
//! - **Bin-Events** - accumulating event lists into a slab
//! - **Extract-Events** - rebuilding level-classified events from cell values
//! - **Histogram3D** - a driver that runs the workers on rayon and merges
//!   their results
//!
#![warn(missing_docs)]

mod bin_events;
mod extract_events;
mod histogram;
pub mod pages;
mod scan;

pub use bin_events::{BinEvents, BinSummary, Weighting};
pub use extract_events::{merge_level_lists, ExtractEvents, LevelLists};
pub use histogram::{Histogram3D, HistogramConfig};
pub use pages::{HistogramShape, PageRange, PageSlab, PageView};
pub use scan::{clear_pages, scan_pages};

// Re-export core binning types
pub use qhist_core::{
    BinPosition, Binner, DualBinnerSet, EdgeBinner, Event, EventList, FloatArrayEventList,
    ProjectionBinner, UniformBinner, Vector3,
};
