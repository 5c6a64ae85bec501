//! qhist-core: Core types for 3D event histogramming.
//!
//! This crate provides the binners that map coordinates to histogram cells,
//! projection binners for arbitrary axis directions, the dual binner set used
//! to reconstruct cell centers on skewed axes, and read-only event lists.
//!

pub mod binner;
pub mod dual;
pub mod error;
pub mod event;
pub mod projection;
pub mod vector;

pub use binner::{BinPosition, Binner, EdgeBinner, UniformBinner};
pub use dual::{center_point, DualBinnerSet};
pub use error::{Error, Result};
pub use event::{Event, EventList, FloatArrayEventList};
pub use projection::ProjectionBinner;
pub use vector::Vector3;
