//! Binners along arbitrary directions in 3D.

use std::sync::Arc;

use crate::binner::{BinPosition, Binner};
use crate::error::{Error, Result};
use crate::vector::Vector3;

/// A [`Binner`] paired with a 3D direction.
///
/// A point is binned by projecting it onto the direction and classifying the
/// resulting scalar. The direction does not need unit length; its length
/// scales the coordinate the binner sees.
#[derive(Debug, Clone)]
pub struct ProjectionBinner {
    binner: Arc<dyn Binner>,
    direction: Vector3,
}

impl ProjectionBinner {
    /// Creates a projection binner.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDirection`] if `direction` is zero or has a
    /// non-finite component.
    pub fn new(binner: Arc<dyn Binner>, direction: Vector3) -> Result<Self> {
        if !direction.is_finite() || direction.length() == 0.0 {
            return Err(Error::InvalidDirection {
                x: direction.x,
                y: direction.y,
                z: direction.z,
            });
        }
        Ok(Self { binner, direction })
    }

    /// Wraps any binner by value.
    ///
    /// # Errors
    /// See [`ProjectionBinner::new`].
    pub fn from_binner<B: Binner + 'static>(binner: B, direction: Vector3) -> Result<Self> {
        Self::new(Arc::new(binner), direction)
    }

    /// The same binner along another direction.
    pub(crate) fn with_direction(&self, direction: Vector3) -> Self {
        Self {
            binner: Arc::clone(&self.binner),
            direction,
        }
    }

    /// The underlying scalar binner.
    #[must_use]
    pub fn binner(&self) -> &dyn Binner {
        self.binner.as_ref()
    }

    /// Projection direction.
    #[must_use]
    pub fn direction(&self) -> Vector3 {
        self.direction
    }

    /// Number of bins along this axis.
    #[inline]
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.binner.num_bins()
    }

    /// Scalar coordinate of a point along this axis.
    #[inline]
    #[must_use]
    pub fn coordinate(&self, x: f64, y: f64, z: f64) -> f64 {
        self.direction.dot(&Vector3::new(x, y, z))
    }

    /// Classifies a point's projected coordinate.
    #[inline]
    #[must_use]
    pub fn position(&self, x: f64, y: f64, z: f64) -> BinPosition {
        self.binner.position(self.coordinate(x, y, z))
    }

    /// Axis index of a point, or `None` outside the covered range.
    #[inline]
    #[must_use]
    pub fn index(&self, x: f64, y: f64, z: f64) -> Option<usize> {
        self.binner.index(self.coordinate(x, y, z))
    }

    /// Bin-center scalar of interval `index`.
    #[inline]
    #[must_use]
    pub fn center(&self, index: usize) -> f64 {
        self.binner.center(index)
    }
}
