//! Event types and read-only event lists.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A weighted 3D sample point.
///
/// `code` is a weight when events are binned, and an intensity level index
/// when events are extracted from a histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
    /// Weight or level code.
    pub code: i32,
}

impl Event {
    /// Creates a new event.
    #[inline]
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32, code: i32) -> Self {
        Self { x, y, z, code }
    }
}

/// Read-only, randomly accessible sequence of events.
///
/// Lists are shared by reference across binning workers, so implementations
/// must be `Sync`.
pub trait EventList: Send + Sync {
    /// Number of events.
    fn len(&self) -> usize;

    /// Returns true if the list holds no events.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Event at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    fn event(&self, index: usize) -> Event;
}

impl EventList for Vec<Event> {
    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn event(&self, index: usize) -> Event {
        self[index]
    }
}

/// Event list backed by flat arrays: one code per event and interleaved
/// `x, y, z` coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloatArrayEventList {
    codes: Vec<i32>,
    xyz: Vec<f32>,
}

impl FloatArrayEventList {
    /// Creates a list from codes and interleaved coordinates.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] unless `xyz.len() == 3 * codes.len()`.
    pub fn new(codes: Vec<i32>, xyz: Vec<f32>) -> Result<Self> {
        if xyz.len() != 3 * codes.len() {
            return Err(Error::LengthMismatch {
                codes: codes.len(),
                coords: xyz.len(),
            });
        }
        Ok(Self { codes, xyz })
    }

    /// Creates a list from a sequence of events.
    #[must_use]
    pub fn from_events(events: &[Event]) -> Self {
        let mut codes = Vec::with_capacity(events.len());
        let mut xyz = Vec::with_capacity(3 * events.len());
        for e in events {
            codes.push(e.code);
            xyz.extend_from_slice(&[e.x, e.y, e.z]);
        }
        Self { codes, xyz }
    }

    /// Creates a list in which every event carries the same `code`.
    ///
    /// # Panics
    /// Panics if `xyz.len()` is not a multiple of 3.
    #[must_use]
    pub fn with_shared_code(code: i32, xyz: Vec<f32>) -> Self {
        assert!(
            xyz.len() % 3 == 0,
            "interleaved coordinates must come in triples, got {}",
            xyz.len()
        );
        Self {
            codes: vec![code; xyz.len() / 3],
            xyz,
        }
    }

    /// Concatenates lists in order.
    #[must_use]
    pub fn concat<'a, I>(lists: I) -> Self
    where
        I: IntoIterator<Item = &'a FloatArrayEventList>,
    {
        let mut out = Self::default();
        for list in lists {
            out.codes.extend_from_slice(&list.codes);
            out.xyz.extend_from_slice(&list.xyz);
        }
        out
    }

    /// Event codes.
    #[must_use]
    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    /// Interleaved `x, y, z` coordinates.
    #[must_use]
    pub fn xyz(&self) -> &[f32] {
        &self.xyz
    }

    /// Iterates over the events.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.codes
            .iter()
            .zip(self.xyz.chunks_exact(3))
            .map(|(&code, p)| Event::new(p[0], p[1], p[2], code))
    }

    /// Sum of all codes.
    #[must_use]
    pub fn total_code(&self) -> i64 {
        self.codes.iter().map(|&c| i64::from(c)).sum()
    }

    /// Per-coordinate `[min, max]` bounds, or `None` for an empty list.
    #[must_use]
    pub fn extent(&self) -> Option<[[f32; 2]; 3]> {
        if self.codes.is_empty() {
            return None;
        }
        let mut bounds = [[f32::INFINITY, f32::NEG_INFINITY]; 3];
        for p in self.xyz.chunks_exact(3) {
            for (axis, &v) in p.iter().enumerate() {
                bounds[axis][0] = bounds[axis][0].min(v);
                bounds[axis][1] = bounds[axis][1].max(v);
            }
        }
        Some(bounds)
    }
}

impl EventList for FloatArrayEventList {
    #[inline]
    fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    fn event(&self, index: usize) -> Event {
        let base = 3 * index;
        Event::new(
            self.xyz[base],
            self.xyz[base + 1],
            self.xyz[base + 2],
            self.codes[index],
        )
    }
}

impl From<Vec<Event>> for FloatArrayEventList {
    fn from(events: Vec<Event>) -> Self {
        Self::from_events(&events)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_float_array_list_access() {
        let list =
            FloatArrayEventList::new(vec![3, 5], vec![0.5, 0.5, 0.5, 3.0, 2.0, 1.0]).unwrap();
        assert_eq!(list.len(), 2);
        assert!(!list.is_empty());
        assert_eq!(list.event(1), Event::new(3.0, 2.0, 1.0, 5));
        assert_eq!(list.total_code(), 8);

        let collected: Vec<Event> = list.iter().collect();
        assert_eq!(collected[0], Event::new(0.5, 0.5, 0.5, 3));
    }

    #[test]
    fn test_length_mismatch() {
        let err = FloatArrayEventList::new(vec![1, 2], vec![0.0; 5]).unwrap_err();
        assert_eq!(err, Error::LengthMismatch { codes: 2, coords: 5 });
    }

    #[test]
    fn test_concat_preserves_order() {
        let a = FloatArrayEventList::from_events(&[Event::new(1.0, 1.0, 1.0, 0)]);
        let b = FloatArrayEventList::from_events(&[
            Event::new(2.0, 2.0, 2.0, 0),
            Event::new(3.0, 3.0, 3.0, 0),
        ]);
        let joined = FloatArrayEventList::concat([&a, &b]);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.event(0).x, 1.0);
        assert_eq!(joined.event(2).z, 3.0);
    }

    #[test]
    fn test_extent() {
        assert!(FloatArrayEventList::default().extent().is_none());

        let list = FloatArrayEventList::from_events(&[
            Event::new(-1.0, 4.0, 0.0, 1),
            Event::new(2.0, -3.0, 0.5, 1),
        ]);
        let ext = list.extent().unwrap();
        assert_eq!(ext[0], [-1.0, 2.0]);
        assert_eq!(ext[1], [-3.0, 4.0]);
        assert_eq!(ext[2], [0.0, 0.5]);
    }

    #[test]
    fn test_vec_is_event_list() {
        let events = vec![Event::new(0.0, 0.0, 0.0, 7)];
        let list: &dyn EventList = &events;
        assert_eq!(list.len(), 1);
        assert_eq!(list.event(0).code, 7);
    }
}
