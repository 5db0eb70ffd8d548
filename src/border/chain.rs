use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::zones::{ZoneId, ZonePair};

use super::geometry::{GridPos, Segment};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BorderError {
    #[error("segment index {index} out of range for border of {len} segments")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("a border needs at least one segment")]
    Empty,
    #[error("segment {index} does not continue the chain")]
    Broken { index: usize },
    #[error("left and right zone of a border must differ (both {0})")]
    SameZone(ZoneId),
}

/// One maximal chain of unit segments separating two zones.
///
/// Segments are stored start-to-end: `segments[k + 1]` is always one of
/// `segments[k].next_candidates()`. Every segment has `left` on its left-hand
/// side and `right` on its right-hand side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    left: ZoneId,
    right: ZoneId,
    segments: Vec<Segment>,
}

impl Border {
    /// Build a border from an already ordered chain. The chain relation is
    /// checked; zone sides are taken on trust.
    pub fn from_segments(left: ZoneId, right: ZoneId, segments: Vec<Segment>) -> Result<Self, BorderError> {
        if left == right {
            return Err(BorderError::SameZone(left));
        }
        if segments.is_empty() {
            return Err(BorderError::Empty);
        }
        if let Some(k) = segments.windows(2).position(|w| !w[0].is_followed_by(&w[1])) {
            return Err(BorderError::Broken { index: k + 1 });
        }
        Ok(Self { left, right, segments })
    }

    pub(crate) fn from_traced(left: ZoneId, right: ZoneId, segments: Vec<Segment>) -> Self {
        debug_assert!(!segments.is_empty());
        Self { left, right, segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn at(&self, index: usize) -> Result<&Segment, BorderError> {
        self.segments
            .get(index)
            .ok_or(BorderError::IndexOutOfRange { index, len: self.segments.len() })
    }

    /// Zone on the left-hand side of every segment.
    pub fn left_zone(&self) -> ZoneId {
        self.left
    }

    /// Zone on the right-hand side of every segment.
    pub fn right_zone(&self) -> ZoneId {
        self.right
    }

    /// Ordered `(left, right)` zone pair.
    pub fn zones(&self) -> (ZoneId, ZoneId) {
        (self.left, self.right)
    }

    pub fn pair(&self) -> ZonePair {
        ZonePair::new(self.left, self.right)
    }

    pub fn left_cell(&self, index: usize) -> Result<GridPos, BorderError> {
        self.at(index).map(|s| s.left_cell())
    }

    pub fn right_cell(&self, index: usize) -> Result<GridPos, BorderError> {
        self.at(index).map(|s| s.right_cell())
    }

    /// Cells on `zone`'s side of the border, one per segment (a cell may repeat
    /// at corners). `None` if `zone` is not one of the two zones.
    pub fn cells_on(&self, zone: ZoneId) -> Option<Vec<GridPos>> {
        if zone == self.left {
            Some(self.segments.iter().map(|s| s.left_cell()).collect())
        } else if zone == self.right {
            Some(self.segments.iter().map(|s| s.right_cell()).collect())
        } else {
            None
        }
    }

    /// First vertex of the chain.
    pub fn start(&self) -> GridPos {
        self.segments[0].start
    }

    /// Last vertex of the chain.
    pub fn end(&self) -> GridPos {
        self.segments[self.segments.len() - 1].end()
    }

    /// Whether the chain returns to where it began (an enclosed zone).
    pub fn is_closed(&self) -> bool {
        self.start() == self.end()
    }

    /// Manhattan distance from the end of segment `from` to the start of
    /// segment `to`.
    pub fn manhattan_from_to(&self, from: usize, to: usize) -> Result<usize, BorderError> {
        let from_end = self.at(from)?.end();
        let to_start = self.at(to)?.start;
        Ok(from_end.manhattan(to_start))
    }

    /// Width of an opening covering segments `first..end`: the distance
    /// between the start of `first` and the end of `end - 1`.
    pub fn opening_width(&self, first: usize, end: usize) -> Result<usize, BorderError> {
        if end <= first {
            return Err(BorderError::IndexOutOfRange { index: end, len: self.len() });
        }
        self.manhattan_from_to(end - 1, first)
    }
}
