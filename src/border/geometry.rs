//! Unit boundary geometry on a square grid
//!
//! Positions double as cell coordinates and lattice vertices: vertex `(x, y)` is
//! the top-left corner of cell `(x, y)`, with `y` growing downward.
//!
//! An [`Edge`] is the undirected boundary between two 4-connected cells. A
//! [`Segment`] is the same piece of boundary walked in one direction, which
//! makes it possible to tell which cell lies on its left and which on its right.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer grid position (cell or lattice vertex).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// |dx| + |dy|
    pub fn manhattan(self, other: GridPos) -> usize {
        (self.x - other.x).unsigned_abs() as usize + (self.y - other.y).unsigned_abs() as usize
    }

    /// The position one unit away in `direction`.
    pub fn step(self, direction: Direction) -> GridPos {
        self + direction.offset()
    }
}

impl Add for GridPos {
    type Output = GridPos;

    fn add(self, rhs: GridPos) -> GridPos {
        GridPos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for GridPos {
    type Output = GridPos;

    fn sub(self, rhs: GridPos) -> GridPos {
        GridPos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal walking direction (screen orientation, y down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub fn all() -> &'static [Direction] {
        &[Direction::Up, Direction::Right, Direction::Down, Direction::Left]
    }

    /// Unit offset of one step in this direction.
    pub fn offset(self) -> GridPos {
        match self {
            Direction::Up => GridPos::new(0, -1),
            Direction::Right => GridPos::new(1, 0),
            Direction::Down => GridPos::new(0, 1),
            Direction::Left => GridPos::new(-1, 0),
        }
    }

    pub fn turn_left(self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }

    pub fn turn_right(self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    pub fn turn_back(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// How the two cells separated by a segment walking this way are arranged.
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Up | Direction::Down => Orientation::Horizontal,
            Direction::Left | Direction::Right => Orientation::Vertical,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Right => write!(f, "right"),
            Direction::Down => write!(f, "down"),
            Direction::Left => write!(f, "left"),
        }
    }
}

/// Arrangement of the two cells an [`Edge`] separates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    /// Cells side by side: `(x, y)` and `(x + 1, y)`.
    Horizontal,
    /// Cells stacked: `(x, y)` and `(x, y + 1)`.
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("cells {a} and {b} are not 4-connected neighbours")]
    NotAdjacent { a: GridPos, b: GridPos },
}

/// Undirected boundary between two 4-connected cells.
///
/// Anchored at the top/left cell of the pair, so an edge and its reverse are
/// the same value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub top_left: GridPos,
    pub orientation: Orientation,
}

impl Edge {
    pub fn new(top_left: GridPos, orientation: Orientation) -> Self {
        Self { top_left, orientation }
    }

    /// The edge between two cells, in either order.
    pub fn between(a: GridPos, b: GridPos) -> Result<Edge, GeometryError> {
        let delta = b - a;
        match (delta.x.abs(), delta.y.abs()) {
            (1, 0) => Ok(Edge::new(GridPos::new(a.x.min(b.x), a.y), Orientation::Horizontal)),
            (0, 1) => Ok(Edge::new(GridPos::new(a.x, a.y.min(b.y)), Orientation::Vertical)),
            _ => Err(GeometryError::NotAdjacent { a, b }),
        }
    }

    pub fn top_left_cell(&self) -> GridPos {
        self.top_left
    }

    pub fn bottom_right_cell(&self) -> GridPos {
        match self.orientation {
            Orientation::Horizontal => self.top_left + GridPos::new(1, 0),
            Orientation::Vertical => self.top_left + GridPos::new(0, 1),
        }
    }

    /// Both cells, top/left first.
    pub fn cells(&self) -> (GridPos, GridPos) {
        (self.top_left_cell(), self.bottom_right_cell())
    }
}

impl From<Segment> for Edge {
    fn from(segment: Segment) -> Edge {
        let top_left = match segment.direction {
            Direction::Right | Direction::Up => segment.left_cell(),
            Direction::Down | Direction::Left => segment.right_cell(),
        };
        Edge::new(top_left, segment.direction.orientation())
    }
}

/// Directed unit piece of boundary: a start vertex plus a walking direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub start: GridPos,
    pub direction: Direction,
}

impl Segment {
    pub const fn new(start: GridPos, direction: Direction) -> Self {
        Self { start, direction }
    }

    /// The segment that has `left` on its left-hand side and `right` on its
    /// right-hand side.
    pub fn separating(left: GridPos, right: GridPos) -> Result<Segment, GeometryError> {
        let delta = right - left;
        let (start, direction) = match (delta.x, delta.y) {
            // right cell below: walk right along the shared horizontal line
            (0, 1) => (right, Direction::Right),
            (0, -1) => (GridPos::new(left.x + 1, left.y), Direction::Left),
            (1, 0) => (GridPos::new(right.x, right.y + 1), Direction::Up),
            (-1, 0) => (left, Direction::Down),
            _ => return Err(GeometryError::NotAdjacent { a: left, b: right }),
        };
        Ok(Segment::new(start, direction))
    }

    /// The vertex this segment ends at.
    pub fn end(&self) -> GridPos {
        self.start.step(self.direction)
    }

    pub fn left_cell(&self) -> GridPos {
        let GridPos { x, y } = self.start;
        match self.direction {
            Direction::Up => GridPos::new(x - 1, y - 1),
            Direction::Right => GridPos::new(x, y - 1),
            Direction::Down => GridPos::new(x, y),
            Direction::Left => GridPos::new(x - 1, y),
        }
    }

    pub fn right_cell(&self) -> GridPos {
        let GridPos { x, y } = self.start;
        match self.direction {
            Direction::Up => GridPos::new(x, y - 1),
            Direction::Right => GridPos::new(x, y),
            Direction::Down => GridPos::new(x - 1, y),
            Direction::Left => GridPos::new(x - 1, y - 1),
        }
    }

    pub fn turn_left(self) -> Segment {
        Segment::new(self.start, self.direction.turn_left())
    }

    pub fn turn_right(self) -> Segment {
        Segment::new(self.start, self.direction.turn_right())
    }

    pub fn turn_back(self) -> Segment {
        Segment::new(self.start, self.direction.turn_back())
    }

    /// Translate one unit along the current direction.
    pub fn move_forward(self) -> Segment {
        Segment::new(self.end(), self.direction)
    }

    /// Same edge walked the other way; left and right cells swap.
    pub fn flipped(self) -> Segment {
        Segment::new(self.end(), self.direction.turn_back())
    }

    /// Segments that can follow this one in a chain: left turn, straight,
    /// right turn, all starting at this segment's end.
    pub fn next_candidates(&self) -> [Segment; 3] {
        let ahead = self.move_forward();
        [ahead.turn_left(), ahead, ahead.turn_right()]
    }

    /// Segments this one can follow in a chain, i.e. those whose
    /// [`next_candidates`](Self::next_candidates) contain `self`.
    ///
    /// Ordered so that a backward walk also prefers turning left.
    pub fn prev_candidates(&self) -> [Segment; 3] {
        let d = self.direction;
        [d.turn_right(), d, d.turn_left()]
            .map(|incoming| Segment::new(self.start - incoming.offset(), incoming))
    }

    /// Whether `other` may directly follow this segment.
    pub fn is_followed_by(&self, other: &Segment) -> bool {
        self.next_candidates().contains(other)
    }
}

impl From<Edge> for Segment {
    /// Canonical direction: side-by-side cells give a downward segment,
    /// stacked cells a rightward one, both starting at the bottom-right cell's
    /// top-left vertex.
    fn from(edge: Edge) -> Segment {
        let direction = match edge.orientation {
            Orientation::Horizontal => Direction::Down,
            Orientation::Vertical => Direction::Right,
        };
        Segment::new(edge.bottom_right_cell(), direction)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.start, self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_segments_around(center: GridPos) -> Vec<Segment> {
        Direction::all()
            .iter()
            .map(|&d| Segment::new(center, d))
            .collect()
    }

    #[test]
    fn test_turns_are_inverse() {
        for &d in Direction::all() {
            assert_eq!(d.turn_left().turn_right(), d);
            assert_eq!(d.turn_back().turn_back(), d);
            assert_eq!(d.turn_left().turn_left(), d.turn_back());
        }
    }

    #[test]
    fn test_left_and_right_cells_are_adjacent_pairs() {
        for seg in all_segments_around(GridPos::new(3, 3)) {
            let edge = Edge::between(seg.left_cell(), seg.right_cell()).unwrap();
            assert_eq!(edge, Edge::from(seg));
        }
    }

    #[test]
    fn test_right_segment_cells() {
        // Walking right along y = 2 between rows 1 and 2
        let seg = Segment::new(GridPos::new(4, 2), Direction::Right);
        assert_eq!(seg.left_cell(), GridPos::new(4, 1));
        assert_eq!(seg.right_cell(), GridPos::new(4, 2));
        assert_eq!(seg.end(), GridPos::new(5, 2));
    }

    #[test]
    fn test_edge_between_rejects_non_neighbours() {
        let a = GridPos::new(0, 0);
        assert!(Edge::between(a, GridPos::new(1, 1)).is_err());
        assert!(Edge::between(a, GridPos::new(2, 0)).is_err());
        assert!(Edge::between(a, a).is_err());
        assert_eq!(
            Edge::between(a, GridPos::new(0, 3)),
            Err(GeometryError::NotAdjacent { a, b: GridPos::new(0, 3) })
        );
    }

    #[test]
    fn test_edge_is_unordered() {
        let a = GridPos::new(2, 5);
        let b = GridPos::new(3, 5);
        assert_eq!(Edge::between(a, b).unwrap(), Edge::between(b, a).unwrap());
        assert_eq!(Edge::between(a, b).unwrap().cells(), (a, b));
    }

    #[test]
    fn test_separating_puts_cells_on_requested_sides() {
        let center = GridPos::new(5, 5);
        for &d in Direction::all() {
            let other = center.step(d);
            let seg = Segment::separating(center, other).unwrap();
            assert_eq!(seg.left_cell(), center);
            assert_eq!(seg.right_cell(), other);
        }
        assert!(Segment::separating(center, GridPos::new(6, 6)).is_err());
    }

    #[test]
    fn test_segment_edge_round_trip() {
        for seg in all_segments_around(GridPos::new(-2, 7)) {
            let back = Segment::from(Edge::from(seg));
            assert!(back == seg || back == seg.flipped(), "{} -> {}", seg, back);
            assert_eq!(Edge::from(back), Edge::from(seg));
        }
    }

    #[test]
    fn test_edge_segment_round_trip_is_exact() {
        let edges = [
            Edge::new(GridPos::new(1, 1), Orientation::Horizontal),
            Edge::new(GridPos::new(1, 1), Orientation::Vertical),
        ];
        for edge in edges {
            assert_eq!(Edge::from(Segment::from(edge)), edge);
        }
    }

    #[test]
    fn test_flipped_swaps_sides() {
        let seg = Segment::new(GridPos::new(1, 4), Direction::Up);
        let flipped = seg.flipped();
        assert_eq!(flipped.left_cell(), seg.right_cell());
        assert_eq!(flipped.right_cell(), seg.left_cell());
        assert_eq!(flipped.flipped(), seg);
    }

    #[test]
    fn test_prev_candidates_mirror_next_candidates() {
        for seg in all_segments_around(GridPos::new(0, 0)) {
            for prev in seg.prev_candidates() {
                assert!(prev.is_followed_by(&seg), "{} should precede {}", prev, seg);
            }
            for next in seg.next_candidates() {
                assert!(next.prev_candidates().contains(&seg));
            }
        }
    }

    #[test]
    fn test_next_candidates_order() {
        let seg = Segment::new(GridPos::new(0, 0), Direction::Right);
        let [left, straight, right] = seg.next_candidates();
        assert_eq!(left, Segment::new(GridPos::new(1, 0), Direction::Up));
        assert_eq!(straight, Segment::new(GridPos::new(1, 0), Direction::Right));
        assert_eq!(right, Segment::new(GridPos::new(1, 0), Direction::Down));
    }
}
