use crate::border::GridPos;
use crate::zones::ZoneId;

/// A 2D tilemap grid (row-major, no wrapping at any edge).
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({}, {}) out of bounds", x, y);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Checked access by signed position.
    pub fn get_pos(&self, pos: GridPos) -> Option<&T> {
        if self.in_bounds(pos) {
            Some(self.get(pos.x as usize, pos.y as usize))
        } else {
            None
        }
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }
}

/// Read access to a fully populated zone grid.
pub trait ZoneGrid {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Zone at a cell, or `None` when the position is outside the grid.
    fn zone_at(&self, pos: GridPos) -> Option<ZoneId>;

    fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width() && (pos.y as usize) < self.height()
    }
}

impl ZoneGrid for Tilemap<ZoneId> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn zone_at(&self, pos: GridPos) -> Option<ZoneId> {
        self.get_pos(pos).copied()
    }
}
