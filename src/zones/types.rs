use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tilemap::Tilemap;

/// Unique identifier for a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl ZoneId {
    pub const NONE: ZoneId = ZoneId(u32::MAX);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "zone#none")
        } else {
            write!(f, "zone#{}", self.0)
        }
    }
}

/// Unordered pair of zones, stored with the smaller id first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZonePair {
    low: ZoneId,
    high: ZoneId,
}

impl ZonePair {
    pub fn new(a: ZoneId, b: ZoneId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> ZoneId {
        self.low
    }

    pub fn high(&self) -> ZoneId {
        self.high
    }

    pub fn contains(&self, zone: ZoneId) -> bool {
        self.low == zone || self.high == zone
    }

    /// The zone across the pair from `zone`, if `zone` is part of it.
    pub fn other(&self, zone: ZoneId) -> Option<ZoneId> {
        if zone == self.low {
            Some(self.high)
        } else if zone == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

impl From<(ZoneId, ZoneId)> for ZonePair {
    fn from((a, b): (ZoneId, ZoneId)) -> Self {
        ZonePair::new(a, b)
    }
}

impl fmt::Display for ZonePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.low, self.high)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapParseError {
    #[error("zone map is empty")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
}

/// Parse an ASCII zone map: one line per row, one non-space character per cell.
///
/// Each distinct character becomes a zone, numbered in order of first
/// appearance. Blank lines are skipped; trailing whitespace is ignored.
pub fn parse_zone_map(text: &str) -> Result<(Tilemap<ZoneId>, BTreeMap<ZoneId, char>), MapParseError> {
    let rows: Vec<Vec<char>> = text
        .lines()
        .map(|line| line.trim_end().chars().collect::<Vec<char>>())
        .filter(|row| !row.is_empty())
        .collect();

    let width = rows.first().map(|r| r.len()).ok_or(MapParseError::Empty)?;
    let height = rows.len();

    let mut ids: BTreeMap<char, ZoneId> = BTreeMap::new();
    let mut legend: BTreeMap<ZoneId, char> = BTreeMap::new();
    let mut map = Tilemap::new(width, height);

    for (y, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(MapParseError::Ragged { row: y, expected: width, found: row.len() });
        }
        for (x, &c) in row.iter().enumerate() {
            let next_id = ZoneId(ids.len() as u32);
            let id = *ids.entry(c).or_insert(next_id);
            legend.insert(id, c);
            map.set(x, y, id);
        }
    }

    Ok((map, legend))
}
