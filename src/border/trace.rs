//! Border tracing
//!
//! Scans every horizontal and vertical cell adjacency once, collects the
//! boundary edges between differing zones, then stitches them into maximal
//! chains. A chain only ever absorbs edges separating the same ordered zone
//! pair as its seed, so borders of different pairs never merge even where they
//! meet end to end.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::tilemap::ZoneGrid;
use crate::zones::{ZoneId, ZonePair};

use super::chain::Border;
use super::geometry::{Edge, GridPos, Orientation, Segment};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    #[error("cell {0} has no zone; the grid must be fully populated before tracing")]
    EmptyCell(GridPos),
    #[error("boundary edge at {0:?} reaches outside the grid")]
    OutsideGrid(Edge),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no border recorded between {0}")]
    NoBorder(ZonePair),
}

/// All traced borders, grouped by unordered zone pair.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneBorders {
    borders: BTreeMap<ZonePair, Vec<Border>>,
}

impl ZoneBorders {
    pub fn get(&self, pair: ZonePair) -> Result<&[Border], LookupError> {
        self.borders
            .get(&pair)
            .map(|b| b.as_slice())
            .ok_or(LookupError::NoBorder(pair))
    }

    pub fn between(&self, a: ZoneId, b: ZoneId) -> Result<&[Border], LookupError> {
        self.get(ZonePair::new(a, b))
    }

    pub fn pairs(&self) -> impl Iterator<Item = ZonePair> + '_ {
        self.borders.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZonePair, &[Border])> + '_ {
        self.borders.iter().map(|(pair, b)| (*pair, b.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.borders.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.borders.len()
    }

    pub fn border_count(&self) -> usize {
        self.borders.values().map(|b| b.len()).sum()
    }

    pub fn segment_count(&self) -> usize {
        self.borders.values().flatten().map(|b| b.len()).sum()
    }
}

/// Collect every boundary edge of the grid.
pub fn boundary_edges<G: ZoneGrid + ?Sized>(grid: &G) -> Result<BTreeSet<Edge>, TraceError> {
    let mut edges = BTreeSet::new();
    let (width, height) = (grid.width() as i32, grid.height() as i32);

    for y in 0..height {
        for x in 0..width {
            let here = GridPos::new(x, y);
            let zone = zone_of(grid, here)?;
            if x + 1 < width && zone != zone_of(grid, GridPos::new(x + 1, y))? {
                edges.insert(Edge::new(here, Orientation::Horizontal));
            }
            if y + 1 < height && zone != zone_of(grid, GridPos::new(x, y + 1))? {
                edges.insert(Edge::new(here, Orientation::Vertical));
            }
        }
    }

    Ok(edges)
}

/// Trace all borders of a fully populated zone grid.
pub fn trace_borders<G: ZoneGrid + ?Sized>(grid: &G) -> Result<ZoneBorders, TraceError> {
    let mut free = boundary_edges(grid)?;
    let edge_count = free.len();
    let mut result = ZoneBorders::default();

    while let Some(edge) = free.pop_first() {
        let seed = Segment::from(edge);
        let zones = sides(grid, &seed).ok_or(TraceError::OutsideGrid(edge))?;

        let forward = grow(grid, &mut free, seed, zones, Segment::next_candidates);
        let backward = grow(grid, &mut free, seed, zones, Segment::prev_candidates);

        let mut segments = Vec::with_capacity(backward.len() + 1 + forward.len());
        segments.extend(backward.into_iter().rev());
        segments.push(seed);
        segments.extend(forward);

        let border = Border::from_traced(zones.0, zones.1, segments);
        result.borders.entry(border.pair()).or_default().push(border);
    }

    log::debug!(
        "traced {} borders over {} zone pairs from {} boundary edges",
        result.border_count(),
        result.pair_count(),
        edge_count
    );

    Ok(result)
}

/// Walk away from `seed` one step at a time, claiming free edges that separate
/// exactly `zones` in the same left/right order.
fn grow<G: ZoneGrid + ?Sized>(
    grid: &G,
    free: &mut BTreeSet<Edge>,
    seed: Segment,
    zones: (ZoneId, ZoneId),
    candidates: fn(&Segment) -> [Segment; 3],
) -> Vec<Segment> {
    let mut run = Vec::new();
    let mut current = seed;

    while let Some(next) = candidates(&current)
        .into_iter()
        .find(|c| free.contains(&Edge::from(*c)) && sides(grid, c) == Some(zones))
    {
        free.remove(&Edge::from(next));
        run.push(next);
        current = next;
    }

    run
}

fn sides<G: ZoneGrid + ?Sized>(grid: &G, segment: &Segment) -> Option<(ZoneId, ZoneId)> {
    Some((grid.zone_at(segment.left_cell())?, grid.zone_at(segment.right_cell())?))
}

fn zone_of<G: ZoneGrid + ?Sized>(grid: &G, pos: GridPos) -> Result<ZoneId, TraceError> {
    match grid.zone_at(pos) {
        Some(zone) if !zone.is_none() => Ok(zone),
        _ => Err(TraceError::EmptyCell(pos)),
    }
}
