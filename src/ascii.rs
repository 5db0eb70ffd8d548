//! ASCII rendering and export of zone maps and pass layouts
//!
//! The layout view doubles the resolution so that cell boundaries get their
//! own characters: zone characters sit in cells, `|` and `-` mark walls, `.`
//! marks segments opened by a pass and `+` marks border vertices.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;

use crate::border::{Direction, Edge, GridPos, Segment, ZoneBorders};
use crate::layout::LayoutReport;
use crate::tilemap::Tilemap;
use crate::zones::ZoneId;

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AsciiMode {
    /// One character per cell
    Zones,
    /// Double resolution with walls and passes
    Layout,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Zones => "Zones",
            AsciiMode::Layout => "Layout",
        }
    }

    pub fn all() -> &'static [AsciiMode] {
        &[AsciiMode::Zones, AsciiMode::Layout]
    }
}

pub fn zone_char(zone: ZoneId, legend: &BTreeMap<ZoneId, char>) -> char {
    if zone.is_none() {
        ' '
    } else {
        legend.get(&zone).copied().unwrap_or('?')
    }
}

/// Edges opened by any successful layout in `report`.
pub fn opened_edges(borders: &ZoneBorders, report: &LayoutReport) -> HashSet<Edge> {
    let mut open = HashSet::new();
    for (b, layout) in report.successes() {
        let Some(border) = borders.get(b.pair).ok().and_then(|list| list.get(b.index)) else {
            continue;
        };
        for (k, seg) in border.segments().iter().enumerate() {
            if layout.is_open(k) {
                open.insert(Edge::from(*seg));
            }
        }
    }
    open
}

pub fn render_ascii_map(
    grid: &Tilemap<ZoneId>,
    legend: &BTreeMap<ZoneId, char>,
    borders: &ZoneBorders,
    report: Option<&LayoutReport>,
    mode: AsciiMode,
) -> String {
    match mode {
        AsciiMode::Zones => render_zones(grid, legend),
        AsciiMode::Layout => render_layout(grid, legend, borders, report),
    }
}

fn render_zones(grid: &Tilemap<ZoneId>, legend: &BTreeMap<ZoneId, char>) -> String {
    let mut result = String::with_capacity((grid.width + 1) * grid.height);
    for y in 0..grid.height {
        for x in 0..grid.width {
            result.push(zone_char(*grid.get(x, y), legend));
        }
        result.push('\n');
    }
    result
}

fn render_layout(
    grid: &Tilemap<ZoneId>,
    legend: &BTreeMap<ZoneId, char>,
    borders: &ZoneBorders,
    report: Option<&LayoutReport>,
) -> String {
    let (w, h) = (grid.width, grid.height);
    let mut canvas = Tilemap::new_with(2 * w + 1, 2 * h + 1, ' ');

    for (x, y, &zone) in grid.iter() {
        let ch = zone_char(zone, legend);
        canvas.set(2 * x + 1, 2 * y + 1, ch);
        if x + 1 < w && *grid.get(x + 1, y) == zone {
            canvas.set(2 * x + 2, 2 * y + 1, ch);
        }
        if y + 1 < h && *grid.get(x, y + 1) == zone {
            canvas.set(2 * x + 1, 2 * y + 2, ch);
        }
        if x + 1 < w
            && y + 1 < h
            && *grid.get(x + 1, y) == zone
            && *grid.get(x, y + 1) == zone
            && *grid.get(x + 1, y + 1) == zone
        {
            canvas.set(2 * x + 2, 2 * y + 2, ch);
        }
    }

    let open = report.map(|r| opened_edges(borders, r)).unwrap_or_default();
    for (_, list) in borders.iter() {
        for seg in list.iter().flat_map(|b| b.segments()) {
            let ch = if open.contains(&Edge::from(*seg)) {
                '.'
            } else {
                match seg.direction {
                    Direction::Up | Direction::Down => '|',
                    Direction::Left | Direction::Right => '-',
                }
            };
            put(&mut canvas, midpoint(seg), ch);
            put(&mut canvas, seg.start + seg.start, '+');
            put(&mut canvas, seg.end() + seg.end(), '+');
        }
    }

    let mut result = String::with_capacity((canvas.width + 1) * canvas.height);
    for y in 0..canvas.height {
        for x in 0..canvas.width {
            result.push(*canvas.get(x, y));
        }
        result.push('\n');
    }
    result
}

/// Canvas position of a segment's middle.
fn midpoint(seg: &Segment) -> GridPos {
    seg.start + seg.start + seg.direction.offset()
}

fn put(canvas: &mut Tilemap<char>, pos: GridPos, ch: char) {
    if canvas.in_bounds(pos) {
        canvas.set(pos.x as usize, pos.y as usize, ch);
    }
}

/// Export the zone map and its pass layout to a text file.
pub fn export_layout_file(
    grid: &Tilemap<ZoneId>,
    legend: &BTreeMap<ZoneId, char>,
    borders: &ZoneBorders,
    report: Option<&LayoutReport>,
    seed: u64,
    path: &Path,
) -> io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "=== ZONE BORDER LAYOUT ===")?;
    writeln!(file, "Seed: {}", seed)?;
    writeln!(file, "Size: {}x{}", grid.width, grid.height)?;
    writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file)?;

    for &mode in AsciiMode::all() {
        writeln!(file, "=== MAP ({} View) ===", mode.name())?;
        write!(file, "{}", render_ascii_map(grid, legend, borders, report, mode))?;
        writeln!(file)?;
    }

    writeln!(file, "=== BORDERS ===")?;
    for (pair, list) in borders.iter() {
        let segments: usize = list.iter().map(|b| b.len()).sum();
        write!(
            file,
            "  {}-{}: {} border(s), {} segments",
            zone_char(pair.low(), legend),
            zone_char(pair.high(), legend),
            list.len(),
            segments
        )?;
        if let Some(report) = report {
            let passes: usize = report
                .successes()
                .filter(|(b, _)| b.pair == pair)
                .map(|(_, layout)| layout.passes().count())
                .sum();
            let failed = report.failures().filter(|(b, _)| b.pair == pair).count();
            write!(file, ", {} passes", passes)?;
            if failed > 0 {
                write!(file, ", {} failed", failed)?;
            }
        }
        writeln!(file)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::{trace_borders, Combinations, PassLayout, PassParams, Run, RunKind};
    use crate::layout::BorderLayout;
    use crate::zones::{parse_zone_map, ZonePair};

    #[test]
    fn test_zones_view() {
        let (grid, legend) = parse_zone_map("AB\nCB").unwrap();
        let borders = trace_borders(&grid).unwrap();
        assert_eq!(render_ascii_map(&grid, &legend, &borders, None, AsciiMode::Zones), "AB\nCB\n");
    }

    #[test]
    fn test_layout_view_draws_walls() {
        let (grid, legend) = parse_zone_map("AABBB").unwrap();
        let borders = trace_borders(&grid).unwrap();
        let text = render_ascii_map(&grid, &legend, &borders, None, AsciiMode::Layout);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["    +      ", " AAA|BBBBB ", "    +      "]);
    }

    #[test]
    fn test_layout_view_marks_passes() {
        let (grid, legend) = parse_zone_map("AABBB").unwrap();
        let borders = trace_borders(&grid).unwrap();
        let pair = ZonePair::new(ZoneId(0), ZoneId(1));
        let report = LayoutReport {
            borders: vec![BorderLayout {
                pair,
                index: 0,
                seed: 0,
                params: PassParams::new(1, 1, 1, 1),
                layout_count: Combinations::from_f64(2.0),
                result: Ok(PassLayout {
                    runs: vec![Run {
                        kind: RunKind::Pass { width: 1 },
                        start: 0,
                        end: 1,
                    }],
                    opened: vec![true],
                }),
            }],
            ..LayoutReport::default()
        };

        let text = render_ascii_map(&grid, &legend, &borders, Some(&report), AsciiMode::Layout);
        assert_eq!(text.lines().nth(1), Some(" AAA.BBBBB "));
        assert_eq!(opened_edges(&borders, &report).len(), 1);
    }

    #[test]
    fn test_horizontal_border_uses_dashes() {
        let (grid, legend) = parse_zone_map("AA\nBB").unwrap();
        let borders = trace_borders(&grid).unwrap();
        let text = render_ascii_map(&grid, &legend, &borders, None, AsciiMode::Layout);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "+-+-+");
        assert_eq!(lines[1], " AAA ");
    }

    #[test]
    fn test_export_layout_file() {
        let (grid, legend) = parse_zone_map("AB\nAB").unwrap();
        let borders = trace_borders(&grid).unwrap();
        let tmp = std::env::temp_dir().join("zone_borders_test_layout.txt");

        export_layout_file(&grid, &legend, &borders, None, 42, &tmp).expect("export failed");
        let content = std::fs::read_to_string(&tmp).expect("read failed");
        assert!(content.contains("Seed: 42"));
        assert!(content.contains("A-B: 1 border(s), 2 segments"));
        let _ = std::fs::remove_file(&tmp);
    }
}
