use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::ascii::opened_edges;
use crate::border::{Edge, Orientation, Run, Segment, ZoneBorders};
use crate::layout::LayoutReport;
use crate::tilemap::Tilemap;
use crate::zones::ZoneId;

/// Serializable snapshot of a traced and laid out map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutExport {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub zones: Vec<ZoneEntry>,
    pub borders: Vec<BorderEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneEntry {
    pub id: ZoneId,
    pub symbol: char,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorderEntry {
    pub left: ZoneId,
    pub right: ZoneId,
    pub index: usize,
    pub segments: Vec<Segment>,
    /// Omitted once the count no longer fits an `f64`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_count_log2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<Run>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayoutExport {
    pub fn build(
        grid: &Tilemap<ZoneId>,
        legend: &BTreeMap<ZoneId, char>,
        borders: &ZoneBorders,
        report: Option<&LayoutReport>,
        seed: u64,
    ) -> Self {
        let zones = legend.iter().map(|(&id, &symbol)| ZoneEntry { id, symbol }).collect();

        let mut entries = Vec::with_capacity(borders.border_count());
        for (pair, list) in borders.iter() {
            for (index, border) in list.iter().enumerate() {
                let outcome = report.and_then(|r| r.get(pair, index));
                entries.push(BorderEntry {
                    left: border.left_zone(),
                    right: border.right_zone(),
                    index,
                    segments: border.segments().to_vec(),
                    layout_count: outcome.map(|o| o.layout_count.to_f64()).filter(|c| c.is_finite()),
                    layout_count_log2: outcome
                        .map(|o| o.layout_count.log2())
                        .filter(|l| l.is_finite()),
                    runs: outcome.and_then(|o| o.result.as_ref().ok()).map(|l| l.runs.clone()),
                    error: outcome.and_then(|o| o.result.as_ref().err()).map(|e| e.to_string()),
                });
            }
        }

        Self {
            seed,
            width: grid.width,
            height: grid.height,
            zones,
            borders: entries,
        }
    }
}

/// Write a layout snapshot as pretty-printed JSON.
pub fn export_layout_json(export: &LayoutExport, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, export)?;
    writer.flush()
}

const ZONE_PALETTE: [[u8; 3]; 12] = [
    [141, 211, 199],
    [255, 255, 179],
    [190, 186, 218],
    [251, 128, 114],
    [128, 177, 211],
    [253, 180, 98],
    [179, 222, 105],
    [252, 205, 229],
    [217, 217, 217],
    [188, 128, 189],
    [204, 235, 197],
    [255, 237, 111],
];

const WALL_COLOR: [u8; 3] = [20, 20, 20];
const PASS_COLOR: [u8; 3] = [255, 255, 255];

pub fn zone_color(zone: ZoneId) -> [u8; 3] {
    if zone.is_none() {
        [0, 0, 0]
    } else {
        ZONE_PALETTE[zone.0 as usize % ZONE_PALETTE.len()]
    }
}

/// Render zones as `scale`-sized blocks with walls and passes drawn along the
/// cell boundaries.
pub fn render_layout_image(
    grid: &Tilemap<ZoneId>,
    borders: &ZoneBorders,
    report: Option<&LayoutReport>,
    scale: u32,
) -> RgbImage {
    let scale = scale.max(1);
    let mut img: RgbImage = ImageBuffer::new(grid.width as u32 * scale, grid.height as u32 * scale);

    for (x, y, &zone) in grid.iter() {
        let color = Rgb(zone_color(zone));
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(x as u32 * scale + dx, y as u32 * scale + dy, color);
            }
        }
    }

    let open: HashSet<Edge> = report.map(|r| opened_edges(borders, r)).unwrap_or_default();
    for (_, list) in borders.iter() {
        for seg in list.iter().flat_map(|b| b.segments()) {
            let edge = Edge::from(*seg);
            let color = if open.contains(&edge) { PASS_COLOR } else { WALL_COLOR };
            draw_edge(&mut img, edge, scale, Rgb(color));
        }
    }

    img
}

fn draw_edge(img: &mut RgbImage, edge: Edge, scale: u32, color: Rgb<u8>) {
    let cell = edge.top_left_cell();
    let (cx, cy) = (cell.x as u32 * scale, cell.y as u32 * scale);
    for t in 0..scale {
        let (px, py) = match edge.orientation {
            Orientation::Horizontal => (cx + scale, cy + t),
            Orientation::Vertical => (cx + t, cy + scale),
        };
        // The shared boundary sits on the first pixel row/column of the second cell.
        if px < img.width() && py < img.height() {
            img.put_pixel(px, py, color);
        }
    }
}

/// Export the zone map with its walls and passes as a PNG.
pub fn export_layout_png(
    grid: &Tilemap<ZoneId>,
    borders: &ZoneBorders,
    report: Option<&LayoutReport>,
    scale: u32,
    path: &Path,
) -> Result<(), image::ImageError> {
    render_layout_image(grid, borders, report, scale).save(path)
}
