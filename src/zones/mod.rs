pub mod graph;
pub mod types;

pub use graph::{Connection, ZoneGraph};
pub use types::{parse_zone_map, MapParseError, ZoneId, ZonePair};
