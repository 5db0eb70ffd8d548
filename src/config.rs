//! JSON layout configuration.
//!
//! ```json
//! {
//!   "seed": 42,
//!   "default_pass": { "min_pass_width": 1, "max_pass_width": 2 },
//!   "connections": [
//!     { "a": "A", "b": "B", "pass": { "min_wall_length": 5 }, "blend_distance": 3 }
//!   ]
//! }
//! ```
//!
//! Zones are named by their character in the ASCII map.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::border::{PassParams, PlanError};
use crate::zones::{Connection, ZoneGraph, ZoneId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pass parameters for {context}: {source}")]
    Params { context: String, source: PlanError },
    #[error("zone '{0}' does not appear in the map")]
    UnknownZone(char),
}

/// Explicit connection between two map characters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub a: char,
    pub b: char,
    #[serde(default)]
    pub pass: PassParams,
    #[serde(default)]
    pub intake_distance: u32,
    #[serde(default)]
    pub blend_distance: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Master seed; random when absent
    pub seed: Option<u64>,
    /// Parameters for traced pairs without an explicit connection.
    /// `None` lays out only the listed connections.
    pub default_pass: Option<PassParams>,
    pub connections: Vec<ConnectionConfig>,
    pub parallel: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_pass: Some(PassParams::default()),
            connections: Vec::new(),
            parallel: true,
        }
    }
}

impl LayoutConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: LayoutConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(params) = &self.default_pass {
            params.validate().map_err(|source| ConfigError::Params {
                context: "default_pass".to_string(),
                source,
            })?;
        }
        for c in &self.connections {
            c.pass.validate().map_err(|source| ConfigError::Params {
                context: format!("connection {}-{}", c.a, c.b),
                source,
            })?;
        }
        Ok(())
    }

    /// Build the zone graph, resolving map characters through `legend`.
    pub fn zone_graph(&self, legend: &BTreeMap<ZoneId, char>) -> Result<ZoneGraph, ConfigError> {
        let ids: BTreeMap<char, ZoneId> = legend.iter().map(|(&id, &c)| (c, id)).collect();
        let lookup = |c: char| ids.get(&c).copied().ok_or(ConfigError::UnknownZone(c));

        let mut graph = ZoneGraph::new();
        graph.set_default(self.default_pass);
        for c in &self.connections {
            let connection = Connection {
                pass: c.pass,
                intake_distance: c.intake_distance,
                blend_distance: c.blend_distance,
            };
            graph.connect(lookup(c.a)?, lookup(c.b)?, connection);
        }
        Ok(graph)
    }
}
