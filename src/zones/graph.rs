use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::border::PassParams;

use super::types::{ZoneId, ZonePair};

/// How two adjacent zones are joined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    /// Pass widths and wall lengths along the shared borders
    pub pass: PassParams,
    /// How far one zone may reach into the other through a pass
    pub intake_distance: u32,
    /// Width of the blended transition band
    pub blend_distance: u32,
}

impl Connection {
    pub fn with_pass(pass: PassParams) -> Self {
        Self {
            pass,
            ..Self::default()
        }
    }
}

/// Zone adjacency graph with one [`Connection`] per connected pair.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneGraph {
    connections: BTreeMap<ZonePair, Connection>,
    default_pass: Option<PassParams>,
}

impl ZoneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph whose every pair falls back to `pass`.
    pub fn with_default(pass: PassParams) -> Self {
        Self {
            connections: BTreeMap::new(),
            default_pass: Some(pass),
        }
    }

    pub fn set_default(&mut self, pass: Option<PassParams>) {
        self.default_pass = pass;
    }

    pub fn default_pass(&self) -> Option<PassParams> {
        self.default_pass
    }

    /// Add or replace the connection between `a` and `b`.
    pub fn connect(&mut self, a: ZoneId, b: ZoneId, connection: Connection) -> Option<Connection> {
        self.connections.insert(ZonePair::new(a, b), connection)
    }

    pub fn connection(&self, pair: ZonePair) -> Option<&Connection> {
        self.connections.get(&pair)
    }

    /// Pass parameters for a pair: its own connection, else the graph default.
    pub fn pass_params(&self, pair: ZonePair) -> Option<PassParams> {
        self.connections.get(&pair).map(|c| c.pass).or(self.default_pass)
    }

    /// Zones explicitly connected to `zone`.
    pub fn neighbours(&self, zone: ZoneId) -> BTreeSet<ZoneId> {
        self.connections.keys().filter_map(|pair| pair.other(zone)).collect()
    }

    /// Explicitly connected pairs.
    pub fn pairs(&self) -> impl Iterator<Item = ZonePair> + '_ {
        self.connections.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
