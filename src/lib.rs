//! Zone border tracing and pass layout
//!
//! Traces the borders between labelled zones of a tile grid, then lays out
//! walls and passes along each border, drawing every complete layout with
//! equal probability.

pub mod ascii;
pub mod border;
pub mod config;
pub mod export;
pub mod layout;
pub mod seeds;
pub mod tilemap;
pub mod zones;
