//! Seed management for pass layout
//!
//! Every border draws from its own generator, seeded from the master seed and
//! the border's identity, so a layout does not depend on the order or thread
//! in which borders are processed.
//!
//! Derivation uses a fixed SplitMix64 mix rather than std's hasher, so a
//! saved seed keeps reproducing the same layouts across toolchains.

use crate::zones::ZonePair;

/// Seeds for one layout run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Root of all per-border pass sampling seeds
    pub passes: u64,
}

impl LayoutSeeds {
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            passes: derive_seed(master, "passes"),
        }
    }

    /// Seed for the `index`-th border between the zones of `pair`.
    pub fn border_seed(&self, pair: ZonePair, index: usize) -> u64 {
        derive_border_seed(self.passes, pair, index)
    }
}

impl Default for LayoutSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

impl std::fmt::Display for LayoutSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LayoutSeeds {{ master: {}, passes: {} }}", self.master, self.passes)
    }
}

/// SplitMix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn derive_seed(master: u64, system: &str) -> u64 {
    system.bytes().fold(mix(master), |h, b| mix(h ^ u64::from(b)))
}

/// Derive a per-border seed from a root seed, the zone pair and the border's
/// position in that pair's list.
pub fn derive_border_seed(root: u64, pair: ZonePair, index: usize) -> u64 {
    [u64::from(pair.low().0), u64::from(pair.high().0), index as u64]
        .into_iter()
        .fold(mix(root), |h, v| mix(h ^ v))
}
