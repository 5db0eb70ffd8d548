//! Pass planning
//!
//! A full layout splits a border's segments `0..N` into consecutive non-empty
//! runs that alternate between wall and pass:
//!
//! - a wall `[i, r)` has length `r - i` within `[min_wall_length, max_wall_length]`,
//!   except that walls touching either end of the chain only need one segment;
//! - a pass `[i, j)` must end at `next_pass_index(i, w)` for some width offset `w`,
//!   i.e. at the furthest segment giving an opening of exactly
//!   `min_pass_width + w`.
//!
//! [`PassPlan`] precomputes those pass ends and, in a single backward sweep, the
//! number of complete layouts of every suffix. The counts are what make
//! sampling in [`super::sample`] uniform over whole layouts.

use std::fmt::{self, Write as _};
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chain::{Border, BorderError};

/// Binary exponent step used to keep [`Combinations`] mantissas in range.
const RESCALE_BITS: i32 = 512;

/// A layout count, stored as `value * 2^shift`.
///
/// Counts below 2^53 are exact. Beyond that only relative precision is kept,
/// which is all the sampler needs, and the exponent never overflows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Combinations {
    value: f64,
    shift: i64,
}

impl Combinations {
    pub const ZERO: Self = Self { value: 0.0, shift: 0 };
    pub const ONE: Self = Self { value: 1.0, shift: 0 };

    pub fn from_f64(value: f64) -> Self {
        Self { value, shift: 0 }.normalized()
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    /// Plain `f64` value; infinite once the count passes `f64::MAX`.
    pub fn to_f64(&self) -> f64 {
        if self.shift >= f64::MAX_EXP as i64 {
            return if self.is_zero() { 0.0 } else { f64::INFINITY };
        }
        self.value * 2f64.powi(self.shift as i32)
    }

    /// Base-2 logarithm of the count; negative infinity for zero.
    pub fn log2(&self) -> f64 {
        self.value.log2() + self.shift as f64
    }

    /// Mantissa expressed at a shift no smaller than `self.shift`.
    fn value_at(&self, shift: i64) -> f64 {
        let diff = shift - self.shift;
        if diff > 2 * f64::MAX_EXP as i64 {
            0.0
        } else {
            self.value * 2f64.powi(-(diff as i32))
        }
    }

    fn normalized(mut self) -> Self {
        let limit = 2f64.powi(RESCALE_BITS);
        while self.value.is_finite() && self.value >= limit {
            self.value *= 2f64.powi(-RESCALE_BITS);
            self.shift += RESCALE_BITS as i64;
        }
        self
    }

    /// Weights proportional to `counts`, scaled relative to the largest one so
    /// they fit an `f64`.
    pub fn relative_weights(counts: &[Combinations]) -> Vec<f64> {
        let top = counts
            .iter()
            .filter(|c| !c.is_zero())
            .map(|c| c.shift)
            .max()
            .unwrap_or(0);
        counts
            .iter()
            .map(|c| if c.is_zero() { 0.0 } else { c.value_at(top) })
            .collect()
    }
}

impl Add for Combinations {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        if self.is_zero() {
            return other;
        }
        if other.is_zero() {
            return self;
        }
        let (hi, lo) = if self.shift >= other.shift { (self, other) } else { (other, self) };
        Self {
            value: hi.value + lo.value_at(hi.shift),
            shift: hi.shift,
        }
        .normalized()
    }
}

impl Sum for Combinations {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Combinations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = self.to_f64();
        if plain.is_finite() {
            fmt::Display::fmt(&plain, f)
        } else {
            f.pad(&format!("2^{:.1}", self.log2()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("max_pass_width ({max}) is smaller than min_pass_width ({min})")]
    InvalidPassWidths { min: usize, max: usize },
    #[error("max_wall_length ({max}) is smaller than min_wall_length ({min})")]
    InvalidWallLengths { min: usize, max: usize },
    #[error("layout count overflowed at segment {index}")]
    CountOverflow { index: usize },
    #[error("segment index {index} out of range for border of {len} segments")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Border(#[from] BorderError),
}

/// Width and length policy for passes along one border.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PassParams {
    /// Narrowest opening, in Manhattan distance
    pub min_pass_width: usize,
    /// Widest opening, in Manhattan distance
    pub max_pass_width: usize,
    /// Shortest wall between two passes, in segments
    pub min_wall_length: usize,
    /// Longest uninterrupted wall, in segments
    pub max_wall_length: usize,
}

impl Default for PassParams {
    fn default() -> Self {
        Self {
            min_pass_width: 1,
            max_pass_width: 2,
            min_wall_length: 3,
            max_wall_length: 12,
        }
    }
}

impl PassParams {
    pub fn new(min_pass_width: usize, max_pass_width: usize, min_wall_length: usize, max_wall_length: usize) -> Self {
        Self {
            min_pass_width,
            max_pass_width,
            min_wall_length,
            max_wall_length,
        }
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.max_pass_width < self.min_pass_width {
            return Err(PlanError::InvalidPassWidths {
                min: self.min_pass_width,
                max: self.max_pass_width,
            });
        }
        if self.max_wall_length < self.min_wall_length {
            return Err(PlanError::InvalidWallLengths {
                min: self.min_wall_length,
                max: self.max_wall_length,
            });
        }
        Ok(())
    }

    /// Number of distinct pass widths, saturating at `usize::MAX`. Zero when
    /// the widths are inverted.
    pub fn width_count(&self) -> usize {
        if self.max_pass_width < self.min_pass_width {
            return 0;
        }
        (self.max_pass_width - self.min_pass_width).saturating_add(1)
    }
}

/// A candidate opening covering segments `first_index..second_index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PossiblePass {
    pub first_index: usize,
    pub second_index: usize,
    pub width: usize,
}

/// Lookup tables for one border under one [`PassParams`].
#[derive(Clone, Debug, PartialEq)]
pub struct PassPlan {
    params: PassParams,
    len: usize,
    /// `next_pass[i][w]`: furthest end of a pass starting at `i` with width
    /// `min_pass_width + w`. Rows only cover widths up to the border length.
    next_pass: Vec<Vec<Option<usize>>>,
    wall_starting: Vec<Combinations>,
    pass_starting: Vec<Combinations>,
}

impl PassPlan {
    /// Validate `params`, then build the pass table and layout counts.
    pub fn new(border: &Border, params: PassParams) -> Result<Self, PlanError> {
        params.validate()?;

        let mut plan = Self {
            params,
            len: border.len(),
            next_pass: Vec::new(),
            wall_starting: Vec::new(),
            pass_starting: Vec::new(),
        };
        plan.init_pass_index(border)?;
        plan.init_combinations()?;

        log::trace!("{}", plan.dump());
        Ok(plan)
    }

    fn init_pass_index(&mut self, border: &Border) -> Result<(), PlanError> {
        let n = self.len;
        let min_width = self.params.min_pass_width;
        // An opening over k segments is at most k wide.
        let max_width = self.params.max_pass_width.min(n);
        let widths = if max_width < min_width { 0 } else { max_width - min_width + 1 };

        self.next_pass = vec![vec![None; widths]; n];
        for i in 0..n {
            for j in (i + 1)..=n {
                let width = border.opening_width(i, j)?;
                if width < min_width || width > max_width {
                    continue;
                }
                // j only grows, so the last hit per width is the furthest.
                self.next_pass[i][width - min_width] = Some(j);
            }
        }
        Ok(())
    }

    fn init_combinations(&mut self) -> Result<(), PlanError> {
        let n = self.len;
        self.wall_starting = vec![Combinations::ZERO; n];
        self.pass_starting = vec![Combinations::ZERO; n];

        for i in (0..n).rev() {
            let walls: Combinations = self.wall_ends(i).map(|r| self.after_wall(r)).sum();
            let passes: Combinations = self.next_pass[i]
                .iter()
                .flatten()
                .map(|&j| self.after_pass(j))
                .sum();

            if !walls.is_finite() || !passes.is_finite() || !(walls + passes).is_finite() {
                return Err(PlanError::CountOverflow { index: i });
            }
            self.wall_starting[i] = walls;
            self.pass_starting[i] = passes;
        }
        Ok(())
    }

    /// Legal ends `r` of a wall starting at `i`. Walls touching either end of
    /// the chain may be shorter than `min_wall_length`.
    pub(crate) fn wall_ends(&self, i: usize) -> impl Iterator<Item = usize> {
        let n = self.len;
        let min_len = self.params.min_wall_length;
        let highest = i.saturating_add(self.params.max_wall_length).min(n);
        ((i + 1)..=highest).filter(move |&r| i == 0 || r == n || r - i >= min_len)
    }

    /// Completions once a wall ends at `r`: the chain is done, or a pass starts.
    pub(crate) fn after_wall(&self, r: usize) -> Combinations {
        if r == self.len {
            Combinations::ONE
        } else {
            self.pass_starting[r]
        }
    }

    /// Completions once a pass ends at `j`: the chain is done, or a wall starts.
    pub(crate) fn after_pass(&self, j: usize) -> Combinations {
        if j == self.len {
            Combinations::ONE
        } else {
            self.wall_starting[j]
        }
    }

    pub fn params(&self) -> &PassParams {
        &self.params
    }

    /// Number of segments of the planned border.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check_index(&self, index: usize) -> Result<(), PlanError> {
        if index < self.len {
            Ok(())
        } else {
            Err(PlanError::IndexOutOfRange { index, len: self.len })
        }
    }

    pub fn next_pass_index(&self, index: usize, width_offset: usize) -> Result<Option<usize>, PlanError> {
        self.check_index(index)?;
        Ok(self.next_pass[index].get(width_offset).copied().flatten())
    }

    /// Layouts of the suffix starting at `index` that begin with a wall.
    pub fn wall_starting_combs(&self, index: usize) -> Result<Combinations, PlanError> {
        self.check_index(index)?;
        Ok(self.wall_starting[index])
    }

    /// Layouts of the suffix starting at `index` that begin with a pass.
    pub fn pass_starting_combs(&self, index: usize) -> Result<Combinations, PlanError> {
        self.check_index(index)?;
        Ok(self.pass_starting[index])
    }

    pub fn any_starting_combs(&self, index: usize) -> Result<Combinations, PlanError> {
        Ok(self.wall_starting_combs(index)? + self.pass_starting_combs(index)?)
    }

    /// Number of distinct full layouts of the whole border.
    pub fn layout_count(&self) -> Combinations {
        if self.len == 0 {
            return Combinations::ZERO;
        }
        self.wall_starting[0] + self.pass_starting[0]
    }

    pub fn is_feasible(&self) -> bool {
        !self.layout_count().is_zero()
    }

    /// Every pass that can start at `index`, narrowest first.
    pub fn possible_passes(&self, index: usize) -> Result<Vec<PossiblePass>, PlanError> {
        self.check_index(index)?;
        Ok(self.next_pass[index]
            .iter()
            .enumerate()
            .filter_map(|(w, end)| {
                end.map(|second_index| PossiblePass {
                    first_index: index,
                    second_index,
                    width: self.params.min_pass_width + w,
                })
            })
            .collect())
    }

    /// Tabular dump of the pass index and layout counts.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "pass plan for {} segments ({:?})", self.len, self.params);
        let _ = write!(out, "wall starting: [");
        for c in &self.wall_starting {
            let _ = write!(out, "{:>4}", c);
        }
        let _ = writeln!(out, "]");
        let _ = write!(out, "pass starting: [");
        for c in &self.pass_starting {
            let _ = write!(out, "{:>4}", c);
        }
        let _ = writeln!(out, "]");
        let widths = self.next_pass.first().map_or(0, |row| row.len());
        for w in 0..widths {
            let _ = write!(out, "width {:>2}:     [", self.params.min_pass_width + w);
            for row in &self.next_pass {
                match row[w] {
                    Some(j) => {
                        let _ = write!(out, "{:>4}", j);
                    }
                    None => {
                        let _ = write!(out, "{:>4}", "-");
                    }
                }
            }
            let _ = writeln!(out, "]");
        }
        out
    }
}
