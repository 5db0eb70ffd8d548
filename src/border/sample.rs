//! Uniform sampling of wall/pass layouts
//!
//! Every local choice is weighted by the number of full layouts it leads to,
//! so each complete layout of a border is drawn with the same probability.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::plan::{Combinations, PassPlan, PlanError, PossiblePass};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("no layout can be completed from segment {index}")]
    Infeasible { index: usize },
    #[error("segment index {index} out of range for border of {len} segments")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("sampler returned an unusable choice at segment {index}")]
    SamplerRejected { index: usize },
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Source of weighted random choices.
pub trait WeightedSampler {
    /// Index `i` with probability `weights[i] / sum(weights)`, or `None` when no
    /// weight is positive.
    fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize>;
}

impl<S: WeightedSampler + ?Sized> WeightedSampler for &mut S {
    fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        (**self).pick_weighted(weights)
    }
}

/// [`WeightedSampler`] backed by any `rand` generator.
#[derive(Clone, Debug)]
pub struct RandomSampler<R> {
    rng: R,
}

impl<R: Rng> RandomSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> WeightedSampler for RandomSampler<R> {
    fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        // WeightedIndex panics on a non-finite total.
        if !weights.iter().all(|w| w.is_finite()) {
            return None;
        }
        let dist = WeightedIndex::new(weights).ok()?;
        Some(dist.sample(&mut self.rng))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunKind {
    Wall,
    Pass { width: usize },
}

/// One run of consecutive segments, `start..end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    #[serde(flatten)]
    pub kind: RunKind,
    pub start: usize,
    pub end: usize,
}

impl Run {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.kind, RunKind::Pass { .. })
    }
}

/// One complete layout of a border.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassLayout {
    pub runs: Vec<Run>,
    /// Per segment: covered by a pass.
    pub opened: Vec<bool>,
}

impl PassLayout {
    pub fn passes(&self) -> impl Iterator<Item = &Run> + '_ {
        self.runs.iter().filter(|r| r.is_pass())
    }

    pub fn walls(&self) -> impl Iterator<Item = &Run> + '_ {
        self.runs.iter().filter(|r| !r.is_pass())
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.opened.get(index).copied().unwrap_or(false)
    }
}

/// Draws layouts for one planned border.
pub struct PassSampler<'a, S> {
    plan: &'a PassPlan,
    sampler: S,
    opened: Vec<bool>,
}

impl<'a, S: WeightedSampler> PassSampler<'a, S> {
    pub fn new(plan: &'a PassPlan, sampler: S) -> Self {
        Self {
            plan,
            sampler,
            opened: vec![false; plan.len()],
        }
    }

    /// Segments marked by [`generate_pass`](Self::generate_pass) so far.
    pub fn opened(&self) -> &[bool] {
        &self.opened
    }

    pub fn into_sampler(self) -> S {
        self.sampler
    }

    fn check_index(&self, index: usize) -> Result<(), SampleError> {
        if index < self.plan.len() {
            Ok(())
        } else {
            Err(SampleError::IndexOutOfRange {
                index,
                len: self.plan.len(),
            })
        }
    }

    fn pick(&mut self, index: usize, weights: &[f64]) -> Result<usize, SampleError> {
        if !weights.iter().any(|&w| w > 0.0) {
            return Err(SampleError::Infeasible { index });
        }
        match self.sampler.pick_weighted(weights) {
            Some(choice) if weights.get(choice).is_some_and(|&w| w > 0.0) => Ok(choice),
            _ => Err(SampleError::SamplerRejected { index }),
        }
    }

    /// Draw the end of a wall starting at `index`.
    pub fn generate_wall(&mut self, index: usize) -> Result<usize, SampleError> {
        self.check_index(index)?;
        let ends: Vec<usize> = self.plan.wall_ends(index).collect();
        let counts: Vec<Combinations> = ends.iter().map(|&r| self.plan.after_wall(r)).collect();
        let weights = Combinations::relative_weights(&counts);
        let choice = self.pick(index, &weights)?;
        Ok(ends[choice])
    }

    fn draw_pass(&mut self, index: usize) -> Result<PossiblePass, SampleError> {
        self.check_index(index)?;
        let passes = self.plan.possible_passes(index)?;
        let counts: Vec<Combinations> = passes.iter().map(|p| self.plan.after_pass(p.second_index)).collect();
        let weights = Combinations::relative_weights(&counts);
        let pass = passes[self.pick(index, &weights)?];

        for open in &mut self.opened[pass.first_index..pass.second_index] {
            *open = true;
        }
        Ok(pass)
    }

    /// Draw a pass starting at `index`, mark its segments opened and return
    /// its end.
    pub fn generate_pass(&mut self, index: usize) -> Result<usize, SampleError> {
        self.draw_pass(index).map(|p| p.second_index)
    }

    /// Draw one complete layout, uniformly among all layouts of the border.
    pub fn generate_passes(&mut self) -> Result<PassLayout, SampleError> {
        let n = self.plan.len();
        self.opened = vec![false; n];
        if n == 0 {
            return Err(SampleError::Infeasible { index: 0 });
        }

        let first = Combinations::relative_weights(&[self.plan.wall_starting_combs(0)?, self.plan.pass_starting_combs(0)?]);
        let mut wall_turn = self.pick(0, &first)? == 0;

        let mut runs = Vec::new();
        let mut index = 0;
        while index < n {
            let run = if wall_turn {
                let end = self.generate_wall(index)?;
                Run {
                    kind: RunKind::Wall,
                    start: index,
                    end,
                }
            } else {
                let pass = self.draw_pass(index)?;
                Run {
                    kind: RunKind::Pass { width: pass.width },
                    start: index,
                    end: pass.second_index,
                }
            };
            debug_assert!(run.end > index);
            index = run.end;
            runs.push(run);
            wall_turn = !wall_turn;
        }

        log::trace!("sampled {} runs over {} segments", runs.len(), n);
        Ok(PassLayout {
            runs,
            opened: self.opened.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::chain::Border;
    use crate::border::geometry::{Direction, GridPos, Segment};
    use crate::border::plan::PassParams;
    use crate::zones::ZoneId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::{HashMap, VecDeque};

    fn straight(len: usize) -> Border {
        let segments = (0..len)
            .map(|i| Segment::new(GridPos::new(i as i32, 2), Direction::Right))
            .collect();
        Border::from_segments(ZoneId(0), ZoneId(1), segments).unwrap()
    }

    /// Replays a fixed list of choices.
    struct Scripted(VecDeque<usize>);

    impl WeightedSampler for Scripted {
        fn pick_weighted(&mut self, _weights: &[f64]) -> Option<usize> {
            self.0.pop_front()
        }
    }

    fn check_layout(border: &Border, params: &PassParams, layout: &PassLayout) {
        let n = border.len();
        assert_eq!(layout.runs.first().map(|r| r.start), Some(0));
        assert_eq!(layout.runs.last().map(|r| r.end), Some(n));
        assert_eq!(layout.runs.iter().map(|r| r.len()).sum::<usize>(), n);

        for pair in layout.runs.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_ne!(pair[0].is_pass(), pair[1].is_pass(), "two runs of one kind in a row");
        }
        for run in &layout.runs {
            assert!(!run.is_empty());
            match run.kind {
                RunKind::Wall => {
                    assert!(run.len() <= params.max_wall_length);
                    if run.start > 0 && run.end < n {
                        assert!(run.len() >= params.min_wall_length, "short inner wall {:?}", run);
                    }
                }
                RunKind::Pass { width } => {
                    assert!(width >= params.min_pass_width && width <= params.max_pass_width);
                    assert_eq!(border.opening_width(run.start, run.end).unwrap(), width);
                }
            }
        }
        for k in 0..n {
            let in_pass = layout.passes().any(|r| r.start <= k && k < r.end);
            assert_eq!(layout.is_open(k), in_pass);
        }
    }

    #[test]
    fn test_ten_segment_border_alternates() {
        let border = straight(10);
        let params = PassParams::new(1, 2, 2, 4);
        let plan = PassPlan::new(&border, params).unwrap();

        for seed in 0..200u64 {
            let mut sampler = PassSampler::new(&plan, RandomSampler::new(ChaCha8Rng::seed_from_u64(seed)));
            let layout = sampler.generate_passes().unwrap();
            check_layout(&border, &params, &layout);
            assert_eq!(sampler.opened(), layout.opened.as_slice());
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let border = straight(30);
        let plan = PassPlan::new(&border, PassParams::default()).unwrap();
        let draw = |seed| {
            PassSampler::new(&plan, RandomSampler::new(ChaCha8Rng::seed_from_u64(seed)))
                .generate_passes()
                .unwrap()
        };
        assert_eq!(draw(7), draw(7));
    }

    #[test]
    fn test_scripted_choices() {
        let border = straight(6);
        let params = PassParams::new(1, 2, 2, 3);
        let plan = PassPlan::new(&border, params).unwrap();

        // Wall first, wall ends at 1, pass of width 2, wall to the end.
        let script = Scripted(VecDeque::from(vec![0, 0, 1, 1]));
        let layout = PassSampler::new(&plan, script).generate_passes().unwrap();
        assert_eq!(
            layout.runs,
            vec![
                Run { kind: RunKind::Wall, start: 0, end: 1 },
                Run { kind: RunKind::Pass { width: 2 }, start: 1, end: 3 },
                Run { kind: RunKind::Wall, start: 3, end: 6 },
            ]
        );
        assert_eq!(layout.opened, vec![false, true, true, false, false, false]);
        check_layout(&border, &params, &layout);
    }

    #[test]
    fn test_generate_pass_marks_segments() {
        let border = straight(6);
        let plan = PassPlan::new(&border, PassParams::new(2, 2, 1, 6)).unwrap();
        let mut sampler = PassSampler::new(&plan, Scripted(VecDeque::from(vec![0])));

        assert_eq!(sampler.generate_pass(2).unwrap(), 4);
        assert_eq!(sampler.opened(), &[false, false, true, true, false, false]);
        assert_eq!(sampler.generate_wall(6), Err(SampleError::IndexOutOfRange { index: 6, len: 6 }));
    }

    #[test]
    fn test_infeasible_border_is_reported() {
        // No pass fits and walls cannot span the border.
        let border = straight(4);
        let plan = PassPlan::new(&border, PassParams::new(5, 5, 1, 2)).unwrap();
        let mut sampler = PassSampler::new(&plan, RandomSampler::new(ChaCha8Rng::seed_from_u64(1)));
        assert_eq!(sampler.generate_passes(), Err(SampleError::Infeasible { index: 0 }));
    }

    #[test]
    fn test_bad_sampler_choice_is_rejected() {
        let border = straight(4);
        let plan = PassPlan::new(&border, PassParams::new(1, 2, 1, 4)).unwrap();
        let mut sampler = PassSampler::new(&plan, Scripted(VecDeque::new()));
        assert_eq!(sampler.generate_passes(), Err(SampleError::SamplerRejected { index: 0 }));

        let mut sampler = PassSampler::new(&plan, Scripted(VecDeque::from(vec![9])));
        assert_eq!(sampler.generate_passes(), Err(SampleError::SamplerRejected { index: 0 }));
    }

    #[test]
    fn test_winding_borders_terminate() {
        let mut seg = Segment::new(GridPos::new(0, 0), Direction::Right);
        let mut segments = vec![seg];
        for t in "RLSSRRSLLSRSLRRS".chars() {
            seg = seg.move_forward();
            seg = match t {
                'L' => seg.turn_left(),
                'R' => seg.turn_right(),
                _ => seg,
            };
            segments.push(seg);
        }
        let border = Border::from_segments(ZoneId(0), ZoneId(1), segments).unwrap();
        let params = PassParams::new(1, 3, 1, 5);
        let plan = PassPlan::new(&border, params).unwrap();
        assert!(plan.is_feasible());

        let mut sampler = PassSampler::new(&plan, RandomSampler::new(ChaCha8Rng::seed_from_u64(99)));
        for _ in 0..100 {
            let layout = sampler.generate_passes().unwrap();
            check_layout(&border, &params, &layout);
            assert!(layout.runs.len() <= border.len());
        }
    }

    #[test]
    fn test_layouts_are_uniform() {
        let border = straight(6);
        let params = PassParams::new(1, 2, 1, 3);
        let plan = PassPlan::new(&border, params).unwrap();
        let categories = plan.layout_count().to_f64() as usize;
        assert!(categories > 5);

        let draws = 20_000usize;
        let mut sampler = PassSampler::new(&plan, RandomSampler::new(ChaCha8Rng::seed_from_u64(2024)));
        let mut seen: HashMap<Vec<Run>, usize> = HashMap::new();
        for _ in 0..draws {
            let layout = sampler.generate_passes().unwrap();
            *seen.entry(layout.runs).or_default() += 1;
        }
        assert_eq!(seen.len(), categories);

        let expected = draws as f64 / categories as f64;
        let chi2: f64 = seen
            .values()
            .map(|&observed| {
                let d = observed as f64 - expected;
                d * d / expected
            })
            .sum();
        let dof = (categories - 1) as f64;
        // Far above the 99.9th percentile for these degrees of freedom.
        let limit = dof + 6.0 * (2.0 * dof).sqrt() + 10.0;
        assert!(chi2 < limit, "chi2 {} over {} categories", chi2, categories);
    }

    #[test]
    fn test_long_borders_sample() {
        // Past 1024 segments the total no longer fits an f64.
        let params = PassParams::new(1, 12, 1, 12);
        for len in [1025, 5000] {
            let border = straight(len);
            let plan = PassPlan::new(&border, params).unwrap();
            assert_eq!(plan.layout_count().to_f64(), f64::INFINITY);

            let mut sampler = PassSampler::new(&plan, RandomSampler::new(ChaCha8Rng::seed_from_u64(5)));
            let layout = sampler.generate_passes().unwrap();
            check_layout(&border, &params, &layout);
            assert!(layout.passes().count() >= len / 24);
        }
    }

    #[test]
    fn test_random_sampler_refuses_infinite_weights() {
        let mut sampler = RandomSampler::new(ChaCha8Rng::seed_from_u64(1));
        assert_eq!(sampler.pick_weighted(&[f64::INFINITY, 1.0]), None);
        assert_eq!(sampler.pick_weighted(&[0.0, 0.0]), None);
        assert_eq!(sampler.pick_weighted(&[0.0, 2.0]), Some(1));
    }
}
