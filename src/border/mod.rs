pub mod chain;
pub mod geometry;
pub mod plan;
pub mod sample;
pub mod trace;

pub use chain::{Border, BorderError};
pub use geometry::{Direction, Edge, GeometryError, GridPos, Orientation, Segment};
pub use plan::{Combinations, PassParams, PassPlan, PlanError, PossiblePass};
pub use sample::{PassLayout, PassSampler, RandomSampler, Run, RunKind, SampleError, WeightedSampler};
pub use trace::{boundary_edges, trace_borders, LookupError, TraceError, ZoneBorders};
