//! The two-dimensional merge grid: cell provenance, rectangular sub-views,
//! merge identity/configuration, and ref-namespace persistence.

mod cell;
mod grid;
pub mod persist;
mod state;

pub use cell::{MergeRecord, Source};
pub use grid::{Grid, SubBlock};
pub use persist::GridError;
pub use state::{Goal, GoalOpts, MergeState};

pub use imerge_vcs::Oid;
