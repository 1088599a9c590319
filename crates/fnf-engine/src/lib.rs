//! Decision core: per-snapshot hit-window evaluation and hold-note tracking.

pub mod hold;
pub mod judge;

pub use hold::{HoldState, HoldTracker};
pub use judge::{ActionSet, Judge, JudgeConfig, LaneAction};
