//! Planning: neighbor-pair expansion and time-window splitting
//!
//! Both steps are pure — they touch neither the network nor storage — and
//! run to completion before any request is issued, so bad input aborts a run
//! with no side effects.

pub mod pairs;
pub mod windows;

pub use pairs::expand_directed_pairs;
pub use windows::{PlanError, WindowPlan};
