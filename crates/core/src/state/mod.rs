//! Run state for the active pipeline run.
//!
//! This module provides:
//! - The run state machine driven by progress events
//! - Payload preview rules for stage input/output
//! - The renderable result of a finished run

pub mod preview;
pub mod result;
pub mod run;

pub use preview::Preview;
pub use result::RunResult;
pub use run::{RunState, StageView};
