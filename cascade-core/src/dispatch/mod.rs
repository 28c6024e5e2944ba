//! Reactive Dispatch
//!
//! This module wraps a host store's dispatch path with change detection.
//!
//! The [`ChangeController`] is handed each action before the rest of the
//! pipeline sees it. It snapshots the watched projections, lets the
//! [`Pipeline`] run the action, diffs the projections and re-enters itself
//! with every derived action. A per-controller [`CausalityStack`] bounds the
//! recursion and names the culprit chain when a feedback loop runs away.
//!
//! Everything here is synchronous. Re-entry is plain recursion on the
//! caller's thread.

mod causality;
mod controller;
mod options;
mod pipeline;

pub use causality::CausalityStack;
pub use controller::ChangeController;
pub use options::{
    fail_on_overflow, log_overflow, ControllerOptions, ControllerSettings, OverflowHandler,
    OverflowPolicy, DEFAULT_MAX_DEPTH,
};
pub use pipeline::Pipeline;
