//! State Watching
//!
//! This module holds the declarative half of the system: which projections
//! of state are watched and what each one reacts with.
//!
//! # Concepts
//!
//! ## Dependencies
//!
//! A dependency pairs a selector, a pure function from state to some
//! comparable projection, with a reaction: either a fixed action or a
//! factory that builds one from the new projection, the new state and the
//! action that caused the change.
//!
//! ## Triggers
//!
//! Before an action is processed, every dependency is snapshotted into a
//! trigger holding the projection's current value. After the action has run,
//! each trigger re-selects and compares. Comparison is `PartialEq` on the
//! projection type; wrap shared values in [`Identity`] to compare by pointer.

mod dependency;
mod registry;
mod trigger;

pub use dependency::{DependencyId, Identity, Reaction, ReactionContext, ReactionFn};
pub use registry::{DependencyRegistry, Registration};
pub use trigger::{Trigger, TriggerSet};
