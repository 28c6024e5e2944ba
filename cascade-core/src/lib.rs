//! Cascade Core
//!
//! This crate provides a change-detection layer for unidirectional state
//! stores. Callers declare "when this projection of the state changes,
//! dispatch that action", and the layer takes care of snapshotting,
//! diffing and redispatching around every action the store processes.
//!
//! It implements:
//!
//! - Dependency declarations (selector plus reaction)
//! - Per-action change triggers
//! - A re-entrant dispatch controller with a bounded causality stack
//! - A small reference store to host the controller
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `watch`: dependency registry, reactions and change triggers
//! - `dispatch`: the controller, its causality stack and configuration
//! - `store`: reducer-driven host store with effect stages
//! - `error`: dispatch and configuration errors
//!
//! # Example
//!
//! ```rust,ignore
//! use cascade_core::store::Store;
//!
//! let store = Store::new(State::default(), reduce);
//!
//! // Keep a label in sync with the counter
//! store
//!     .when_changed(|s: &State| s.counter)
//!     .then_dispatch_with(|cx| Some(Action::Label(format!("Counter {}", cx.selected))));
//!
//! store.dispatch(Action::Inc(2))?;
//! // The reducer has now seen Inc(2) followed by Label("Counter 2")
//! ```

pub mod dispatch;
pub mod error;
pub mod store;
pub mod watch;

pub use dispatch::{ChangeController, ControllerOptions, ControllerSettings, Pipeline};
pub use error::{CausalityDepthExceeded, ConfigError, DispatchResult};
pub use store::Store;
pub use watch::{DependencyId, Identity, Reaction, ReactionContext};
