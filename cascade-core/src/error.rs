//! Error types.
//!
//! Dispatch has exactly one failure mode: the causality stack grew past the
//! configured limit. Everything else a dispatch can do wrong (a selector or
//! reaction panicking) belongs to the code that registered it and unwinds
//! through the controller untouched.

use thiserror::Error;

/// The chain of in-flight actions grew past the configured maximum depth.
///
/// `chain` lists the actions that were being processed when the limit was
/// hit, outermost first. For a feedback loop this is the loop itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "max causality depth {max_depth} exceeded by a chain of {} actions: {chain:?}",
    .chain.len()
)]
pub struct CausalityDepthExceeded<A> {
    /// In-flight actions, outermost first.
    pub chain: Vec<A>,
    /// The configured limit.
    pub max_depth: usize,
}

/// Result of a dispatch through the controller.
pub type DispatchResult<T, A> = Result<T, CausalityDepthExceeded<A>>;

/// Invalid controller configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_depth must be at least 1")]
    ZeroMaxDepth,

    #[error("failed to parse controller settings: {0}")]
    Parse(#[from] serde_json::Error),
}
