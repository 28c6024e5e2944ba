//! Controller configuration.
//!
//! Options are fixed when the controller is built. They can be assembled in
//! code with [`ControllerOptions`] or loaded from a JSON settings document
//! through [`ControllerSettings`].

use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{CausalityDepthExceeded, ConfigError, DispatchResult};

/// Default causality depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Called with the in-flight chain and the limit when the causality stack
/// overflows. Returning `Err` aborts the dispatch chain with that error;
/// returning `Ok(())` abandons the overflowing action and lets the caller
/// carry on.
pub type OverflowHandler<A> = Arc<dyn Fn(&[A], usize) -> DispatchResult<(), A> + Send + Sync>;

/// The default overflow handler: fail with [`CausalityDepthExceeded`].
pub fn fail_on_overflow<A: Clone>(chain: &[A], max_depth: usize) -> DispatchResult<(), A> {
    Err(CausalityDepthExceeded {
        chain: chain.to_vec(),
        max_depth,
    })
}

/// An overflow handler that logs the chain and keeps going.
pub fn log_overflow<A: Debug>(chain: &[A], max_depth: usize) -> DispatchResult<(), A> {
    tracing::warn!(
        max_depth,
        depth = chain.len(),
        chain = ?chain,
        "causality depth exceeded; abandoning action chain"
    );
    Ok(())
}

/// Options for a [`ChangeController`](super::ChangeController).
pub struct ControllerOptions<A> {
    max_depth: usize,
    on_overflow: OverflowHandler<A>,
}

impl<A> ControllerOptions<A>
where
    A: Clone + Debug + 'static,
{
    /// Set the causality depth limit. Must be at least 1.
    ///
    /// An action is admitted while no more than `max_depth` actions are
    /// already in flight, so the stack holds at most `max_depth + 1` entries:
    /// the originating action plus `max_depth` nested dispatches.
    pub fn with_max_depth(mut self, max_depth: usize) -> Result<Self, ConfigError> {
        if max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        self.max_depth = max_depth;
        Ok(self)
    }

    /// Replace the overflow handler.
    pub fn with_overflow_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[A], usize) -> DispatchResult<(), A> + Send + Sync + 'static,
    {
        self.on_overflow = Arc::new(handler);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn into_parts(self) -> (usize, OverflowHandler<A>) {
        (self.max_depth, self.on_overflow)
    }
}

impl<A> Default for ControllerOptions<A>
where
    A: Clone + Debug + 'static,
{
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            on_overflow: Arc::new(fail_on_overflow::<A>),
        }
    }
}

impl<A> Clone for ControllerOptions<A> {
    fn clone(&self) -> Self {
        Self {
            max_depth: self.max_depth,
            on_overflow: Arc::clone(&self.on_overflow),
        }
    }
}

impl<A> fmt::Debug for ControllerOptions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerOptions")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// What to do when the causality stack overflows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail the dispatch with [`CausalityDepthExceeded`].
    #[default]
    Error,
    /// Log a warning and abandon the chain.
    Log,
}

/// Serializable controller settings.
///
/// ```json
/// { "max_depth": 20, "overflow": "error" }
/// ```
///
/// Both fields are optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerSettings {
    pub max_depth: usize,
    pub overflow: OverflowPolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl ControllerSettings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<A> TryFrom<ControllerSettings> for ControllerOptions<A>
where
    A: Clone + Debug + 'static,
{
    type Error = ConfigError;

    fn try_from(settings: ControllerSettings) -> Result<Self, ConfigError> {
        let options = ControllerOptions::default().with_max_depth(settings.max_depth)?;
        Ok(match settings.overflow {
            OverflowPolicy::Error => options,
            OverflowPolicy::Log => options.with_overflow_handler(log_overflow::<A>),
        })
    }
}
