//! Reactive Dispatch Controller
//!
//! The controller sits in front of a host pipeline and turns projection
//! changes into follow-up dispatches.
//!
//! # How It Works
//!
//! For every action handed to [`ChangeController::process`]:
//!
//! 1. The action is admitted onto the causality stack, or rejected if the
//!    stack is already past the depth limit.
//!
//! 2. Every registered dependency is snapshotted against the current state.
//!
//! 3. The action runs through the rest of the pipeline. Stages there may
//!    dispatch nested actions, which come back through `process`.
//!
//! 4. Each snapshot is compared against the new state, in registration
//!    order, and the changed ones produce derived actions.
//!
//! 5. Derived actions are processed one after the other, each one to
//!    completion (including whatever it derives in turn) before the next
//!    starts. Propagation is depth-first.
//!
//! The result of the original action's pipeline run is returned; results of
//! derived actions are dropped.
//!
//! # Recursion Bound
//!
//! Depth is measured on a stack of actions rather than a counter so an
//! overflow can report the exact chain that caused it. The limit covers
//! nested dispatches from pipeline stages and derived dispatches alike.
//!
//! An overflow resets the stack. When the handler lets processing go on,
//! every action that was in flight at that point finishes its own pipeline
//! run but dispatches nothing further, so the whole chain is abandoned
//! rather than continued by its pending siblings.

use std::fmt::{self, Debug};

use super::causality::{Admission, CausalityStack};
use super::options::{ControllerOptions, OverflowHandler};
use super::pipeline::Pipeline;
use crate::error::DispatchResult;
use crate::watch::{DependencyRegistry, Registration};

/// Change-detecting dispatch wrapper.
///
/// # Example
///
/// ```rust,ignore
/// let controller = ChangeController::new();
///
/// controller
///     .when_changed(|s: &State| s.counter)
///     .then_dispatch_with(|cx| Some(Action::Text(format!("counter is {}", cx.selected))));
///
/// controller.process(&store, Action::Inc(2))?;
/// ```
pub struct ChangeController<S, A> {
    registry: DependencyRegistry<S, A>,
    causality: CausalityStack<A>,
    max_depth: usize,
    on_overflow: OverflowHandler<A>,
}

impl<S, A> ChangeController<S, A>
where
    S: 'static,
    A: Clone + Debug + Send + Sync + 'static,
{
    /// Create a controller with default options.
    pub fn new() -> Self {
        Self::with_options(ControllerOptions::default())
    }

    /// Create a controller with the given options.
    pub fn with_options(options: ControllerOptions<A>) -> Self {
        let (max_depth, on_overflow) = options.into_parts();
        Self {
            registry: DependencyRegistry::new(),
            causality: CausalityStack::new(),
            max_depth,
            on_overflow,
        }
    }

    /// Declare interest in a projection of the state.
    ///
    /// Takes effect from the next action that enters the controller; actions
    /// already in flight keep the snapshot they took.
    pub fn when_changed<T, F>(&self, selector: F) -> Registration<'_, S, T, A>
    where
        T: PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.registry.when_changed(selector)
    }

    pub fn registry(&self) -> &DependencyRegistry<S, A> {
        &self.registry
    }

    /// Number of actions currently in flight.
    pub fn depth(&self) -> usize {
        self.causality.depth()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Process one action through `pipeline`, then dispatch whatever the
    /// resulting projection changes derive.
    ///
    /// Returns `Ok(None)` if the action was abandoned because the causality
    /// stack overflowed and the overflow handler chose not to fail.
    pub fn process<P>(&self, pipeline: &P, action: A) -> DispatchResult<Option<P::Output>, A>
    where
        P: Pipeline<A, State = S> + ?Sized,
    {
        let frame = match self.causality.enter(&action, self.max_depth) {
            Admission::Admitted(frame) => frame,
            Admission::Overflow(chain) => return self.overflow(chain),
        };

        let _span = tracing::trace_span!("process", depth = frame.depth(), action = ?action).entered();

        let triggers = self.registry.snapshot(&pipeline.state());
        let output = pipeline.next(&action)?;
        if triggers.is_empty() || frame.is_stale() {
            return Ok(Some(output));
        }

        let derived = triggers.derive(&pipeline.state(), &action);
        if !derived.is_empty() {
            tracing::debug!(
                depth = frame.depth(),
                derived = derived.len(),
                "projection changes derived actions"
            );
        }

        for derived_action in derived {
            if frame.is_stale() {
                tracing::debug!(depth = frame.depth(), "chain abandoned after overflow");
                break;
            }
            self.process(pipeline, derived_action)?;
        }

        Ok(Some(output))
    }

    fn overflow<O>(&self, chain: Vec<A>) -> DispatchResult<Option<O>, A> {
        tracing::debug!(
            max_depth = self.max_depth,
            depth = chain.len(),
            "causality stack overflow"
        );

        let outcome = (self.on_overflow)(&chain, self.max_depth);
        // Hard reset, whatever the handler decided.
        self.causality.clear();
        outcome.map(|()| None)
    }
}

impl<S, A> Default for ChangeController<S, A>
where
    S: 'static,
    A: Clone + Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> fmt::Debug for ChangeController<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeController")
            .field("registry", &self.registry)
            .field("causality", &self.causality)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
