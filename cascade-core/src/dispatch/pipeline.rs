//! The host pipeline the controller wraps.

use crate::error::DispatchResult;

/// The two things the controller needs from a host store.
///
/// `next` runs the stages after the controller (further middleware, then
/// the reducer). It may dispatch nested actions back through the controller,
/// and must propagate the errors those nested dispatches return.
pub trait Pipeline<A> {
    type State;
    type Output;

    /// Read the current state. Must have no side effects.
    fn state(&self) -> Self::State;

    /// Deliver one action to the rest of the pipeline.
    fn next(&self, action: &A) -> DispatchResult<Self::Output, A>;
}
