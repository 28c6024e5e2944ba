//! Causality Stack
//!
//! The causality stack records which actions are currently being processed,
//! outermost first. Every admitted action pushes an entry; the entry is
//! removed when the action's processing, including every redispatch it
//! caused, has finished. Its length is therefore the controller's
//! re-entrancy depth at any instant.
//!
//! # Implementation
//!
//! Entries are removed by a guard rather than by an explicit pop, so the
//! stack is kept consistent even when a nested dispatch returns an error or
//! a user callback panics.
//!
//! An overflow clears the stack outright and starts a new generation.
//! Frames admitted before the clear are stale: their guards leave the stack
//! alone, and the controller stops dispatching on their behalf, so the
//! abandoned chain unwinds instead of restarting with a fresh budget.

use parking_lot::Mutex;

/// The live chain of in-flight actions for one controller.
pub struct CausalityStack<A> {
    inner: Mutex<Chain<A>>,
}

struct Chain<A> {
    actions: Vec<A>,
    generation: u64,
}

/// Outcome of trying to enter the stack.
pub(crate) enum Admission<'s, A> {
    /// The action was pushed; the frame pops it when dropped.
    Admitted(Frame<'s, A>),

    /// The stack was already past the limit. Carries a copy of the chain
    /// that was in flight; nothing was pushed.
    Overflow(Vec<A>),
}

impl<A: Clone> CausalityStack<A> {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Chain {
                actions: Vec::new(),
                generation: 0,
            }),
        }
    }

    /// Push `action` unless more than `max_depth` actions are already in
    /// flight.
    pub(crate) fn enter(&self, action: &A, max_depth: usize) -> Admission<'_, A> {
        let mut chain = self.inner.lock();
        if chain.actions.len() > max_depth {
            return Admission::Overflow(chain.actions.clone());
        }

        chain.actions.push(action.clone());
        Admission::Admitted(Frame {
            stack: self,
            depth: chain.actions.len(),
            generation: chain.generation,
        })
    }

    /// Number of actions currently in flight.
    pub fn depth(&self) -> usize {
        self.inner.lock().actions.len()
    }

    /// Copy of the in-flight actions, outermost first.
    pub fn chain(&self) -> Vec<A> {
        self.inner.lock().actions.clone()
    }

    /// Drop every entry. Frames admitted so far become stale.
    pub fn clear(&self) {
        let mut chain = self.inner.lock();
        chain.actions.clear();
        chain.generation += 1;
    }
}

impl<A: Clone> Default for CausalityStack<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for CausalityStack<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CausalityStack")
            .field("depth", &self.inner.lock().actions.len())
            .finish()
    }
}

/// Guard for one admitted action.
///
/// Dropping it removes the action's entry and anything above it.
pub(crate) struct Frame<'s, A> {
    stack: &'s CausalityStack<A>,
    depth: usize,
    generation: u64,
}

impl<A> Frame<'_, A> {
    /// Stack length right after this frame's action was pushed.
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the stack has been cleared since this frame was admitted.
    pub(crate) fn is_stale(&self) -> bool {
        self.stack.inner.lock().generation != self.generation
    }
}

impl<A> Drop for Frame<'_, A> {
    fn drop(&mut self) {
        let mut chain = self.stack.inner.lock();

        // Entries from a cleared generation are already gone.
        if chain.generation == self.generation {
            chain.actions.truncate(self.depth - 1);
        }
    }
}
