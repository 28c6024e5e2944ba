//! Reference Store
//!
//! A small host store with the controller installed as its first stage:
//!
//! ```text
//! dispatch(action)
//!     │
//!     ▼
//! ChangeController ── snapshot / diff / redispatch
//!     │ next
//!     ▼
//! Effect stages ───── may dispatch nested actions back through the store
//!     │
//!     ▼
//! Reducer ─────────── state = reduce(state, action)
//! ```
//!
//! Top-level dispatches are serialized with a re-entrant lock: a dispatch
//! that re-enters from the same thread (an effect, or a derived action)
//! proceeds, while dispatches from other threads wait their turn. Each one
//! starts on an empty causality stack.

use std::fmt::Debug;

use parking_lot::{ReentrantMutex, RwLock};

use crate::dispatch::{ChangeController, ControllerOptions, Pipeline};
use crate::error::DispatchResult;
use crate::watch::Registration;

/// Pure state updates.
pub trait Reducer<S, A>: Send + Sync {
    fn reduce(&self, state: &S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> S + Send + Sync,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        self(state, action)
    }
}

/// Whether an action continues to the reducer after an effect stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectFlow {
    Continue,
    Handled,
}

/// A stage between the controller and the reducer.
///
/// Effects may dispatch nested actions through the store they are given;
/// those re-enter the controller on the current causality chain.
pub trait Effect<S, A>: Send + Sync {
    fn apply(&self, store: &Store<S, A>, action: &A) -> DispatchResult<EffectFlow, A>;
}

impl<S, A, F> Effect<S, A> for F
where
    F: Fn(&Store<S, A>, &A) -> DispatchResult<EffectFlow, A> + Send + Sync,
{
    fn apply(&self, store: &Store<S, A>, action: &A) -> DispatchResult<EffectFlow, A> {
        self(store, action)
    }
}

/// What happened to an action inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The reducer ran.
    Reduced,
    /// An effect consumed the action.
    Handled,
}

/// A state cell driven by a reducer, with change-triggered dispatch.
pub struct Store<S, A> {
    state: RwLock<S>,
    reducer: Box<dyn Reducer<S, A>>,
    effects: Vec<Box<dyn Effect<S, A>>>,
    controller: ChangeController<S, A>,
    dispatching: ReentrantMutex<()>,
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Clone + Debug + Send + Sync + 'static,
{
    /// Create a store with default controller options.
    pub fn new<R>(initial: S, reducer: R) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        Self::with_options(initial, reducer, ControllerOptions::default())
    }

    pub fn with_options<R>(initial: S, reducer: R, options: ControllerOptions<A>) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        Self {
            state: RwLock::new(initial),
            reducer: Box::new(reducer),
            effects: Vec::new(),
            controller: ChangeController::with_options(options),
            dispatching: ReentrantMutex::new(()),
        }
    }

    /// Append an effect stage. Stages run in the order they were added.
    pub fn with_effect<E>(mut self, effect: E) -> Self
    where
        E: Effect<S, A> + 'static,
    {
        self.effects.push(Box::new(effect));
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.state.read().clone()
    }

    /// Dispatch an action through the controller, effects and reducer.
    pub fn dispatch(&self, action: A) -> DispatchResult<Option<Outcome>, A> {
        let _serial = self.dispatching.lock();
        self.controller.process(self, action)
    }

    /// Declare interest in a projection of the state.
    pub fn when_changed<T, F>(&self, selector: F) -> Registration<'_, S, T, A>
    where
        T: PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.controller.when_changed(selector)
    }

    pub fn controller(&self) -> &ChangeController<S, A> {
        &self.controller
    }
}

impl<S, A> Pipeline<A> for Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Clone + Debug + Send + Sync + 'static,
{
    type State = S;
    type Output = Outcome;

    fn state(&self) -> S {
        self.state.read().clone()
    }

    fn next(&self, action: &A) -> DispatchResult<Outcome, A> {
        for effect in &self.effects {
            if effect.apply(self, action)? == EffectFlow::Handled {
                return Ok(Outcome::Handled);
            }
        }

        let mut state = self.state.write();
        *state = self.reducer.reduce(&state, action);
        Ok(Outcome::Reduced)
    }
}

impl<S, A> std::fmt::Debug for Store<S, A>
where
    S: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.state.read())
            .field("effects", &self.effects.len())
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}
