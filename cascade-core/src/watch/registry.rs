//! Dependency Registry
//!
//! The registry is the ordered list of everything the controller watches.
//! It knows nothing about dispatch: it hands out registration handles and,
//! when asked, captures a trigger per dependency against a given state.
//!
//! # Ordering
//!
//! Dependencies keep their registration order. Triggers are captured and
//! evaluated in that order, and derived actions are dispatched in it, so the
//! order in which callers register is the tie-break when one action changes
//! several projections.
//!
//! # Lifetime
//!
//! The registry is append-only. Dependencies live as long as the registry.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::dependency::{Dependency, DependencyId, Reaction, ReactionContext, Selector, Watch};
use super::trigger::TriggerSet;

/// Ordered, append-only set of dependencies.
pub struct DependencyRegistry<S, A> {
    dependencies: RwLock<IndexMap<DependencyId, Arc<dyn Watch<S, A>>>>,
}

impl<S, A> DependencyRegistry<S, A>
where
    S: 'static,
    A: Clone + Send + Sync + 'static,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            dependencies: RwLock::new(IndexMap::new()),
        }
    }

    /// Declare interest in a projection of the state.
    ///
    /// Nothing is registered until a reaction is attached to the returned
    /// handle.
    pub fn when_changed<T, F>(&self, selector: F) -> Registration<'_, S, T, A>
    where
        T: PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        Registration {
            registry: self,
            selector: Box::new(selector),
        }
    }

    fn insert(&self, watch: Arc<dyn Watch<S, A>>) -> DependencyId {
        let id = watch.id();
        let mut dependencies = self.dependencies.write();
        dependencies.insert(id, watch);

        tracing::debug!(dependency = %id, registered = dependencies.len(), "dependency registered");
        id
    }

    /// Capture a trigger for every dependency against `state`, in
    /// registration order.
    pub fn snapshot(&self, state: &S) -> TriggerSet<S, A> {
        // Selectors run without the lock held, so one may register another
        // dependency; that dependency is picked up from the next snapshot on.
        let watches: SmallVec<[Arc<dyn Watch<S, A>>; 4]> =
            self.dependencies.read().values().cloned().collect();

        TriggerSet::new(
            watches
                .into_iter()
                .map(|watch| watch.snapshot(state))
                .collect(),
        )
    }

    /// Number of registered dependencies.
    pub fn len(&self) -> usize {
        self.dependencies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.read().is_empty()
    }

    /// Check whether a dependency is registered here.
    pub fn contains(&self, id: DependencyId) -> bool {
        self.dependencies.read().contains_key(&id)
    }
}

impl<S, A> Default for DependencyRegistry<S, A>
where
    S: 'static,
    A: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> std::fmt::Debug for DependencyRegistry<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("dependencies", &self.dependencies.read().len())
            .finish()
    }
}

/// Write-only handle returned by [`DependencyRegistry::when_changed`].
///
/// Attaching a reaction consumes the handle, so a selector is registered at
/// most once per `when_changed` call.
#[must_use = "nothing is registered until a reaction is attached"]
pub struct Registration<'r, S, T, A> {
    registry: &'r DependencyRegistry<S, A>,
    selector: Selector<S, T>,
}

impl<'r, S, T, A> Registration<'r, S, T, A>
where
    S: 'static,
    T: PartialEq + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    /// Attach a reaction and register the dependency.
    pub fn then(self, reaction: Reaction<S, T, A>) -> DependencyId {
        let dependency = Dependency::new(self.selector, reaction);
        self.registry.insert(Arc::new(dependency))
    }

    /// Dispatch `action` every time the projection changes.
    pub fn then_dispatch(self, action: A) -> DependencyId {
        self.then(Reaction::Fixed(action))
    }

    /// Build the action to dispatch from the change. The factory may return
    /// `None` to skip a change.
    pub fn then_dispatch_with<F>(self, factory: F) -> DependencyId
    where
        F: Fn(ReactionContext<'_, S, T, A>) -> Option<A> + Send + Sync + 'static,
    {
        self.then(Reaction::derived(factory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct State {
        counter: i32,
        text: String,
    }

    fn state(counter: i32, text: &str) -> State {
        State {
            counter,
            text: text.to_string(),
        }
    }

    #[test]
    fn handle_registers_only_on_attach() {
        let registry: DependencyRegistry<State, String> = DependencyRegistry::new();

        let handle = registry.when_changed(|s: &State| s.counter);
        assert!(registry.is_empty());

        let id = handle.then_dispatch("changed".to_string());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id));
    }

    #[test]
    fn dropped_handle_registers_nothing() {
        let registry: DependencyRegistry<State, String> = DependencyRegistry::new();

        drop(registry.when_changed(|s: &State| s.counter));
        assert!(registry.is_empty());
        assert_eq!(registry.snapshot(&state(0, "")).len(), 0);
    }

    #[test]
    fn snapshot_follows_registration_order() {
        let registry: DependencyRegistry<State, String> = DependencyRegistry::new();

        let text = registry
            .when_changed(|s: &State| s.text.clone())
            .then_dispatch("text".to_string());
        let counter = registry
            .when_changed(|s: &State| s.counter)
            .then_dispatch_with(|cx| Some(format!("counter {}", cx.selected)));

        let triggers = registry.snapshot(&state(0, ""));
        let ids: Vec<_> = triggers.iter().map(|t| t.dependency_id()).collect();
        assert_eq!(ids, vec![text, counter]);

        let derived = triggers.derive(&state(3, "x"), &"inc".to_string());
        assert_eq!(derived.as_slice(), ["text".to_string(), "counter 3".to_string()]);
    }

    #[test]
    fn snapshot_ignores_unchanged_projections() {
        let registry: DependencyRegistry<State, String> = DependencyRegistry::new();
        registry
            .when_changed(|s: &State| s.counter)
            .then_dispatch("counter".to_string());

        let triggers = registry.snapshot(&state(1, "a"));
        assert!(triggers.derive(&state(1, "b"), &"text".to_string()).is_empty());
    }

    #[test]
    fn registries_are_independent() {
        let first: DependencyRegistry<State, String> = DependencyRegistry::new();
        let second: DependencyRegistry<State, String> = DependencyRegistry::new();

        let id = first
            .when_changed(|s: &State| s.counter)
            .then_dispatch("counter".to_string());

        assert!(first.contains(id));
        assert!(!second.contains(id));
        assert!(second.is_empty());
    }
}
