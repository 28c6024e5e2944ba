//! Dependency declarations.
//!
//! A dependency pairs a selector (a pure projection of state) with the
//! reaction to run when that projection changes. Dependencies are created by
//! finalizing a [`Registration`](super::Registration) and are never mutated
//! afterwards.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::trigger::{ChangeTrigger, Trigger};

/// Unique identifier for a registered dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyId(u64);

impl DependencyId {
    /// Generate a new unique dependency ID.
    ///
    /// IDs are unique across every registry in the process, so an ID can
    /// never be confused between two controllers.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for DependencyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dep#{}", self.raw())
    }
}

/// Everything a reaction factory gets to look at.
pub struct ReactionContext<'a, S, T, A> {
    /// The projection's value after the update.
    pub selected: &'a T,
    /// The full state after the update.
    pub state: &'a S,
    /// The action whose processing changed the projection.
    pub action: &'a A,
}

/// A reaction factory.
pub type ReactionFn<S, T, A> =
    Arc<dyn Fn(ReactionContext<'_, S, T, A>) -> Option<A> + Send + Sync>;

/// What to dispatch when a projection changes.
pub enum Reaction<S, T, A> {
    /// Dispatch this action as-is on every change.
    Fixed(A),

    /// Build the action from the change. Returning `None` suppresses the
    /// dispatch for this change.
    Derived(ReactionFn<S, T, A>),
}

impl<S, T, A> Reaction<S, T, A> {
    /// Wrap a factory closure.
    pub fn derived<F>(factory: F) -> Self
    where
        F: Fn(ReactionContext<'_, S, T, A>) -> Option<A> + Send + Sync + 'static,
    {
        Reaction::Derived(Arc::new(factory))
    }

    /// Resolve the reaction into the action to dispatch, if any.
    pub fn resolve(&self, cx: ReactionContext<'_, S, T, A>) -> Option<A>
    where
        A: Clone,
    {
        match self {
            Reaction::Fixed(action) => Some(action.clone()),
            Reaction::Derived(factory) => factory(cx),
        }
    }
}

impl<S, T, A: Clone> Clone for Reaction<S, T, A> {
    fn clone(&self) -> Self {
        match self {
            Reaction::Fixed(action) => Reaction::Fixed(action.clone()),
            Reaction::Derived(factory) => Reaction::Derived(Arc::clone(factory)),
        }
    }
}

impl<S, T, A: fmt::Debug> fmt::Debug for Reaction<S, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reaction::Fixed(action) => f.debug_tuple("Fixed").field(action).finish(),
            Reaction::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// A projection compared by pointer identity instead of by value.
///
/// Selectors that hand out shared, non-primitive state should wrap it in
/// `Identity`: an update that rebuilds the value counts as a change even
/// when the rebuilt value is equal, and an update that keeps the same `Arc`
/// never does, no matter how expensive a deep comparison would be.
pub struct Identity<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized> Identity<T> {
    /// Wrap a clone of the given `Arc`.
    pub fn of(value: &Arc<T>) -> Self {
        Identity(Arc::clone(value))
    }
}

impl<T: ?Sized> Clone for Identity<T> {
    fn clone(&self) -> Self {
        Identity(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for Identity<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for Identity<T> {}

impl<T: ?Sized> Deref for Identity<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Identity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity").field(&&*self.0).finish()
    }
}

/// A selector boxed for storage.
pub(crate) type Selector<S, T> = Box<dyn Fn(&S) -> T + Send + Sync>;

/// A finalized dependency with a concrete projection type.
pub(crate) struct Dependency<S, T, A> {
    id: DependencyId,
    selector: Selector<S, T>,
    reaction: Reaction<S, T, A>,
}

impl<S, T, A> Dependency<S, T, A> {
    pub(crate) fn new(selector: Selector<S, T>, reaction: Reaction<S, T, A>) -> Self {
        Self {
            id: DependencyId::new(),
            selector,
            reaction,
        }
    }

    pub(crate) fn id(&self) -> DependencyId {
        self.id
    }

    pub(crate) fn select(&self, state: &S) -> T {
        (self.selector)(state)
    }

    pub(crate) fn reaction(&self) -> &Reaction<S, T, A> {
        &self.reaction
    }
}

/// A dependency with its projection type erased, as stored in the registry.
pub(crate) trait Watch<S, A>: Send + Sync {
    fn id(&self) -> DependencyId;

    /// Capture the projection's current value as a trigger.
    fn snapshot(self: Arc<Self>, state: &S) -> Box<dyn Trigger<S, A>>;
}

impl<S, T, A> Watch<S, A> for Dependency<S, T, A>
where
    S: 'static,
    T: PartialEq + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    fn id(&self) -> DependencyId {
        Dependency::id(self)
    }

    fn snapshot(self: Arc<Self>, state: &S) -> Box<dyn Trigger<S, A>> {
        let before = self.select(state);
        Box::new(ChangeTrigger::new(self, before))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_ids_are_unique() {
        let id1 = DependencyId::new();
        let id2 = DependencyId::new();
        let id3 = DependencyId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert!(id1 < id2 && id2 < id3);
    }

    #[test]
    fn dependency_id_displays_raw_value() {
        let id = DependencyId::new();
        assert_eq!(id.to_string(), format!("dep#{}", id.raw()));
    }

    #[test]
    fn fixed_reaction_resolves_to_its_action() {
        let reaction: Reaction<(), i32, &str> = Reaction::Fixed("changed");
        let cx = ReactionContext {
            selected: &1,
            state: &(),
            action: &"inc",
        };

        assert_eq!(reaction.resolve(cx), Some("changed"));
    }

    #[test]
    fn derived_reaction_sees_context() {
        let reaction: Reaction<i32, i32, String> =
            Reaction::derived(|cx| Some(format!("{} {} {}", cx.action, cx.selected, cx.state)));
        let action = "inc".to_string();
        let cx = ReactionContext {
            selected: &2,
            state: &20,
            action: &action,
        };

        assert_eq!(reaction.resolve(cx).as_deref(), Some("inc 2 20"));
    }

    #[test]
    fn derived_reaction_may_decline() {
        let reaction: Reaction<(), i32, &str> =
            Reaction::derived(|cx| (*cx.selected > 10).then_some("big"));

        let small = ReactionContext {
            selected: &3,
            state: &(),
            action: &"inc",
        };
        assert_eq!(reaction.resolve(small), None);
    }

    #[test]
    fn identity_compares_pointers() {
        let items = Arc::new(vec![1, 2, 3]);
        let same = Identity::of(&items);
        let rebuilt = Identity(Arc::new(vec![1, 2, 3]));

        assert_eq!(Identity::of(&items), same);
        assert_ne!(same, rebuilt);
        assert_eq!(*same, *rebuilt);
    }
}
