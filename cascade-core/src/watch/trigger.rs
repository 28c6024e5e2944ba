//! Change triggers.
//!
//! A trigger is created for every registered dependency when an action
//! enters the controller. It holds the projection as it was before the
//! action ran; once the action has been processed it re-runs the selector
//! and, if the value moved, resolves the dependency's reaction.

use std::sync::Arc;

use smallvec::SmallVec;

use super::dependency::{Dependency, DependencyId, ReactionContext};

/// A pending change check for one dependency, scoped to one action.
pub trait Trigger<S, A> {
    /// The dependency this trigger was captured from.
    fn dependency_id(&self) -> DependencyId;

    /// Compare the captured projection against `state` and produce the
    /// derived action, if the projection changed and the reaction yields one.
    fn evaluate(&self, state: &S, action: &A) -> Option<A>;
}

/// Trigger for a dependency with projection type `T`.
pub(crate) struct ChangeTrigger<S, T, A> {
    dependency: Arc<Dependency<S, T, A>>,
    before: T,
}

impl<S, T, A> ChangeTrigger<S, T, A> {
    pub(crate) fn new(dependency: Arc<Dependency<S, T, A>>, before: T) -> Self {
        Self { dependency, before }
    }
}

impl<S, T, A> Trigger<S, A> for ChangeTrigger<S, T, A>
where
    S: 'static,
    T: PartialEq + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    fn dependency_id(&self) -> DependencyId {
        self.dependency.id()
    }

    fn evaluate(&self, state: &S, action: &A) -> Option<A> {
        let after = self.dependency.select(state);
        if after == self.before {
            return None;
        }

        self.dependency.reaction().resolve(ReactionContext {
            selected: &after,
            state,
            action,
        })
    }
}

/// Inline capacity of trigger sets and derived-action batches. Most stores
/// watch a handful of projections.
pub(crate) const INLINE_TRIGGERS: usize = 4;

/// The triggers captured for one action, in registration order.
pub struct TriggerSet<S, A> {
    triggers: SmallVec<[Box<dyn Trigger<S, A>>; INLINE_TRIGGERS]>,
}

impl<S, A> TriggerSet<S, A> {
    pub(crate) fn new(triggers: SmallVec<[Box<dyn Trigger<S, A>>; INLINE_TRIGGERS]>) -> Self {
        Self { triggers }
    }

    /// Number of captured triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Evaluate every trigger in registration order, keeping the actions
    /// that were produced.
    pub fn derive(&self, state: &S, action: &A) -> SmallVec<[A; INLINE_TRIGGERS]> {
        self.triggers
            .iter()
            .filter_map(|trigger| trigger.evaluate(state, action))
            .collect()
    }

    /// Iterate over the captured triggers.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Trigger<S, A> + 'static)> + '_ {
        self.triggers.iter().map(|trigger| trigger.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::dependency::{Reaction, Watch};

    struct Counter {
        value: i32,
        label: &'static str,
    }

    fn counter_dependency(
        reaction: Reaction<Counter, i32, String>,
    ) -> Arc<Dependency<Counter, i32, String>> {
        Arc::new(Dependency::new(Box::new(|s: &Counter| s.value), reaction))
    }

    #[test]
    fn unchanged_projection_produces_nothing() {
        let dep = counter_dependency(Reaction::Fixed("changed".into()));
        let trigger = dep.snapshot(&Counter { value: 1, label: "a" });

        let after = Counter { value: 1, label: "b" };
        assert_eq!(trigger.evaluate(&after, &"text".to_string()), None);
    }

    #[test]
    fn changed_projection_resolves_reaction() {
        let dep = counter_dependency(Reaction::derived(|cx: ReactionContext<'_, Counter, i32, String>| {
            Some(format!("{} -> {} ({})", cx.action, cx.selected, cx.state.label))
        }));
        let trigger = dep.snapshot(&Counter { value: 0, label: "a" });

        let after = Counter { value: 2, label: "b" };
        assert_eq!(
            trigger.evaluate(&after, &"inc".to_string()).as_deref(),
            Some("inc -> 2 (b)")
        );
    }

    #[test]
    fn trigger_keeps_its_pre_value() {
        let dep = counter_dependency(Reaction::Fixed("changed".into()));
        let id = dep.id();
        let trigger = dep.snapshot(&Counter { value: 0, label: "a" });

        // Evaluation does not move the baseline.
        let after = Counter { value: 5, label: "a" };
        assert!(trigger.evaluate(&after, &"inc".to_string()).is_some());
        assert!(trigger.evaluate(&after, &"inc".to_string()).is_some());
        assert_eq!(trigger.dependency_id(), id);
    }

    #[test]
    fn trigger_set_derives_in_order() {
        let first = counter_dependency(Reaction::Fixed("first".into()));
        let second = counter_dependency(Reaction::derived(|_| None));
        let third = counter_dependency(Reaction::Fixed("third".into()));

        let before = Counter { value: 0, label: "a" };
        let set = TriggerSet::new(
            [first, second, third]
                .into_iter()
                .map(|dep| dep.snapshot(&before))
                .collect(),
        );
        assert_eq!(set.len(), 3);

        let after = Counter { value: 1, label: "a" };
        let derived = set.derive(&after, &"inc".to_string());
        assert_eq!(derived.as_slice(), ["first".to_string(), "third".to_string()]);
    }
}
