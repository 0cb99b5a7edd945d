//! Reducer composition utilities
//!
//! [`combine_reducers`] runs several reducers over one state, in order.
//! [`scope_reducer`] lets a reducer written for one field of the state take
//! part in that combination.
//!
//! A site usually splits its reducer by concern: one reducer owns the entity
//! cache, another owns request status flags. Both see every action.
//!
//! # Example
//!
//! ```
//! use press_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//! use press_core::composition::{combine_reducers, scope_reducer};
//!
//! #[derive(Clone, Default)]
//! struct Status {
//!     loading: bool,
//! }
//!
//! #[derive(Clone, Default)]
//! struct SiteState {
//!     titles: Vec<String>,
//!     status: Status,
//! }
//!
//! #[derive(Clone)]
//! enum SiteAction {
//!     Requested,
//!     Received(String),
//! }
//!
//! struct TitleReducer;
//! struct StatusReducer;
//!
//! impl Reducer for TitleReducer {
//!     type State = SiteState;
//!     type Action = SiteAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut SiteState, action: SiteAction, _env: &()) -> SmallVec<[Effect<SiteAction>; 4]> {
//!         if let SiteAction::Received(title) = action {
//!             state.titles.push(title);
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! impl Reducer for StatusReducer {
//!     type State = Status;
//!     type Action = SiteAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Status, action: SiteAction, _env: &()) -> SmallVec<[Effect<SiteAction>; 4]> {
//!         state.loading = matches!(action, SiteAction::Requested);
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let combined = combine_reducers(vec![
//!     Box::new(TitleReducer),
//!     Box::new(scope_reducer(StatusReducer, |site: &mut SiteState| &mut site.status)),
//! ]);
//!
//! let mut state = SiteState::default();
//! let _ = combined.reduce(&mut state, SiteAction::Requested, &());
//! assert!(state.status.loading);
//! let _ = combined.reduce(&mut state, SiteAction::Received("About".into()), &());
//! assert!(!state.status.loading);
//! assert_eq!(state.titles, vec!["About".to_string()]);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::marker::PhantomData;
use std::sync::Arc;

/// Boxed reducer trait object accepted by [`combine_reducers`]
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Run `reducers` one after another on every action
///
/// Later reducers observe the changes earlier ones made. Effects are
/// concatenated in reducer order; no-op effects are dropped.
#[must_use]
pub fn combine_reducers<S, A: Clone, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E> {
    CombinedReducer {
        reducers: Arc::new(reducers),
    }
}

/// Reducer built by [`combine_reducers`]
///
/// Clones share the underlying reducers.
pub struct CombinedReducer<S, A, E> {
    reducers: Arc<Vec<BoxedReducer<S, A, E>>>,
}

impl<S, A, E> Clone for CombinedReducer<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            reducers: Arc::clone(&self.reducers),
        }
    }
}

impl<S, A: Clone, E> Reducer for CombinedReducer<S, A, E> {
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(&self, state: &mut S, action: A, env: &E) -> SmallVec<[Effect<A>; 4]> {
        self.reducers
            .iter()
            .flat_map(|reducer| reducer.reduce(state, action.clone(), env))
            .filter(|effect| !effect.is_none())
            .collect()
    }
}

/// Run `reducer` on the part of the state that `focus` points at
///
/// The field is reduced in place; nothing is cloned.
pub fn scope_reducer<S, Sub, R>(reducer: R, focus: fn(&mut S) -> &mut Sub) -> ScopedReducer<S, Sub, R>
where
    R: Reducer<State = Sub>,
{
    ScopedReducer {
        reducer,
        focus,
        _state: PhantomData,
    }
}

/// Reducer built by [`scope_reducer`]
pub struct ScopedReducer<S, Sub, R> {
    reducer: R,
    focus: fn(&mut S) -> &mut Sub,
    _state: PhantomData<fn(&mut S)>,
}

impl<S, Sub, R> Reducer for ScopedReducer<S, Sub, R>
where
    R: Reducer<State = Sub>,
{
    type State = S;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut S,
        action: R::Action,
        env: &R::Environment,
    ) -> SmallVec<[Effect<R::Action>; 4]> {
        self.reducer.reduce((self.focus)(state), action, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;

    #[derive(Clone, Default)]
    struct TestState {
        fetched: Vec<u64>,
        label: String,
    }

    #[derive(Clone)]
    enum TestAction {
        Fetched(u64),
        Evict(u64),
        Label(String),
    }

    struct CacheReducer;

    impl Reducer for CacheReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Fetched(id) => {
                    state.fetched.push(id);
                    smallvec![Effect::None]
                },
                TestAction::Evict(id) => {
                    state.fetched.retain(|cached| *cached != id);
                    smallvec![Effect::send(TestAction::Label("evicted".to_string()))]
                },
                TestAction::Label(_) => smallvec![Effect::None],
            }
        }
    }

    struct LabelReducer;

    impl Reducer for LabelReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if let TestAction::Label(label) = action {
                state.label = label;
            }
            smallvec![Effect::None]
        }
    }

    #[test]
    fn test_combine_reducers() {
        let combined = combine_reducers(vec![Box::new(CacheReducer), Box::new(LabelReducer)]);
        let mut state = TestState::default();

        let effects = combined.reduce(&mut state, TestAction::Fetched(3), &());
        assert_eq!(state.fetched, vec![3]);
        assert!(effects.is_empty());

        let _ = combined.reduce(&mut state, TestAction::Label("posts".to_string()), &());
        assert_eq!(state.label, "posts");

        let effects = combined.reduce(&mut state, TestAction::Evict(3), &());
        assert!(state.fetched.is_empty());
        assert_eq!(effects.len(), 1);
    }

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }

    struct HitReducer;

    impl Reducer for HitReducer {
        type State = Counter;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if matches!(action, TestAction::Fetched(_)) {
                state.hits += 1;
            }
            smallvec![Effect::None]
        }
    }

    #[derive(Default)]
    struct ParentState {
        counter: Counter,
        other: String,
    }

    #[test]
    fn test_scope_reducer() {
        let scoped = scope_reducer(HitReducer, |parent: &mut ParentState| &mut parent.counter);

        let mut state = ParentState {
            counter: Counter { hits: 1 },
            other: "home".to_string(),
        };

        let _ = scoped.reduce(&mut state, TestAction::Fetched(1), &());
        assert_eq!(state.counter.hits, 2);
        assert_eq!(state.other, "home");

        let _ = scoped.reduce(&mut state, TestAction::Label("x".to_string()), &());
        assert_eq!(state.counter.hits, 2);
    }
}
