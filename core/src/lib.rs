//! # Composable Press Core
//!
//! Building blocks of the Composable Press store, the data layer behind a
//! CMS-backed content site.
//!
//! Every action a view dispatches travels through a pipeline of
//! [`Middleware`] stages. A stage either passes the action on or intercepts
//! it, dispatching other actions in its place and describing follow-up work
//! as an [`Effect`](effect::Effect). Whatever comes out of the pipeline is
//! folded into state by a pure [`Reducer`](reducer::Reducer), which may
//! describe effects of its own. Reducers never perform I/O; clocks and other
//! services reach them through an environment value.
//!
//! ```
//! use press_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct PageState {
//!     views: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum PageAction {
//!     Viewed,
//! }
//!
//! struct PageReducer;
//!
//! impl Reducer for PageReducer {
//!     type State = PageState;
//!     type Action = PageAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut PageState, action: PageAction, _env: &()) -> SmallVec<[Effect<PageAction>; 4]> {
//!         match action {
//!             PageAction::Viewed => state.views += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = PageState::default();
//! let _ = PageReducer.reduce(&mut state, PageAction::Viewed, &());
//! assert_eq!(state.views, 1);
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer composition utilities
pub mod composition;

/// Middleware pipeline stages
pub mod middleware;

pub use middleware::{Intercept, Middleware, MiddlewareError};

/// State transitions
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Folds actions into state
    ///
    /// `reduce` must be deterministic given the state, the action and the
    /// environment. Anything asynchronous is returned as an [`Effect`] for the
    /// store to run; its result comes back as a new action.
    pub trait Reducer {
        /// State owned by this reducer
        type State;

        /// Actions it understands
        type Action;

        /// Injected services (clock, route table, ...)
        type Environment;

        /// Apply `action` to `state` and describe any follow-up work
        ///
        /// Most reducers return `smallvec![Effect::None]`; four inline slots
        /// cover every reducer in the workspace without allocating.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of asynchronous work
pub mod effect {
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;

    /// Work for the store to run after a reduction or an interception
    ///
    /// An effect is a value. Nothing happens until the store executes it, and
    /// whatever action it yields is fed back through the whole pipeline.
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Independent effects, started together
        Parallel(Vec<Effect<Action>>),

        /// A future that may yield one follow-up action
        ///
        /// The API middleware uses this for the network call; the action is
        /// the success or failure of that call.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action: fmt::Debug> fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::None => f.write_str("Effect::None"),
                Self::Parallel(effects) => f.debug_tuple("Effect::Parallel").field(effects).finish(),
                Self::Future(_) => f.write_str("Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Start `effects` together
        #[must_use]
        pub const fn merge(effects: Vec<Self>) -> Self {
            Self::Parallel(effects)
        }

        /// Run `fut` and dispatch the action it yields, if any
        #[must_use]
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Self::Future(Box::pin(fut))
        }

        /// Dispatch `action` once the current dispatch has finished
        #[must_use]
        pub fn send(action: Action) -> Self
        where
            Action: Send + 'static,
        {
            Self::future(async move { Some(action) })
        }

        /// Whether running this effect would do nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Self::None => true,
                Self::Parallel(effects) => effects.iter().all(Self::is_none),
                Self::Future(_) => false,
            }
        }
    }
}

/// Services injected into reducers
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of the current time
    ///
    /// Reducers stamp request status with it; tests use a fixed clock.
    pub trait Clock: Send + Sync {
        /// Current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
