//! # Composable Press Runtime
//!
//! The [`Store`] owns application state and drives every action through
//! three phases:
//!
//! 1. the middleware pipeline, where a stage may take the action over
//! 2. the reducer, for actions that made it through
//! 3. effect execution, whose resulting actions are dispatched again
//!
//! ## Dispatch Order
//!
//! `send(action)` offers the action to each middleware stage in order. A stage
//! that intercepts it may dispatch replacement actions; those continue from the
//! next stage and are reduced (depth-first, in order) before the intercepting
//! stage's effect is started. Actions produced by that effect also resume after
//! the intercepting stage, while actions produced by reducer effects start over
//! at the first stage.
//!
//! ## Example
//!
//! ```ignore
//! use press_runtime::{LoggingMiddleware, Store};
//!
//! let store = Store::new(SiteState::new(), SiteReducer::new(), environment)
//!     .with_middleware(api_middleware)
//!     .with_middleware(LoggingMiddleware);
//!
//! let mut handle = store.send(SiteAction::OpenPage { id: 7 }).await?;
//! handle.wait().await;
//!
//! let title = store.state(|s| selectors::page_title(s, 7).map(str::to_owned)).await;
//! ```

use press_core::{effect::Effect, middleware::Intercept, middleware::Middleware, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Development action logger
pub mod logging;

/// Prometheus metrics for observability
pub mod metrics;

pub use logging::LoggingMiddleware;

/// Store errors
pub mod error {
    use press_core::MiddlewareError;
    use thiserror::Error;

    /// Why a store operation did not complete
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// A middleware stage refused a malformed action
        ///
        /// Nothing from the refused action was reduced.
        #[error("Action refused by middleware: {0}")]
        Middleware(#[from] MiddlewareError),

        /// `send` was called after shutdown began
        #[error("Store is closed to new actions")]
        ShutdownInProgress,

        /// Effects were still running when the shutdown deadline passed
        #[error("{0} effects still in flight at shutdown deadline")]
        ShutdownTimeout(usize),

        /// A deadline passed before the awaited action or effects arrived
        #[error("Deadline elapsed")]
        Timeout,

        /// No more reduced actions will be observed
        #[error("Reduced-action stream closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Tunables for a [`Store`]
///
/// ```
/// use press_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Reduced actions buffered per observer before it starts lagging
    pub broadcast_capacity: usize,
    /// How long `shutdown_gracefully` waits for in-flight effects
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Explicit capacity and shutdown deadline
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Replace the observer buffer size
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Replace the shutdown deadline
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(64, Duration::from_secs(30))
    }
}

/// Count of running effects that can be awaited down to zero
#[derive(Clone)]
struct InFlight(Arc<watch::Sender<usize>>);

impl InFlight {
    fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self(Arc::new(count))
    }

    /// Count one more running effect until the guard is dropped
    fn enter(&self) -> InFlightGuard {
        self.0.send_modify(|count| *count += 1);
        InFlightGuard(self.clone())
    }

    fn count(&self) -> usize {
        *self.0.borrow()
    }

    fn watch(&self) -> watch::Receiver<usize> {
        self.0.subscribe()
    }
}

/// Releases its slot even when the effect task panics
struct InFlightGuard(InFlight);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.0.send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// Completion handle for one [`Store::send`]
///
/// Covers every effect started on behalf of the action, including effects
/// started by the actions those effects fed back. For an API call that is
/// the request, the round trip and the terminal action.
///
/// ```ignore
/// let mut handle = store.send(SiteAction::Call(fetch_posts())).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // FETCH_POSTS_SUCCESS or FETCH_POSTS_FAILURE has been reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    in_flight: watch::Receiver<usize>,
}

impl EffectHandle {
    fn tracking(in_flight: &InFlight) -> Self {
        Self {
            in_flight: in_flight.watch(),
        }
    }

    /// Handle with nothing left to wait for
    #[must_use]
    pub fn completed() -> Self {
        let (_, in_flight) = watch::channel(0);
        Self { in_flight }
    }

    /// Effects of this send still running
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Resolve once no effect of this send is running
    pub async fn wait(&mut self) {
        // The sender only goes away after the count is back at zero.
        let _ = self.in_flight.wait_for(|count| *count == 0).await;
    }

    /// [`EffectHandle::wait`] with a deadline
    ///
    /// # Errors
    ///
    /// [`StoreError::Timeout`] if effects are still running at the deadline.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// The store and its dispatch loop
pub mod store {
    use super::{
        Arc, AtomicBool, Duration, Effect, EffectHandle, InFlight, Intercept, Middleware, Ordering,
        Reducer, RwLock, StoreConfig, StoreError,
    };
    use crate::metrics::StoreMetrics;
    use press_core::SmallVec;
    use tokio::sync::broadcast;

    type Stage<S, A> = Arc<dyn Middleware<S, A>>;

    /// Pending work inside one dispatch
    enum Work<A> {
        /// Offer `action` to the pipeline starting at `stage`
        Dispatch { stage: usize, action: A },
        /// Start an effect whose actions resume at `resume`
        Run { effect: Effect<A>, resume: usize },
    }

    /// Where the pipeline delivered an action
    enum Routed<A> {
        Reducer(A),
        Intercepted {
            stage: usize,
            dispatch: Vec<A>,
            effect: Effect<A>,
        },
    }

    /// State container driving a reducer behind a middleware pipeline
    ///
    /// Cloning is cheap and every clone shares state, pipeline, observers
    /// and the shutdown flag.
    ///
    /// - `S`: state
    /// - `A`: action
    /// - `E`: environment handed to the reducer
    /// - `R`: reducer
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        middleware: Arc<Vec<Stage<S, A>>>,
        config: StoreConfig,
        closed: Arc<AtomicBool>,
        in_flight: InFlight,
        /// Every reduced action, in reduction order.
        reduced: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Store with an empty pipeline and default tunables
        ///
        /// Every action goes straight to the reducer until middleware is
        /// added with [`Store::with_middleware`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Store with explicit tunables
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (reduced, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                middleware: Arc::new(Vec::new()),
                config,
                closed: Arc::new(AtomicBool::new(false)),
                in_flight: InFlight::new(),
                reduced,
            }
        }

        /// Append a middleware stage to the end of the pipeline
        ///
        /// Stages see actions in the order they were added. Build the pipeline
        /// before cloning the store; clones made earlier keep the old pipeline.
        #[must_use]
        pub fn with_middleware<M>(mut self, middleware: M) -> Self
        where
            M: Middleware<S, A> + 'static,
        {
            let mut stages: Vec<Stage<S, A>> = self.middleware.iter().cloned().collect();
            stages.push(Arc::new(middleware));
            self.middleware = Arc::new(stages);
            self
        }

        /// Names of the pipeline stages, in order
        #[must_use]
        pub fn middleware_names(&self) -> Vec<&'static str> {
            self.middleware.iter().map(|stage| stage.name()).collect()
        }

        /// Effects running right now, across all sends
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.in_flight.count()
        }

        /// Close the store and wait for running effects
        ///
        /// `send` fails from now on. Effects already running are left alone and
        /// the actions they produce are still reduced, so every started API call
        /// still delivers its terminal action.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownTimeout`] with the number of effects still
        /// running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.closed.store(true, Ordering::Release);
            tracing::info!(pending_effects = self.in_flight.count(), "Store closed, draining effects");

            let mut count = self.in_flight.watch();
            let drained = async move {
                let _ = count.wait_for(|running| *running == 0).await;
            };

            if tokio::time::timeout(timeout, drained).await.is_ok() {
                tracing::info!("Store drained");
                return Ok(());
            }

            let remaining = self.in_flight.count();
            tracing::error!(pending_effects = remaining, "Store still busy at shutdown deadline");
            Err(StoreError::ShutdownTimeout(remaining))
        }

        /// [`Store::shutdown`] with the configured deadline
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_gracefully(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Dispatch an action
        ///
        /// Returns once the action and everything it synchronously caused
        /// has been reduced. Effects may still be running; the returned
        /// handle resolves when they are done.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`] once shutdown has begun
        /// - [`StoreError::Middleware`] if a stage refused the action
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.closed.load(Ordering::Acquire) {
                tracing::warn!("Action dropped, store is closed");
                return Err(StoreError::ShutdownInProgress);
            }

            StoreMetrics::record_send();

            let tracker = InFlight::new();
            let handle = EffectHandle::tracking(&tracker);
            self.dispatch_from(0, action, &tracker).await?;

            Ok(handle)
        }

        /// Dispatch an action and return the first reduced action matching
        /// `predicate`
        ///
        /// The subscription is taken before dispatching, so a match caused by
        /// this very action is never missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`] when nothing matched in time
        /// - [`StoreError::ChannelClosed`] when the stream ended first
        /// - whatever [`Store::send`] returns
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut observed = self.reduced.subscribe();
            self.send(action).await?;

            let first_match = async move {
                loop {
                    match observed.recv().await {
                        Ok(candidate) if predicate(&candidate) => break Ok(candidate),
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Observer fell behind, some actions were not seen");
                        },
                        Err(broadcast::error::RecvError::Closed) => break Err(StoreError::ChannelClosed),
                    }
                }
            };

            match tokio::time::timeout(timeout, first_match).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout),
            }
        }

        /// Subscribe to every reduced action, in reduction order
        ///
        /// Descriptor-like actions consumed by middleware are not broadcast;
        /// the actions dispatched in their place are.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.reduced.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let cached = store.state(|s| s.cache.len(kinds::PAGES)).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            f(&*self.state.read().await)
        }

        /// Run `action` and everything it synchronously causes
        async fn dispatch_from(&self, stage: usize, action: A, tracker: &InFlight) -> Result<(), StoreError> {
            let mut work = vec![Work::Dispatch { stage, action }];

            while let Some(item) = work.pop() {
                match item {
                    Work::Dispatch { stage, action } => match self.route(stage, action).await? {
                        Routed::Reducer(action) => {
                            let effects = self.reduce(action).await;
                            tracing::trace!("Reducer returned {} effects", effects.len());
                            for effect in effects {
                                self.execute_effect(effect, 0, tracker);
                            }
                        },
                        Routed::Intercepted {
                            stage,
                            dispatch,
                            effect,
                        } => {
                            let resume = stage + 1;
                            // Stack: the effect runs after every dispatched action.
                            work.push(Work::Run { effect, resume });
                            work.extend(
                                dispatch
                                    .into_iter()
                                    .rev()
                                    .map(|action| Work::Dispatch { stage: resume, action }),
                            );
                        },
                    },
                    Work::Run { effect, resume } => self.execute_effect(effect, resume, tracker),
                }
            }

            Ok(())
        }

        /// Offer an action to the stages from `start` onwards
        async fn route(&self, start: usize, action: A) -> Result<Routed<A>, StoreError> {
            if start >= self.middleware.len() {
                return Ok(Routed::Reducer(action));
            }

            let state = self.state.read().await;
            let mut action = action;

            for (index, stage) in self.middleware.iter().enumerate().skip(start) {
                tracing::trace!(stage = stage.name(), "Offering action to middleware");

                let outcome = stage.intercept(&*state, action).map_err(|error| {
                    tracing::error!(stage = stage.name(), error = %error, "Middleware rejected action");
                    error
                })?;

                match outcome {
                    Intercept::Next(next) => action = next,
                    Intercept::Handled { dispatch, effect } => {
                        tracing::debug!(
                            stage = stage.name(),
                            dispatched = dispatch.len(),
                            "Middleware intercepted action"
                        );
                        return Ok(Routed::Intercepted {
                            stage: index,
                            dispatch,
                            effect,
                        });
                    },
                }
            }

            Ok(Routed::Reducer(action))
        }

        /// Apply the reducer and broadcast the action
        async fn reduce(&self, action: A) -> SmallVec<[Effect<A>; 4]> {
            let observed = action.clone();
            let mut state = self.state.write().await;

            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();

            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(&mut *state, action, &self.environment);
            StoreMetrics::record_reduce(start.elapsed());

            // Broadcast while the lock is held so observers see reduction order.
            let _ = self.reduced.send(observed);

            effects
        }

        /// Start an effect; its actions re-enter the pipeline at `resume`
        ///
        /// Futures run on their own task, counted against both the sender's
        /// handle and the store. A panicking future only loses its own task.
        fn execute_effect(&self, effect: Effect<A>, resume: usize, tracker: &InFlight) {
            match effect {
                Effect::None => StoreMetrics::record_effect("none"),
                Effect::Parallel(effects) => {
                    StoreMetrics::record_effect("parallel");
                    for effect in effects {
                        self.execute_effect(effect, resume, tracker);
                    }
                },
                Effect::Future(fut) => {
                    StoreMetrics::record_effect("future");

                    let for_send = tracker.enter();
                    let for_store = self.in_flight.enter();
                    let tracker = tracker.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _slots = (for_send, for_store);

                        let Some(action) = fut.await else {
                            tracing::trace!("Effect finished without an action");
                            return;
                        };
                        if let Err(error) = store.dispatch_from(resume, action, &tracker).await {
                            tracing::error!(error = %error, "Action produced by effect was rejected");
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                middleware: Arc::clone(&self.middleware),
                config: self.config.clone(),
                closed: Arc::clone(&self.closed),
                in_flight: self.in_flight.clone(),
                reduced: self.reduced.clone(),
            }
        }
    }
}

pub use store::Store;
