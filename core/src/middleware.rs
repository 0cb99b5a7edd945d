//! Middleware pipeline stages
//!
//! Every action sent to the store flows through an ordered list of middleware
//! stages before it reaches the reducer. A stage either hands the action on
//! unchanged ([`Intercept::Next`]) or takes ownership of it
//! ([`Intercept::Handled`]), in which case it may dispatch replacement actions
//! to the stages after it and describe an effect whose resulting action
//! re-enters the pipeline after the intercepting stage.
//!
//! # Example
//!
//! ```
//! use press_core::{effect::Effect, Intercept, Middleware, MiddlewareError};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Action {
//!     Ping,
//!     Pong,
//! }
//!
//! /// Answers every `Ping` with a `Pong`.
//! struct PingPong;
//!
//! impl Middleware<(), Action> for PingPong {
//!     fn name(&self) -> &'static str {
//!         "ping_pong"
//!     }
//!
//!     fn intercept(&self, _state: &(), action: Action) -> Result<Intercept<Action>, MiddlewareError> {
//!         match action {
//!             Action::Ping => Ok(Intercept::handled(vec![Action::Pong], Effect::None)),
//!             other => Ok(Intercept::Next(other)),
//!         }
//!     }
//! }
//!
//! let outcome = PingPong.intercept(&(), Action::Pong).unwrap();
//! assert!(matches!(outcome, Intercept::Next(Action::Pong)));
//! ```

use crate::effect::Effect;
use thiserror::Error;

/// Result of offering an action to a middleware stage
pub enum Intercept<A> {
    /// The stage does not recognize the action; pass it to the next stage
    Next(A),

    /// The stage consumed the action
    Handled {
        /// Actions dispatched synchronously to the following stages, in order
        dispatch: Vec<A>,
        /// Effect started after every `dispatch` action has been reduced
        effect: Effect<A>,
    },
}

impl<A> Intercept<A> {
    /// Build a [`Intercept::Handled`] outcome
    #[must_use]
    pub const fn handled(dispatch: Vec<A>, effect: Effect<A>) -> Self {
        Self::Handled { dispatch, effect }
    }

    /// Whether the stage let the action through
    #[must_use]
    pub const fn is_next(&self) -> bool {
        matches!(self, Self::Next(_))
    }
}

impl<A: std::fmt::Debug> std::fmt::Debug for Intercept<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Next(action) => f.debug_tuple("Intercept::Next").field(action).finish(),
            Self::Handled { dispatch, effect } => f
                .debug_struct("Intercept::Handled")
                .field("dispatch", dispatch)
                .field("effect", effect)
                .finish(),
        }
    }
}

/// Errors raised by a middleware stage
///
/// These are programmer errors (malformed actions, invalid configuration).
/// They surface synchronously from the store's `send` and are never turned
/// into actions.
#[derive(Error, Debug)]
pub enum MiddlewareError {
    /// The action carried an invalid configuration
    #[error("Invalid action configuration in {stage}: {message}")]
    Configuration {
        /// Name of the stage that rejected the action
        stage: &'static str,
        /// Human readable description of the problem
        message: String,
    },
}

/// A composable stage of the store's dispatch pipeline
///
/// Implementations must be cheap to call: `intercept` runs while the store
/// holds a read lock on its state, so any I/O belongs in the returned effect.
pub trait Middleware<S, A>: Send + Sync {
    /// Stage name, used in logs and errors
    fn name(&self) -> &'static str;

    /// Inspect an action against the current state
    ///
    /// # Errors
    ///
    /// Returns [`MiddlewareError`] when the action is malformed. The store
    /// propagates the error to the caller without reducing anything.
    fn intercept(&self, state: &S, action: A) -> Result<Intercept<A>, MiddlewareError>;
}
