//! Development action logger.
//!
//! [`LoggingMiddleware`] is a pass-through stage: it never intercepts, it only
//! records what reaches it. Placed after the API middleware it sees the
//! lifecycle actions (request, success, failure) rather than the descriptors.

use press_core::{Intercept, Middleware, MiddlewareError};
use std::fmt::Debug;

/// Logs every action at `debug`, and the state it will be reduced against at `trace`
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl<S, A> Middleware<S, A> for LoggingMiddleware
where
    S: Debug,
    A: Debug,
{
    fn name(&self) -> &'static str {
        "logger"
    }

    fn intercept(&self, state: &S, action: A) -> Result<Intercept<A>, MiddlewareError> {
        tracing::debug!(target: "press::actions", action = ?action, "action");
        tracing::trace!(target: "press::actions", prev_state = ?state, "state before reduce");
        Ok(Intercept::Next(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_passes_actions_through() {
        let outcome = Middleware::<u8, &str>::intercept(&LoggingMiddleware, &0, "open_page");
        assert!(matches!(outcome, Ok(Intercept::Next("open_page"))));
    }

    #[test]
    fn test_logger_name() {
        assert_eq!(Middleware::<(), ()>::name(&LoggingMiddleware), "logger");
    }
}
