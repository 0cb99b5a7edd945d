//! The Call API pipeline stage.

use crate::client::ApiClient;
use crate::config::ApiConfig;
use crate::lifecycle::ApiActionKind;
use crate::transport::Transport;
use press_core::effect::Effect;
use press_core::{Intercept, Middleware, MiddlewareError};
use std::sync::Arc;

/// Stage name reported in logs and configuration errors
pub const STAGE_NAME: &str = "api";

/// Intercepts call descriptors and runs them
///
/// For a descriptor the stage dispatches the request action to the following
/// stages, then runs the call as an effect whose single result is the
/// success or failure action. Every other action passes through untouched.
///
/// ```ignore
/// let api = ApiMiddleware::new(ApiConfig::from_env(), Arc::new(HttpTransport::new()?));
/// let store = Store::new(SiteState::default(), SiteReducer::new(), env)
///     .with_middleware(api)
///     .with_middleware(LoggingMiddleware);
/// ```
#[derive(Debug, Clone)]
pub struct ApiMiddleware {
    client: ApiClient,
}

impl ApiMiddleware {
    /// Stage over `transport`
    #[must_use]
    pub fn new(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            client: ApiClient::new(config, transport),
        }
    }

    /// Stage around an existing client
    #[must_use]
    pub const fn from_client(client: ApiClient) -> Self {
        Self { client }
    }
}

impl<S, A> Middleware<S, A> for ApiMiddleware
where
    A: ApiActionKind<S> + Send + 'static,
{
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn intercept(&self, state: &S, action: A) -> Result<Intercept<A>, MiddlewareError> {
        let call = match action.try_into_call() {
            Ok(call) => call,
            Err(action) => return Ok(Intercept::Next(action)),
        };

        let prepared = self.client.prepare(call, state).map_err(|error| {
            tracing::error!(error = %error, "Rejected malformed call descriptor");
            MiddlewareError::from(error)
        })?;

        tracing::debug!(
            action_type = %prepared.types.request,
            method = %prepared.request.method,
            url = %prepared.request.url,
            "Dispatching API call"
        );

        let request = A::from_api(prepared.request_action());
        let client = self.client.clone();

        Ok(Intercept::handled(
            vec![request],
            Effect::future(async move { Some(A::from_api(client.execute(prepared).await)) }),
        ))
    }
}
