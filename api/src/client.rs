//! Call execution.
//!
//! [`ApiClient::prepare`] validates a descriptor and builds its request;
//! [`ApiClient::execute`] performs it and always settles with exactly one
//! terminal [`ApiAction`]. Every way a call can go wrong is collapsed into a
//! [`Rejection`] and from there into the uniform failure shape.

use crate::casing::camelize_keys;
use crate::config::ApiConfig;
use crate::descriptor::{CallApi, QueryOptions};
use crate::error::ApiError;
use crate::lifecycle::{ActionTypes, ApiAction, Payload};
use crate::schema::{NormalizeError, Schema, normalize};
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use reqwest::Url;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Why a call failed
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// No response was obtained
    Transport(TransportError),
    /// The body was not JSON
    Malformed {
        /// Response status
        status: u16,
        /// Parser message
        reason: String,
    },
    /// Non-2xx status; the parsed body
    Server {
        /// Response status
        status: u16,
        /// Parsed JSON body, unrecased
        body: Value,
    },
    /// The body did not fit the schema
    Normalize(NormalizeError),
}

impl Rejection {
    /// Message for the failure action
    ///
    /// The server's non-empty string `error` field when there is one,
    /// `fallback` otherwise.
    #[must_use]
    pub fn message(&self, fallback: &str) -> String {
        match self {
            Self::Server { body, .. } => body
                .get("error")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or(fallback)
                .to_string(),
            Self::Transport(_) | Self::Malformed { .. } | Self::Normalize(_) => fallback.to_string(),
        }
    }

    const fn outcome_label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::Malformed { .. } => "malformed",
            Self::Server { .. } => "server_error",
            Self::Normalize(_) => "normalize_error",
        }
    }
}

/// A validated descriptor, ready to run
#[derive(Debug, Clone)]
pub struct PreparedCall {
    /// Lifecycle tags
    pub types: ActionTypes,
    /// The request to send
    pub request: ApiRequest,
    /// Schema for the response
    pub schema: Option<Schema>,
    /// Copied onto the failure action
    pub suppress_error: bool,
    /// Copied onto every lifecycle action
    pub fields: Map<String, Value>,
}

impl PreparedCall {
    /// The loading action dispatched before the request is sent
    #[must_use]
    pub fn request_action(&self) -> ApiAction {
        ApiAction::request(&self.types, self.fields.clone())
    }
}

/// Runs calls against one API
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ApiConfig>,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Client over `transport`
    #[must_use]
    pub fn new(config: ApiConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Validate a descriptor against `state` and build its request
    ///
    /// The endpoint is resolved here, once.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for an empty or invalid action type, an empty
    /// endpoint, or a URL that does not parse.
    pub fn prepare<S>(&self, call: CallApi<S>, state: &S) -> Result<PreparedCall, ApiError> {
        let types = ActionTypes::derive(&call.action_type)?;

        let endpoint = call.endpoint.resolve(state);
        if endpoint.is_empty() {
            return Err(ApiError::EmptyEndpoint {
                action_type: call.action_type,
            });
        }

        let mut options = call.options;
        options.merge(QueryOptions::from_json(&call.json_options)?);
        let url = build_url(&self.config.base_url, &endpoint, &options)?;

        Ok(PreparedCall {
            types,
            request: ApiRequest::new(call.method, url, call.payload),
            schema: call.schema,
            suppress_error: call.suppress_error,
            fields: call.fields,
        })
    }

    /// Perform a prepared call and produce its terminal action
    ///
    /// Never fails: every rejection becomes a failure action.
    #[tracing::instrument(
        skip(self, call),
        fields(action_type = %call.types.request, method = %call.request.method, url = %call.request.url)
    )]
    pub async fn execute(&self, call: PreparedCall) -> ApiAction {
        let PreparedCall {
            types,
            request,
            schema,
            suppress_error,
            fields,
        } = call;

        metrics::counter!("api.requests.total", "method" => request.method.to_string()).increment(1);
        let start = Instant::now();

        let settled = self.settle(request, schema.as_ref()).await;
        metrics::histogram!("api.request.duration_seconds").record(start.elapsed().as_secs_f64());

        match settled {
            Ok(payload) => {
                tracing::debug!("API call succeeded");
                metrics::counter!("api.responses.total", "outcome" => "success").increment(1);
                ApiAction::success(&types, payload, fields)
            },
            Err(rejection) => {
                let error = rejection.message(&self.config.fallback_error);
                tracing::warn!(rejection = ?rejection, error = %error, "API call failed");
                metrics::counter!("api.responses.total", "outcome" => rejection.outcome_label()).increment(1);
                ApiAction::failure(&types, error, suppress_error, fields)
            },
        }
    }

    /// Send, parse, recase and normalize
    async fn settle(&self, request: ApiRequest, schema: Option<&Schema>) -> Result<Payload, Rejection> {
        let response = self.transport.send(request).await.map_err(Rejection::Transport)?;
        let body = parse_body(&response)?;

        if !response.is_success() {
            return Err(Rejection::Server {
                status: response.status.as_u16(),
                body,
            });
        }

        let recased = camelize_keys(&body);
        match schema {
            Some(schema) => normalize(&recased, schema)
                .map(Payload::Normalized)
                .map_err(Rejection::Normalize),
            None => Ok(Payload::Raw(recased)),
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn parse_body(response: &ApiResponse) -> Result<Value, Rejection> {
    serde_json::from_slice(&response.body).map_err(|e| {
        // The API must answer with JSON even on errors.
        tracing::error!(
            status = response.status.as_u16(),
            error = %e,
            "API returned a body that is not JSON"
        );
        Rejection::Malformed {
            status: response.status.as_u16(),
            reason: e.to_string(),
        }
    })
}

/// `base_url + endpoint`, plus the form-encoded query when `options` is non-empty
///
/// # Errors
///
/// Returns [`ApiError::InvalidUrl`] when the result is not an absolute URL.
pub fn build_url(base_url: &str, endpoint: &str, options: &QueryOptions) -> Result<Url, ApiError> {
    let raw = format!("{base_url}{endpoint}");
    let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;

    if !options.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(options.iter().map(|(key, value)| (key, value.to_string())));
    }

    Ok(url)
}
