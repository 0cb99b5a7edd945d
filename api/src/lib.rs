//! # Composable Press Call API
//!
//! Declarative HTTP calls for the Composable Press store.
//!
//! Producer code dispatches a [`CallApi`] descriptor. The [`ApiMiddleware`]
//! stage intercepts it, dispatches the request action (`T`, loading), runs
//! the call and dispatches exactly one of `T_SUCCESS` (recased, optionally
//! normalized body) or `T_FAILURE` (uniform error message).
//!
//! ## Example
//!
//! ```no_run
//! use press_api::{ApiConfig, ApiMiddleware, CallApi, HttpTransport};
//! use press_api::schema::{EntitySchema, Schema};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiMiddleware::new(ApiConfig::from_env(), Arc::new(HttpTransport::new()?));
//!
//! let fetch_posts: CallApi<()> = CallApi::new("FETCH_POSTS", "/posts")
//!     .with_schema(Schema::array(Schema::entity(EntitySchema::new("posts"))))
//!     .with_option("per_page", 10_i64);
//! # let _ = (api, fetch_posts);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - `descriptor`: the call descriptor and query options
//! - `lifecycle`: action triple, lifecycle actions, [`ApiActionKind`]
//! - `casing` / `schema`: response recasing and normalization
//! - `transport` / `client`: request building and settlement
//! - `middleware`: the pipeline stage

pub mod casing;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod schema;
pub mod transport;

// Re-export main types for convenience
pub use client::{ApiClient, PreparedCall, Rejection};
pub use config::ApiConfig;
pub use descriptor::{CALL_API, CallApi, Endpoint, QueryOptions, QueryValue};
pub use error::ApiError;
pub use lifecycle::{ActionTypes, ApiAction, ApiActionKind, ApiOutcome, Payload, Phase};
pub use middleware::ApiMiddleware;
pub use schema::{EntitySchema, Normalized, NormalizeError, Schema};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportError};
