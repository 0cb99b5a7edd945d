//! Error types for the Call API middleware

use press_core::MiddlewareError;
use thiserror::Error;

/// Malformed call descriptors
///
/// Raised while a descriptor is being prepared, before any network I/O.
/// These are programmer errors: the store returns them from `send` instead
/// of dispatching a failure action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Descriptor has an empty action type
    #[error("Expected a non-empty action type")]
    EmptyActionType,

    /// The lifecycle triple is not three distinct, non-empty tags
    #[error("Expected three distinct, non-empty action types: {0}")]
    InvalidActionTypes(String),

    /// Endpoint resolved to an empty string
    #[error("Specify a string endpoint URL (action type {action_type})")]
    EmptyEndpoint {
        /// Base action type of the offending descriptor
        action_type: String,
    },

    /// Base URL and endpoint do not form a valid absolute URL
    #[error("Invalid request URL {url}: {reason}")]
    InvalidUrl {
        /// The concatenated URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// A query option is not a primitive value
    #[error("Query option {key} must be a string, number or boolean")]
    InvalidOption {
        /// Option key
        key: String,
    },
}

impl From<ApiError> for MiddlewareError {
    fn from(error: ApiError) -> Self {
        Self::Configuration {
            stage: crate::middleware::STAGE_NAME,
            message: error.to_string(),
        }
    }
}
