//! Request lifecycle actions.
//!
//! Every call produces a request action (`T`, loading) followed by exactly
//! one terminal action (`T_SUCCESS` or `T_FAILURE`). Reducers key their
//! loading, error and cache state off these three tags.

use crate::descriptor::CallApi;
use crate::error::ApiError;
use crate::schema::Normalized;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Suffix of the success tag
pub const SUCCESS_SUFFIX: &str = "_SUCCESS";

/// Suffix of the failure tag
pub const FAILURE_SUFFIX: &str = "_FAILURE";

/// Position of a tag in the lifecycle triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Call started
    Request,
    /// Call settled with a response
    Success,
    /// Call settled with an error
    Failure,
}

/// The three tags of one request family, in fixed order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTypes {
    /// `T`
    pub request: String,
    /// `T_SUCCESS`
    pub success: String,
    /// `T_FAILURE`
    pub failure: String,
}

impl ActionTypes {
    /// Derive `T`, `T_SUCCESS`, `T_FAILURE` from a base type
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::EmptyActionType`] when `base` is empty.
    pub fn derive(base: &str) -> Result<Self, ApiError> {
        if base.is_empty() {
            return Err(ApiError::EmptyActionType);
        }

        Self::new(
            base.to_string(),
            format!("{base}{SUCCESS_SUFFIX}"),
            format!("{base}{FAILURE_SUFFIX}"),
        )
    }

    /// Build a triple from explicit tags
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidActionTypes`] unless all three tags are
    /// non-empty and pairwise distinct.
    pub fn new(request: String, success: String, failure: String) -> Result<Self, ApiError> {
        if request.is_empty() || success.is_empty() || failure.is_empty() {
            return Err(ApiError::InvalidActionTypes(format!(
                "[{request:?}, {success:?}, {failure:?}] contains an empty tag"
            )));
        }
        if request == success || request == failure || success == failure {
            return Err(ApiError::InvalidActionTypes(format!(
                "[{request:?}, {success:?}, {failure:?}] contains duplicates"
            )));
        }

        Ok(Self {
            request,
            success,
            failure,
        })
    }

    /// Which phase `tag` is in this family, if any
    #[must_use]
    pub fn phase_of(&self, tag: &str) -> Option<Phase> {
        if tag == self.request {
            Some(Phase::Request)
        } else if tag == self.success {
            Some(Phase::Success)
        } else if tag == self.failure {
            Some(Phase::Failure)
        } else {
            None
        }
    }

    /// Split any lifecycle tag into its base type and phase
    ///
    /// ```
    /// use press_api::lifecycle::{ActionTypes, Phase};
    ///
    /// assert_eq!(ActionTypes::split("FETCH_POSTS_FAILURE"), ("FETCH_POSTS", Phase::Failure));
    /// assert_eq!(ActionTypes::split("FETCH_POSTS"), ("FETCH_POSTS", Phase::Request));
    /// ```
    #[must_use]
    pub fn split(tag: &str) -> (&str, Phase) {
        if let Some(base) = tag.strip_suffix(SUCCESS_SUFFIX).filter(|base| !base.is_empty()) {
            (base, Phase::Success)
        } else if let Some(base) = tag.strip_suffix(FAILURE_SUFFIX).filter(|base| !base.is_empty()) {
            (base, Phase::Failure)
        } else {
            (tag, Phase::Request)
        }
    }
}

/// Body of a successful call
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Flattened with the descriptor's schema
    Normalized(Normalized),
    /// Recased body, no schema given
    Raw(Value),
}

impl Payload {
    /// The body's own `success` field, when the body is an object that has one
    #[must_use]
    pub fn success_flag(&self) -> Option<Value> {
        match self {
            Self::Raw(Value::Object(body)) => body.get("success").cloned(),
            Self::Raw(_) | Self::Normalized(_) => None,
        }
    }

    /// The normalized payload, if a schema was applied
    #[must_use]
    pub const fn normalized(&self) -> Option<&Normalized> {
        match self {
            Self::Normalized(normalized) => Some(normalized),
            Self::Raw(_) => None,
        }
    }
}

/// What a lifecycle action reports
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    /// Request started
    Pending,
    /// Call succeeded
    Success {
        /// Recased or normalized body
        response: Payload,
        /// The body's `success` field, if present
        success: Option<Value>,
    },
    /// Call failed
    Failure {
        /// Server-supplied message or the fallback
        error: String,
        /// Copied from the descriptor
        suppress_error: bool,
    },
}

/// A request, success or failure action
#[derive(Debug, Clone, PartialEq)]
pub struct ApiAction {
    /// One tag of the lifecycle triple
    pub action_type: String,
    /// `true` only on the request action
    pub is_loading: bool,
    /// Phase-specific data
    pub outcome: ApiOutcome,
    /// Custom fields copied from the descriptor
    pub fields: Map<String, Value>,
}

impl ApiAction {
    /// The request action for a call
    #[must_use]
    pub fn request(types: &ActionTypes, fields: Map<String, Value>) -> Self {
        Self {
            action_type: types.request.clone(),
            is_loading: true,
            outcome: ApiOutcome::Pending,
            fields,
        }
    }

    /// The success action for a call
    #[must_use]
    pub fn success(types: &ActionTypes, response: Payload, fields: Map<String, Value>) -> Self {
        let success = response.success_flag();
        Self {
            action_type: types.success.clone(),
            is_loading: false,
            outcome: ApiOutcome::Success { response, success },
            fields,
        }
    }

    /// The failure action for a call
    #[must_use]
    pub fn failure(
        types: &ActionTypes,
        error: impl Into<String>,
        suppress_error: bool,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            action_type: types.failure.clone(),
            is_loading: false,
            outcome: ApiOutcome::Failure {
                error: error.into(),
                suppress_error,
            },
            fields,
        }
    }

    /// Base type and phase of this action
    #[must_use]
    pub fn split_type(&self) -> (&str, Phase) {
        let (base, phase) = ActionTypes::split(&self.action_type);
        // Trust the outcome over the tag for families whose base already ends in a suffix
        match (&self.outcome, phase) {
            (ApiOutcome::Pending, Phase::Success | Phase::Failure) => (&self.action_type, Phase::Request),
            _ => (base, phase),
        }
    }

    /// Whether this is a terminal (success or failure) action
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self.outcome, ApiOutcome::Pending)
    }

    /// Response payload of a success action
    #[must_use]
    pub const fn response(&self) -> Option<&Payload> {
        match &self.outcome {
            ApiOutcome::Success { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Error message of a failure action
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ApiOutcome::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    /// A custom field copied from the descriptor
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Serializes to the flat `{ type, isLoading, response?, success?, error?, suppressError?, ...fields }` shape
impl Serialize for ApiAction {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.fields {
            if !matches!(
                key.as_str(),
                "type" | "isLoading" | "response" | "success" | "error" | "suppressError"
            ) {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry("type", &self.action_type)?;
        map.serialize_entry("isLoading", &self.is_loading)?;
        match &self.outcome {
            ApiOutcome::Pending => {},
            ApiOutcome::Success { response, success } => {
                map.serialize_entry("response", response)?;
                if let Some(success) = success {
                    map.serialize_entry("success", success)?;
                }
            },
            ApiOutcome::Failure {
                error,
                suppress_error,
            } => {
                map.serialize_entry("suppressError", suppress_error)?;
                map.serialize_entry("error", error)?;
            },
        }
        map.end()
    }
}

/// Action types that can carry call descriptors and lifecycle actions
///
/// The API middleware uses this to pick descriptors out of the action
/// stream and to wrap the lifecycle actions it dispatches.
///
/// ```
/// use press_api::{ApiAction, ApiActionKind, CallApi};
///
/// #[derive(Clone, Debug)]
/// enum Action {
///     Call(CallApi<()>),
///     Api(ApiAction),
///     Refresh,
/// }
///
/// impl ApiActionKind<()> for Action {
///     fn try_into_call(self) -> Result<CallApi<()>, Self> {
///         match self {
///             Self::Call(call) => Ok(call),
///             other => Err(other),
///         }
///     }
///
///     fn from_api(action: ApiAction) -> Self {
///         Self::Api(action)
///     }
/// }
///
/// assert!(Action::Refresh.try_into_call().is_err());
/// ```
pub trait ApiActionKind<S>: Sized {
    /// Take the descriptor out of the action, or give the action back
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` when the action is not a descriptor.
    fn try_into_call(self) -> Result<CallApi<S>, Self>;

    /// Wrap a lifecycle action
    fn from_api(action: ApiAction) -> Self;
}
