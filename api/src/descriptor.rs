//! Call descriptors.
//!
//! A [`CallApi`] is a declarative description of one HTTP call. Producer code
//! builds it and dispatches it like any other action; the API middleware
//! recognizes it, runs the call and replaces it with lifecycle actions.

use crate::error::ApiError;
use crate::schema::Schema;
use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Name of the descriptor variant, used in logs and serialized actions
pub const CALL_API: &str = "Call API";

/// Where a call is sent, relative to the configured base URL
pub enum Endpoint<S> {
    /// A fixed path such as `/wp/v2/pages/7`
    Path(String),
    /// Computed from the store state when the descriptor is dispatched
    Resolve(Arc<dyn Fn(&S) -> String + Send + Sync>),
}

impl<S> Endpoint<S> {
    /// Resolve against the current state
    ///
    /// A resolver is invoked exactly once per call.
    pub fn resolve(&self, state: &S) -> String {
        match self {
            Self::Path(path) => path.clone(),
            Self::Resolve(resolver) => resolver(state),
        }
    }
}

impl<S> Clone for Endpoint<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Path(path) => Self::Path(path.clone()),
            Self::Resolve(resolver) => Self::Resolve(Arc::clone(resolver)),
        }
    }
}

impl<S> fmt::Debug for Endpoint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Endpoint::Path").field(path).finish(),
            Self::Resolve(_) => write!(f, "Endpoint::Resolve(<fn>)"),
        }
    }
}

impl<S> From<&str> for Endpoint<S> {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl<S> From<String> for Endpoint<S> {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

/// A primitive query string value
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Text
    String(String),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// `true` / `false`
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered query options for one call
///
/// Serialized into the query string in insertion order. Inserting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions(Vec<(String, QueryValue)>);

impl QueryOptions {
    /// Empty options
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Set `key` to `value`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    /// Build options from a JSON object
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidOption`] for `null`, array or object values.
    pub fn from_json(options: &Map<String, Value>) -> Result<Self, ApiError> {
        let mut query = Self::new();
        for (key, value) in options {
            let value = match value {
                Value::String(text) => QueryValue::String(text.clone()),
                Value::Bool(flag) => QueryValue::Bool(*flag),
                Value::Number(number) => number
                    .as_i64()
                    .map(QueryValue::Integer)
                    .or_else(|| number.as_f64().map(QueryValue::Float))
                    .ok_or_else(|| ApiError::InvalidOption { key: key.clone() })?,
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(ApiError::InvalidOption { key: key.clone() });
                },
            };
            query.insert(key.clone(), value);
        }
        Ok(query)
    }

    /// Whether no options are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Insert every option of `other`, in its order
    pub fn merge(&mut self, other: Self) {
        for (key, value) in other.0 {
            self.insert(key, value);
        }
    }
}

/// A declarative HTTP call carried through the store pipeline
///
/// # Example
///
/// ```
/// use press_api::CallApi;
///
/// let call: CallApi<()> = CallApi::new("FETCH_POSTS", "/posts")
///     .with_option("per_page", 5_i64)
///     .with_field("page", 2);
/// assert_eq!(call.action_type, "FETCH_POSTS");
/// assert_eq!(call.method, reqwest::Method::GET);
/// ```
pub struct CallApi<S> {
    /// Base action type `T`; lifecycle tags are `T`, `T_SUCCESS`, `T_FAILURE`
    pub action_type: String,
    /// Endpoint path or resolver
    pub endpoint: Endpoint<S>,
    /// How to flatten the response; `None` keeps the recased body
    pub schema: Option<Schema>,
    /// HTTP method (default `GET`)
    pub method: Method,
    /// JSON body; never sent for `GET` and `DELETE`
    pub payload: Option<Value>,
    /// Query string options
    pub options: QueryOptions,
    /// Untyped query options, checked when the call is prepared and
    /// applied after `options`
    pub json_options: Map<String, Value>,
    /// Tells consumers not to surface a failure to the user
    pub suppress_error: bool,
    /// Custom fields copied onto every lifecycle action
    pub fields: Map<String, Value>,
}

impl<S> CallApi<S> {
    /// A `GET` call to a fixed endpoint
    #[must_use]
    pub fn new(action_type: impl Into<String>, endpoint: impl Into<Endpoint<S>>) -> Self {
        Self {
            action_type: action_type.into(),
            endpoint: endpoint.into(),
            schema: None,
            method: Method::GET,
            payload: None,
            options: QueryOptions::new(),
            json_options: Map::new(),
            suppress_error: false,
            fields: Map::new(),
        }
    }

    /// A `GET` call whose endpoint is computed from the state at dispatch
    #[must_use]
    pub fn resolve<F>(action_type: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        Self::new(action_type, Endpoint::Resolve(Arc::new(resolver)))
    }

    /// Normalize the response with `schema`
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Use `method` instead of `GET`
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Attach a JSON body
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Add a query option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.options.insert(key, value);
        self
    }

    /// Replace all query options
    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a query option from arbitrary JSON
    ///
    /// Only strings, numbers and booleans are valid. Anything else makes
    /// the descriptor malformed and is refused when it is dispatched.
    #[must_use]
    pub fn with_json_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.json_options.insert(key.into(), value.into());
        self
    }

    /// Mark failures of this call as not user-facing
    #[must_use]
    pub const fn with_suppress_error(mut self, suppress: bool) -> Self {
        self.suppress_error = suppress;
        self
    }

    /// Add a custom field copied onto the lifecycle actions
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl<S> Clone for CallApi<S> {
    fn clone(&self) -> Self {
        Self {
            action_type: self.action_type.clone(),
            endpoint: self.endpoint.clone(),
            schema: self.schema.clone(),
            method: self.method.clone(),
            payload: self.payload.clone(),
            options: self.options.clone(),
            json_options: self.json_options.clone(),
            suppress_error: self.suppress_error,
            fields: self.fields.clone(),
        }
    }
}

impl<S> fmt::Debug for CallApi<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(CALL_API)
            .field("action_type", &self.action_type)
            .field("endpoint", &self.endpoint)
            .field("method", &self.method)
            .field("schema", &self.schema.as_ref().map(Schema::describe))
            .field("options", &self.options)
            .field("json_options", &self.json_options)
            .field("suppress_error", &self.suppress_error)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
