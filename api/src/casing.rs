//! Response key recasing.
//!
//! Every object key in a response body is camelized, at any depth: each run
//! of `-`, `_` or whitespace is dropped and the character after it is
//! uppercased, then the first character is lowercased. Nothing else about
//! the key changes, so `post_ID` becomes `postID` and `wp:action-publish`
//! becomes `wp:actionPublish`. Numeric keys are left alone. Keys made only
//! of uppercase letters, digits and underscores (flag names such as
//! `STATUS_CODE`) are lowercased verbatim instead.
//!
//! Camelized output is a fixed point: recasing it again changes nothing.
//! Lowercased constant keys are the exception, since `status_code` is an
//! ordinary snake_case key on a second pass.

use serde_json::{Map, Value};

/// Recase every object key in `value`
///
/// Arrays are walked element by element; scalars are copied. The input is
/// not modified.
///
/// ```
/// use press_api::casing::camelize_keys;
/// use serde_json::json;
///
/// let body = json!({ "featured_media": 12, "STATUS_CODE": 200, "_links": [{ "wp:action-publish": "/" }] });
/// assert_eq!(
///     camelize_keys(&body),
///     json!({ "featuredMedia": 12, "status_code": 200, "links": [{ "wp:actionPublish": "/" }] })
/// );
/// ```
#[must_use]
pub fn camelize_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (camelize_key(key), camelize_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(camelize_keys).collect()),
        scalar => scalar.clone(),
    }
}

/// Recase a single key
#[must_use]
pub fn camelize_key(key: &str) -> String {
    if is_constant_key(key) {
        return key.to_ascii_lowercase();
    }
    if is_numeric_key(key) {
        return key.to_string();
    }

    let mut camel = String::with_capacity(key.len());
    let mut after_separator = false;
    for c in key.chars() {
        if is_separator(c) {
            after_separator = true;
        } else if after_separator {
            camel.extend(c.to_uppercase());
            after_separator = false;
        } else {
            camel.push(c);
        }
    }

    let mut chars = camel.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

/// `^[A-Z0-9_]+$`
fn is_constant_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Keys that read as a number, such as `404` or `1.5`
fn is_numeric_key(key: &str) -> bool {
    let trimmed = key.trim();
    trimmed.is_empty() || trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '_' || c.is_whitespace()
}
