//! Property-based tests for response recasing and normalization.
//!
//! - Recasing is deterministic and does not touch values
//! - Camel-cased output is a fixed point
//! - Constant keys are lowercased verbatim, and recased again on a second pass
//! - Normalizing flat records again changes nothing

use press_api::casing::{camelize_key, camelize_keys};
use press_api::schema::{normalize, EntitySchema, Schema};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn snake_key() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,6}(_[a-z0-9]{1,6}){0,3}").unwrap()
}

fn constant_key() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9_]{0,10}").unwrap()
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-zA-Z_ ]{0,12}".prop_map(Value::String),
    ]
}

fn body() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((snake_key(), inner), 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn count_scalars(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.values().map(count_scalars).sum(),
        Value::Array(items) => items.iter().map(count_scalars).sum(),
        _ => 1,
    }
}

// =============================================================================
// RECASING PROPERTIES
// =============================================================================

proptest! {
    /// Recasing camel-cased output again is a no-op
    #[test]
    fn recasing_is_idempotent(value in body()) {
        let once = camelize_keys(&value);
        let twice = camelize_keys(&once);
        prop_assert_eq!(once, twice);
    }

    /// Same input, same output; input untouched
    #[test]
    fn recasing_is_deterministic(value in body()) {
        let copy = value.clone();
        prop_assert_eq!(camelize_keys(&value), camelize_keys(&value));
        prop_assert_eq!(value, copy);
    }

    /// Only keys change, never the leaves
    #[test]
    fn recasing_preserves_leaves(value in body()) {
        let recased = camelize_keys(&value);
        // Distinct keys may collapse (`a_b` and `aB`), so compare with <=
        prop_assert!(count_scalars(&recased) <= count_scalars(&value));
    }

    /// Snake-case keys lose their underscores
    #[test]
    fn snake_keys_become_camel(key in snake_key()) {
        let camel = camelize_key(&key);
        prop_assert!(!camel.contains('_'));
        prop_assert_eq!(camelize_key(&camel), camel.clone());
    }

    /// Constant keys are lowercased verbatim
    #[test]
    fn constant_keys_are_lowercased(key in constant_key()) {
        prop_assert_eq!(camelize_key(&key), key.to_ascii_lowercase());
    }
}

proptest! {
    /// Keys without separators only lose their leading capital
    #[test]
    fn separator_free_keys_keep_inner_case(key in "[a-zA-Z][a-zA-Z0-9:.]{0,10}") {
        prop_assume!(!key.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        let camel = camelize_key(&key);
        prop_assert_eq!(&camel[1..], &key[1..]);
        prop_assert_eq!(camelize_key(&camel), camel.clone());
    }

    /// A lowercased constant key with an underscore is recased again on a
    /// second pass, so the fixed point only holds once constants are gone
    #[test]
    fn constant_keys_recase_again_on_second_pass(
        head in "[A-Z][A-Z0-9]{0,4}",
        tail in "[A-Z][A-Z0-9]{0,4}",
    ) {
        let key = format!("{head}_{tail}");
        let once = camelize_key(&key);
        prop_assert_eq!(&once, &key.to_ascii_lowercase());

        let twice = camelize_key(&once);
        prop_assert_ne!(&twice, &once);
        prop_assert!(!twice.contains('_'));
        prop_assert_eq!(camelize_key(&twice), twice.clone());
    }
}

#[test]
fn constant_key_second_pass_example() {
    let once = camelize_keys(&json!({ "STATUS_CODE": 404 }));
    assert_eq!(once, json!({ "status_code": 404 }));
    assert_eq!(camelize_keys(&once), json!({ "statusCode": 404 }));
}

#[test]
fn status_code_example() {
    assert_eq!(
        camelize_keys(&json!({ "STATUS_CODE": 404, "error_message": "x" })),
        json!({ "status_code": 404, "errorMessage": "x" })
    );
}

// =============================================================================
// NORMALIZATION PROPERTIES
// =============================================================================

fn article() -> Schema {
    Schema::entity(EntitySchema::new("articles").define("author", Schema::entity(EntitySchema::new("authors"))))
}

proptest! {
    /// Flattened records normalize to themselves
    #[test]
    fn renormalizing_flat_records_is_noop(id in 1u32..10_000, author in 1u32..10_000, name in "[a-zA-Z ]{0,12}") {
        let nested = json!({ "id": id, "author": { "id": author, "name": name } });
        let first = normalize(&nested, &article()).unwrap();

        let flat = first.entity("articles", &id.to_string()).unwrap().clone();
        let second = normalize(&flat, &article()).unwrap();

        prop_assert_eq!(&second.result, &first.result);
        prop_assert_eq!(second.entity("articles", &id.to_string()), Some(&flat));
        prop_assert!(second.entity("authors", &author.to_string()).is_none());
    }

    /// Normalization is pure
    #[test]
    fn normalization_is_deterministic(ids in prop::collection::vec(1u32..50, 0..8)) {
        let body = Value::Array(ids.iter().map(|id| json!({ "id": id, "author": { "id": id % 3 } })).collect());
        let schema = Schema::array(article());
        prop_assert_eq!(normalize(&body, &schema).unwrap(), normalize(&body, &schema).unwrap());
    }
}
