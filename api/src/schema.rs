//! Normalization schemas.
//!
//! A [`Schema`] describes where entities live in a response so that nested
//! records can be flattened into per-kind tables keyed by id. Each entity is
//! replaced by its id at the position it was found, and the same entity found
//! twice collapses into one record.
//!
//! ```
//! use press_api::schema::{normalize, EntitySchema, Schema};
//! use serde_json::json;
//!
//! let user = Schema::entity(EntitySchema::new("authors"));
//! let article = Schema::entity(EntitySchema::new("articles").define("author", user));
//!
//! let normalized = normalize(&json!({ "id": 1, "author": { "id": 9, "name": "A" } }), &article).unwrap();
//!
//! assert_eq!(normalized.result, json!(1));
//! assert_eq!(normalized.entity("authors", "9"), Some(&json!({ "id": 9, "name": "A" })));
//! assert_eq!(normalized.entity("articles", "1"), Some(&json!({ "id": 1, "author": 9 })));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Entity tables: kind → id → record
pub type Entities = BTreeMap<String, BTreeMap<String, Value>>;

/// Errors raised while flattening a response
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// An entity record has no usable id
    #[error("Entity of kind {kind} has no string or number {attribute} attribute")]
    MissingId {
        /// Entity kind
        kind: String,
        /// Id attribute that was looked up
        attribute: String,
    },
}

/// Definition of one entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    key: String,
    id_attribute: String,
    relations: BTreeMap<String, Schema>,
}

impl EntitySchema {
    /// Entity kind stored under `key`, identified by its `id` attribute
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id_attribute: "id".to_string(),
            relations: BTreeMap::new(),
        }
    }

    /// Use a different id attribute
    #[must_use]
    pub fn with_id_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.id_attribute = attribute.into();
        self
    }

    /// Declare that `field` holds nested data described by `schema`
    ///
    /// Field names are matched after recasing (`featuredMedia`, not
    /// `featured_media`).
    #[must_use]
    pub fn define(mut self, field: impl Into<String>, schema: Schema) -> Self {
        self.relations.insert(field.into(), schema);
        self
    }

    /// Entity kind
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn id_of(&self, record: &Map<String, Value>) -> Result<String, NormalizeError> {
        match record.get(&self.id_attribute) {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(NormalizeError::MissingId {
                kind: self.key.clone(),
                attribute: self.id_attribute.clone(),
            }),
        }
    }
}

/// Shape of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// A single entity
    Entity(EntitySchema),
    /// A list of values with the inner shape
    Array(Box<Schema>),
    /// A plain object whose named fields have the given shapes
    Object(BTreeMap<String, Schema>),
}

impl Schema {
    /// Single entity schema
    #[must_use]
    pub const fn entity(schema: EntitySchema) -> Self {
        Self::Entity(schema)
    }

    /// List of `inner`
    #[must_use]
    pub fn array(inner: Self) -> Self {
        Self::Array(Box::new(inner))
    }

    /// Plain object with the given shaped fields
    #[must_use]
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Object(fields.into_iter().map(|(key, schema)| (key.into(), schema)).collect())
    }

    /// Short description for logs, e.g. `[posts]`
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Entity(entity) => entity.key.clone(),
            Self::Array(inner) => format!("[{}]", inner.describe()),
            Self::Object(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(key, schema)| format!("{key}: {}", schema.describe()))
                    .collect();
                format!("{{{}}}", fields.join(", "))
            },
        }
    }
}

/// A flattened response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    /// Every entity found, by kind and stringified id
    pub entities: Entities,
    /// The input with each entity replaced by its id
    pub result: Value,
}

impl Normalized {
    /// Look up one entity
    #[must_use]
    pub fn entity(&self, kind: &str, id: &str) -> Option<&Value> {
        self.entities.get(kind).and_then(|table| table.get(id))
    }

    /// Ids referenced by `result`, stringified, in order
    ///
    /// A scalar result yields one id; a list yields its scalar elements.
    #[must_use]
    pub fn result_ids(&self) -> Vec<String> {
        match &self.result {
            Value::Array(items) => items.iter().filter_map(id_string).collect(),
            scalar => id_string(scalar).into_iter().collect(),
        }
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Flatten `value` according to `schema`
///
/// Pure and deterministic; `value` is not modified. Values at an entity
/// position that are not objects are taken to be ids already, so flat data
/// normalizes to itself.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingId`] when an entity record has no id.
pub fn normalize(value: &Value, schema: &Schema) -> Result<Normalized, NormalizeError> {
    let mut entities = Entities::new();
    let result = visit(value, schema, &mut entities)?;
    Ok(Normalized { entities, result })
}

fn visit(value: &Value, schema: &Schema, entities: &mut Entities) -> Result<Value, NormalizeError> {
    match schema {
        Schema::Entity(entity) => visit_entity(value, entity, entities),
        Schema::Array(inner) => match value {
            Value::Array(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| visit(item, inner, entities))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            // Keyed collections normalize like a list of their values
            Value::Object(map) => map
                .values()
                .filter(|item| !item.is_null())
                .map(|item| visit(item, inner, entities))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        },
        Schema::Object(fields) => match value {
            Value::Object(map) => {
                let mut out = map.clone();
                visit_fields(&mut out, fields, entities)?;
                Ok(Value::Object(out))
            },
            other => Ok(other.clone()),
        },
    }
}

fn visit_entity(
    value: &Value,
    schema: &EntitySchema,
    entities: &mut Entities,
) -> Result<Value, NormalizeError> {
    let Value::Object(record) = value else {
        return Ok(value.clone());
    };

    let id = schema.id_of(record)?;
    let mut flat = record.clone();
    visit_fields(&mut flat, &schema.relations, entities)?;

    let table = entities.entry(schema.key.clone()).or_default();
    match table.get_mut(&id) {
        Some(Value::Object(existing)) => existing.extend(flat),
        _ => {
            table.insert(id, Value::Object(flat));
        },
    }

    Ok(record
        .get(&schema.id_attribute)
        .cloned()
        .unwrap_or(Value::Null))
}

fn visit_fields(
    record: &mut Map<String, Value>,
    fields: &BTreeMap<String, Schema>,
    entities: &mut Entities,
) -> Result<(), NormalizeError> {
    for (field, schema) in fields {
        if let Some(nested) = record.get(field).filter(|nested| !nested.is_null()) {
            let replaced = visit(nested, schema, entities)?;
            record.insert(field.clone(), replaced);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn article() -> Schema {
        let author = Schema::entity(EntitySchema::new("authors"));
        Schema::entity(EntitySchema::new("articles").define("author", author))
    }

    #[test]
    fn test_nested_entity_is_flattened() {
        let normalized = normalize(&json!({ "id": 1, "author": { "id": 9, "name": "A" } }), &article()).unwrap();

        assert_eq!(normalized.entity("authors", "9"), Some(&json!({ "id": 9, "name": "A" })));
        assert_eq!(normalized.entity("articles", "1"), Some(&json!({ "id": 1, "author": 9 })));
        assert_eq!(normalized.result, json!(1));
    }

    #[test]
    fn test_renormalizing_flat_data_is_noop() {
        let normalized = normalize(&json!({ "id": 1, "author": { "id": 9, "name": "A" } }), &article()).unwrap();
        let flat = normalized.entity("articles", "1").unwrap().clone();

        let again = normalize(&flat, &article()).unwrap();
        assert_eq!(again.result, json!(1));
        assert_eq!(again.entity("articles", "1"), Some(&flat));
        assert!(!again.entities.contains_key("authors"));
    }

    #[test]
    fn test_duplicate_entities_collapse() {
        let schema = Schema::array(article());
        let body = json!([
            { "id": 1, "author": { "id": 9, "name": "A" } },
            { "id": 2, "author": { "id": 9, "avatar": "a.png" } }
        ]);

        let normalized = normalize(&body, &schema).unwrap();
        assert_eq!(normalized.result, json!([1, 2]));
        assert_eq!(normalized.entities["authors"].len(), 1);
        assert_eq!(
            normalized.entity("authors", "9"),
            Some(&json!({ "id": 9, "name": "A", "avatar": "a.png" }))
        );
        assert_eq!(normalized.result_ids(), vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_string_ids_and_custom_attribute() {
        let schema = Schema::entity(EntitySchema::new("media").with_id_attribute("slug"));
        let normalized = normalize(&json!({ "slug": "hero", "width": 1200 }), &schema).unwrap();
        assert_eq!(normalized.result, json!("hero"));
        assert_eq!(normalized.result_ids(), vec!["hero".to_string()]);
    }

    #[test]
    fn test_missing_id() {
        let err = normalize(&json!({ "name": "nobody" }), &article()).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingId {
                kind: "articles".to_string(),
                attribute: "id".to_string()
            }
        );
    }

    #[test]
    fn test_object_schema_and_nulls() {
        let schema = Schema::object([("items", Schema::array(article())), ("featured", article())]);
        let body = json!({
            "items": [{ "id": 3, "author": null }, null],
            "featured": null,
            "total": 1
        });

        let normalized = normalize(&body, &schema).unwrap();
        assert_eq!(normalized.result, json!({ "items": [3], "featured": null, "total": 1 }));
        assert_eq!(normalized.entity("articles", "3"), Some(&json!({ "id": 3, "author": null })));
    }

    #[test]
    fn test_describe() {
        assert_eq!(Schema::array(article()).describe(), "[articles]");
    }
}
