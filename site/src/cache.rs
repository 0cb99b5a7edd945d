//! Normalized entity cache.
//!
//! Records are stored per kind and id exactly as the normalizer produced
//! them. A record that arrives again is shallow-merged into the cached one,
//! so a list response with partial fields never erases the richer copy a
//! single-record response left behind.

use press_api::schema::Entities;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Cached entities plus the ordered ids of the latest list per request family
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCache {
    tables: Entities,
    listings: BTreeMap<String, Vec<String>>,
}

impl EntityCache {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, merging its top-level fields into any cached copy
    ///
    /// Non-object records replace whatever was cached.
    pub fn upsert(&mut self, kind: &str, id: &str, record: Value) {
        let table = self.tables.entry(kind.to_string()).or_default();
        match table.entry(id.to_string()) {
            Entry::Occupied(mut slot) => match (slot.get_mut(), record) {
                (Value::Object(cached), Value::Object(incoming)) => cached.extend(incoming),
                (cached, record) => *cached = record,
            },
            Entry::Vacant(slot) => {
                slot.insert(record);
            },
        }
    }

    /// Merge every table of a normalized response
    pub fn merge_entities(&mut self, entities: Entities) {
        for (kind, table) in entities {
            for (id, record) in table {
                self.upsert(&kind, &id, record);
            }
        }
    }

    /// Remember the ids a list call returned, replacing the previous list
    pub fn record_listing(&mut self, family: &str, ids: Vec<String>) {
        self.listings.insert(family.to_string(), ids);
    }

    /// Ids of the latest list for `family`, in response order
    #[must_use]
    pub fn listing(&self, family: &str) -> &[String] {
        self.listings.get(family).map(Vec::as_slice).unwrap_or_default()
    }

    /// Look up one record
    #[must_use]
    pub fn get(&self, kind: &str, id: &str) -> Option<&Value> {
        self.tables.get(kind).and_then(|table| table.get(id))
    }

    /// Whether a record is cached
    #[must_use]
    pub fn contains(&self, kind: &str, id: &str) -> bool {
        self.get(kind, id).is_some()
    }

    /// Number of cached records of `kind`
    #[must_use]
    pub fn len(&self, kind: &str) -> usize {
        self.tables.get(kind).map_or(0, BTreeMap::len)
    }

    /// Whether nothing at all is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upsert_merges_fields() {
        let mut cache = EntityCache::new();
        cache.upsert("posts", "1", json!({ "id": 1, "title": "Old", "content": "Body" }));
        cache.upsert("posts", "1", json!({ "id": 1, "title": "New" }));

        assert_eq!(
            cache.get("posts", "1"),
            Some(&json!({ "id": 1, "title": "New", "content": "Body" }))
        );
        assert_eq!(cache.len("posts"), 1);
    }

    #[test]
    fn test_non_object_replaces() {
        let mut cache = EntityCache::new();
        cache.upsert("media", "4", json!({ "id": 4 }));
        cache.upsert("media", "4", json!(4));
        assert_eq!(cache.get("media", "4"), Some(&json!(4)));
    }

    #[test]
    fn test_merge_entities() {
        let mut entities = Entities::new();
        entities
            .entry("pages".to_string())
            .or_default()
            .insert("7".to_string(), json!({ "id": 7, "slug": "about" }));
        entities
            .entry("users".to_string())
            .or_default()
            .insert("3".to_string(), json!({ "id": 3 }));

        let mut cache = EntityCache::new();
        assert!(cache.is_empty());
        cache.merge_entities(entities);

        assert!(cache.contains("pages", "7"));
        assert!(cache.contains("users", "3"));
        assert!(!cache.contains("pages", "3"));
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_listing_is_replaced() {
        let mut cache = EntityCache::new();
        assert!(cache.listing("FETCH_POSTS").is_empty());

        cache.record_listing("FETCH_POSTS", vec!["2".into(), "1".into()]);
        cache.record_listing("FETCH_POSTS", vec!["3".into()]);
        assert_eq!(cache.listing("FETCH_POSTS"), ["3".to_string()]);
    }
}
