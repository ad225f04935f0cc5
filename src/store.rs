//! Document store boundary
//!
//! The engine talks to the store through a narrow RPC surface: issue a
//! filtered, projected query against a named collection and stream the
//! matching documents back in server order. The wire protocol behind that
//! surface is opaque; backends implement [`StoreConnector`] and
//! [`StoreConnection`]. An in-memory backend ships here for tests and
//! embedding.

use crate::error::Result;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One result document: a nested key/value tree with typed scalars, arrays,
/// and sub-documents. Read-only once produced, discarded after decode.
pub type Document = serde_json::Map<String, Value>;

/// Ordered field selection for a query response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<(String, bool)>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projection selecting exactly one field.
    pub fn select(field: impl Into<String>) -> Self {
        Self::new().with(field, true)
    }

    pub fn with(mut self, field: impl Into<String>, selected: bool) -> Self {
        self.fields.push((field.into(), selected));
        self
    }

    /// Fields in declaration order with their selection flags.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.fields.iter().map(|(f, s)| (f.as_str(), *s))
    }
}

/// One query: collection, equality filter, and projection. Constructed per
/// call, never cached.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub collection: String,
    pub filter: Document,
    pub projection: Projection,
}

impl QuerySpec {
    pub fn new(collection: impl Into<String>, filter: Document, projection: Projection) -> Self {
        Self {
            collection: collection.into(),
            filter,
            projection,
        }
    }
}

/// Single-field equality filter, the only filter shape this module issues.
pub fn eq_filter(field: &str, value: &str) -> Document {
    let mut doc = Document::new();
    doc.insert(field.to_string(), Value::String(value.to_string()));
    doc
}

/// Streaming cursor over a query response. Borrows the issuing connection
/// until dropped.
pub type DocumentStream<'c> = Box<dyn Iterator<Item = Document> + Send + 'c>;

/// Outcome of issuing one query on a connection.
pub enum QueryReply<'c> {
    /// The query could not be executed (transport/protocol failure). By
    /// policy this reads as zero matching documents, not as an error.
    NoReply,
    /// The reply arrived but the result cursor could not be opened. This is
    /// an operational failure, distinct from "no documents".
    CursorFailed,
    /// Matching documents, in server order.
    Cursor(DocumentStream<'c>),
}

/// A live store session. Owned by exactly one caller between pool borrow and
/// release.
pub trait StoreConnection: Send {
    /// Enable or disable transparent reconnection on this session.
    fn set_auto_reconnect(&mut self, enabled: bool);

    /// Issue a filtered, projected query against `spec.collection`.
    fn query(&mut self, spec: &QuerySpec) -> QueryReply<'_>;
}

/// Dials new store sessions; used once at pool construction.
pub trait StoreConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn StoreConnection>>;
}

/// In-memory document store.
///
/// Matches the exact-equality filter shape the module issues; good enough for
/// tests and embedded use, not a general query engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to a collection, creating the collection on first
    /// use. Documents are returned in insertion order.
    pub fn insert(&self, collection: &str, doc: Document) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    fn matching(&self, spec: &QuerySpec) -> Vec<Document> {
        let collections = self.collections.read();
        collections
            .get(&spec.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter_matches(&spec.filter, doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn filter_matches(filter: &Document, doc: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

/// Connector handing out sessions against one shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(&self) -> Result<Box<dyn StoreConnection>> {
        Ok(Box::new(MemoryConnection {
            store: Arc::clone(&self.store),
        }))
    }
}

struct MemoryConnection {
    store: Arc<MemoryStore>,
}

impl StoreConnection for MemoryConnection {
    fn set_auto_reconnect(&mut self, _enabled: bool) {
        // memory sessions cannot drop
    }

    fn query(&mut self, spec: &QuerySpec) -> QueryReply<'_> {
        QueryReply::Cursor(Box::new(self.store.matching(spec).into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn projection_preserves_declaration_order() {
        let projection = Projection::new().with("check", true).with("reply", false);
        let fields: Vec<(&str, bool)> = projection.iter().collect();
        assert_eq!(fields, [("check", true), ("reply", false)]);
    }

    #[test]
    fn memory_store_filters_on_equality() {
        let store = MemoryStore::new();
        store.insert("radius.users", doc(json!({"username": "alice", "n": 1})));
        store.insert("radius.users", doc(json!({"username": "bob", "n": 2})));
        store.insert("radius.users", doc(json!({"username": "alice", "n": 3})));

        let spec = QuerySpec::new(
            "radius.users",
            eq_filter("username", "alice"),
            Projection::select("check"),
        );
        let matched = store.matching(&spec);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0]["n"], json!(1));
        assert_eq!(matched[1]["n"], json!(3));
    }

    #[test]
    fn memory_store_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let spec = QuerySpec::new(
            "radius.groups",
            eq_filter("groupname", "eng"),
            Projection::select("check"),
        );
        assert!(store.matching(&spec).is_empty());
    }

    #[test]
    fn memory_connection_streams_matches() {
        let store = Arc::new(MemoryStore::new());
        store.insert("radius.users", doc(json!({"username": "alice"})));
        let connector = MemoryConnector::new(store);
        let mut conn = connector.connect().unwrap();

        let spec = QuerySpec::new(
            "radius.users",
            eq_filter("username", "alice"),
            Projection::select("check"),
        );
        match conn.query(&spec) {
            QueryReply::Cursor(stream) => assert_eq!(stream.count(), 1),
            _ => panic!("expected a cursor"),
        };
    }
}
