//! Document store port - hosted document database abstraction

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::domain::result::{Error, Result};

/// Collection names
pub mod collections {
    pub const CLIENTS: &str = "clients";
    pub const CATEGORIES: &str = "categories";
    pub const TRANSACTIONS: &str = "transactions";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const PRODUCTS: &str = "products";
    pub const CONTRACTS: &str = "contracts";
    pub const WORKFLOWS: &str = "workflows";
}

/// Field map of a document (the id is not part of it)
pub type Fields = Map<String, JsonValue>;

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Fields) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.data.get(field)
    }

    /// Decode into a domain type; the document id is exposed as field `id`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut data = self.data.clone();
        data.insert("id".to_string(), JsonValue::String(self.id.clone()));
        Ok(serde_json::from_value(JsonValue::Object(data))?)
    }
}

/// Encode a domain type as document fields, dropping its `id`
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        JsonValue::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(Error::validation(format!(
            "documents must be JSON objects, got {}",
            other
        ))),
    }
}

/// Build a field map from `(name, value)` pairs
pub fn fields<I, K>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, JsonValue)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Equality filter on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: JsonValue,
}

/// Equality-filtered query over one collection with optional single-field ordering
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<String>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Ascending order on `field`. Documents without the field are not returned.
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Whether a document satisfies every filter and has the ordering field
    pub fn matches(&self, doc: &Document) -> bool {
        let filters_hold = self.filters.iter().all(|f| {
            doc.get(&f.field)
                .map(|v| values_equal(v, &f.value))
                .unwrap_or(false)
        });
        let has_order_field = self
            .order_by
            .as_ref()
            .map(|field| doc.get(field).is_some())
            .unwrap_or(true);
        filters_hold && has_order_field
    }

    /// Filter and order a set of documents the way a store would
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();
        if let Some(field) = &self.order_by {
            matched.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
        }
        matched
    }
}

/// JSON equality where numbers compare by value (`3 == 3.0`)
pub fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

/// Ordering used by `order_by`: values of different types order by type,
/// numbers numerically, strings lexicographically
pub fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (JsonValue::Number(x), JsonValue::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
            (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

/// A single staged write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Delete a document; deleting a missing document is not an error
    Delete { collection: String, id: String },
    /// Merge fields into an existing document; fails the batch if it is missing
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
}

/// Writes committed atomically by [`DocumentStore::commit`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn update(&mut self, collection: &str, id: &str, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Document database abstraction
///
/// Implementations (adapters) provide CRUD, equality-filtered queries and
/// atomic multi-document batches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a document by id
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Run a query
    async fn query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Create a document with a generated id, returning the id
    async fn add(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Create or replace a document
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Merge fields into an existing document (`NotFound` if missing)
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Delete a document (missing documents are ignored)
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Apply every staged write atomically: all of them or none
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: JsonValue) -> Document {
        match value {
            JsonValue::Object(map) => Document::new(id, map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(values_equal(&json!(3), &json!(3.0)));
        assert!(!values_equal(&json!(3), &json!("3")));
    }

    #[test]
    fn test_query_filters_are_anded() {
        let query = Query::collection("categories")
            .where_eq("title", "Ivanov Petr")
            .where_eq("row", 3);

        assert!(query.matches(&doc("a", json!({"title": "Ivanov Petr", "row": 3}))));
        assert!(!query.matches(&doc("b", json!({"title": "Ivanov Petr", "row": 1}))));
        assert!(!query.matches(&doc("c", json!({"title": "ivanov petr", "row": 3}))));
        assert!(!query.matches(&doc("d", json!({"row": 3}))));
    }

    #[test]
    fn test_order_by_skips_documents_without_field() {
        let query = Query::collection("clients").order_by("clientNumber");
        let docs = vec![
            doc("b", json!({"clientNumber": 2})),
            doc("x", json!({})),
            doc("a", json!({"clientNumber": 1})),
            doc("c", json!({"clientNumber": 10})),
        ];

        let ids: Vec<String> = query.apply(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_decode_exposes_id_and_to_fields_drops_it() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Named {
            id: String,
            name: String,
        }

        let d = doc("n1", json!({"name": "Склад"}));
        let named: Named = d.decode().unwrap();
        assert_eq!(named.id, "n1");

        let encoded = to_fields(&named).unwrap();
        assert!(!encoded.contains_key("id"));
        assert_eq!(encoded.get("name"), Some(&json!("Склад")));
    }

    #[test]
    fn test_write_batch_staging() {
        let mut batch = WriteBatch::new();
        batch
            .delete("clients", "c1")
            .update("categories", "k1", fields([("isVisible", json!(false))]));
        assert_eq!(batch.len(), 2);
        assert!(matches!(batch.ops()[0], WriteOp::Delete { .. }));
    }
}
