pub mod memory;
pub mod postgres;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One item in the composite-key document table. `pk`/`sk` carry the
/// load-bearing key conventions (`ASSESSMENT#...`, `CLIENT#...`); everything
/// else lives in `attributes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub pk: String,
    pub sk: String,
    pub attributes: JsonValue,
}

/// Opaque continuation key for `scan`. Serialized as-is through the HTTP
/// layer so clients can pass it back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastKey {
    pub pk: String,
    pub sk: String,
}

#[derive(Debug, Default)]
pub struct ScanPage {
    pub items: Vec<Document>,
    pub last_key: Option<LastKey>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Unconditional upsert.
    async fn put(&self, doc: Document) -> Result<()>;

    async fn get(&self, pk: &str, sk: &str) -> Result<Option<Document>>;

    /// Exact partition key, sort-key prefix match, ordered by sort key.
    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Document>>;

    /// Prefix match on both keys with keyset pagination. Items are ordered by
    /// `(pk, sk)`; `start_key` resumes strictly after that position.
    async fn scan(
        &self,
        pk_prefix: &str,
        sk_prefix: &str,
        limit: i64,
        start_key: Option<LastKey>,
    ) -> Result<ScanPage>;

    /// Overwrites the given top-level attributes on an existing item and
    /// returns the full new item. Fails with `NotFound` when absent.
    async fn update_attributes(
        &self,
        pk: &str,
        sk: &str,
        updates: serde_json::Map<String, JsonValue>,
    ) -> Result<Document>;

    async fn delete(&self, pk: &str, sk: &str) -> Result<()>;

    /// Atomic counter: persists and returns `max(stored, floor) + 1` in a
    /// single conditional write, so concurrent callers never see the same
    /// value twice.
    async fn increment_at_least(&self, pk: &str, sk: &str, floor: i64) -> Result<i64>;
}
