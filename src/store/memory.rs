use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::store::{Document, DocumentStore, LastKey, ScanPage};

/// In-memory document table, ordered by `(pk, sk)` like the real one.
/// Backs the test suites and any environment without a database.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    items: Arc<RwLock<BTreeMap<(String, String), JsonValue>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<(String, String), JsonValue>> {
        self.items.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<(String, String), JsonValue>> {
        self.items.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemStore {
    async fn put(&self, doc: Document) -> Result<()> {
        self.guard().insert((doc.pk, doc.sk), doc.attributes);
        Ok(())
    }

    async fn get(&self, pk: &str, sk: &str) -> Result<Option<Document>> {
        Ok(self
            .read_guard()
            .get(&(pk.to_string(), sk.to_string()))
            .map(|attrs| Document {
                pk: pk.to_string(),
                sk: sk.to_string(),
                attributes: attrs.clone(),
            }))
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Document>> {
        let items = self.read_guard();
        Ok(items
            .range((
                Bound::Included((pk.to_string(), sk_prefix.to_string())),
                Bound::Unbounded,
            ))
            .take_while(|((item_pk, item_sk), _)| item_pk == pk && item_sk.starts_with(sk_prefix))
            .map(|((item_pk, item_sk), attrs)| Document {
                pk: item_pk.clone(),
                sk: item_sk.clone(),
                attributes: attrs.clone(),
            })
            .collect())
    }

    async fn scan(
        &self,
        pk_prefix: &str,
        sk_prefix: &str,
        limit: i64,
        start_key: Option<LastKey>,
    ) -> Result<ScanPage> {
        let limit = limit.max(1) as usize;
        let items = self.read_guard();
        let lower = match &start_key {
            Some(key) => Bound::Excluded((key.pk.clone(), key.sk.clone())),
            None => Bound::Unbounded,
        };

        let mut matched: Vec<Document> = items
            .range((lower, Bound::Unbounded))
            .filter(|((pk, sk), _)| pk.starts_with(pk_prefix) && sk.starts_with(sk_prefix))
            .take(limit + 1)
            .map(|((pk, sk), attrs)| Document {
                pk: pk.clone(),
                sk: sk.clone(),
                attributes: attrs.clone(),
            })
            .collect();

        let last_key = if matched.len() > limit {
            matched.truncate(limit);
            matched.last().map(|doc| LastKey {
                pk: doc.pk.clone(),
                sk: doc.sk.clone(),
            })
        } else {
            None
        };

        Ok(ScanPage {
            items: matched,
            last_key,
        })
    }

    async fn update_attributes(
        &self,
        pk: &str,
        sk: &str,
        updates: serde_json::Map<String, JsonValue>,
    ) -> Result<Document> {
        let mut items = self.guard();
        let attrs = items
            .get_mut(&(pk.to_string(), sk.to_string()))
            .ok_or_else(|| Error::NotFound("Resource not found".to_string()))?;
        if let Some(map) = attrs.as_object_mut() {
            for (key, value) in updates {
                map.insert(key, value);
            }
        }
        Ok(Document {
            pk: pk.to_string(),
            sk: sk.to_string(),
            attributes: attrs.clone(),
        })
    }

    async fn delete(&self, pk: &str, sk: &str) -> Result<()> {
        self.guard().remove(&(pk.to_string(), sk.to_string()));
        Ok(())
    }

    async fn increment_at_least(&self, pk: &str, sk: &str, floor: i64) -> Result<i64> {
        let mut items = self.guard();
        let entry = items
            .entry((pk.to_string(), sk.to_string()))
            .or_insert_with(|| serde_json::json!({ "value": 0 }));
        let current = entry.get("value").and_then(|v| v.as_i64()).unwrap_or(0);
        let next = current.max(floor) + 1;
        entry["value"] = serde_json::json!(next);
        Ok(next)
    }
}
