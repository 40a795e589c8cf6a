use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};

use crate::error::{Error, Result};
use crate::store::{Document, DocumentStore, LastKey, ScanPage};

/// Postgres-backed document table: `documents (pk, sk, attributes jsonb)`
/// with a composite primary key, created by the bundled migration.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Key prefixes contain `_` and `#`, so LIKE patterns must be escaped.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document> {
    Ok(Document {
        pk: row.try_get("pk")?,
        sk: row.try_get("sk")?,
        attributes: row.try_get::<JsonValue, _>("attributes")?,
    })
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn put(&self, doc: Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (pk, sk, attributes)
            VALUES ($1, $2, $3)
            ON CONFLICT (pk, sk) DO UPDATE SET attributes = EXCLUDED.attributes
            "#,
        )
        .bind(&doc.pk)
        .bind(&doc.sk)
        .bind(&doc.attributes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, pk: &str, sk: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT pk, sk, attributes FROM documents WHERE pk = $1 AND sk = $2")
            .bind(pk)
            .bind(sk)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT pk, sk, attributes FROM documents
            WHERE pk = $1 AND sk LIKE $2 ESCAPE '\'
            ORDER BY sk
            "#,
        )
        .bind(pk)
        .bind(escape_like(sk_prefix))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn scan(
        &self,
        pk_prefix: &str,
        sk_prefix: &str,
        limit: i64,
        start_key: Option<LastKey>,
    ) -> Result<ScanPage> {
        let limit = limit.max(1);
        let (after_pk, after_sk) = match &start_key {
            Some(key) => (Some(key.pk.clone()), Some(key.sk.clone())),
            None => (None, None),
        };

        let rows = sqlx::query(
            r#"
            SELECT pk, sk, attributes FROM documents
            WHERE pk LIKE $1 ESCAPE '\'
              AND sk LIKE $2 ESCAPE '\'
              AND ($3::text IS NULL OR (pk, sk) > ($3::text, $4::text))
            ORDER BY pk, sk
            LIMIT $5
            "#,
        )
        .bind(escape_like(pk_prefix))
        .bind(escape_like(sk_prefix))
        .bind(after_pk)
        .bind(after_sk)
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await?;

        let mut items: Vec<Document> = rows
            .iter()
            .map(row_to_document)
            .collect::<Result<Vec<_>>>()?;

        let last_key = if items.len() as i64 > limit {
            items.truncate(limit as usize);
            items.last().map(|doc| LastKey {
                pk: doc.pk.clone(),
                sk: doc.sk.clone(),
            })
        } else {
            None
        };

        Ok(ScanPage { items, last_key })
    }

    async fn update_attributes(
        &self,
        pk: &str,
        sk: &str,
        updates: serde_json::Map<String, JsonValue>,
    ) -> Result<Document> {
        // jsonb || merges at the top level, exactly the overwrite semantics
        // the update path needs.
        let row = sqlx::query(
            r#"
            UPDATE documents
            SET attributes = attributes || $3
            WHERE pk = $1 AND sk = $2
            RETURNING pk, sk, attributes
            "#,
        )
        .bind(pk)
        .bind(sk)
        .bind(JsonValue::Object(updates))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_document(&row),
            None => Err(Error::NotFound("Resource not found".to_string())),
        }
    }

    async fn delete(&self, pk: &str, sk: &str) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE pk = $1 AND sk = $2")
            .bind(pk)
            .bind(sk)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_at_least(&self, pk: &str, sk: &str, floor: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO documents (pk, sk, attributes)
            VALUES ($1, $2, jsonb_build_object('value', $3::bigint + 1))
            ON CONFLICT (pk, sk) DO UPDATE
            SET attributes = jsonb_set(
                documents.attributes,
                '{value}',
                to_jsonb(GREATEST(COALESCE((documents.attributes->>'value')::bigint, 0), $3::bigint) + 1)
            )
            RETURNING (attributes->>'value')::bigint AS value
            "#,
        )
        .bind(pk)
        .bind(sk)
        .bind(floor)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("value")?)
    }
}
