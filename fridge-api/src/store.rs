use crate::errors::StoreError;
use crate::metrics::STORE_LATENCY_SECONDS;
use crate::model::{Document, DocumentKind};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};
use tracing::info;

/// Partition-keyed document collection, as consumed by the HTTP handlers.
///
/// `create` persists one document and returns the stored representation.
/// `list` is a full cross-partition scan filtered by kind; callers get the
/// entire history on every call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, doc: &Document) -> Result<Value, StoreError>;
    async fn list(&self, kind: DocumentKind) -> Result<Vec<Value>, StoreError>;
}

/// PostgreSQL-backed store. Documents live in a single `documents` table as
/// JSONB rows keyed by `(device_id, id)`, mirroring a partitioned collection
/// where ids are unique per partition.
pub struct PgDocumentStore {
    pool: PgPool,
    call_timeout: Duration,
}

impl PgDocumentStore {
    pub async fn connect(database_url: &str, call_timeout: Duration) -> Result<Self, StoreError> {
        info!("Connecting to document store...");
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(classify_sqlx)?;

        info!("Store connection established");
        info!("Running store migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        info!("Migrations completed");

        Ok(Self { pool, call_timeout })
    }

    fn timeout_error(&self) -> StoreError {
        StoreError::Unavailable(format!(
            "store call exceeded {}ms",
            self.call_timeout.as_millis()
        ))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, doc: &Document) -> Result<Value, StoreError> {
        let body = Value::Object(doc.body.clone());
        let query = sqlx::query_scalar::<_, Value>(
            r#"
            INSERT INTO documents (device_id, id, kind, body)
            VALUES ($1, $2, $3, $4)
            RETURNING body
            "#,
        )
        .bind(&doc.device_id)
        .bind(&doc.id)
        .bind(doc.kind.as_str())
        .bind(&body);

        let start = Instant::now();
        let result = tokio::time::timeout(self.call_timeout, query.fetch_one(&self.pool)).await;
        STORE_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());

        match result {
            Ok(Ok(stored)) => Ok(stored),
            Ok(Err(e)) if is_unique_violation(&e) => Err(StoreError::Conflict {
                id: doc.id.clone(),
            }),
            Ok(Err(e)) => Err(classify_sqlx(e)),
            Err(_) => Err(self.timeout_error()),
        }
    }

    async fn list(&self, kind: DocumentKind) -> Result<Vec<Value>, StoreError> {
        let query = sqlx::query_scalar::<_, Value>(
            "SELECT body FROM documents WHERE kind = $1 ORDER BY created_at",
        )
        .bind(kind.as_str());

        let start = Instant::now();
        let result = tokio::time::timeout(self.call_timeout, query.fetch_all(&self.pool)).await;
        STORE_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());

        match result {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(e)) => Err(classify_sqlx(e)),
            Err(_) => Err(self.timeout_error()),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

/// Splits store failures into unreachable-backend errors and everything else.
fn classify_sqlx(err: sqlx::Error) -> StoreError {
    let transient = match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed => true,
        sqlx::Error::Database(db_err) => {
            db_err.code().is_some_and(|code| {
                code == "08000" || // connection_exception
                code == "08003" || // connection_does_not_exist
                code == "08006" || // connection_failure
                code == "57P03" || // cannot_connect_now
                code == "53300" // too_many_connections
            })
        }
        _ => false,
    };

    if transient {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

/// In-memory store used by handler tests. Enforces the same per-partition
/// id uniqueness as the Postgres adapter and preserves creation order.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    documents: tokio::sync::Mutex<Vec<StoredDoc>>,
}

#[cfg(test)]
struct StoredDoc {
    device_id: String,
    id: String,
    kind: DocumentKind,
    body: Value,
}

#[cfg(test)]
#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, doc: &Document) -> Result<Value, StoreError> {
        let mut documents = self.documents.lock().await;
        if documents
            .iter()
            .any(|d| d.device_id == doc.device_id && d.id == doc.id)
        {
            return Err(StoreError::Conflict {
                id: doc.id.clone(),
            });
        }

        let body = Value::Object(doc.body.clone());
        documents.push(StoredDoc {
            device_id: doc.device_id.clone(),
            id: doc.id.clone(),
            kind: doc.kind,
            body: body.clone(),
        });
        Ok(body)
    }

    async fn list(&self, kind: DocumentKind) -> Result<Vec<Value>, StoreError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.body.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(device_id: &str, id: &str, kind: DocumentKind) -> Document {
        let body = json!({
            "id": id,
            "deviceId": device_id,
            "type": kind.as_str(),
        });
        Document {
            id: id.to_string(),
            device_id: device_id.to_string(),
            kind,
            body: body.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_memory_store_conflict_on_duplicate_id() {
        tokio_test::block_on(async {
            let store = MemoryStore::default();
            let first = doc("fridge-1", "doc-1", DocumentKind::Telemetry);

            assert!(store.create(&first).await.is_ok());

            let err = store.create(&first).await.unwrap_err();
            assert!(matches!(err, StoreError::Conflict { id } if id == "doc-1"));
        });
    }

    #[test]
    fn test_memory_store_same_id_different_partition() {
        tokio_test::block_on(async {
            let store = MemoryStore::default();

            store
                .create(&doc("fridge-1", "doc-1", DocumentKind::Telemetry))
                .await
                .unwrap();
            store
                .create(&doc("fridge-2", "doc-1", DocumentKind::Telemetry))
                .await
                .unwrap();

            let all = store.list(DocumentKind::Telemetry).await.unwrap();
            assert_eq!(all.len(), 2);
        });
    }

    #[test]
    fn test_memory_store_list_filters_by_kind() {
        tokio_test::block_on(async {
            let store = MemoryStore::default();

            store
                .create(&doc("fridge-1", "t-1", DocumentKind::Telemetry))
                .await
                .unwrap();
            store
                .create(&doc("fridge-1", "i-1", DocumentKind::Inventory))
                .await
                .unwrap();

            let telemetry = store.list(DocumentKind::Telemetry).await.unwrap();
            assert_eq!(telemetry.len(), 1);
            assert_eq!(telemetry[0]["type"], "telemetry");

            let inventory = store.list(DocumentKind::Inventory).await.unwrap();
            assert_eq!(inventory.len(), 1);
            assert_eq!(inventory[0]["type"], "inventory");
        });
    }
}
