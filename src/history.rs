//! Alert-history store: the only persistent state of the service.
//!
//! [`PgAlertHistory`] keeps sent alerts in the `sent_alerts` table created by
//! `schema::create_schema`. [`MemoryAlertHistory`] implements the same
//! interface in process for tests and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::error::{AlertError, Result};
use crate::models::{AlertRecord, HazardKind};

// ---

/// Narrow query/append interface over sent alerts.
#[async_trait]
pub trait AlertHistory: Send + Sync {
    /// Is there a record of `kind` for `key` sent strictly after `since`?
    async fn exists(&self, kind: HazardKind, key: &str, since: DateTime<Utc>) -> Result<bool>;

    async fn append(&self, record: AlertRecord) -> Result<()>;
}

/// PostgreSQL-backed alert history.
#[derive(Debug, Clone)]
pub struct PgAlertHistory {
    pool: PgPool,
}

impl PgAlertHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertHistory for PgAlertHistory {
    async fn exists(&self, kind: HazardKind, key: &str, since: DateTime<Utc>) -> Result<bool> {
        // ---
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM sent_alerts
                WHERE hazard_kind = $1
                  AND dedup_key   = $2
                  AND sent_at     > $3
            )
            "#,
        )
        .bind(kind.as_str())
        .bind(key)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AlertError::HistoryRead(e.to_string()))
    }

    async fn append(&self, record: AlertRecord) -> Result<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO sent_alerts (id, hazard_kind, dedup_key, sent_at, payload)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.hazard_kind.as_str())
        .bind(&record.dedup_key)
        .bind(record.sent_at)
        .bind(&record.payload)
        .execute(&self.pool)
        .await
        .map_err(|e| AlertError::HistoryWrite(e.to_string()))?;

        Ok(())
    }
}

/// In-process alert history.
#[derive(Debug, Default)]
pub struct MemoryAlertHistory {
    records: Mutex<Vec<AlertRecord>>,
}

impl MemoryAlertHistory {
    /// Snapshot of everything recorded so far, oldest first.
    pub async fn records(&self) -> Vec<AlertRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl AlertHistory for MemoryAlertHistory {
    async fn exists(&self, kind: HazardKind, key: &str, since: DateTime<Utc>) -> Result<bool> {
        // ---
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .any(|r| r.hazard_kind == kind && r.dedup_key == key && r.sent_at > since))
    }

    async fn append(&self, record: AlertRecord) -> Result<()> {
        self.records.lock().await.push(record);
        Ok(())
    }
}
