//! Database schema management for `hazardwatch`.
//!
//! Ensures the alert-history table and its lookup index exist before any
//! cycle runs. Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `sent_alerts` table holding one row per delivered alert.
/// Safe to call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per alert actually delivered by the notifier
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sent_alerts (
            id           UUID        PRIMARY KEY,
            hazard_kind  TEXT        NOT NULL,
            dedup_key    TEXT        NOT NULL,
            sent_at      TIMESTAMPTZ NOT NULL,
            payload      JSONB       NOT NULL DEFAULT '{}'::jsonb
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Covers the dedup query: kind + key, newest first
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sent_alerts_kind_key_sent_at
            ON sent_alerts (hazard_kind, dedup_key, sent_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
