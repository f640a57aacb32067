//! Deduplication gate over the alert-history store.
//!
//! Novelty is a stateless query: an alert is novel when no record with the
//! same (kind, key) is newer than `now - cooldown`. There is no cross-process
//! lock between the check and the later append.

use chrono::{DateTime, Duration, Utc};

use crate::error::{AlertError, Result};
use crate::history::AlertHistory;
use crate::models::{AlertRecord, HazardKind};

// ---

/// Has no alert of `kind` for `key` been recorded within `cooldown` of `now`?
///
/// A failed history read aborts with [`AlertError::HistoryRead`] unless
/// `fail_open` is set, in which case the key is treated as not yet sent.
pub async fn is_novel(
    history: &dyn AlertHistory,
    kind: HazardKind,
    key: &str,
    cooldown: Duration,
    now: DateTime<Utc>,
    fail_open: bool,
) -> Result<bool> {
    // ---
    let since = now - cooldown;
    match history.exists(kind, key, since).await {
        Ok(exists) => {
            if exists {
                tracing::debug!(%kind, key, %since, "already alerted within cooldown");
            }
            Ok(!exists)
        }
        Err(e) if fail_open => {
            tracing::warn!(%kind, key, "history read failed, failing open: {}", e);
            Ok(true)
        }
        Err(e) => {
            tracing::error!(%kind, key, "history read failed, failing closed: {}", e);
            Err(AlertError::HistoryRead(e.to_string()))
        }
    }
}

/// Append `record` after a successful send.
///
/// Write failures are logged and swallowed: a possible duplicate on the next
/// cycle is preferred over losing track of the alert entirely. Returns
/// whether the record was stored.
pub async fn record_sent(history: &dyn AlertHistory, record: AlertRecord) -> bool {
    // ---
    let kind = record.hazard_kind;
    let key = record.dedup_key.clone();
    match history.append(record).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(%kind, key, "failed to record sent alert: {}", e);
            false
        }
    }
}
