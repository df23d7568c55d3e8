// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted retry queue for deferred re-submission attempts.
//!
//! At-least-once semantics: entries survive restarts, the worker claims
//! them after `due_at` passes, and a claim that is never completed becomes
//! claimable again once its lock expires. Execution-time idempotence is
//! the orchestrator's job.

use chrono::{DateTime, Utc};
use faxgate_core::FaxgateError;
use rusqlite::params;

use crate::database::Database;
use crate::models::RetryEntry;

use super::to_ts;

/// Schedule a re-submission attempt for `job_id` at `due_at`.
/// Returns the queue entry id.
pub async fn schedule(
    db: &Database,
    job_id: &str,
    due_at: DateTime<Utc>,
) -> Result<i64, FaxgateError> {
    let job_id = job_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO retries (job_id, due_at) VALUES (?1, ?2)",
                params![job_id, to_ts(&due_at)],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim all entries due at or before `now`.
///
/// Atomically marks them "processing" with a 5-minute lock recorded in
/// `updated_at`; entries stuck in "processing" past the lock are
/// re-claimed, which is where the at-least-once guarantee comes from.
pub async fn claim_due(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<RetryEntry>, FaxgateError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let now_ts = to_ts(&now);
            let lock_expiry = to_ts(&(now - chrono::Duration::minutes(5)));

            let entries = {
                let mut stmt = tx.prepare(
                    "SELECT id, job_id, due_at, status, created_at, updated_at
                     FROM retries
                     WHERE due_at <= ?1
                       AND (status = 'pending'
                            OR (status = 'processing' AND updated_at <= ?2))
                     ORDER BY due_at ASC",
                )?;
                let rows = stmt.query_map(params![now_ts, lock_expiry], |row| {
                    Ok(RetryEntry {
                        id: row.get(0)?,
                        job_id: row.get(1)?,
                        due_at: row.get(2)?,
                        status: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                })?;
                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }
                entries
            };

            for entry in &entries {
                tx.execute(
                    "UPDATE retries SET status = 'processing', updated_at = ?1 WHERE id = ?2",
                    params![now_ts, entry.id],
                )?;
            }
            tx.commit()?;

            Ok(entries
                .into_iter()
                .map(|entry| RetryEntry {
                    status: "processing".to_string(),
                    ..entry
                })
                .collect())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a claimed entry as completed.
pub async fn complete(db: &Database, id: i64) -> Result<(), FaxgateError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE retries SET status = 'completed',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return a claimed entry to the queue with a new due time, after a
/// transient execution failure.
pub async fn release(db: &Database, id: i64, due_at: DateTime<Utc>) -> Result<(), FaxgateError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE retries SET status = 'pending', due_at = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![to_ts(&due_at), id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FaxJob, FaxJobId, MessageId};
    use crate::queries::jobs;
    use chrono::Duration;
    use faxgate_core::CanonicalStatus;
    use tempfile::tempdir;

    async fn setup_db_with_job(job_id: &str) -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let job = FaxJob {
            id: FaxJobId(job_id.into()),
            message_id: MessageId(format!("msg-{job_id}")),
            recipient_number: "+49301234567".into(),
            provider_fax_id: None,
            created_at: Utc::now(),
        };
        jobs::create_job(&db, &job, CanonicalStatus::Sending)
            .await
            .unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn schedule_and_claim_lifecycle() {
        let (db, _dir) = setup_db_with_job("job-1").await;
        let now = Utc::now();

        let id = schedule(&db, "job-1", now - Duration::minutes(1)).await.unwrap();
        assert!(id > 0);

        let claimed = claim_due(&db, now).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].job_id, "job-1");
        assert_eq!(claimed[0].status, "processing");

        // Already claimed: not claimable again within the lock window.
        assert!(claim_due(&db, now).await.unwrap().is_empty());

        complete(&db, id).await.unwrap();
        assert!(claim_due(&db, now).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn future_entries_are_not_claimed() {
        let (db, _dir) = setup_db_with_job("job-1").await;
        let now = Utc::now();

        schedule(&db, "job-1", now + Duration::minutes(15)).await.unwrap();
        assert!(claim_due(&db, now).await.unwrap().is_empty());

        let later = now + Duration::minutes(16);
        assert_eq!(claim_due(&db, later).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stuck_processing_entries_are_reclaimed_after_lock_expiry() {
        let (db, _dir) = setup_db_with_job("job-1").await;
        let now = Utc::now();

        schedule(&db, "job-1", now - Duration::minutes(1)).await.unwrap();
        assert_eq!(claim_due(&db, now).await.unwrap().len(), 1);

        // Worker died without completing; entry becomes claimable again
        // once the 5-minute lock passes.
        let later = now + Duration::minutes(6);
        assert_eq!(claim_due(&db, later).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn release_makes_entry_claimable_at_new_due_time() {
        let (db, _dir) = setup_db_with_job("job-1").await;
        let now = Utc::now();

        let id = schedule(&db, "job-1", now - Duration::minutes(1)).await.unwrap();
        claim_due(&db, now).await.unwrap();

        release(&db, id, now + Duration::minutes(10)).await.unwrap();
        assert!(claim_due(&db, now).await.unwrap().is_empty());
        assert_eq!(
            claim_due(&db, now + Duration::minutes(11)).await.unwrap().len(),
            1
        );
        db.close().await.unwrap();
    }
}
