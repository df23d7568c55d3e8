// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery-status operations: the transactional event upsert and retry
//! counters.

use chrono::{DateTime, Utc};
use faxgate_core::{CanonicalStatus, FaxgateError};
use rusqlite::params;

use crate::database::Database;
use crate::models::{DeliveryStatus, FaxJobId};

use super::{parse_status, parse_ts, to_ts, truncate_millis};

/// Result of applying an event to a job's delivery status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The event was newer than the stored state and has been merged.
    Applied(DeliveryStatus),
    /// The event's timestamp was not newer than `last_update`; nothing
    /// was written.
    Stale,
}

/// Fetch the delivery status for a job.
pub async fn get(
    db: &Database,
    job_id: &FaxJobId,
) -> Result<Option<DeliveryStatus>, FaxgateError> {
    let job_id = job_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT job_id, status, last_update, retry_count, log
                 FROM delivery_status WHERE job_id = ?1",
            )?;
            match stmt.query_row(params![job_id], |row| {
                let status: String = row.get(1)?;
                let last_update: String = row.get(2)?;
                Ok(DeliveryStatus {
                    job_id: FaxJobId(row.get(0)?),
                    status: parse_status(1, &status)?,
                    last_update: parse_ts(2, &last_update)?,
                    retry_count: row.get(3)?,
                    log: row.get(4)?,
                })
            }) {
                Ok(status) => Ok(Some(status)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Merge an event into the stored delivery status.
///
/// Runs as one transaction: the staleness guard re-reads `last_update`
/// inside it, so two concurrently delivered webhooks for the same job
/// cannot interleave their merges -- the later-timestamped one wins and
/// the other is reported [`UpsertOutcome::Stale`]. Creates the row
/// (normally written at job creation) if it is somehow missing.
pub async fn apply_event(
    db: &Database,
    job_id: &FaxJobId,
    status: CanonicalStatus,
    occurred_at: DateTime<Utc>,
    log: String,
) -> Result<UpsertOutcome, FaxgateError> {
    let job_id = job_id.0.clone();
    let occurred_at = truncate_millis(occurred_at);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let existing: Option<(String, u32)> = {
                let mut stmt = tx.prepare(
                    "SELECT last_update, retry_count FROM delivery_status WHERE job_id = ?1",
                )?;
                match stmt.query_row(params![job_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
                }) {
                    Ok(pair) => Some(pair),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e.into()),
                }
            };

            let retry_count = match existing {
                Some((last_update, retry_count)) => {
                    let last_update = parse_ts(0, &last_update)?;
                    if occurred_at <= last_update {
                        tx.commit()?;
                        return Ok(UpsertOutcome::Stale);
                    }
                    tx.execute(
                        "UPDATE delivery_status
                         SET status = ?1, last_update = ?2, log = ?3
                         WHERE job_id = ?4",
                        params![status.to_string(), to_ts(&occurred_at), log, job_id],
                    )?;
                    retry_count
                }
                None => {
                    tx.execute(
                        "INSERT INTO delivery_status (job_id, status, last_update, retry_count, log)
                         VALUES (?1, ?2, ?3, 0, ?4)",
                        params![job_id, status.to_string(), to_ts(&occurred_at), log],
                    )?;
                    0
                }
            };

            tx.commit()?;
            Ok(UpsertOutcome::Applied(DeliveryStatus {
                job_id: FaxJobId(job_id),
                status,
                last_update: occurred_at,
                retry_count,
                log,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Reset a job to `sending` after the retry worker re-submitted it.
///
/// Not a provider event, so the staleness guard does not apply; the
/// timestamp only ever moves forward (string MAX works because the stored
/// format sorts chronologically) and the log is left untouched.
pub async fn mark_resubmitted(
    db: &Database,
    job_id: &FaxJobId,
    now: DateTime<Utc>,
) -> Result<(), FaxgateError> {
    let job_id = job_id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE delivery_status
                 SET status = 'sending', last_update = MAX(last_update, ?1)
                 WHERE job_id = ?2",
                params![to_ts(&now), job_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically increment the retry counter, returning the new value.
pub async fn increment_retry(db: &Database, job_id: &FaxJobId) -> Result<u32, FaxgateError> {
    let job_id = job_id.0.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let current: u32 = tx.query_row(
                "SELECT retry_count FROM delivery_status WHERE job_id = ?1",
                params![job_id],
                |row| row.get(0),
            )?;
            let next = current + 1;
            tx.execute(
                "UPDATE delivery_status SET retry_count = ?1 WHERE job_id = ?2",
                params![next, job_id],
            )?;
            tx.commit()?;
            Ok(next)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Current retry count for a job.
pub async fn retry_count(db: &Database, job_id: &FaxJobId) -> Result<u32, FaxgateError> {
    let job_id = job_id.0.clone();
    db.connection()
        .call(move |conn| {
            let count: u32 = conn.query_row(
                "SELECT retry_count FROM delivery_status WHERE job_id = ?1",
                params![job_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FaxJob, MessageId};
    use crate::queries::jobs;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    async fn setup_job() -> (Database, tempfile::TempDir, FaxJobId, DateTime<Utc>) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let created_at = Utc::now();
        let job = FaxJob {
            id: FaxJobId("job-1".into()),
            message_id: MessageId("msg-1".into()),
            recipient_number: "+49301234567".into(),
            provider_fax_id: Some("FX1".into()),
            created_at,
        };
        jobs::create_job(&db, &job, CanonicalStatus::Sending)
            .await
            .unwrap();
        (db, dir, job.id, created_at)
    }

    #[tokio::test]
    async fn newer_event_is_applied() {
        let (db, _dir, job_id, created_at) = setup_job().await;

        let outcome = apply_event(
            &db,
            &job_id,
            CanonicalStatus::Sent,
            created_at + Duration::seconds(30),
            "delivered".into(),
        )
        .await
        .unwrap();

        match outcome {
            UpsertOutcome::Applied(status) => {
                assert_eq!(status.status, CanonicalStatus::Sent);
                assert_eq!(status.log, "delivered");
            }
            UpsertOutcome::Stale => panic!("expected Applied"),
        }

        let stored = get(&db, &job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, CanonicalStatus::Sent);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn older_event_is_stale_and_leaves_state_untouched() {
        let (db, _dir, job_id, created_at) = setup_job().await;

        apply_event(
            &db,
            &job_id,
            CanonicalStatus::Sent,
            created_at + Duration::seconds(30),
            "delivered".into(),
        )
        .await
        .unwrap();

        let outcome = apply_event(
            &db,
            &job_id,
            CanonicalStatus::Failed,
            created_at + Duration::seconds(10),
            "failed".into(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, UpsertOutcome::Stale);

        let stored = get(&db, &job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, CanonicalStatus::Sent);
        assert_eq!(stored.log, "delivered");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn equal_timestamp_is_stale() {
        let (db, _dir, job_id, created_at) = setup_job().await;
        let at = created_at + Duration::seconds(30);

        apply_event(&db, &job_id, CanonicalStatus::Sent, at, "first".into())
            .await
            .unwrap();
        let outcome = apply_event(&db, &job_id, CanonicalStatus::Failed, at, "second".into())
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Stale);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn retry_counter_increments_atomically() {
        let (db, _dir, job_id, _) = setup_job().await;

        assert_eq!(retry_count(&db, &job_id).await.unwrap(), 0);
        assert_eq!(increment_retry(&db, &job_id).await.unwrap(), 1);
        assert_eq!(increment_retry(&db, &job_id).await.unwrap(), 2);
        assert_eq!(retry_count(&db, &job_id).await.unwrap(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_events_never_lose_the_newest() {
        let (db, _dir, job_id, created_at) = setup_job().await;

        // Ten events with distinct timestamps, applied concurrently in
        // arbitrary order. The single-writer connection plus the
        // in-transaction staleness guard must leave the newest one stored.
        let mut handles = Vec::new();
        for i in 1..=10i64 {
            let db = db.clone();
            let job_id = job_id.clone();
            handles.push(tokio::spawn(async move {
                apply_event(
                    &db,
                    &job_id,
                    CanonicalStatus::Sending,
                    created_at + Duration::seconds(i),
                    format!("event-{i}"),
                )
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = get(&db, &job_id).await.unwrap().unwrap();
        assert_eq!(stored.log, "event-10");
        assert_eq!(stored.last_update.timestamp(), (created_at + Duration::seconds(10)).timestamp());
        db.close().await.unwrap();
    }
}
