// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fax job CRUD operations.

use faxgate_core::{CanonicalStatus, FaxgateError};
use rusqlite::{Row, params};

use crate::database::Database;
use crate::models::{FaxJob, FaxJobId, MessageId};

use super::{parse_ts, to_ts};

fn job_from_row(row: &Row<'_>) -> Result<FaxJob, rusqlite::Error> {
    let created_at: String = row.get(4)?;
    Ok(FaxJob {
        id: FaxJobId(row.get(0)?),
        message_id: MessageId(row.get(1)?),
        recipient_number: row.get(2)?,
        provider_fax_id: row.get(3)?,
        created_at: parse_ts(4, &created_at)?,
    })
}

const JOB_COLUMNS: &str = "id, message_id, recipient_number, provider_fax_id, created_at";

/// Insert a job together with its delivery-status row in one transaction.
///
/// The pair is created atomically: a job without delivery state (or the
/// reverse) must never be observable.
pub async fn create_job(
    db: &Database,
    job: &FaxJob,
    initial: CanonicalStatus,
) -> Result<(), FaxgateError> {
    let job = job.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO fax_jobs (id, message_id, recipient_number, provider_fax_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    job.id.0,
                    job.message_id.0,
                    job.recipient_number,
                    job.provider_fax_id,
                    to_ts(&job.created_at),
                ],
            )?;
            tx.execute(
                "INSERT INTO delivery_status (job_id, status, last_update, retry_count, log)
                 VALUES (?1, ?2, ?3, 0, '')",
                params![job.id.0, initial.to_string(), to_ts(&job.created_at)],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a job by id.
pub async fn get_job(db: &Database, id: &FaxJobId) -> Result<Option<FaxJob>, FaxgateError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM fax_jobs WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], job_from_row) {
                Ok(job) => Ok(Some(job)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Resolve a job by the provider-assigned external id. The newest job wins
/// if a provider ever recycles ids.
pub async fn find_by_provider_id(
    db: &Database,
    provider_fax_id: &str,
) -> Result<Option<FaxJob>, FaxgateError> {
    let provider_fax_id = provider_fax_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLUMNS} FROM fax_jobs
                 WHERE provider_fax_id = ?1
                 ORDER BY created_at DESC LIMIT 1"
            ))?;
            match stmt.query_row(params![provider_fax_id], job_from_row) {
                Ok(job) => Ok(Some(job)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The non-terminal job for a message, if one exists. Enforces the
/// one-active-job-per-message invariant at submission time.
pub async fn find_active_for_message(
    db: &Database,
    message_id: &MessageId,
) -> Result<Option<FaxJob>, FaxgateError> {
    let message_id = message_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT j.id, j.message_id, j.recipient_number, j.provider_fax_id, j.created_at
                 FROM fax_jobs j
                 JOIN delivery_status d ON d.job_id = j.id
                 WHERE j.message_id = ?1
                   AND d.status NOT IN ('sent', 'received', 'failed')
                 ORDER BY j.created_at DESC LIMIT 1",
            )?;
            match stmt.query_row(params![message_id], job_from_row) {
                Ok(job) => Ok(Some(job)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether any job (active or terminal) was ever created for the message.
pub async fn has_job_for_message(
    db: &Database,
    message_id: &MessageId,
) -> Result<bool, FaxgateError> {
    let message_id = message_id.0.clone();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM fax_jobs WHERE message_id = ?1",
                params![message_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record the provider-assigned external id after an accepted submission.
pub async fn set_provider_fax_id(
    db: &Database,
    id: &FaxJobId,
    provider_fax_id: &str,
) -> Result<(), FaxgateError> {
    let id = id.0.clone();
    let provider_fax_id = provider_fax_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE fax_jobs SET provider_fax_id = ?1 WHERE id = ?2",
                params![provider_fax_id, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remove a job (and, via cascade, its delivery status and retries).
/// Only used to roll back a submission the provider rejected.
pub async fn delete_job(db: &Database, id: &FaxJobId) -> Result<(), FaxgateError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM fax_jobs WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn sample_job(id: &str, message: &str) -> FaxJob {
        FaxJob {
            id: FaxJobId(id.into()),
            message_id: MessageId(message.into()),
            recipient_number: "+49301234567".into(),
            provider_fax_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let (db, _dir) = setup_db().await;
        let job = sample_job("job-1", "msg-1");
        create_job(&db, &job, CanonicalStatus::Sending).await.unwrap();

        let fetched = get_job(&db, &job.id).await.unwrap().unwrap();
        assert_eq!(fetched.message_id, job.message_id);
        assert_eq!(fetched.recipient_number, "+49301234567");
        assert!(fetched.provider_fax_id.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn create_job_also_creates_delivery_status() {
        let (db, _dir) = setup_db().await;
        let job = sample_job("job-1", "msg-1");
        create_job(&db, &job, CanonicalStatus::Sending).await.unwrap();

        let status = crate::queries::delivery::get(&db, &job.id)
            .await
            .unwrap()
            .expect("status row created atomically with the job");
        assert_eq!(status.status, CanonicalStatus::Sending);
        assert_eq!(status.retry_count, 0);
        assert_eq!(status.log, "");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_by_provider_id_after_assignment() {
        let (db, _dir) = setup_db().await;
        let job = sample_job("job-1", "msg-1");
        create_job(&db, &job, CanonicalStatus::Sending).await.unwrap();

        assert!(find_by_provider_id(&db, "FX99").await.unwrap().is_none());

        set_provider_fax_id(&db, &job.id, "FX99").await.unwrap();
        let found = find_by_provider_id(&db, "FX99").await.unwrap().unwrap();
        assert_eq!(found.id, job.id);
        assert_eq!(found.provider_fax_id.as_deref(), Some("FX99"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn active_job_lookup_ignores_terminal_jobs() {
        let (db, _dir) = setup_db().await;
        let job = sample_job("job-1", "msg-1");
        create_job(&db, &job, CanonicalStatus::Sending).await.unwrap();

        assert!(
            find_active_for_message(&db, &job.message_id)
                .await
                .unwrap()
                .is_some()
        );

        // Drive the job to a terminal state.
        crate::queries::delivery::apply_event(
            &db,
            &job.id,
            CanonicalStatus::Failed,
            Utc::now() + chrono::Duration::seconds(10),
            "failed".into(),
        )
        .await
        .unwrap();

        assert!(
            find_active_for_message(&db, &job.message_id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(has_job_for_message(&db, &job.message_id).await.unwrap());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_job_cascades_to_delivery_status() {
        let (db, _dir) = setup_db().await;
        let job = sample_job("job-1", "msg-1");
        create_job(&db, &job, CanonicalStatus::Sending).await.unwrap();

        delete_job(&db, &job.id).await.unwrap();

        assert!(get_job(&db, &job.id).await.unwrap().is_none());
        assert!(
            crate::queries::delivery::get(&db, &job.id)
                .await
                .unwrap()
                .is_none()
        );

        db.close().await.unwrap();
    }
}
