// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! High-level store facade used by the dispatch and gateway crates.
//!
//! Thin delegation onto the typed query modules; exists so callers hold a
//! single cloneable handle instead of reaching into query modules.

use chrono::{DateTime, Utc};
use faxgate_core::{CanonicalStatus, FaxgateError};

use crate::database::Database;
use crate::models::{DeliveryStatus, FaxJob, FaxJobId, MessageId, RetryEntry};
use crate::queries;

pub use crate::queries::delivery::UpsertOutcome;

/// Cloneable handle to the delivery-state database.
#[derive(Clone)]
pub struct FaxStore {
    db: Database,
}

impl FaxStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (or create) the store at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, FaxgateError> {
        Ok(Self::new(Database::open(path).await?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // --- Fax jobs ---

    pub async fn create_job(
        &self,
        job: &FaxJob,
        initial: CanonicalStatus,
    ) -> Result<(), FaxgateError> {
        queries::jobs::create_job(&self.db, job, initial).await
    }

    pub async fn get_job(&self, id: &FaxJobId) -> Result<Option<FaxJob>, FaxgateError> {
        queries::jobs::get_job(&self.db, id).await
    }

    pub async fn find_job_by_provider_id(
        &self,
        provider_fax_id: &str,
    ) -> Result<Option<FaxJob>, FaxgateError> {
        queries::jobs::find_by_provider_id(&self.db, provider_fax_id).await
    }

    pub async fn find_active_job_for_message(
        &self,
        message_id: &MessageId,
    ) -> Result<Option<FaxJob>, FaxgateError> {
        queries::jobs::find_active_for_message(&self.db, message_id).await
    }

    pub async fn has_job_for_message(
        &self,
        message_id: &MessageId,
    ) -> Result<bool, FaxgateError> {
        queries::jobs::has_job_for_message(&self.db, message_id).await
    }

    pub async fn set_provider_fax_id(
        &self,
        id: &FaxJobId,
        provider_fax_id: &str,
    ) -> Result<(), FaxgateError> {
        queries::jobs::set_provider_fax_id(&self.db, id, provider_fax_id).await
    }

    pub async fn delete_job(&self, id: &FaxJobId) -> Result<(), FaxgateError> {
        queries::jobs::delete_job(&self.db, id).await
    }

    // --- Delivery status ---

    pub async fn delivery_status(
        &self,
        job_id: &FaxJobId,
    ) -> Result<Option<DeliveryStatus>, FaxgateError> {
        queries::delivery::get(&self.db, job_id).await
    }

    pub async fn apply_event(
        &self,
        job_id: &FaxJobId,
        status: CanonicalStatus,
        occurred_at: DateTime<Utc>,
        log: String,
    ) -> Result<UpsertOutcome, FaxgateError> {
        queries::delivery::apply_event(&self.db, job_id, status, occurred_at, log).await
    }

    pub async fn mark_resubmitted(
        &self,
        job_id: &FaxJobId,
        now: DateTime<Utc>,
    ) -> Result<(), FaxgateError> {
        queries::delivery::mark_resubmitted(&self.db, job_id, now).await
    }

    pub async fn increment_retry(&self, job_id: &FaxJobId) -> Result<u32, FaxgateError> {
        queries::delivery::increment_retry(&self.db, job_id).await
    }

    pub async fn retry_count(&self, job_id: &FaxJobId) -> Result<u32, FaxgateError> {
        queries::delivery::retry_count(&self.db, job_id).await
    }

    // --- Retry queue ---

    pub async fn schedule_retry(
        &self,
        job_id: &FaxJobId,
        due_at: DateTime<Utc>,
    ) -> Result<i64, FaxgateError> {
        queries::retries::schedule(&self.db, &job_id.0, due_at).await
    }

    pub async fn claim_due_retries(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<RetryEntry>, FaxgateError> {
        queries::retries::claim_due(&self.db, now).await
    }

    pub async fn complete_retry(&self, id: i64) -> Result<(), FaxgateError> {
        queries::retries::complete(&self.db, id).await
    }

    pub async fn release_retry(
        &self,
        id: i64,
        due_at: DateTime<Utc>,
    ) -> Result<(), FaxgateError> {
        queries::retries::release(&self.db, id, due_at).await
    }
}
