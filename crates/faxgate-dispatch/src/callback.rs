// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delivery-status state machine.
//!
//! `CallbackProcessor::on_event` is the single write path for inbound
//! provider events: resolve the job, discard stale or replayed deliveries,
//! map the status token, merge the log, persist atomically, then run
//! terminal-state side effects. Signature verification happens in the HTTP
//! layer before this code can touch anything; everything up to the store
//! update is free of mutation, so a failure at any of those steps leaves
//! the store exactly as it was.

use std::sync::Arc;

use faxgate_core::{
    CanonicalStatus, FaxJob, FaxJobId, FaxgateError, MessageStore, ProblemReporter,
    ProviderEvent,
};
use faxgate_status::{map_status, merge};
use faxgate_storage::{FaxStore, UpsertOutcome};
use tracing::{debug, info, warn};

use crate::retry::{RetryPolicy, RetryScheduler};

/// Outcome of processing one webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The event was merged; the job now has this status.
    Applied {
        job_id: FaxJobId,
        status: CanonicalStatus,
    },
    /// Out-of-order, duplicate, or replayed event: discarded, no mutation.
    Stale,
}

/// Orchestrates webhook processing against the store and collaborators.
pub struct CallbackProcessor {
    store: FaxStore,
    messages: Arc<dyn MessageStore>,
    problems: Arc<dyn ProblemReporter>,
    scheduler: RetryScheduler,
    policy: RetryPolicy,
}

impl CallbackProcessor {
    pub fn new(
        store: FaxStore,
        messages: Arc<dyn MessageStore>,
        problems: Arc<dyn ProblemReporter>,
        policy: RetryPolicy,
    ) -> Self {
        let scheduler = RetryScheduler::new(store.clone());
        Self {
            store,
            messages,
            problems,
            scheduler,
            policy,
        }
    }

    /// Process one verified webhook event.
    ///
    /// Errors map to HTTP responses in the gateway: `UnknownJob` to 404,
    /// `UnmappableStatus` to 500 (loud on purpose -- it means the provider
    /// contract drifted), everything else to 500 so the provider's own
    /// retry mechanism re-delivers the event.
    pub async fn on_event(
        &self,
        event: &ProviderEvent,
    ) -> Result<CallbackOutcome, FaxgateError> {
        let job = self.resolve_job(event).await?;

        // Staleness guard: an event not newer than the stored last_update
        // is discarded before any mapping or merging happens. The store
        // re-checks this inside the update transaction, so concurrent
        // deliveries for the same job cannot interleave.
        let current = self.store.delivery_status(&job.id).await?;
        if let Some(current) = &current {
            if event.occurred_at <= current.last_update {
                debug!(job_id = %job.id, occurred_at = %event.occurred_at, "stale event discarded");
                return Ok(CallbackOutcome::Stale);
            }
        }

        let status = map_status(event.provider, &event.status_token)?;
        let existing_log = current.as_ref().map(|c| c.log.as_str()).unwrap_or("");
        let merged_log = merge(existing_log, event, status)?;

        let updated = match self
            .store
            .apply_event(&job.id, status, event.occurred_at, merged_log)
            .await?
        {
            UpsertOutcome::Applied(updated) => updated,
            UpsertOutcome::Stale => return Ok(CallbackOutcome::Stale),
        };

        info!(job_id = %job.id, status = %status, "delivery status updated");

        if status.is_delivered() {
            self.messages
                .mark_delivered(&job.message_id, event.occurred_at)
                .await?;
            self.problems.resolve(&job.message_id).await?;
        } else if matches!(status, CanonicalStatus::Failed | CanonicalStatus::Deferred) {
            self.retry_or_report(&job, updated.retry_count, &updated.log)
                .await?;
        }

        Ok(CallbackOutcome::Applied {
            job_id: job.id,
            status,
        })
    }

    async fn resolve_job(&self, event: &ProviderEvent) -> Result<FaxJob, FaxgateError> {
        if let Some(fax_id) = &event.fax_id {
            if let Some(job) = self.store.find_job_by_provider_id(fax_id).await? {
                return Ok(job);
            }
        }
        // Legacy callbacks are addressed by the signed URL token's message
        // id; their payload may not repeat the provider fax id.
        if let Some(message_id) = &event.message_id {
            if let Some(job) = self.store.find_active_job_for_message(message_id).await? {
                return Ok(job);
            }
        }
        let external_id = event
            .fax_id
            .clone()
            .or_else(|| event.message_id.as_ref().map(|m| m.0.clone()))
            .unwrap_or_default();
        warn!(external_id, "callback references no known job");
        Err(FaxgateError::UnknownJob { external_id })
    }

    /// Decide retry vs. terminal failure.
    ///
    /// `retry_count` counts retries already spent. While under the bound,
    /// a retry is scheduled and the counter advances. On the first event
    /// at the bound, exactly one problem report is raised and the counter
    /// advances once more, marking the failure as reported so later
    /// duplicate failure events stay quiet.
    async fn retry_or_report(
        &self,
        job: &FaxJob,
        retry_count: u32,
        log: &str,
    ) -> Result<(), FaxgateError> {
        if self.policy.exhausted(retry_count) {
            if retry_count == self.policy.max_retries() {
                warn!(job_id = %job.id, retry_count, "retries exhausted, raising problem report");
                let description = format!(
                    "fax delivery permanently failed after {retry_count} retries\n\n{log}"
                );
                self.problems.report(&job.message_id, &description).await?;
                self.store.increment_retry(&job.id).await?;
            } else {
                debug!(job_id = %job.id, retry_count, "failure already reported");
            }
            return Ok(());
        }

        let delay = self.policy.delay_for(retry_count);
        self.store.increment_retry(&job.id).await?;
        self.scheduler.schedule(&job.id, delay).await?;
        Ok(())
    }
}
