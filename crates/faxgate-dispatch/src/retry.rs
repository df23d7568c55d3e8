// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry policy and the deferred re-submission machinery.
//!
//! Scheduling is fire-and-forget: `RetryScheduler::schedule` inserts into
//! the persisted queue and returns without blocking the callback response.
//! A polling worker claims due entries and re-invokes the orchestrator.
//! At-least-once execution is acceptable because re-submission is
//! idempotent (a retry fired for an already-delivered job is discarded
//! cheaply at execution time).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use faxgate_core::{FaxJobId, FaxgateError, ProviderKind};
use faxgate_storage::FaxStore;
use tracing::{debug, warn};

use crate::submit::{Orchestrator, ResubmitOutcome};

/// Retry bounds and backoff shape, keyed by provider variant.
///
/// The two providers historically used different policies and both are
/// preserved: the current provider backs off exponentially
/// (`base * 4^retry`), the legacy provider retries at a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    kind: ProviderKind,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(kind: ProviderKind, max_retries: u32, base_delay_minutes: u64) -> Self {
        Self {
            kind,
            max_retries,
            base_delay: Duration::from_secs(base_delay_minutes * 60),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether a job with this many completed retries gets another one.
    pub fn exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_retries
    }

    /// Delay before the next attempt, given the retries already spent.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        match self.kind {
            ProviderKind::Current => {
                // Bounded by max_retries, so the exponent stays tiny.
                self.base_delay * 4u32.pow(retry_count.min(8))
            }
            ProviderKind::Legacy => self.base_delay,
        }
    }
}

/// Hands retry requests to the persisted queue.
#[derive(Clone)]
pub struct RetryScheduler {
    store: FaxStore,
}

impl RetryScheduler {
    pub fn new(store: FaxStore) -> Self {
        Self { store }
    }

    /// Schedule a re-submission attempt after `delay`. Returns as soon as
    /// the queue entry is written; execution happens in the worker.
    pub async fn schedule(
        &self,
        job_id: &FaxJobId,
        delay: Duration,
    ) -> Result<(), FaxgateError> {
        let due_at = Utc::now()
            + chrono::Duration::from_std(delay)
                .map_err(|e| FaxgateError::Internal(format!("retry delay out of range: {e}")))?;
        let entry_id = self.store.schedule_retry(job_id, due_at).await?;
        debug!(job_id = %job_id, entry_id, due_at = %due_at, "retry scheduled");
        Ok(())
    }
}

/// Polls the retry queue and re-invokes the orchestrator for due entries.
pub struct RetryWorker {
    store: FaxStore,
    orchestrator: Arc<Orchestrator>,
    poll_interval: Duration,
}

impl RetryWorker {
    pub fn new(store: FaxStore, orchestrator: Arc<Orchestrator>, poll_interval: Duration) -> Self {
        Self {
            store,
            orchestrator,
            poll_interval,
        }
    }

    /// Run the polling loop until the task is aborted.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.drain().await {
                    warn!(error = %e, "retry drain failed");
                }
            }
        })
    }

    /// Claim and execute every due entry once. Exposed separately from the
    /// loop so tests can drive it deterministically.
    pub async fn drain(&self) -> Result<usize, FaxgateError> {
        let due = self.store.claim_due_retries(Utc::now()).await?;
        let mut executed = 0;
        for entry in due {
            let job_id = FaxJobId(entry.job_id.clone());
            match self.orchestrator.resubmit(&job_id).await {
                Ok(ResubmitOutcome::Resubmitted) => {
                    executed += 1;
                    self.store.complete_retry(entry.id).await?;
                }
                Ok(ResubmitOutcome::Superseded) => {
                    debug!(job_id = %job_id, "retry superseded, job already settled");
                    self.store.complete_retry(entry.id).await?;
                }
                Err(e) => {
                    // Transient failure: put the entry back and try again
                    // on a later poll.
                    warn!(job_id = %job_id, error = %e, "retry execution failed, releasing");
                    self.store
                        .release_retry(entry.id, Utc::now() + chrono::Duration::minutes(5))
                        .await?;
                }
            }
        }
        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_policy_backs_off_exponentially() {
        let policy = RetryPolicy::new(ProviderKind::Current, 3, 15);
        assert_eq!(policy.delay_for(0), Duration::from_secs(15 * 60));
        assert_eq!(policy.delay_for(1), Duration::from_secs(60 * 60));
        assert_eq!(policy.delay_for(2), Duration::from_secs(240 * 60));
    }

    #[test]
    fn legacy_policy_is_linear() {
        let policy = RetryPolicy::new(ProviderKind::Legacy, 4, 15);
        for retry in 0..4 {
            assert_eq!(policy.delay_for(retry), Duration::from_secs(15 * 60));
        }
    }

    #[test]
    fn exhaustion_bound_matches_max_retries() {
        let policy = RetryPolicy::new(ProviderKind::Current, 3, 15);
        assert!(!policy.exhausted(0));
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
        assert!(policy.exhausted(4));
    }
}
