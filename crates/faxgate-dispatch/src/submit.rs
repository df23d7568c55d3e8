// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fax submission orchestrator.
//!
//! Decides whether a candidate message is eligible to be faxed, creates
//! the job + delivery-status pair atomically, and submits to the provider.
//! Ineligibility is a normal, silent outcome (`Ok(None)`); only provider
//! and infrastructure failures are errors.

use std::sync::Arc;

use chrono::Utc;
use faxgate_auth::UrlTokenSigner;
use faxgate_core::{
    CanonicalStatus, FaxJob, FaxJobId, FaxProvider, FaxSubmission, FaxgateError, MessageId,
    MessageStore, ProviderKind, SignatureStore, SourceMessage,
};
use faxgate_storage::FaxStore;
use tracing::{debug, info, warn};

use crate::number;

/// Who is asking for the submission. Staff actors may override individual
/// eligibility checks for manually triggered resends; for everyone else
/// the overrides are ignored.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub is_staff: bool,
}

impl Actor {
    /// The automatic pipeline (listeners, retry worker).
    pub fn system() -> Self {
        Self {
            id: "system".to_string(),
            is_staff: false,
        }
    }

    pub fn staff(id: &str) -> Self {
        Self {
            id: id.to_string(),
            is_staff: true,
        }
    }
}

/// Per-check overrides for staff-triggered submissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitOverrides {
    /// Skip the outbound-email-kind and non-reply checks.
    pub ignore_kind: bool,
    /// Fax even when the governing law does not require a signature.
    pub ignore_signature_requirement: bool,
    /// Fax even when the sender has no stored signature image.
    pub ignore_missing_signature: bool,
    /// Skip the message-age recency window.
    pub ignore_age: bool,
    /// Allow a resend: only an *active* prior job blocks, terminal job
    /// chains do not.
    pub allow_resend: bool,
}

/// Why a message was not faxed. Expected outcomes, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotEmailKind,
    IsResponse,
    SignatureNotRequired,
    NoFaxNumber,
    NoSenderSignature,
    TooOld,
    JobAlreadyExists,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::NotEmailKind => "message is not an outbound email",
            SkipReason::IsResponse => "message is a reply",
            SkipReason::SignatureNotRequired => "law does not require a signature",
            SkipReason::NoFaxNumber => "recipient has no usable fax number",
            SkipReason::NoSenderSignature => "sender has no stored signature",
            SkipReason::TooOld => "message is outside the recency window",
            SkipReason::JobAlreadyExists => "a fax job already exists for this message",
        };
        f.write_str(s)
    }
}

/// Result of a re-submission attempt from the retry worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResubmitOutcome {
    Resubmitted,
    /// The job was already delivered (or gone); nothing to do.
    Superseded,
}

enum Eligibility {
    /// Carries the normalized E.164 recipient number.
    Eligible(String),
    Skip(SkipReason),
}

/// Static wiring for the orchestrator, fed from configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Public base URL for minted callback/media URLs.
    pub public_url: String,
    /// Source fax number, E.164.
    pub from_number: String,
    /// Provider connection identifier, where required.
    pub connection_id: Option<String>,
    /// Messages older than this are never auto-faxed.
    pub eligibility_window_hours: i64,
    /// Country calling code for nationally formatted numbers.
    pub default_country_code: String,
}

/// Creates fax jobs and drives provider submission.
pub struct Orchestrator {
    store: FaxStore,
    messages: Arc<dyn MessageStore>,
    signatures: Arc<dyn SignatureStore>,
    provider: Arc<dyn FaxProvider>,
    tokens: UrlTokenSigner,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        store: FaxStore,
        messages: Arc<dyn MessageStore>,
        signatures: Arc<dyn SignatureStore>,
        provider: Arc<dyn FaxProvider>,
        tokens: UrlTokenSigner,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            messages,
            signatures,
            provider,
            tokens,
            config,
        }
    }

    /// Submit one message as a fax if it is eligible.
    ///
    /// Returns `Ok(None)` when the message does not exist or fails the
    /// eligibility predicate -- a normal "not applicable" outcome. On
    /// success the job is created with status `Sending`, submitted, and
    /// the message is marked sent iff the provider accepted. A provider
    /// rejection rolls the job back and surfaces as
    /// [`FaxgateError::Submission`]; no partially consistent job remains.
    pub async fn submit(
        &self,
        message_id: &MessageId,
        actor: &Actor,
        overrides: SubmitOverrides,
    ) -> Result<Option<FaxJob>, FaxgateError> {
        let Some(message) = self.messages.get_message(message_id).await? else {
            debug!(message_id = %message_id, "message disappeared before submission");
            return Ok(None);
        };

        let number = match self.check_eligibility(&message, actor, overrides).await? {
            Eligibility::Eligible(number) => number,
            Eligibility::Skip(reason) => {
                debug!(message_id = %message_id, %reason, "message not faxed");
                return Ok(None);
            }
        };

        let mut job = FaxJob {
            id: FaxJobId(uuid::Uuid::new_v4().to_string()),
            message_id: message.id.clone(),
            recipient_number: number,
            provider_fax_id: None,
            created_at: Utc::now(),
        };
        self.store.create_job(&job, CanonicalStatus::Sending).await?;

        let submission = self.build_submission(&job);
        match self.provider.submit(&submission).await {
            Ok(accepted) => {
                self.store
                    .set_provider_fax_id(&job.id, &accepted.fax_id)
                    .await?;
                self.messages.mark_sent(&message.id, &accepted.fax_id).await?;
                info!(job_id = %job.id, fax_id = %accepted.fax_id, "fax submitted");
                job.provider_fax_id = Some(accepted.fax_id);
                Ok(Some(job))
            }
            Err(e) => {
                // Leave no half-created job behind; the next attempt
                // starts from a clean slate.
                self.store.delete_job(&job.id).await?;
                Err(e)
            }
        }
    }

    /// Bulk entry point: fax every recent outbound message of a request.
    ///
    /// Individual submission failures are logged and skipped so one bad
    /// recipient does not block the rest.
    pub async fn submit_request(
        &self,
        request_id: &str,
        actor: &Actor,
    ) -> Result<Vec<FaxJob>, FaxgateError> {
        let since = Utc::now() - chrono::Duration::hours(self.config.eligibility_window_hours);
        let messages = self
            .messages
            .outbound_messages_of_request(request_id, since)
            .await?;

        let mut jobs = Vec::new();
        for message in messages {
            match self
                .submit(&message.id, actor, SubmitOverrides::default())
                .await
            {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => {
                    warn!(message_id = %message.id, error = %e, "submission failed, continuing");
                }
            }
        }
        Ok(jobs)
    }

    /// Re-submit an existing job from the retry worker.
    ///
    /// Idempotent: a job that was delivered in the meantime (or deleted)
    /// is discarded cheaply. The job keeps its identity and retry count;
    /// only the provider fax id and the `Sending` status are refreshed.
    pub async fn resubmit(&self, job_id: &FaxJobId) -> Result<ResubmitOutcome, FaxgateError> {
        let Some(job) = self.store.get_job(job_id).await? else {
            return Ok(ResubmitOutcome::Superseded);
        };
        let Some(status) = self.store.delivery_status(job_id).await? else {
            return Ok(ResubmitOutcome::Superseded);
        };
        if status.status.is_delivered() {
            return Ok(ResubmitOutcome::Superseded);
        }

        let submission = self.build_submission(&job);
        let accepted = self.provider.submit(&submission).await?;
        self.store
            .set_provider_fax_id(&job.id, &accepted.fax_id)
            .await?;
        self.messages.mark_sent(&job.message_id, &accepted.fax_id).await?;
        self.store.mark_resubmitted(&job.id, Utc::now()).await?;
        info!(job_id = %job.id, fax_id = %accepted.fax_id, "fax re-submitted");
        Ok(ResubmitOutcome::Resubmitted)
    }

    fn build_submission(&self, job: &FaxJob) -> FaxSubmission {
        let base = self.config.public_url.trim_end_matches('/');
        let callback_url = match self.provider.kind() {
            // The current provider authenticates callbacks with signature
            // headers; one shared endpoint suffices.
            ProviderKind::Current => format!("{base}/fax/callback"),
            // Legacy callbacks are authenticated by the signed URL itself.
            ProviderKind::Legacy => format!(
                "{base}/fax/callback/{}",
                self.tokens.sign_callback(&job.message_id)
            ),
        };
        FaxSubmission {
            to: job.recipient_number.clone(),
            from: self.config.from_number.clone(),
            media_url: format!("{base}/fax/media/{}", self.tokens.sign_media(&job.message_id)),
            callback_url,
            connection_id: self.config.connection_id.clone(),
        }
    }

    async fn check_eligibility(
        &self,
        message: &SourceMessage,
        actor: &Actor,
        overrides: SubmitOverrides,
    ) -> Result<Eligibility, FaxgateError> {
        // Overrides are a staff capability; anyone else gets the full
        // predicate regardless of what they passed.
        let overrides = if actor.is_staff {
            overrides
        } else {
            SubmitOverrides::default()
        };

        if !overrides.ignore_kind {
            if message.kind != "email" {
                return Ok(Eligibility::Skip(SkipReason::NotEmailKind));
            }
            if message.is_response {
                return Ok(Eligibility::Skip(SkipReason::IsResponse));
            }
        }

        if !overrides.ignore_signature_requirement && !message.law_requires_signature {
            return Ok(Eligibility::Skip(SkipReason::SignatureNotRequired));
        }

        let number = match self.ensure_fax_number(message).await? {
            Some(number) => number,
            None => return Ok(Eligibility::Skip(SkipReason::NoFaxNumber)),
        };

        if !overrides.ignore_missing_signature {
            let has_signature = match &message.sender_user {
                Some(user) => self.signatures.has_signature(user).await?,
                None => false,
            };
            if !has_signature {
                return Ok(Eligibility::Skip(SkipReason::NoSenderSignature));
            }
        }

        if !overrides.ignore_age {
            let window = chrono::Duration::hours(self.config.eligibility_window_hours);
            if Utc::now() - message.sent_at > window {
                return Ok(Eligibility::Skip(SkipReason::TooOld));
            }
        }

        let duplicate = if overrides.allow_resend {
            self.store
                .find_active_job_for_message(&message.id)
                .await?
                .is_some()
        } else {
            self.store.has_job_for_message(&message.id).await?
        };
        if duplicate {
            return Ok(Eligibility::Skip(SkipReason::JobAlreadyExists));
        }

        Ok(Eligibility::Eligible(number))
    }

    /// Validate and normalize the recipient fax number, persisting the
    /// result back onto the recipient record: unparseable numbers are
    /// cleared, non-canonical ones are rewritten as E.164.
    async fn ensure_fax_number(
        &self,
        message: &SourceMessage,
    ) -> Result<Option<String>, FaxgateError> {
        let Some(raw) = message.recipient_fax.as_deref() else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        match number::normalize(raw, &self.config.default_country_code) {
            Some(normalized) => {
                if normalized != raw {
                    self.messages
                        .update_recipient_fax(&message.recipient_id, Some(&normalized))
                        .await?;
                }
                Ok(Some(normalized))
            }
            None => {
                self.messages
                    .update_recipient_fax(&message.recipient_id, None)
                    .await?;
                Ok(None)
            }
        }
    }
}
