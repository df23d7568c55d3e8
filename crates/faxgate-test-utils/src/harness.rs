// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness assembling the full delivery stack over temp SQLite.
//!
//! Wires a [`FaxStore`] in a tempdir with mock collaborators, the
//! orchestrator, and the callback processor, so integration tests can
//! drive submit-then-callback flows end to end without a network.

use std::sync::Arc;

use chrono::{Duration, Utc};
use faxgate_auth::UrlTokenSigner;
use faxgate_core::{FaxgateError, MessageId, ProviderKind, SourceMessage};
use faxgate_dispatch::{
    CallbackProcessor, Orchestrator, OrchestratorConfig, RetryPolicy,
};
use faxgate_storage::FaxStore;

use crate::mocks::{
    MockAttachmentStore, MockFaxProvider, MockMessageStore, MockProblemReporter,
    MockSignatureStore,
};

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    kind: ProviderKind,
    max_retries: u32,
    base_delay_minutes: u64,
    messages: Vec<SourceMessage>,
    signature_users: Vec<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            kind: ProviderKind::Current,
            max_retries: 3,
            base_delay_minutes: 15,
            messages: Vec::new(),
            signature_users: vec!["alice".to_string()],
        }
    }

    pub fn with_provider_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay_minutes(mut self, minutes: u64) -> Self {
        self.base_delay_minutes = minutes;
        self
    }

    pub fn with_message(mut self, message: SourceMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_signature_user(mut self, user: &str) -> Self {
        self.signature_users.push(user.to_string());
        self
    }

    pub async fn build(self) -> Result<TestHarness, FaxgateError> {
        let dir = tempfile::tempdir().map_err(|e| FaxgateError::Storage {
            source: Box::new(e),
        })?;
        let db_path = dir.path().join("faxgate-test.db");
        let store = FaxStore::open(&db_path.to_string_lossy()).await?;

        let messages = Arc::new(MockMessageStore::with(self.messages));
        let signatures = Arc::new(MockSignatureStore::with_users(
            &self
                .signature_users
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
        ));
        let problems = Arc::new(MockProblemReporter::default());
        let attachments = Arc::new(MockAttachmentStore::default());
        let provider = Arc::new(MockFaxProvider::accepting(self.kind));
        let tokens = UrlTokenSigner::new("harness-url-secret", "acct-test")?;

        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            messages.clone(),
            signatures.clone(),
            provider.clone(),
            tokens.clone(),
            OrchestratorConfig {
                public_url: "https://fax.example.org".to_string(),
                from_number: "+4930111111".to_string(),
                connection_id: Some("conn-test".to_string()),
                eligibility_window_hours: 36,
                default_country_code: "49".to_string(),
            },
        ));

        let processor = Arc::new(CallbackProcessor::new(
            store.clone(),
            messages.clone(),
            problems.clone(),
            RetryPolicy::new(self.kind, self.max_retries, self.base_delay_minutes),
        ));

        Ok(TestHarness {
            _dir: dir,
            kind: self.kind,
            store,
            messages,
            signatures,
            problems,
            attachments,
            provider,
            tokens,
            orchestrator,
            processor,
        })
    }
}

/// A fully wired delivery stack over temp SQLite and mock collaborators.
pub struct TestHarness {
    _dir: tempfile::TempDir,
    pub kind: ProviderKind,
    pub store: FaxStore,
    pub messages: Arc<MockMessageStore>,
    pub signatures: Arc<MockSignatureStore>,
    pub problems: Arc<MockProblemReporter>,
    pub attachments: Arc<MockAttachmentStore>,
    pub provider: Arc<MockFaxProvider>,
    pub tokens: UrlTokenSigner,
    pub orchestrator: Arc<Orchestrator>,
    pub processor: Arc<CallbackProcessor>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// An eligible outbound email message, two hours old.
    pub fn eligible_message(id: &str) -> SourceMessage {
        SourceMessage {
            id: MessageId(id.to_string()),
            kind: "email".to_string(),
            is_response: false,
            sent_at: Utc::now() - Duration::hours(2),
            sender_user: Some("alice".to_string()),
            recipient_id: format!("recipient-{id}"),
            recipient_fax: Some("+49 30 1234567".to_string()),
            law_requires_signature: true,
        }
    }
}
