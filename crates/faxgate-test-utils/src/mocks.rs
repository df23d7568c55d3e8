// SPDX-FileCopyrightText: 2026 Faxgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborator implementations for deterministic testing.
//!
//! Every mock records its calls behind a `Mutex` so tests can assert on
//! side effects, and `MockFaxProvider` pops scripted results from a FIFO
//! queue, defaulting to acceptance with a generated fax id.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faxgate_core::{
    AttachmentStore, Document, FaxProvider, FaxSubmission, FaxgateError, MessageId,
    MessageStore, ProblemReporter, ProviderAccepted, ProviderKind, SignatureStore,
    SourceMessage,
};

/// Scripted fax-gateway client.
pub struct MockFaxProvider {
    kind: ProviderKind,
    results: Mutex<VecDeque<Result<String, String>>>,
    /// Every submission received, in order.
    pub calls: Mutex<Vec<FaxSubmission>>,
}

impl MockFaxProvider {
    /// Accepts every submission with a generated fax id.
    pub fn accepting(kind: ProviderKind) -> Self {
        Self {
            kind,
            results: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue an acceptance with a specific fax id.
    pub fn push_accept(&self, fax_id: &str) {
        self.results
            .lock()
            .unwrap()
            .push_back(Ok(fax_id.to_string()));
    }

    /// Queue a rejection.
    pub fn push_reject(&self, message: &str) {
        self.results
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }
}

#[async_trait]
impl FaxProvider for MockFaxProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn submit(&self, request: &FaxSubmission) -> Result<ProviderAccepted, FaxgateError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(request.clone());
        let call_count = calls.len();
        drop(calls);

        match self.results.lock().unwrap().pop_front() {
            Some(Ok(fax_id)) => Ok(ProviderAccepted { fax_id }),
            Some(Err(message)) => Err(FaxgateError::Submission {
                message,
                source: None,
            }),
            None => Ok(ProviderAccepted {
                fax_id: format!("mock-fax-{call_count}"),
            }),
        }
    }
}

/// In-memory message store recording every mutation.
#[derive(Default)]
pub struct MockMessageStore {
    pub messages: Mutex<HashMap<String, SourceMessage>>,
    pub recipient_updates: Mutex<Vec<(String, Option<String>)>>,
    pub sent: Mutex<Vec<(MessageId, String)>>,
    pub delivered: Mutex<Vec<(MessageId, DateTime<Utc>)>>,
}

impl MockMessageStore {
    pub fn with(messages: Vec<SourceMessage>) -> Self {
        Self {
            messages: Mutex::new(
                messages.into_iter().map(|m| (m.id.0.clone(), m)).collect(),
            ),
            ..Default::default()
        }
    }

    pub fn insert(&self, message: SourceMessage) {
        self.messages
            .lock()
            .unwrap()
            .insert(message.id.0.clone(), message);
    }
}

#[async_trait]
impl MessageStore for MockMessageStore {
    async fn get_message(&self, id: &MessageId) -> Result<Option<SourceMessage>, FaxgateError> {
        Ok(self.messages.lock().unwrap().get(&id.0).cloned())
    }

    async fn outbound_messages_of_request(
        &self,
        _request_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SourceMessage>, FaxgateError> {
        let mut messages: Vec<_> = self
            .messages
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.sent_at >= since && !m.is_response)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sent_at);
        Ok(messages)
    }

    async fn update_recipient_fax(
        &self,
        recipient_id: &str,
        number: Option<&str>,
    ) -> Result<(), FaxgateError> {
        self.recipient_updates
            .lock()
            .unwrap()
            .push((recipient_id.to_string(), number.map(String::from)));
        Ok(())
    }

    async fn mark_sent(&self, id: &MessageId, provider_fax_id: &str) -> Result<(), FaxgateError> {
        self.sent
            .lock()
            .unwrap()
            .push((id.clone(), provider_fax_id.to_string()));
        Ok(())
    }

    async fn mark_delivered(&self, id: &MessageId, at: DateTime<Utc>) -> Result<(), FaxgateError> {
        self.delivered.lock().unwrap().push((id.clone(), at));
        Ok(())
    }
}

/// Signature image store backed by a set of user ids.
#[derive(Default)]
pub struct MockSignatureStore {
    pub users: Mutex<HashSet<String>>,
}

impl MockSignatureStore {
    pub fn with_users(users: &[&str]) -> Self {
        Self {
            users: Mutex::new(users.iter().map(|u| u.to_string()).collect()),
        }
    }
}

#[async_trait]
impl SignatureStore for MockSignatureStore {
    async fn has_signature(&self, user: &str) -> Result<bool, FaxgateError> {
        Ok(self.users.lock().unwrap().contains(user))
    }
}

/// Problem-report collaborator recording reports and resolutions.
#[derive(Default)]
pub struct MockProblemReporter {
    pub reports: Mutex<Vec<(MessageId, String)>>,
    pub resolved: Mutex<Vec<MessageId>>,
}

#[async_trait]
impl ProblemReporter for MockProblemReporter {
    async fn report(&self, message: &MessageId, description: &str) -> Result<(), FaxgateError> {
        self.reports
            .lock()
            .unwrap()
            .push((message.clone(), description.to_string()));
        Ok(())
    }

    async fn resolve(&self, message: &MessageId) -> Result<(), FaxgateError> {
        self.resolved.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Rendered-document store backed by a map.
#[derive(Default)]
pub struct MockAttachmentStore {
    pub documents: Mutex<HashMap<String, Document>>,
}

impl MockAttachmentStore {
    pub fn insert_pdf(&self, message: &MessageId, bytes: &[u8]) {
        self.documents.lock().unwrap().insert(
            message.0.clone(),
            Document {
                content_type: "application/pdf".to_string(),
                bytes: bytes.to_vec(),
            },
        );
    }
}

#[async_trait]
impl AttachmentStore for MockAttachmentStore {
    async fn fetch_document(
        &self,
        message: &MessageId,
    ) -> Result<Option<Document>, FaxgateError> {
        Ok(self.documents.lock().unwrap().get(&message.0).cloned())
    }
}
