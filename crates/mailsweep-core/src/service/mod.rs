//! The consumed triage service boundary.
//!
//! This module defines the contract the workflow engine expects from the
//! backend: authentication checks, fetching, classification, deletion and
//! logout. The engine is generic over [`TriageService`], so the HTTP
//! transport lives in its own crate and tests can script responses.

use std::future::Future;

use crate::triage::{Message, MessageId};
use crate::workflow::FetchQuery;

/// Errors reported by a [`TriageService`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The session credentials were rejected (HTTP 401).
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found")]
    NotFound,

    /// The service answered with a failure status.
    #[error("Service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The request never completed (connection, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for service calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Raw messages returned by a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMessages {
    /// The fetched, unclassified messages.
    pub messages: Vec<Message>,
    /// Number of messages the service reports as fetched.
    pub total_fetched: usize,
}

/// Classification result for a set of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Messages suggested for deletion.
    pub to_delete: Vec<Message>,
    /// Count the service reports for `to_delete`.
    pub to_delete_count: usize,
    /// Important messages.
    pub important: Vec<Message>,
    /// Count the service reports for `important`.
    pub important_count: usize,
    /// Number of batches of ten the service processed.
    pub batches_processed: usize,
}

/// Outcome of a confirmed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// The message was deleted by this call.
    Deleted,
    /// The message was already gone; treated as success.
    AlreadyGone,
}

/// The latest messages, already categorized, as served by the dashboard
/// endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentSnapshot {
    /// Every recent message.
    pub all: Vec<Message>,
    /// Messages suggested for deletion.
    pub to_delete: Vec<Message>,
    /// Important messages.
    pub important: Vec<Message>,
    /// Total the service reports; informational only.
    pub total_emails: usize,
}

/// Backend operations consumed by the workflow engine.
///
/// Every call carries the session credentials. Implementations must map a
/// rejected session to [`ServiceError::Unauthorized`], whatever the
/// operation.
pub trait TriageService {
    /// Checks whether the current session is authenticated.
    fn check_auth(&self) -> impl Future<Output = ServiceResult<()>> + Send;

    /// Fetches the latest messages matching `query`.
    fn fetch(&self, query: &FetchQuery)
    -> impl Future<Output = ServiceResult<FetchedMessages>> + Send;

    /// Submits messages for classification.
    fn analyze(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = ServiceResult<AnalysisReport>> + Send;

    /// Deletes a single message.
    fn delete(&self, id: &MessageId) -> impl Future<Output = ServiceResult<DeleteStatus>> + Send;

    /// Fetches and categorizes the latest messages in one call.
    fn recent(&self) -> impl Future<Output = ServiceResult<RecentSnapshot>> + Send;

    /// Ends the session on the server.
    fn logout(&self) -> impl Future<Output = ServiceResult<()>> + Send;

    /// Where the user is sent to authenticate again.
    fn login_url(&self) -> String;
}
