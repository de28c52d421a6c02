//! Error types for the core library.

use thiserror::Error;

use crate::service::ServiceError;
use crate::workflow::ViewKind;

/// Errors that can occur in workflow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// User input was rejected before any network call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Message data is malformed (for example a message without an id).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The service rejected the session credentials.
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// A workflow operation was attempted without an authenticated session.
    #[error("Not signed in")]
    NotSignedIn,

    /// The triggering action is not valid in the current view.
    #[error("Cannot {action} while in {state} view")]
    InvalidTransition {
        /// The action that was attempted.
        action: &'static str,
        /// The view the session was in.
        state: ViewKind,
    },

    /// The classification service failed.
    #[error("Analysis failed: {cause}")]
    AnalysisFailed {
        /// Underlying service failure.
        #[source]
        cause: ServiceError,
    },

    /// Any other service failure (network, 5xx, malformed response).
    #[error("Service error: {0}")]
    Service(ServiceError),
}

impl Error {
    /// Creates an analysis failure, keeping `SessionExpired` distinguishable.
    #[must_use]
    pub fn analysis(cause: ServiceError) -> Self {
        match cause {
            ServiceError::Unauthorized => Self::SessionExpired,
            cause => Self::AnalysisFailed { cause },
        }
    }

    /// Returns `true` if re-issuing the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::AnalysisFailed { .. } | Self::Service(_))
    }

    /// Returns `true` if this error must force a full session reset.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized => Self::SessionExpired,
            err => Self::Service(err),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
