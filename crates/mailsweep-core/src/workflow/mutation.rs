//! Delete controller for single and bulk deletes.

use std::fmt;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::activity::{ActivityTracker, Task};
use crate::service::{DeleteStatus, ServiceError, ServiceResult, TriageService};
use crate::triage::{EmailStore, MessageId, SelectionSet};
use crate::{Error, Result};

/// Lifecycle of one delete request.
///
/// A delete starts `Pending` and settles exactly once. Both settled states
/// are terminal and nothing is retried automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeleteState {
    /// The request is in flight.
    #[default]
    Pending,
    /// The service confirmed the message is gone.
    Confirmed(DeleteStatus),
    /// The service refused or the request failed.
    Failed(String),
}

impl DeleteState {
    /// Settles a pending delete with the service outcome.
    ///
    /// Returns `false` and leaves the state alone if it already settled.
    pub fn settle(&mut self, outcome: &ServiceResult<DeleteStatus>) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = match outcome {
            Ok(status) => Self::Confirmed(*status),
            Err(e) => Self::Failed(e.to_string()),
        };
        true
    }

    /// Returns `true` once the delete has settled.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns `true` if the message is confirmed gone.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

/// A delete that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    /// The message that is still present.
    pub id: MessageId,
    /// What the service reported.
    pub reason: String,
}

/// Outcome of a bulk delete. Successes are applied even when some ids fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteReport {
    /// Ids removed from the collection.
    pub succeeded: Vec<MessageId>,
    /// Ids that remain, with the reason.
    pub failed: Vec<DeleteFailure>,
}

impl BulkDeleteReport {
    /// Returns `true` if some deletes failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Short human summary, e.g. `"2 deleted, 1 failed"`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BulkDeleteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deleted", self.succeeded.len())?;
        if self.is_partial() {
            write!(f, ", {} failed", self.failed.len())?;
        }
        Ok(())
    }
}

/// Issues deletes and applies confirmed removals to a collection.
pub(crate) struct MutationController<'a, S> {
    service: &'a S,
    activity: &'a ActivityTracker,
}

impl<'a, S: TriageService> MutationController<'a, S> {
    pub(crate) const fn new(service: &'a S, activity: &'a ActivityTracker) -> Self {
        Self { service, activity }
    }

    /// Deletes one message. Nothing changes unless the service confirms.
    pub(crate) async fn delete_one(
        &self,
        store: &mut EmailStore,
        selection: &mut SelectionSet,
        id: &MessageId,
    ) -> Result<DeleteStatus> {
        if !store.contains(id) {
            return Err(Error::InvalidRequest(format!("unknown email id '{id}'")));
        }

        let _busy = self.activity.begin(Task::Delete);
        match self.service.delete(id).await {
            Ok(status) => {
                store.remove(id);
                selection.prune(|selected| store.contains(selected));
                debug!("Deleted {id} ({status:?})");
                Ok(status)
            }
            Err(e) => {
                warn!("Delete of {id} failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Deletes every id concurrently and applies the successes at once.
    ///
    /// A single unauthorized response fails the whole call with
    /// `SessionExpired`; every other failure is reported per id.
    pub(crate) async fn delete_many(
        &self,
        store: &mut EmailStore,
        selection: &mut SelectionSet,
        ids: Vec<MessageId>,
    ) -> Result<BulkDeleteReport> {
        if ids.is_empty() {
            return Err(Error::InvalidRequest("no emails selected".into()));
        }
        if let Some(stale) = ids.iter().find(|id| !store.contains(id)) {
            return Err(Error::InvalidRequest(format!("unknown email id '{stale}'")));
        }

        let _busy = self.activity.begin(Task::Delete);
        info!("Deleting {} emails", ids.len());

        let service = self.service;
        let outcomes = join_all(ids.iter().map(|id| async move {
            let mut state = DeleteState::Pending;
            let outcome = service.delete(id).await;
            state.settle(&outcome);
            (outcome, state)
        }))
        .await;

        if outcomes
            .iter()
            .any(|(outcome, _)| matches!(outcome, Err(ServiceError::Unauthorized)))
        {
            warn!("Session rejected during bulk delete");
            return Err(Error::SessionExpired);
        }

        let mut report = BulkDeleteReport::default();
        for (id, (_, state)) in ids.into_iter().zip(outcomes) {
            match state {
                DeleteState::Confirmed(_) => {
                    store.remove(&id);
                    report.succeeded.push(id);
                }
                DeleteState::Failed(reason) => {
                    warn!("Delete of {id} failed: {reason}");
                    report.failed.push(DeleteFailure { id, reason });
                }
                DeleteState::Pending => {}
            }
        }
        selection.prune(|selected| store.contains(selected));

        info!("Bulk delete finished: {report}");
        Ok(report)
    }
}
