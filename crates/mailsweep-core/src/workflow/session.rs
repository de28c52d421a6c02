//! The owned triage session.

use std::collections::HashSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::activity::{Activity, ActivityTracker, AnalysisProgress, ProgressTracker, Task};
use super::analysis::{AnalysisController, AnalysisMode, AnalysisSummary};
use super::fetch::{FetchController, FetchOutcome};
use super::mutation::{BulkDeleteReport, MutationController};
use super::request::FetchRequest;
use super::view::{FetchedBatch, ViewKind, ViewState};
use crate::service::{DeleteStatus, RecentSnapshot, ServiceError, TriageService};
use crate::triage::{Bucket, EmailStore, Message, MessageId, Section, SelectionSet, Stats};
use crate::{Error, Result};

/// Shown when a fetch matches nothing.
pub const NO_RESULTS_TEXT: &str =
    "No emails found for the specified criteria. Try adjusting your search parameters.";

/// Session behavior settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How batches are submitted for classification.
    pub analysis_mode: AnalysisMode,
}

impl SessionConfig {
    /// Sets the analysis mode.
    #[must_use]
    pub const fn with_analysis_mode(mut self, mode: AnalysisMode) -> Self {
        self.analysis_mode = mode;
        self
    }
}

/// Authentication state as last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Not checked yet.
    #[default]
    Unknown,
    /// The service accepted the session.
    SignedIn,
    /// No valid session.
    SignedOut,
    /// The service rejected a session that used to be valid.
    Expired,
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Routine outcome.
    Info,
    /// The operation partly succeeded.
    Warning,
    /// The operation failed.
    Error,
}

/// The user-visible status line for the last operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text to display.
    pub text: String,
}

impl Notice {
    /// An informational notice.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    /// A warning notice.
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// One user's triage session.
///
/// Owns the service handle, the categorized store, the selection and the
/// view. Every workflow operation takes `&mut self`, so a second trigger
/// cannot start until the first one completes or is dropped.
#[derive(Debug)]
pub struct Session<S> {
    service: S,
    config: SessionConfig,
    auth: AuthState,
    store: EmailStore,
    selection: SelectionSet,
    view: ViewState,
    notice: Option<Notice>,
    activity: ActivityTracker,
    progress: ProgressTracker,
}

impl<S: TriageService> Session<S> {
    /// Creates a session in the `Unknown` auth state on the dashboard.
    #[must_use]
    pub fn new(service: S, config: SessionConfig) -> Self {
        Self {
            service,
            config,
            auth: AuthState::Unknown,
            store: EmailStore::new(),
            selection: SelectionSet::new(),
            view: ViewState::Dashboard,
            notice: None,
            activity: ActivityTracker::new(),
            progress: ProgressTracker::new(),
        }
    }

    /// Checks authentication with the service.
    ///
    /// # Errors
    ///
    /// Returns `Service` if the check itself failed. A rejected session is
    /// not an error; it yields `AuthState::SignedOut`.
    pub async fn start(&mut self) -> Result<AuthState> {
        match self.service.check_auth().await {
            Ok(()) => {
                info!("Session authenticated");
                self.auth = AuthState::SignedIn;
            }
            Err(ServiceError::Unauthorized) => {
                info!("Not signed in");
                self.auth = AuthState::SignedOut;
                self.notice = Some(Notice::info(format!(
                    "Sign in at {}",
                    self.service.login_url()
                )));
            }
            Err(e) => {
                warn!("Auth check failed: {e}");
                self.notice = Some(Notice::error(format!("Could not reach the service: {e}")));
                return Err(Error::Service(e));
            }
        }
        Ok(self.auth)
    }

    /// Fetches the latest messages for review.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a bad count or range (no call is made),
    /// `InvalidTransition` outside the dashboard, `SessionExpired`,
    /// `InvalidData` or `Service` for failed calls.
    pub async fn fetch(&mut self, request: FetchRequest) -> Result<FetchOutcome> {
        self.ensure_signed_in()?;
        let result = FetchController::new(&self.service, &self.activity)
            .run(&mut self.view, request)
            .await;
        self.settle(result, |outcome| match outcome {
            FetchOutcome::Fetched { count } => Notice::info(format!("Fetched {count} emails")),
            FetchOutcome::NoResults => Notice::info(NO_RESULTS_TEXT),
        })
    }

    /// Classifies the fetched batch and merges it into the store.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless reviewing a batch, `SessionExpired`, or
    /// `AnalysisFailed` with the view left in place for a retry.
    pub async fn analyze(&mut self) -> Result<AnalysisSummary> {
        self.ensure_signed_in()?;
        let result = AnalysisController::new(
            &self.service,
            &self.activity,
            &self.progress,
            self.config.analysis_mode,
        )
        .run(&mut self.view, &mut self.store, &mut self.selection)
        .await;
        self.settle(result, analysis_notice)
    }

    /// Like [`Self::analyze`], but gives up when `cancel` resolves first.
    ///
    /// A cancelled analysis leaves the store untouched and goes back to the
    /// dashboard. Returns `Ok(None)` in that case.
    ///
    /// # Errors
    ///
    /// Same as [`Self::analyze`].
    pub async fn analyze_or_cancel(
        &mut self,
        cancel: impl Future<Output = ()>,
    ) -> Result<Option<AnalysisSummary>> {
        self.ensure_signed_in()?;
        let result = {
            let controller = AnalysisController::new(
                &self.service,
                &self.activity,
                &self.progress,
                self.config.analysis_mode,
            );
            tokio::select! {
                result = controller.run(&mut self.view, &mut self.store, &mut self.selection) => Some(result),
                () = cancel => None,
            }
        };

        match result {
            Some(result) => self.settle(result, analysis_notice).map(Some),
            None => {
                info!("Analysis cancelled");
                self.back()?;
                self.notice = Some(Notice::info("Analysis cancelled"));
                Ok(None)
            }
        }
    }

    /// Leaves `Fetching` or `ReviewingFetched` for the dashboard, discarding
    /// any raw batch and resetting analysis progress.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when already on the dashboard.
    pub fn back(&mut self) -> Result<()> {
        if self.view.kind() == ViewKind::Dashboard {
            return Err(Error::InvalidTransition {
                action: "go back",
                state: ViewKind::Dashboard,
            });
        }
        if let Some(batch) = self.view.back() {
            debug!("Discarded {} fetched emails", batch.len());
        }
        self.progress.reset();
        Ok(())
    }

    /// Deletes one message from the collection the current view shows.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an id not in that collection, `SessionExpired`,
    /// or `Service` if the delete was refused.
    pub async fn delete_one(&mut self, id: &MessageId) -> Result<DeleteStatus> {
        self.ensure_signed_in()?;
        let result = match current_collection(&mut self.view, &mut self.store, &mut self.selection, "delete")
        {
            Ok((store, selection)) => {
                MutationController::new(&self.service, &self.activity)
                    .delete_one(store, selection, id)
                    .await
            }
            Err(e) => Err(e),
        };
        if result.is_ok() {
            self.forget(std::slice::from_ref(id));
        }
        self.settle(result, |status| match status {
            DeleteStatus::Deleted => Notice::info("Email deleted"),
            DeleteStatus::AlreadyGone => Notice::info("Email was already deleted"),
        })
    }

    /// Deletes every selected message of the current view concurrently.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty selection, or `SessionExpired` if any
    /// delete was unauthorized. Other per-id failures are reported in the
    /// returned [`BulkDeleteReport`].
    pub async fn delete_selected(&mut self) -> Result<BulkDeleteReport> {
        self.ensure_signed_in()?;
        let result = match current_collection(&mut self.view, &mut self.store, &mut self.selection, "delete")
        {
            Ok((store, selection)) => {
                let ids: Vec<MessageId> = selection.ids().cloned().collect();
                MutationController::new(&self.service, &self.activity)
                    .delete_many(store, selection, ids)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Ok(report) = &result {
            self.forget(&report.succeeded);
        }
        self.settle(result, |report| {
            if report.is_partial() {
                Notice::warning(report.summary())
            } else {
                Notice::info(report.summary())
            }
        })
    }

    /// Replaces the store with the latest messages as categorized by the
    /// service.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside the dashboard, `SessionExpired`,
    /// `InvalidData` or `Service`.
    pub async fn refresh(&mut self) -> Result<Stats> {
        self.ensure_signed_in()?;
        let result = self.reload().await;
        self.settle(result, |stats| {
            Notice::info(format!(
                "Loaded {} emails: {} to delete, {} important",
                stats.total + stats.unclassified,
                stats.to_delete,
                stats.important
            ))
        })
    }

    async fn reload(&mut self) -> Result<Stats> {
        self.view.require(ViewKind::Dashboard, "refresh")?;
        let snapshot = {
            let _busy = self.activity.begin(Task::Refresh);
            self.service.recent().await?
        };

        let total_emails = snapshot.total_emails;
        let messages = categorize_snapshot(snapshot);
        if total_emails != messages.len() {
            warn!(
                "Service reported {total_emails} emails but returned {}",
                messages.len()
            );
        }

        self.store.load(messages)?;
        let store = &self.store;
        self.selection.prune(|id| store.contains(id));

        let stats = self.store.derived_stats();
        info!(
            "Refreshed dashboard: {} to delete, {} important, {} unclassified",
            stats.to_delete, stats.important, stats.unclassified
        );
        Ok(stats)
    }

    /// Ends the session on the service and clears all local state.
    ///
    /// Local state is cleared even if the service call fails.
    ///
    /// # Errors
    ///
    /// `Service` if the service could not be reached.
    pub async fn logout(&mut self) -> Result<()> {
        let result = match self.service.logout().await {
            Ok(()) | Err(ServiceError::Unauthorized) => Ok(()),
            Err(e) => Err(Error::Service(e)),
        };
        self.reset();
        self.auth = AuthState::SignedOut;
        info!("Signed out");
        self.settle(result, |_| Notice::info("Signed out"))
    }

    /// Where the user signs in again.
    #[must_use]
    pub fn login_url(&self) -> String {
        self.service.login_url()
    }

    /// Flips the selection of `id` in the current view. Returns the new state.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an id not in the current collection.
    pub fn toggle(&mut self, id: &MessageId) -> Result<bool> {
        let (store, selection) =
            current_collection(&mut self.view, &mut self.store, &mut self.selection, "select")?;
        ensure_known(store, id)?;
        Ok(selection.toggle(id))
    }

    /// Sets the selection of `id` in the current view.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an id not in the current collection.
    pub fn set_selected(&mut self, id: &MessageId, selected: bool) -> Result<()> {
        let (store, selection) =
            current_collection(&mut self.view, &mut self.store, &mut self.selection, "select")?;
        ensure_known(store, id)?;
        selection.set_selected(id, selected);
        Ok(())
    }

    /// Select-all / deselect-all for one section of the current view.
    /// Returns `true` if the section ends up selected.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` while a fetch is in flight.
    pub fn toggle_section(&mut self, section: Section) -> Result<bool> {
        let (store, selection) =
            current_collection(&mut self.view, &mut self.store, &mut self.selection, "select")?;
        let ids = store.section_ids(section);
        Ok(selection.toggle_all(&ids))
    }

    /// Returns `true` if every message of `section` is selected in the
    /// current view.
    #[must_use]
    pub fn is_section_selected(&self, section: Section) -> bool {
        let (store, selection) = self.current();
        selection.is_all_selected(store.section(section).map(|m| &m.id))
    }

    /// Deselects everything in the current view.
    pub fn clear_selection(&mut self) {
        match self.view.batch_mut() {
            Some(batch) => batch.parts_mut().1.clear(),
            None => self.selection.clear(),
        }
    }

    /// The categorized store shown on the dashboard.
    #[must_use]
    pub const fn store(&self) -> &EmailStore {
        &self.store
    }

    /// The dashboard selection.
    #[must_use]
    pub const fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// The selection of whichever collection the current view shows.
    #[must_use]
    pub fn current_selection(&self) -> &SelectionSet {
        self.current().1
    }

    /// The active view.
    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// Counts derived from the store.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.store.derived_stats()
    }

    /// The status line of the last operation.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Takes the status line, leaving none.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Authentication state as last observed.
    #[must_use]
    pub const fn auth_state(&self) -> AuthState {
        self.auth
    }

    /// Session settings.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The service handle.
    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Current busy flags.
    #[must_use]
    pub fn activity(&self) -> Activity {
        self.activity.current()
    }

    /// Subscribes to busy flag changes.
    #[must_use]
    pub fn subscribe_activity(&self) -> watch::Receiver<Activity> {
        self.activity.subscribe()
    }

    /// Current analysis progress.
    #[must_use]
    pub fn progress(&self) -> AnalysisProgress {
        self.progress.current()
    }

    /// Subscribes to analysis progress changes.
    #[must_use]
    pub fn subscribe_progress(&self) -> watch::Receiver<AnalysisProgress> {
        self.progress.subscribe()
    }

    fn current(&self) -> (&EmailStore, &SelectionSet) {
        match self.view.batch() {
            Some(batch) => (batch.messages(), batch.selection()),
            None => (&self.store, &self.selection),
        }
    }

    fn ensure_signed_in(&mut self) -> Result<()> {
        if self.auth == AuthState::SignedIn {
            return Ok(());
        }
        self.notice = Some(Notice::error(format!(
            "Not signed in. Sign in at {}",
            self.service.login_url()
        )));
        Err(Error::NotSignedIn)
    }

    /// Records the notice for `result` and performs the full reset when the
    /// session expired.
    fn settle<T>(&mut self, result: Result<T>, notice: impl FnOnce(&T) -> Notice) -> Result<T> {
        match &result {
            Ok(value) => self.notice = Some(notice(value)),
            Err(e) => {
                if e.is_session_expired() {
                    warn!("Session expired, clearing local state");
                    self.reset();
                    self.auth = AuthState::Expired;
                }
                self.notice = Some(Notice::error(e.to_string()));
            }
        }
        result
    }

    /// Drops deleted ids from the dashboard collection, whichever view the
    /// delete was issued from.
    fn forget(&mut self, deleted: &[MessageId]) {
        for id in deleted {
            self.store.remove(id);
        }
        let store = &self.store;
        self.selection.prune(|id| store.contains(id));
    }

    fn reset(&mut self) {
        self.store.clear();
        self.selection.clear();
        self.view = ViewState::Dashboard;
        self.progress.reset();
    }
}

fn analysis_notice(summary: &AnalysisSummary) -> Notice {
    let text = format!(
        "Analysis complete: {} to delete, {} important",
        summary.to_delete, summary.important
    );
    if summary.unclassified == 0 {
        Notice::info(text)
    } else {
        Notice::warning(format!("{text}, {} not classified", summary.unclassified))
    }
}

/// The store and selection the current view acts on.
fn current_collection<'a>(
    view: &'a mut ViewState,
    store: &'a mut EmailStore,
    selection: &'a mut SelectionSet,
    action: &'static str,
) -> Result<(&'a mut EmailStore, &'a mut SelectionSet)> {
    match view.kind() {
        ViewKind::Dashboard => Ok((store, selection)),
        ViewKind::ReviewingFetched => view
            .batch_mut()
            .map(FetchedBatch::parts_mut)
            .ok_or(Error::InvalidTransition {
                action,
                state: ViewKind::ReviewingFetched,
            }),
        ViewKind::Fetching => Err(Error::InvalidTransition {
            action,
            state: ViewKind::Fetching,
        }),
    }
}

fn ensure_known(store: &EmailStore, id: &MessageId) -> Result<()> {
    if store.contains(id) {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!("unknown email id '{id}'")))
    }
}

/// Flattens a dashboard snapshot into bucketed messages.
///
/// Messages listed in neither category stay unclassified; an id in both
/// ends up important.
fn categorize_snapshot(snapshot: RecentSnapshot) -> Vec<Message> {
    let important: HashSet<MessageId> = snapshot.important.iter().map(|m| m.id.clone()).collect();
    let to_delete: HashSet<MessageId> = snapshot.to_delete.iter().map(|m| m.id.clone()).collect();

    let mut seen = HashSet::new();
    let mut messages = Vec::with_capacity(snapshot.all.len());
    let listed = snapshot
        .all
        .into_iter()
        .chain(snapshot.to_delete)
        .chain(snapshot.important);
    for message in listed {
        if !seen.insert(message.id.clone()) {
            continue;
        }
        let bucket = if important.contains(&message.id) {
            Bucket::Important
        } else if to_delete.contains(&message.id) {
            Bucket::ToDelete
        } else {
            Bucket::Unclassified
        };
        messages.push(message.with_bucket(bucket));
    }
    messages
}
