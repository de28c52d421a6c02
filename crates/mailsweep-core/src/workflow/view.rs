//! Top-level view state machine.
//!
//! Transitions:
//! - `Dashboard` → `Fetching` (start fetch)
//! - `Fetching` → `ReviewingFetched` (results ready)
//! - `Fetching` → `Dashboard` (no results, error, or abandoned)
//! - `ReviewingFetched` → `Dashboard` (analysis complete, or back)
//!
//! The raw fetched batch only exists inside `ReviewingFetched`, so entering
//! `Dashboard` always discards it.

use crate::triage::{EmailStore, Message, SelectionSet};
use crate::{Error, Result};

/// Which view is active, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Categorized results and bulk actions.
    Dashboard,
    /// A fetch is in flight.
    Fetching,
    /// Raw fetched messages awaiting analysis.
    ReviewingFetched,
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Dashboard => "dashboard",
            Self::Fetching => "fetching",
            Self::ReviewingFetched => "reviewing-fetched",
        })
    }
}

/// A fetched-but-not-yet-analyzed batch and its own selection.
#[derive(Debug, Clone, Default)]
pub struct FetchedBatch {
    messages: EmailStore,
    selection: SelectionSet,
    total_fetched: usize,
}

impl FetchedBatch {
    /// Wraps raw messages in a batch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if any message lacks an id.
    pub fn new(messages: Vec<Message>, total_fetched: usize) -> Result<Self> {
        let mut store = EmailStore::new();
        store.load(messages)?;
        Ok(Self {
            messages: store,
            selection: SelectionSet::new(),
            total_fetched,
        })
    }

    /// The raw messages.
    #[must_use]
    pub const fn messages(&self) -> &EmailStore {
        &self.messages
    }

    /// The selection within this batch.
    #[must_use]
    pub const fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Number of messages the service reported as fetched.
    #[must_use]
    pub const fn total_fetched(&self) -> usize {
        self.total_fetched
    }

    /// Number of messages currently in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if every message was removed from the batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Mutable access to messages and selection together.
    pub(crate) fn parts_mut(&mut self) -> (&mut EmailStore, &mut SelectionSet) {
        (&mut self.messages, &mut self.selection)
    }
}

/// The active view and, while reviewing, the raw batch.
#[derive(Debug, Clone, Default)]
pub enum ViewState {
    /// Categorized results and bulk actions.
    #[default]
    Dashboard,
    /// A fetch is in flight.
    Fetching,
    /// Raw fetched messages awaiting analysis.
    ReviewingFetched(FetchedBatch),
}

impl ViewState {
    /// Returns the active view without payload.
    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        match self {
            Self::Dashboard => ViewKind::Dashboard,
            Self::Fetching => ViewKind::Fetching,
            Self::ReviewingFetched(_) => ViewKind::ReviewingFetched,
        }
    }

    /// Returns the raw batch while reviewing.
    #[must_use]
    pub const fn batch(&self) -> Option<&FetchedBatch> {
        match self {
            Self::ReviewingFetched(batch) => Some(batch),
            _ => None,
        }
    }

    pub(crate) fn batch_mut(&mut self) -> Option<&mut FetchedBatch> {
        match self {
            Self::ReviewingFetched(batch) => Some(batch),
            _ => None,
        }
    }

    /// Fails with `InvalidTransition` unless the active view is `expected`.
    pub(crate) fn require(&self, expected: ViewKind, action: &'static str) -> Result<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                action,
                state: self.kind(),
            })
        }
    }

    /// `Dashboard` → `Fetching`.
    pub(crate) fn begin_fetch(&mut self) -> Result<()> {
        self.require(ViewKind::Dashboard, "start a fetch")?;
        *self = Self::Fetching;
        Ok(())
    }

    /// `Fetching` → `ReviewingFetched`.
    pub(crate) fn fetch_ready(&mut self, batch: FetchedBatch) -> Result<()> {
        self.require(ViewKind::Fetching, "review fetched emails")?;
        *self = Self::ReviewingFetched(batch);
        Ok(())
    }

    /// `Fetching` → `Dashboard` after an empty or failed fetch.
    pub(crate) fn fetch_ended(&mut self) {
        if matches!(self, Self::Fetching) {
            *self = Self::Dashboard;
        }
    }

    /// `ReviewingFetched` → `Dashboard` after a merged analysis.
    pub(crate) fn finish_analysis(&mut self) -> Result<FetchedBatch> {
        match std::mem::take(self) {
            Self::ReviewingFetched(batch) => Ok(batch),
            other => {
                let state = other.kind();
                *self = other;
                Err(Error::InvalidTransition {
                    action: "complete an analysis",
                    state,
                })
            }
        }
    }

    /// Back/cancel: returns to `Dashboard`, discarding any raw batch.
    pub fn back(&mut self) -> Option<FetchedBatch> {
        match std::mem::take(self) {
            Self::ReviewingFetched(batch) => Some(batch),
            Self::Dashboard | Self::Fetching => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn batch(n: usize) -> FetchedBatch {
        let messages = (0..n).map(|i| Message::new(format!("m{i}"))).collect();
        FetchedBatch::new(messages, n).unwrap()
    }

    #[test]
    fn test_default_is_dashboard() {
        assert_eq!(ViewState::default().kind(), ViewKind::Dashboard);
    }

    #[test]
    fn test_fetch_then_analysis_cycle() {
        let mut view = ViewState::Dashboard;

        view.begin_fetch().unwrap();
        assert_eq!(view.kind(), ViewKind::Fetching);

        view.fetch_ready(batch(3)).unwrap();
        assert_eq!(view.batch().unwrap().len(), 3);

        let finished = view.finish_analysis().unwrap();
        assert_eq!(finished.len(), 3);
        assert_eq!(view.kind(), ViewKind::Dashboard);
        assert!(view.batch().is_none());
    }

    #[test]
    fn test_fetch_ended_returns_to_dashboard() {
        let mut view = ViewState::Dashboard;
        view.begin_fetch().unwrap();
        view.fetch_ended();
        assert_eq!(view.kind(), ViewKind::Dashboard);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut view = ViewState::Dashboard;
        assert!(matches!(
            view.fetch_ready(batch(1)),
            Err(Error::InvalidTransition { .. })
        ));
        assert!(view.finish_analysis().is_err());
        assert_eq!(view.kind(), ViewKind::Dashboard);

        view.begin_fetch().unwrap();
        assert!(view.begin_fetch().is_err());
        assert!(view.finish_analysis().is_err());
        assert_eq!(view.kind(), ViewKind::Fetching);
    }

    #[test]
    fn test_back_discards_batch() {
        let mut view = ViewState::ReviewingFetched(batch(2));
        let discarded = view.back().unwrap();
        assert_eq!(discarded.len(), 2);
        assert_eq!(view.kind(), ViewKind::Dashboard);

        let mut fetching = ViewState::Fetching;
        assert!(fetching.back().is_none());
        assert_eq!(fetching.kind(), ViewKind::Dashboard);
    }

    #[test]
    fn test_batch_rejects_missing_id() {
        assert!(FetchedBatch::new(vec![Message::new("")], 1).is_err());
    }
}
