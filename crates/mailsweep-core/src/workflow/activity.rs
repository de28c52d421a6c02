//! Busy flags and analysis progress, published over `watch` channels.

use tokio::sync::watch;

/// Number of messages the classification service processes together.
pub const ANALYSIS_BATCH_SIZE: usize = 10;

/// Which workflow operations are in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)] // One flag per controller, read by the UI
pub struct Activity {
    /// A fetch is in flight.
    pub fetching: bool,
    /// An analysis is in flight.
    pub analyzing: bool,
    /// A single or bulk delete is in flight.
    pub deleting: bool,
    /// A dashboard refresh is in flight.
    pub refreshing: bool,
}

impl Activity {
    /// Returns `true` if any operation is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.fetching || self.analyzing || self.deleting || self.refreshing
    }
}

/// The operation a [`BusyGuard`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Task {
    Fetch,
    Analysis,
    Delete,
    Refresh,
}

impl Task {
    fn flag(self, activity: &mut Activity) -> &mut bool {
        match self {
            Self::Fetch => &mut activity.fetching,
            Self::Analysis => &mut activity.analyzing,
            Self::Delete => &mut activity.deleting,
            Self::Refresh => &mut activity.refreshing,
        }
    }
}

/// Publishes [`Activity`] changes to subscribers.
#[derive(Debug)]
pub(crate) struct ActivityTracker {
    tx: watch::Sender<Activity>,
}

impl ActivityTracker {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Activity::default());
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Activity> {
        self.tx.subscribe()
    }

    pub(crate) fn current(&self) -> Activity {
        *self.tx.borrow()
    }

    /// Raises the flag for `task` until the returned guard is dropped.
    pub(crate) fn begin(&self, task: Task) -> BusyGuard<'_> {
        self.set(task, true);
        BusyGuard {
            tracker: self,
            task,
        }
    }

    fn set(&self, task: Task, value: bool) {
        self.tx.send_modify(|activity| *task.flag(activity) = value);
    }
}

/// Clears its busy flag when dropped, including when the owning future is
/// abandoned mid-flight.
#[derive(Debug)]
pub(crate) struct BusyGuard<'a> {
    tracker: &'a ActivityTracker,
    task: Task,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.tracker.set(self.task, false);
    }
}

/// Phase of the current analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// No analysis in flight.
    #[default]
    Idle,
    /// Batches are being classified.
    Running,
    /// Results have been merged into the store.
    Complete,
}

/// Batch progress of an analysis.
///
/// `completed_batches` never decreases during a run and only reaches
/// `total_batches` once the results are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisProgress {
    /// Batches confirmed by the service.
    pub completed_batches: usize,
    /// `ceil(messages / ANALYSIS_BATCH_SIZE)`.
    pub total_batches: usize,
    /// Current phase.
    pub phase: AnalysisPhase,
}

impl AnalysisProgress {
    /// Number of batches needed for `messages` messages.
    #[must_use]
    pub const fn batch_count(messages: usize) -> usize {
        messages.div_ceil(ANALYSIS_BATCH_SIZE)
    }

    /// A fresh run over `messages` messages.
    #[must_use]
    pub const fn running(messages: usize) -> Self {
        Self {
            completed_batches: 0,
            total_batches: Self::batch_count(messages),
            phase: AnalysisPhase::Running,
        }
    }

    /// Returns `true` once the results are merged.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, AnalysisPhase::Complete)
    }

    /// Completed fraction in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Batch counts are far below 2^52
    pub fn fraction(&self) -> f64 {
        if self.is_complete() {
            return 1.0;
        }
        if self.total_batches == 0 {
            return 0.0;
        }
        self.completed_batches as f64 / self.total_batches as f64
    }

    /// Completed percentage, rounded down.
    #[must_use]
    pub const fn percent(&self) -> usize {
        if self.is_complete() {
            return 100;
        }
        if self.total_batches == 0 {
            return 0;
        }
        self.completed_batches * 100 / self.total_batches
    }
}

/// Publishes [`AnalysisProgress`] and enforces its ordering rules.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    tx: watch::Sender<AnalysisProgress>,
}

impl ProgressTracker {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(AnalysisProgress::default());
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<AnalysisProgress> {
        self.tx.subscribe()
    }

    pub(crate) fn current(&self) -> AnalysisProgress {
        *self.tx.borrow()
    }

    pub(crate) fn start(&self, messages: usize) {
        self.tx.send_replace(AnalysisProgress::running(messages));
    }

    /// Records `completed` confirmed batches.
    ///
    /// The final batch is held back until [`Self::complete`], so a run never
    /// looks finished before its merge.
    pub(crate) fn record(&self, completed: usize) {
        self.tx.send_if_modified(|progress| {
            if progress.phase != AnalysisPhase::Running {
                return false;
            }
            let capped = completed.min(progress.total_batches.saturating_sub(1));
            if capped <= progress.completed_batches {
                return false;
            }
            progress.completed_batches = capped;
            true
        });
    }

    pub(crate) fn complete(&self) {
        self.tx.send_modify(|progress| {
            progress.completed_batches = progress.total_batches;
            progress.phase = AnalysisPhase::Complete;
        });
    }

    pub(crate) fn reset(&self) {
        self.tx.send_replace(AnalysisProgress::default());
    }
}
