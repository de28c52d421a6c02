//! Triage workflow: fetch, analyze, review and delete.
//!
//! The [`Session`] owns all state and drives three controllers:
//!
//! - fetch: validates a [`FetchRequest`] and moves the view to the raw batch
//! - analysis: classifies the batch in groups of ten and merges the result
//! - mutation: single and concurrent bulk deletes with partial results
//!
//! Each controller raises a busy flag for the duration of its call. Flags
//! and analysis progress are published on `watch` channels.

mod activity;
mod analysis;
mod fetch;
mod mutation;
mod request;
mod session;
mod view;

pub use activity::{ANALYSIS_BATCH_SIZE, Activity, AnalysisPhase, AnalysisProgress};
pub use analysis::{AnalysisMode, AnalysisSummary};
pub use fetch::FetchOutcome;
pub use mutation::{BulkDeleteReport, DeleteFailure, DeleteState};
pub use request::{
    DateFilter, FETCH_COUNT_TIERS, FetchQuery, FetchRequest, MAX_FETCH_COUNT, RelativeWindow,
};
pub use session::{AuthState, NO_RESULTS_TEXT, Notice, NoticeLevel, Session, SessionConfig};
pub use view::{FetchedBatch, ViewKind, ViewState};
