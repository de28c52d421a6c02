//! # mailsweep-core
//!
//! Client-side email triage workflow engine for `mailsweep`.
//!
//! This crate provides:
//! - **Email Store** - Messages keyed by id, partitioned into triage buckets
//! - **Selection** - Multi-select state for bulk actions, pruned on every removal
//! - **Workflow Controllers** - Fetch, analysis and delete controllers
//! - **View State** - The `Dashboard` / `Fetching` / `ReviewingFetched` state machine
//! - **Session** - The owned object that ties controllers, store and view together
//! - **Service Boundary** - The [`TriageService`] trait implemented by transports
//!
//! # Example
//!
//! ```ignore
//! use mailsweep_core::{FetchRequest, Session, SessionConfig};
//!
//! let mut session = Session::new(service, SessionConfig::default());
//! session.start().await?;
//!
//! session.fetch(FetchRequest::new(25)).await?;
//! let summary = session.analyze().await?;
//! println!("{} suggested for deletion", summary.to_delete);
//!
//! session.toggle_section(Section::ToDelete)?;
//! let report = session.delete_selected().await?;
//! println!("{}", report.summary());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod service;
pub mod triage;
pub mod workflow;

pub use error::{Error, Result};
pub use service::{
    AnalysisReport, DeleteStatus, FetchedMessages, RecentSnapshot, ServiceError, ServiceResult,
    TriageService,
};
pub use triage::{
    Bucket, Categorized, EmailStore, Message, MessageId, Section, SelectionSet, Stats,
};
pub use workflow::{
    ANALYSIS_BATCH_SIZE, Activity, AnalysisMode, AnalysisPhase, AnalysisProgress, AnalysisSummary,
    AuthState, BulkDeleteReport, DateFilter, DeleteFailure, DeleteState, FETCH_COUNT_TIERS,
    FetchOutcome, FetchQuery, FetchRequest, FetchedBatch, MAX_FETCH_COUNT, NO_RESULTS_TEXT, Notice,
    NoticeLevel, RelativeWindow, Session, SessionConfig, ViewKind, ViewState,
};
