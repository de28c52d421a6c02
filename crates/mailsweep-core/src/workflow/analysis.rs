//! Analysis controller: raw batch in, categorized store out.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::activity::{ANALYSIS_BATCH_SIZE, ActivityTracker, AnalysisProgress, ProgressTracker, Task};
use super::view::{ViewKind, ViewState};
use crate::service::{AnalysisReport, ServiceError, TriageService};
use crate::triage::{Categorized, EmailStore, Message, SelectionSet};
use crate::{Error, Result};

/// How a batch is submitted to the classification service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// One call for the whole batch; the service splits it into tens.
    #[default]
    Whole,
    /// One call per ten messages, so progress follows real completions.
    PerBatch,
}

/// What an analysis did to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    /// Messages placed in the to-delete bucket.
    pub to_delete: usize,
    /// Messages placed in the important bucket.
    pub important: usize,
    /// Submitted messages the service did not categorize.
    pub unclassified: usize,
    /// Batches of ten processed.
    pub batches_processed: usize,
}

/// Submits the raw batch for classification and merges the result.
pub(crate) struct AnalysisController<'a, S> {
    service: &'a S,
    activity: &'a ActivityTracker,
    progress: &'a ProgressTracker,
    mode: AnalysisMode,
}

impl<'a, S: TriageService> AnalysisController<'a, S> {
    pub(crate) const fn new(
        service: &'a S,
        activity: &'a ActivityTracker,
        progress: &'a ProgressTracker,
        mode: AnalysisMode,
    ) -> Self {
        Self {
            service,
            activity,
            progress,
            mode,
        }
    }

    /// Classifies the batch held by `view` and merges it into `store`.
    ///
    /// On failure the store is untouched and the view stays on
    /// `ReviewingFetched` so the user can retry.
    pub(crate) async fn run(
        &self,
        view: &mut ViewState,
        store: &mut EmailStore,
        selection: &mut SelectionSet,
    ) -> Result<AnalysisSummary> {
        view.require(ViewKind::ReviewingFetched, "analyze")?;
        let messages = view
            .batch()
            .map(|batch| batch.messages().to_vec())
            .unwrap_or_default();
        if messages.is_empty() {
            return Err(Error::InvalidRequest("there are no emails to analyze".into()));
        }

        let _busy = self.activity.begin(Task::Analysis);
        self.progress.start(messages.len());
        info!(
            "Analyzing {} emails in {} batches",
            messages.len(),
            AnalysisProgress::batch_count(messages.len())
        );

        let report = match self.classify(&messages).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Analysis failed: {e}");
                self.progress.reset();
                return Err(e);
            }
        };

        let summary = summarize(&messages, &report);
        let categorized = Categorized {
            to_delete: report.to_delete,
            important: report.important,
        };
        if let Err(e) = store.merge(categorized) {
            self.progress.reset();
            return Err(Error::analysis(ServiceError::InvalidResponse(e.to_string())));
        }
        selection.prune(|id| store.contains(id));
        view.finish_analysis()?;
        self.progress.complete();

        info!(
            "Analysis complete: {} to delete, {} important, {} unclassified",
            summary.to_delete, summary.important, summary.unclassified
        );
        Ok(summary)
    }

    async fn classify(&self, messages: &[Message]) -> Result<AnalysisReport> {
        let expected_batches = AnalysisProgress::batch_count(messages.len());

        let report = match self.mode {
            AnalysisMode::Whole => {
                let report = self
                    .service
                    .analyze(messages)
                    .await
                    .map_err(Error::analysis)?;
                if report.batches_processed != expected_batches {
                    debug!(
                        "Service processed {} batches, expected {expected_batches}",
                        report.batches_processed
                    );
                }
                report
            }
            AnalysisMode::PerBatch => {
                let mut combined = AnalysisReport::default();
                for (index, chunk) in messages.chunks(ANALYSIS_BATCH_SIZE).enumerate() {
                    let report = self.service.analyze(chunk).await.map_err(Error::analysis)?;
                    combined.to_delete_count += report.to_delete_count;
                    combined.important_count += report.important_count;
                    combined.to_delete.extend(report.to_delete);
                    combined.important.extend(report.important);
                    combined.batches_processed += 1;
                    self.progress.record(index + 1);
                    debug!("Classified batch {}/{expected_batches}", index + 1);
                }
                combined
            }
        };

        if report.to_delete_count != report.to_delete.len()
            || report.important_count != report.important.len()
        {
            warn!(
                "Service counts ({} to delete, {} important) disagree with returned lists ({}, {})",
                report.to_delete_count,
                report.important_count,
                report.to_delete.len(),
                report.important.len()
            );
        }
        Ok(report)
    }
}

fn summarize(submitted: &[Message], report: &AnalysisReport) -> AnalysisSummary {
    let important: HashSet<_> = report.important.iter().map(|m| &m.id).collect();
    let to_delete: HashSet<_> = report
        .to_delete
        .iter()
        .map(|m| &m.id)
        .filter(|id| !important.contains(id))
        .collect();
    let unclassified = submitted
        .iter()
        .filter(|m| !important.contains(&m.id) && !to_delete.contains(&m.id))
        .count();

    AnalysisSummary {
        to_delete: to_delete.len(),
        important: important.len(),
        unclassified,
        batches_processed: report.batches_processed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_counts_conflicts_once() {
        let submitted: Vec<Message> = ["a", "b", "c", "d"].into_iter().map(Message::new).collect();
        let report = AnalysisReport {
            to_delete: vec![Message::new("a"), Message::new("b")],
            to_delete_count: 2,
            important: vec![Message::new("b")],
            important_count: 1,
            batches_processed: 1,
        };

        let summary = summarize(&submitted, &report);
        assert_eq!(summary.to_delete, 1);
        assert_eq!(summary.important, 1);
        assert_eq!(summary.unclassified, 2);
    }

    #[test]
    fn test_mode_serde_names() {
        assert_eq!(
            serde_json::to_string(&AnalysisMode::PerBatch).unwrap_or_default(),
            "\"per_batch\""
        );
    }
}
