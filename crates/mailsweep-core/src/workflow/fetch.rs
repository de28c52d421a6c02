//! Fetch controller: latest messages in, raw batch out.

use tracing::{debug, info, warn};

use super::activity::{ActivityTracker, Task};
use super::request::FetchRequest;
use super::view::{FetchedBatch, ViewState};
use crate::Result;
use crate::service::TriageService;

/// Outcome of a fetch that reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Messages are ready for review.
    Fetched {
        /// Number of messages in the batch.
        count: usize,
    },
    /// Nothing matched the criteria; the user should adjust them.
    NoResults,
}

/// Issues fetches and moves the view to the raw result set.
pub(crate) struct FetchController<'a, S> {
    service: &'a S,
    activity: &'a ActivityTracker,
}

impl<'a, S: TriageService> FetchController<'a, S> {
    pub(crate) const fn new(service: &'a S, activity: &'a ActivityTracker) -> Self {
        Self { service, activity }
    }

    /// Validates `request`, fetches, and updates `view`.
    ///
    /// Validation failures are returned before the view changes or any call
    /// is made. Every other failure leaves the view on `Dashboard`.
    pub(crate) async fn run(&self, view: &mut ViewState, request: FetchRequest) -> Result<FetchOutcome> {
        let query = request.validate()?;
        view.begin_fetch()?;
        let _busy = self.activity.begin(Task::Fetch);

        debug!(
            "Fetching {} emails (filter: {:?})",
            query.count(),
            query.date_filter()
        );

        let fetched = match self.service.fetch(&query).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Fetch failed: {e}");
                view.fetch_ended();
                return Err(e.into());
            }
        };

        if fetched.messages.is_empty() {
            info!("Fetch returned no emails");
            view.fetch_ended();
            return Ok(FetchOutcome::NoResults);
        }

        if fetched.total_fetched != fetched.messages.len() {
            warn!(
                "Service reported {} fetched emails but returned {}",
                fetched.total_fetched,
                fetched.messages.len()
            );
        }

        let batch = match FetchedBatch::new(fetched.messages, fetched.total_fetched) {
            Ok(batch) => batch,
            Err(e) => {
                view.fetch_ended();
                return Err(e);
            }
        };

        let count = batch.len();
        view.fetch_ready(batch)?;
        info!("Fetched {count} emails for review");
        Ok(FetchOutcome::Fetched { count })
    }
}
