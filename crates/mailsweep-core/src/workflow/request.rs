//! Fetch request validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest number of messages a single fetch may ask for.
pub const MAX_FETCH_COUNT: u32 = 500;

/// Fetch sizes offered to the user.
pub const FETCH_COUNT_TIERS: [u32; 6] = [10, 25, 50, 100, 200, 500];

/// Relative date window for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeWindow {
    /// The last 7 days.
    #[serde(rename = "last_7_days")]
    Last7Days,
    /// The last 30 days.
    #[serde(rename = "last_30_days")]
    Last30Days,
    /// The last 90 days.
    #[serde(rename = "last_90_days")]
    Last90Days,
    /// The last year.
    LastYear,
}

impl RelativeWindow {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Last7Days => "last_7_days",
            Self::Last30Days => "last_30_days",
            Self::Last90Days => "last_90_days",
            Self::LastYear => "last_year",
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Last7Days => "Last 7 days",
            Self::Last30Days => "Last 30 days",
            Self::Last90Days => "Last 90 days",
            Self::LastYear => "Last year",
        }
    }
}

impl std::str::FromStr for RelativeWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "7d" | "last_7_days" => Ok(Self::Last7Days),
            "30d" | "last_30_days" => Ok(Self::Last30Days),
            "90d" | "last_90_days" => Ok(Self::Last90Days),
            "1y" | "365d" | "last_year" => Ok(Self::LastYear),
            other => Err(Error::InvalidRequest(format!(
                "unknown date window '{other}', expected 7d, 30d, 90d or 1y"
            ))),
        }
    }
}

/// Optional date restriction for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// A window ending now.
    Relative(RelativeWindow),
    /// An inclusive calendar range.
    Absolute {
        /// First day included.
        start: NaiveDate,
        /// Last day included.
        end: NaiveDate,
    },
}

impl DateFilter {
    /// Builds an absolute filter from optional bounds.
    ///
    /// Returns `Ok(None)` when neither bound is given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when only one bound is given.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Option<Self>> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Ok(Some(Self::Absolute { start, end })),
            _ => Err(Error::InvalidRequest(
                "a custom date range needs both a start and an end date".into(),
            )),
        }
    }
}

/// A fetch as requested by the user, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// Number of latest messages to fetch.
    pub count: u32,
    /// Optional date restriction.
    pub date_filter: Option<DateFilter>,
}

impl FetchRequest {
    /// Creates a request for the `count` latest messages.
    #[must_use]
    pub const fn new(count: u32) -> Self {
        Self {
            count,
            date_filter: None,
        }
    }

    /// Restricts the fetch to a relative window.
    #[must_use]
    pub const fn with_window(mut self, window: RelativeWindow) -> Self {
        self.date_filter = Some(DateFilter::Relative(window));
        self
    }

    /// Restricts the fetch to an inclusive calendar range.
    #[must_use]
    pub const fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_filter = Some(DateFilter::Absolute { start, end });
        self
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the count is outside `1..=MAX_FETCH_COUNT`
    /// or an absolute range ends before it starts.
    pub fn validate(&self) -> Result<FetchQuery> {
        if self.count == 0 {
            return Err(Error::InvalidRequest(
                "count must be a positive number of emails".into(),
            ));
        }
        if self.count > MAX_FETCH_COUNT {
            return Err(Error::InvalidRequest(format!(
                "count {} exceeds the maximum of {MAX_FETCH_COUNT}",
                self.count
            )));
        }
        if let Some(DateFilter::Absolute { start, end }) = self.date_filter
            && start > end
        {
            return Err(Error::InvalidRequest(format!(
                "start date {start} is after end date {end}"
            )));
        }

        Ok(FetchQuery {
            count: self.count,
            date_filter: self.date_filter,
        })
    }
}

/// A validated fetch, the only form the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchQuery {
    count: u32,
    date_filter: Option<DateFilter>,
}

impl FetchQuery {
    /// Number of latest messages to fetch.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Optional date restriction.
    #[must_use]
    pub const fn date_filter(&self) -> Option<DateFilter> {
        self.date_filter
    }
}
