//! Request and response bodies of the triage service.

use mailsweep_core::{
    AnalysisReport, DateFilter, FetchQuery, FetchedMessages, Message, RecentSnapshot,
};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `GET check-auth`
#[derive(Debug, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
}

/// `POST api/emails/fetch`
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FetchBody {
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl From<&FetchQuery> for FetchBody {
    fn from(query: &FetchQuery) -> Self {
        let mut body = Self {
            count: query.count(),
            date_range: None,
            start_date: None,
            end_date: None,
        };
        match query.date_filter() {
            Some(DateFilter::Relative(window)) => body.date_range = Some(window.as_str()),
            Some(DateFilter::Absolute { start, end }) => {
                body.start_date = Some(start.format(DATE_FORMAT).to_string());
                body.end_date = Some(end.format(DATE_FORMAT).to_string());
            }
            None => {}
        }
        body
    }
}

#[derive(Debug, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub emails: Vec<Message>,
    pub total_fetched: Option<usize>,
}

impl From<FetchResponse> for FetchedMessages {
    fn from(response: FetchResponse) -> Self {
        let total_fetched = response.total_fetched.unwrap_or(response.emails.len());
        Self {
            messages: response.emails,
            total_fetched,
        }
    }
}

/// `POST api/emails/analyze`
#[derive(Debug, Serialize)]
pub struct AnalyzeBody<'a> {
    pub emails: &'a [Message],
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub to_delete_emails: Vec<Message>,
    pub to_delete_count: Option<usize>,
    #[serde(default)]
    pub important_emails: Vec<Message>,
    pub important_count: Option<usize>,
    #[serde(default)]
    pub batches_processed: usize,
}

impl From<AnalyzeResponse> for AnalysisReport {
    fn from(response: AnalyzeResponse) -> Self {
        Self {
            to_delete_count: response
                .to_delete_count
                .unwrap_or(response.to_delete_emails.len()),
            important_count: response
                .important_count
                .unwrap_or(response.important_emails.len()),
            to_delete: response.to_delete_emails,
            important: response.important_emails,
            batches_processed: response.batches_processed,
        }
    }
}

/// `DELETE api/emails/{id}/delete`
#[derive(Debug, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
}

/// `GET api/emails`
#[derive(Debug, Deserialize)]
pub struct RecentResponse {
    #[serde(default)]
    pub total_emails: Option<usize>,
    #[serde(default)]
    pub all_emails: Vec<Message>,
    #[serde(default)]
    pub to_delete_emails: Vec<Message>,
    #[serde(default)]
    pub important_emails: Vec<Message>,
}

impl From<RecentResponse> for RecentSnapshot {
    fn from(response: RecentResponse) -> Self {
        Self {
            total_emails: response.total_emails.unwrap_or(response.all_emails.len()),
            all: response.all_emails,
            to_delete: response.to_delete_emails,
            important: response.important_emails,
        }
    }
}

/// Body of a failed request.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

/// Returns `true` if a service error text says the message no longer exists.
pub fn is_not_found(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("not found") || lower.contains("404")
}
