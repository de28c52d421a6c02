//! Triage data models.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Display format the service uses for message dates.
const SERVICE_DATE_FORMAT: &str = "%B %d, %Y at %I:%M %p";

/// Unique identifier for a message, as issued by the mail service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a new message id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Classification label attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bucket {
    /// Fetched but not yet categorized.
    #[default]
    Unclassified,
    /// Suggested for deletion.
    ToDelete,
    /// Worth keeping.
    Important,
}

impl Bucket {
    /// Human-readable display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Unclassified => "Unclassified",
            Self::ToDelete => "Suggested for Deletion",
            Self::Important => "Important",
        }
    }
}

/// The three display sections of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Every message in the collection.
    All,
    /// Messages suggested for deletion.
    ToDelete,
    /// Important messages.
    Important,
}

impl Section {
    /// Returns `true` if a message in `bucket` is shown in this section.
    #[must_use]
    pub const fn includes(self, bucket: Bucket) -> bool {
        match self {
            Self::All => true,
            Self::ToDelete => matches!(bucket, Bucket::ToDelete),
            Self::Important => matches!(bucket, Bucket::Important),
        }
    }
}

/// An email message as seen by the triage workflow.
///
/// Serialized with the service's field names; the bucket is local state and
/// never travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    #[serde(rename = "msg_id", default)]
    pub id: MessageId,
    /// Message subject.
    #[serde(default)]
    pub subject: String,
    /// Sender address.
    #[serde(default)]
    pub sender: String,
    /// Recipient address.
    #[serde(default)]
    pub receiver: String,
    /// Date as formatted by the service.
    #[serde(default)]
    pub date: String,
    /// Plain text or HTML body.
    #[serde(default)]
    pub body: String,
    /// Triage bucket.
    #[serde(skip)]
    pub bucket: Bucket,
}

impl Message {
    /// Creates a new unclassified message with empty headers.
    #[must_use]
    pub fn new(id: impl Into<MessageId>) -> Self {
        Self {
            id: id.into(),
            subject: String::new(),
            sender: String::new(),
            receiver: String::new(),
            date: String::new(),
            body: String::new(),
            bucket: Bucket::Unclassified,
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the bucket.
    #[must_use]
    pub const fn with_bucket(mut self, bucket: Bucket) -> Self {
        self.bucket = bucket;
        self
    }

    /// Returns `true` if the body looks like HTML markup.
    #[must_use]
    pub fn is_html(&self) -> bool {
        let head = self.body.trim_start();
        let head = head.char_indices().nth(512).map_or(head, |(i, _)| &head[..i]);
        let lower = head.to_ascii_lowercase();
        lower.starts_with("<!doctype html") || lower.starts_with("<html") || lower.contains("<body")
    }

    /// Parses the date field.
    ///
    /// Accepts RFC 2822, RFC 3339, and the service's display format
    /// ("June 01, 2024 at 03:45 PM", taken as UTC).
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        let date = self.date.trim();
        if let Ok(dt) = DateTime::parse_from_rfc2822(date) {
            return Some(dt);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
            return Some(dt);
        }
        NaiveDateTime::parse_from_str(date, SERVICE_DATE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    }
}
