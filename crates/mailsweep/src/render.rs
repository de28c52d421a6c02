//! Plain-text rendering of batches, dashboards and progress.

use std::fmt::Write;

use mailsweep_core::{
    AnalysisProgress, Bucket, DateFilter, EmailStore, FetchRequest, Message, Section, Stats,
};
use tracing::debug;

/// Longest body preview shown per message, in characters.
const BODY_PREVIEW_CHARS: usize = 400;

/// One-line summary of a message.
pub fn message_line(message: &Message) -> String {
    let subject = if message.subject.trim().is_empty() {
        "(No Subject)"
    } else {
        message.subject.trim()
    };
    let date = message.timestamp().map_or_else(
        || message.date.clone(),
        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
    );
    format!("{subject} | {} | {date}", message.sender)
}

/// The body as plain text, HTML converted to Markdown, cut to a preview.
pub fn body_text(message: &Message) -> String {
    let text = if message.is_html() {
        htmd::convert(&message.body).unwrap_or_else(|e| {
            debug!("HTML conversion failed for {}: {e}", message.id);
            message.body.clone()
        })
    } else {
        message.body.clone()
    };

    let text = text.trim();
    match text.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn write_message(out: &mut String, index: usize, message: &Message, bodies: bool) {
    let _ = writeln!(out, "{:>4}. {}", index + 1, message_line(message));
    if bodies {
        for line in body_text(message).lines() {
            let _ = writeln!(out, "        {line}");
        }
    }
}

/// The raw fetched messages.
pub fn batch(messages: &EmailStore, bodies: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fetched emails ({}):", messages.len());
    for (index, message) in messages.iter().enumerate() {
        write_message(&mut out, index, message, bodies);
    }
    out
}

/// Counts followed by the to-delete and important sections.
pub fn dashboard(store: &EmailStore, bodies: bool) -> String {
    let mut out = stats(&store.derived_stats());
    for (section, bucket) in [
        (Section::ToDelete, Bucket::ToDelete),
        (Section::Important, Bucket::Important),
    ] {
        let messages: Vec<&Message> = store.section(section).collect();
        let _ = writeln!(out, "\n{} ({}):", bucket.display_name(), messages.len());
        if messages.is_empty() {
            let _ = writeln!(out, "      none");
        }
        for (index, message) in messages.into_iter().enumerate() {
            write_message(&mut out, index, message, bodies);
        }
    }
    out
}

/// The stats card.
pub fn stats(stats: &Stats) -> String {
    let mut out = format!(
        "Total: {}  Suggested for deletion: {}  Important: {}",
        stats.total, stats.to_delete, stats.important
    );
    if stats.unclassified > 0 {
        let _ = write!(out, "  Unclassified: {}", stats.unclassified);
    }
    out.push('\n');
    out
}

/// What a fetch asks for, e.g. `Fetching 25 emails (Last 7 days)`.
pub fn fetch_criteria(request: &FetchRequest) -> String {
    let mut out = format!("Fetching {} emails", request.count);
    match request.date_filter {
        Some(DateFilter::Relative(window)) => {
            let _ = write!(out, " ({})", window.display_name());
        }
        Some(DateFilter::Absolute { start, end }) => {
            let _ = write!(out, " ({start} to {end})");
        }
        None => {}
    }
    out
}

/// Progress line, e.g. `Analyzing: batch 2/5 (40%)`.
pub fn progress(progress: &AnalysisProgress) -> String {
    if progress.is_complete() {
        return format!("Analysis complete ({} batches)", progress.total_batches);
    }
    format!(
        "Analyzing: batch {}/{} ({}%)",
        progress.completed_batches,
        progress.total_batches,
        progress.percent()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use mailsweep_core::{Categorized, RelativeWindow};

    use super::*;

    #[test]
    fn test_message_line_formats_service_date() {
        let mut message = Message::new("a")
            .with_subject("Invoice")
            .with_sender("billing@example.com");
        message.date = "June 01, 2024 at 03:45 PM".into();
        assert_eq!(
            message_line(&message),
            "Invoice | billing@example.com | 2024-06-01 15:45"
        );
    }

    #[test]
    fn test_message_line_keeps_unparsed_date() {
        let mut message = Message::new("a");
        message.date = "(No Date)".into();
        assert_eq!(message_line(&message), "(No Subject) |  | (No Date)");
    }

    #[test]
    fn test_html_body_converted() {
        let message = Message::new("a").with_body("<html><body><p>Hello <b>there</b></p></body></html>");
        let text = body_text(&message);
        assert!(text.contains("Hello"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_body_preview_is_cut() {
        let message = Message::new("a").with_body("é".repeat(BODY_PREVIEW_CHARS + 10));
        let text = body_text(&message);
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), BODY_PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_dashboard_sections() {
        let mut store = EmailStore::new();
        store
            .merge(Categorized {
                to_delete: vec![Message::new("a").with_subject("Sale")],
                important: Vec::new(),
            })
            .unwrap();

        let text = dashboard(&store, false);
        assert!(text.starts_with("Total: 1  Suggested for deletion: 1  Important: 0"));
        assert!(text.contains("Suggested for Deletion (1):"));
        assert!(text.contains("Important (0):\n      none"));
    }

    #[test]
    fn test_fetch_criteria() {
        let request = FetchRequest::new(25).with_window(RelativeWindow::Last7Days);
        assert_eq!(fetch_criteria(&request), "Fetching 25 emails (Last 7 days)");

        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let request = FetchRequest::new(10).with_range(start, end);
        assert_eq!(
            fetch_criteria(&request),
            "Fetching 10 emails (2024-01-05 to 2024-02-01)"
        );
        assert_eq!(fetch_criteria(&FetchRequest::new(50)), "Fetching 50 emails");
    }

    #[test]
    fn test_progress_line() {
        let mut progress = AnalysisProgress::running(50);
        progress.completed_batches = 2;
        assert_eq!(super::progress(&progress), "Analyzing: batch 2/5 (40%)");
    }
}
