//! Scripted triage service shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use mailsweep_core::{
    AnalysisReport, DeleteStatus, FetchQuery, FetchedMessages, Message, MessageId, RecentSnapshot,
    ServiceError, ServiceResult, Session, SessionConfig, TriageService,
};

/// A call the session made against the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CheckAuth,
    Fetch(u32),
    Analyze(usize),
    Delete(MessageId),
    Recent,
    Logout,
}

#[derive(Debug, Default)]
struct Script {
    auth: Option<ServiceError>,
    fetch: VecDeque<ServiceResult<FetchedMessages>>,
    analyze: VecDeque<ServiceResult<AnalysisReport>>,
    analyze_hangs: bool,
    recent: VecDeque<ServiceResult<RecentSnapshot>>,
    delete_outcomes: HashMap<MessageId, ServiceResult<DeleteStatus>>,
    calls: Vec<Call>,
}

/// Service that replays queued responses and records every call.
///
/// Unscripted fetches and analyses fail with a 500; unscripted deletes
/// succeed.
#[derive(Debug, Default)]
pub struct MockService {
    script: Mutex<Script>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().unwrap();
        f(&mut script)
    }

    pub fn reject_auth(&self, error: ServiceError) {
        self.with(|s| s.auth = Some(error));
    }

    pub fn push_fetch(&self, response: ServiceResult<FetchedMessages>) {
        self.with(|s| s.fetch.push_back(response));
    }

    pub fn push_analyze(&self, response: ServiceResult<AnalysisReport>) {
        self.with(|s| s.analyze.push_back(response));
    }

    pub fn hang_analyze(&self) {
        self.with(|s| s.analyze_hangs = true);
    }

    pub fn push_recent(&self, response: ServiceResult<RecentSnapshot>) {
        self.with(|s| s.recent.push_back(response));
    }

    pub fn set_delete(&self, id: &str, outcome: ServiceResult<DeleteStatus>) {
        self.with(|s| s.delete_outcomes.insert(MessageId::new(id), outcome));
    }

    pub fn clear_deletes(&self) {
        self.with(|s| s.delete_outcomes.clear());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.with(|s| s.calls.iter().filter(|c| matches(c)).count())
    }

    fn unscripted<T>() -> ServiceResult<T> {
        Err(ServiceError::Status {
            status: 500,
            message: "unscripted call".into(),
        })
    }
}

impl TriageService for MockService {
    async fn check_auth(&self) -> ServiceResult<()> {
        self.with(|s| {
            s.calls.push(Call::CheckAuth);
            s.auth.clone().map_or(Ok(()), Err)
        })
    }

    async fn fetch(&self, query: &FetchQuery) -> ServiceResult<FetchedMessages> {
        self.with(|s| {
            s.calls.push(Call::Fetch(query.count()));
            s.fetch.pop_front().unwrap_or_else(Self::unscripted)
        })
    }

    async fn analyze(&self, messages: &[Message]) -> ServiceResult<AnalysisReport> {
        let hangs = self.with(|s| {
            s.calls.push(Call::Analyze(messages.len()));
            s.analyze_hangs
        });
        if hangs {
            std::future::pending::<()>().await;
        }
        self.with(|s| s.analyze.pop_front().unwrap_or_else(Self::unscripted))
    }

    async fn delete(&self, id: &MessageId) -> ServiceResult<DeleteStatus> {
        self.with(|s| {
            s.calls.push(Call::Delete(id.clone()));
            s.delete_outcomes
                .get(id)
                .cloned()
                .unwrap_or(Ok(DeleteStatus::Deleted))
        })
    }

    async fn recent(&self) -> ServiceResult<RecentSnapshot> {
        self.with(|s| {
            s.calls.push(Call::Recent);
            s.recent.pop_front().unwrap_or_else(Self::unscripted)
        })
    }

    async fn logout(&self) -> ServiceResult<()> {
        self.with(|s| s.calls.push(Call::Logout));
        Ok(())
    }

    fn login_url(&self) -> String {
        "http://triage.test/authorize".into()
    }
}

/// `n` messages with ids `{prefix}0..{prefix}n`.
pub fn messages(prefix: &str, n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| {
            Message::new(format!("{prefix}{i}"))
                .with_subject(format!("Subject {i}"))
                .with_sender("sender@example.com")
        })
        .collect()
}

pub fn fetched(messages: Vec<Message>) -> ServiceResult<FetchedMessages> {
    let total_fetched = messages.len();
    Ok(FetchedMessages {
        messages,
        total_fetched,
    })
}

pub fn report(to_delete: &[Message], important: &[Message]) -> ServiceResult<AnalysisReport> {
    Ok(AnalysisReport {
        to_delete: to_delete.to_vec(),
        to_delete_count: to_delete.len(),
        important: important.to_vec(),
        important_count: important.len(),
        batches_processed: (to_delete.len() + important.len()).div_ceil(10),
    })
}

pub fn id(raw: &str) -> MessageId {
    MessageId::new(raw)
}

/// A signed-in session over `service`.
pub async fn signed_in(service: MockService, config: SessionConfig) -> Session<MockService> {
    let mut session = Session::new(service, config);
    session.start().await.unwrap();
    session
}
