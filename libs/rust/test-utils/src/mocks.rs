//! Mock implementations for testing.
//!
//! This module provides a log sink that records events and a request
//! executor that answers from per-URL scripts.

use async_trait::async_trait;
use auth_http_client::{HttpRequest, HttpResponse, RequestExecutor};
use method_logging::{LogEvent, LogSink};
use rust_common::{RequestError, ResponseSnapshot, TransportError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Which sink operation received an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkLevel {
    /// `LogSink::log`
    Log,
    /// `LogSink::error`
    Error,
}

/// An event captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Sink operation
    pub level: SinkLevel,
    /// Event rendered as JSON
    pub event: Value,
}

impl RecordedEvent {
    /// Method name of the event.
    #[must_use]
    pub fn method(&self) -> &str {
        self.event["method"].as_str().unwrap_or_default()
    }

    /// State of the event.
    #[must_use]
    pub fn state(&self) -> &str {
        self.event["state"].as_str().unwrap_or_default()
    }
}

/// Log sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Recorded events for one method.
    #[must_use]
    pub fn events_for(&self, method: &str) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.method() == method)
            .collect()
    }

    /// `(method, state)` pairs, oldest first.
    #[must_use]
    pub fn states(&self) -> Vec<(String, String)> {
        self.events()
            .iter()
            .map(|event| (event.method().to_string(), event.state().to_string()))
            .collect()
    }

    /// Events that went to `LogSink::error`.
    #[must_use]
    pub fn errors(&self) -> Vec<RecordedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level == SinkLevel::Error)
            .collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or_default()
    }

    /// Forget all recorded events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    fn record(&self, level: SinkLevel, event: &LogEvent<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                level,
                event: event.to_json(),
            });
        }
    }
}

impl LogSink for RecordingSink {
    fn log(&self, event: &LogEvent<'_>) {
        self.record(SinkLevel::Log, event);
    }

    fn error(&self, event: &LogEvent<'_>) {
        self.record(SinkLevel::Error, event);
    }
}

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Succeed with a response
    Respond(HttpResponse),
    /// Fail with a transport error
    Fail(TransportError),
    /// Fail with an unrecognized error
    FailOther(String),
}

impl Scripted {
    /// Succeed with a 200 JSON body.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self::Respond(HttpResponse::ok(data))
    }

    /// Fail with a transport error carrying `status`.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::Fail(TransportError::from_status(status))
    }

    fn into_result(self) -> Result<HttpResponse, RequestError> {
        match self {
            Self::Respond(response) => Ok(response),
            Self::Fail(err) => Err(err.into()),
            Self::FailOther(message) => Err(RequestError::other(message)),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<Scripted>,
    fallback: Option<Scripted>,
    calls: u32,
}

/// Request executor that answers from per-URL scripts.
///
/// Each URL has a queue of outcomes consumed in order, then an optional
/// fallback repeated for every later call. A URL with neither answers with
/// a 404 transport error.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, Script>>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Duration,
}

impl ScriptedExecutor {
    /// Create an executor with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue an outcome for `url`.
    #[must_use]
    pub fn on(self, url: impl Into<String>, outcome: Scripted) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(url.into()).or_default().queue.push_back(outcome);
        }
        self
    }

    /// Answer `url` with `outcome` once its queue is empty.
    #[must_use]
    pub fn always(self, url: impl Into<String>, outcome: Scripted) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(url.into()).or_default().fallback = Some(outcome);
        }
        self
    }

    /// Number of calls made to `url`.
    #[must_use]
    pub fn calls(&self, url: &str) -> u32 {
        self.scripts
            .lock()
            .ok()
            .and_then(|scripts| scripts.get(url).map(|script| script.calls))
            .unwrap_or_default()
    }

    /// Every request received, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }

    /// Requests received for `url`, oldest first.
    #[must_use]
    pub fn requests_for(&self, url: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url == url)
            .collect()
    }

    fn next_outcome(&self, url: &str) -> Scripted {
        let unscripted = || {
            Scripted::Fail(
                TransportError::new(format!("No response scripted for {url}"))
                    .with_response(ResponseSnapshot::with_status(404)),
            )
        };
        let Ok(mut scripts) = self.scripts.lock() else {
            return unscripted();
        };
        let script = scripts.entry(url.to_string()).or_default();
        script.calls += 1;
        script
            .queue
            .pop_front()
            .or_else(|| script.fallback.clone())
            .unwrap_or_else(unscripted)
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        let outcome = self.next_outcome(&request.url);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        outcome.into_result()
    }
}
