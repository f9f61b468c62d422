use std::fmt;
use std::sync::mpsc;

use serde_json::{Map, Value};

use crate::records::{FilledForm, Template};
use crate::socket::ConnectionState;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ConnectionChanged(ConnectionState),
    ConnectionFailed { reason: String },
    /// Remote-authored text from a valid inbound frame.
    RemoteMessage(String),
    TemplatesChanged(Vec<Template>),
    FormsChanged(Vec<FilledForm>),
    StoreFailed {
        collection: CollectionKind,
        error: FetchError,
    },
    FormSaved(Result<FilledForm, FetchError>),
    ExtractionCompleted {
        template_code: String,
        result: Result<Map<String, Value>, FetchError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Templates,
    Forms,
}

impl CollectionKind {
    /// Path segment of the collection under the API base url.
    pub fn path(self) -> &'static str {
        match self {
            CollectionKind::Templates => "templates",
            CollectionKind::Forms => "forms",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives engine events from any task or thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Forwards events over the std channel drained by [`crate::EngineHandle::try_recv`].
pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Missing, expired or rejected bearer token.
    Unauthorized,
    /// Body was not the JSON shape we expected.
    InvalidResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
        }
    }
}
