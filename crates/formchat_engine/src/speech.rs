use std::fmt;
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};

pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("No speech was recognized. Please try again.")]
    NoMatch,
    #[error("Microphone permission denied. Please enable microphone access.")]
    PermissionDenied,
    #[error("Voice input is not available on this device.")]
    Unavailable,
    #[error("Speech recognition failed: {0}")]
    Other(String),
}

impl SpeechError {
    /// Maps a recognizer error code as reported by the platform.
    pub fn from_platform_code(code: &str) -> Self {
        match code.trim() {
            "7" => SpeechError::NoMatch,
            "9" => SpeechError::PermissionDenied,
            other => SpeechError::Other(format!("error code {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    /// Final transcript of one utterance.
    Transcript(String),
    Ended,
    Failed(SpeechError),
}

pub trait SpeechSink: Send + Sync {
    fn emit(&self, event: SpeechEvent);
}

/// Platform speech-to-text backend.
pub trait SpeechRecognizer: Send {
    fn start(&mut self, locale: &str, sink: Arc<dyn SpeechSink>) -> Result<(), SpeechError>;
    fn stop(&mut self) -> Result<(), SpeechError>;
}

/// Whether voice input exists here; decided once at startup.
pub enum SpeechCapability {
    Supported(Box<dyn SpeechRecognizer>),
    Unsupported { reason: String },
}

impl SpeechCapability {
    pub fn detect(backend: Option<Box<dyn SpeechRecognizer>>) -> Self {
        match backend {
            Some(recognizer) => {
                engine_info!("speech recognition available");
                SpeechCapability::Supported(recognizer)
            }
            None => {
                engine_info!("speech recognition unavailable");
                SpeechCapability::Unsupported {
                    reason: "no speech recognition backend".to_string(),
                }
            }
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, SpeechCapability::Supported(_))
    }

    pub fn start(&mut self, sink: Arc<dyn SpeechSink>) -> Result<(), SpeechError> {
        match self {
            SpeechCapability::Supported(recognizer) => recognizer.start(DEFAULT_LOCALE, sink),
            SpeechCapability::Unsupported { reason } => {
                engine_warn!("cannot start listening: {}", reason);
                Err(SpeechError::Unavailable)
            }
        }
    }

    pub fn stop(&mut self) -> Result<(), SpeechError> {
        match self {
            SpeechCapability::Supported(recognizer) => recognizer.stop(),
            SpeechCapability::Unsupported { .. } => Ok(()),
        }
    }
}

impl fmt::Debug for SpeechCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechCapability::Supported(_) => f.write_str("Supported"),
            SpeechCapability::Unsupported { reason } => {
                f.debug_struct("Unsupported").field("reason", reason).finish()
            }
        }
    }
}
