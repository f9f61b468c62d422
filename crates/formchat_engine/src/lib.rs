//! Formchat engine: chat connection, REST stores, extraction and local cache.
mod engine;
mod extract;
mod frame;
mod persist;
mod records;
mod rest;
mod socket;
mod speech;
mod store;
mod types;

pub use engine::{EngineConfig, EngineHandle, EngineStartError};
pub use extract::{
    nest_confident_fields, ExtractionRequest, ExtractionResponse, Extractor, FieldExtraction,
    CONFIDENCE_THRESHOLD, UNSECTIONED,
};
pub use frame::{decode_inbound, encode_send_message, SEND_MESSAGE_ACTION};
pub use persist::{
    ensure_cache_dir, AtomicFileWriter, LocalCache, PersistError, FORMS_KEY, MESSAGES_KEY,
};
pub use records::{
    FilledForm, FlatField, FormPatch, NewFilledForm, NewTemplate, Record, ServerTime, TableColumn,
    Template, TemplateField, TemplateKind, TemplatePatch,
};
pub use rest::{ApiSettings, RestClient, StaticToken, TokenProvider};
pub use socket::{
    run_connection, transition, ConnectionEvent, ConnectionManager, ConnectionState, Connector,
    Duplex, FrameSink, FrameSource, SendOutcome, SocketCommand, SocketError, TungsteniteConnector,
};
pub use speech::{
    SpeechCapability, SpeechError, SpeechEvent, SpeechRecognizer, SpeechSink, DEFAULT_LOCALE,
};
pub use store::{Collection, RecordStore};
pub use types::{ChannelEventSink, CollectionKind, EngineEvent, EventSink, FailureKind, FetchError};
