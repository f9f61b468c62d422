use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use tokio::sync::{mpsc as async_mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::extract::{ExtractionRequest, Extractor};
use crate::records::{FilledForm, FormPatch, NewFilledForm, NewTemplate, Record, Template, TemplatePatch};
use crate::rest::{ApiSettings, RestClient, TokenProvider};
use crate::socket::{run_connection, ConnectionManager, Connector, SocketCommand};
use crate::store::RecordStore;
use crate::{ChannelEventSink, CollectionKind, EngineEvent, EventSink, FetchError};

pub struct EngineConfig {
    pub api: ApiSettings,
    pub socket_url: String,
    pub tokens: Arc<dyn TokenProvider>,
    pub connector: Arc<dyn Connector>,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineStartError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("invalid api settings: {0}")]
    Api(#[from] FetchError),
}

enum StoreOp<R: Record> {
    List,
    Create(R::Draft),
    Update(String, R::Patch),
    Delete(String),
}

enum TaskCommand {
    Templates(StoreOp<Template>),
    Forms(StoreOp<FilledForm>),
    Extract { template_code: String, text: String },
}

enum EngineCommand {
    Socket(SocketCommand),
    Task(TaskCommand),
}

struct Shared {
    rest: Arc<RestClient>,
    templates: Mutex<RecordStore<Template>>,
    forms: Mutex<RecordStore<FilledForm>>,
    events: Arc<dyn EventSink>,
}

/// Runs all network work on a background runtime; results come back through [`EngineHandle::try_recv`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineStartError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let events: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        let rest = Arc::new(RestClient::new(config.api, config.tokens)?);
        let shared = Arc::new(Shared {
            templates: Mutex::new(RecordStore::<Template>::new(rest.clone())),
            forms: Mutex::new(RecordStore::<FilledForm>::new(rest.clone())),
            rest,
            events: events.clone(),
        });

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("formchat-io")
            .build()?;
        let shutdown = CancellationToken::new();
        let (socket_tx, socket_rx) = async_mpsc::unbounded_channel();
        let manager = ConnectionManager::new(config.socket_url, config.connector, events);
        runtime.spawn(run_connection(manager, socket_rx, shutdown.clone()));

        let worker_shutdown = shutdown.clone();
        thread::Builder::new()
            .name("formchat-engine".into())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::Socket(command) => {
                            if socket_tx.send(command).is_err() {
                                engine_warn!("socket task stopped; command dropped");
                            }
                        }
                        EngineCommand::Task(task) => {
                            let shared = shared.clone();
                            runtime.spawn(async move {
                                handle_task(&shared, task).await;
                            });
                        }
                    }
                }
                worker_shutdown.cancel();
                runtime.shutdown_timeout(Duration::from_secs(2));
                engine_info!("engine stopped");
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            shutdown,
        })
    }

    pub fn connect(&self) {
        self.dispatch(EngineCommand::Socket(SocketCommand::Connect));
    }

    /// Sends over the live connection; dropped silently when not open.
    pub fn send_message(&self, text: impl Into<String>) {
        self.dispatch(EngineCommand::Socket(SocketCommand::Send(text.into())));
    }

    pub fn disconnect(&self) {
        self.dispatch(EngineCommand::Socket(SocketCommand::Close));
    }

    pub fn load_templates(&self) {
        self.dispatch(EngineCommand::Task(TaskCommand::Templates(StoreOp::List)));
    }

    pub fn create_template(&self, draft: NewTemplate) {
        self.dispatch(EngineCommand::Task(TaskCommand::Templates(StoreOp::Create(draft))));
    }

    pub fn update_template(&self, template_id: impl Into<String>, patch: TemplatePatch) {
        self.dispatch(EngineCommand::Task(TaskCommand::Templates(StoreOp::Update(
            template_id.into(),
            patch,
        ))));
    }

    pub fn delete_template(&self, template_id: impl Into<String>) {
        self.dispatch(EngineCommand::Task(TaskCommand::Templates(StoreOp::Delete(
            template_id.into(),
        ))));
    }

    pub fn load_forms(&self) {
        self.dispatch(EngineCommand::Task(TaskCommand::Forms(StoreOp::List)));
    }

    pub fn create_form(&self, draft: NewFilledForm) {
        self.dispatch(EngineCommand::Task(TaskCommand::Forms(StoreOp::Create(draft))));
    }

    pub fn update_form(&self, form_id: impl Into<String>, patch: FormPatch) {
        self.dispatch(EngineCommand::Task(TaskCommand::Forms(StoreOp::Update(
            form_id.into(),
            patch,
        ))));
    }

    pub fn delete_form(&self, form_id: impl Into<String>) {
        self.dispatch(EngineCommand::Task(TaskCommand::Forms(StoreOp::Delete(form_id.into()))));
    }

    /// Requests pre-filled data for `template_code` from `text`.
    pub fn extract(&self, template_code: impl Into<String>, text: impl Into<String>) {
        self.dispatch(EngineCommand::Task(TaskCommand::Extract {
            template_code: template_code.into(),
            text: text.into(),
        }));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn dispatch(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("engine stopped; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_task(shared: &Shared, task: TaskCommand) {
    let events = shared.events.as_ref();
    match task {
        TaskCommand::Templates(op) => match apply_store_op(&shared.templates, op).await {
            Ok((_, records)) => events.emit(EngineEvent::TemplatesChanged(records)),
            Err(error) => events.emit(EngineEvent::StoreFailed {
                collection: CollectionKind::Templates,
                error,
            }),
        },
        TaskCommand::Forms(op) => {
            // Creates and updates both come from the form editor.
            let is_save = matches!(op, StoreOp::Create(_) | StoreOp::Update(..));
            match apply_store_op(&shared.forms, op).await {
                Ok((touched, records)) => {
                    if let (true, Some(form)) = (is_save, touched) {
                        events.emit(EngineEvent::FormSaved(Ok(form)));
                    }
                    events.emit(EngineEvent::FormsChanged(records));
                }
                Err(error) if is_save => events.emit(EngineEvent::FormSaved(Err(error))),
                Err(error) => events.emit(EngineEvent::StoreFailed {
                    collection: CollectionKind::Forms,
                    error,
                }),
            }
        }
        TaskCommand::Extract {
            template_code,
            text,
        } => {
            let template_fields = {
                let templates = shared.templates.lock().await;
                templates
                    .records()
                    .iter()
                    .find(|template| template.matches(&template_code))
                    .map(Template::flat_fields)
                    .unwrap_or_default()
            };
            let request = ExtractionRequest {
                template_code: template_code.clone(),
                conversation_text: text,
                template_fields,
            };
            let result = shared.rest.extract(&request).await;
            events.emit(EngineEvent::ExtractionCompleted {
                template_code,
                result,
            });
        }
    }
}

/// Returns the record the op produced (create/update) and the cache afterwards.
async fn apply_store_op<R: Record>(
    store: &Mutex<RecordStore<R>>,
    op: StoreOp<R>,
) -> Result<(Option<R>, Vec<R>), FetchError> {
    let mut store = store.lock().await;
    let touched = match op {
        StoreOp::List => {
            store.list().await?;
            None
        }
        StoreOp::Create(draft) => Some(store.create(&draft).await?),
        StoreOp::Update(id, patch) => Some(store.update(&id, &patch).await?),
        StoreOp::Delete(id) => {
            store.delete(&id).await?;
            None
        }
    };
    Ok((touched, store.records().to_vec()))
}
