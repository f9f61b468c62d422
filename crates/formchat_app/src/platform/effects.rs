use std::sync::{mpsc, Arc};

use anyhow::Context;
use chrono::Utc;
use engine_logging::{engine_debug, engine_info, engine_warn};
use formchat_core::{Effect, FieldSpec, FormRow, Msg, Notice, TemplateRow};
use formchat_engine::{
    CollectionKind, EngineConfig, EngineEvent, EngineHandle, FailureKind, FetchError, FilledForm,
    FormPatch, LocalCache, NewFilledForm, NewTemplate, SpeechCapability, SpeechEvent, SpeechSink,
    StaticToken, Template, TemplateField, TemplatePatch, TungsteniteConnector,
};
use serde_json::{Map, Value};

use super::app::Inbox;
use super::config::AppConfig;
use super::persistence;

pub struct EffectRunner {
    engine: EngineHandle,
    cache: LocalCache,
    speech: SpeechCapability,
    speech_sink: Arc<dyn SpeechSink>,
    write_through: bool,
    inbox: mpsc::Sender<Inbox>,
}

impl EffectRunner {
    pub fn new(config: &AppConfig, inbox: mpsc::Sender<Inbox>) -> anyhow::Result<Self> {
        let engine = EngineHandle::new(EngineConfig {
            api: config.api_settings(),
            socket_url: config.socket_url.clone(),
            tokens: Arc::new(StaticToken::new(config.token.clone())),
            connector: Arc::new(TungsteniteConnector),
        })
        .context("starting engine")?;

        Ok(Self {
            engine,
            cache: LocalCache::new(config.cache_dir.clone()),
            // The terminal build ships no recognizer backend.
            speech: SpeechCapability::detect(None),
            speech_sink: Arc::new(InboxSpeechSink {
                inbox: inbox.clone(),
            }),
            write_through: config.write_through,
            inbox,
        })
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn speech_supported(&self) -> bool {
        self.speech.is_supported()
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Connect => self.engine.connect(),
                Effect::SendMessage { text } => {
                    engine_debug!("SendMessage len={}", text.len());
                    self.engine.send_message(text);
                }
                Effect::Disconnect => self.engine.disconnect(),
                Effect::RequestExtraction {
                    template_code,
                    text,
                } => {
                    engine_info!(
                        "RequestExtraction template={} text_len={}",
                        template_code,
                        text.len()
                    );
                    self.engine.extract(template_code, text);
                }
                Effect::OpenFormEditor { template_code } => {
                    engine_info!("Opened form editor for {}", template_code);
                }
                Effect::SaveForm {
                    template_code,
                    data,
                    created_at,
                } => self.engine.create_form(NewFilledForm {
                    template_code,
                    data,
                    created_at: created_at.to_rfc3339(),
                }),
                Effect::UpdateForm { form_id, data } => {
                    self.engine.update_form(form_id, FormPatch { data })
                }
                Effect::CreateTemplate { name, fields } => {
                    engine_info!("CreateTemplate {} with {} field(s)", name, fields.len());
                    self.engine.create_template(NewTemplate {
                        name,
                        fields: template_fields(&fields),
                    });
                }
                Effect::RenameTemplate { template_id, name } => self.engine.update_template(
                    template_id,
                    TemplatePatch {
                        name: Some(name),
                        fields: None,
                    },
                ),
                Effect::LoadTemplates => self.engine.load_templates(),
                Effect::LoadForms => self.engine.load_forms(),
                Effect::DeleteTemplate { template_id } => self.engine.delete_template(template_id),
                Effect::DeleteForm { form_id } => self.engine.delete_form(form_id),
                Effect::StartListening => {
                    if let Err(err) = self.speech.start(self.speech_sink.clone()) {
                        let _ = self
                            .inbox
                            .send(Inbox::Msg(Msg::SpeechFailed(Notice::speech(err.to_string()))));
                    }
                }
                Effect::StopListening => {
                    if let Err(err) = self.speech.stop() {
                        engine_warn!("Failed to stop listening: {}", err);
                    }
                }
                Effect::MirrorMessages(messages) => {
                    persistence::save_messages(&self.cache, &messages);
                }
            }
        }
    }

    /// Drains engine events into messages for the update loop.
    pub fn poll_engine(&self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            if let (true, EngineEvent::FormsChanged(forms)) = (self.write_through, &event) {
                persistence::save_forms(&self.cache, forms);
            }
            msgs.push(map_engine_event(event));
        }
        msgs
    }
}

struct InboxSpeechSink {
    inbox: mpsc::Sender<Inbox>,
}

impl SpeechSink for InboxSpeechSink {
    fn emit(&self, event: SpeechEvent) {
        let msg = match event {
            SpeechEvent::Started => return,
            SpeechEvent::Transcript(text) => Msg::TranscriptReceived(text),
            SpeechEvent::Ended => Msg::SpeechEnded,
            SpeechEvent::Failed(err) => Msg::SpeechFailed(Notice::speech(err.to_string())),
        };
        let _ = self.inbox.send(Inbox::Msg(msg));
    }
}

pub(crate) fn map_engine_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ConnectionChanged(state) => Msg::ConnectionChanged(map_connection(state)),
        EngineEvent::ConnectionFailed { reason } => Msg::ConnectionFailed { reason },
        EngineEvent::RemoteMessage(text) => Msg::RemoteMessageReceived { text, at: Utc::now() },
        EngineEvent::TemplatesChanged(templates) => {
            Msg::TemplatesLoaded(templates.iter().map(template_row).collect())
        }
        EngineEvent::FormsChanged(forms) => Msg::FormsLoaded(forms.iter().map(form_row).collect()),
        EngineEvent::StoreFailed { collection, error } => {
            let action = match collection {
                CollectionKind::Templates => "Could not update templates",
                CollectionKind::Forms => "Could not update forms",
            };
            Msg::StoreFailed(notice_for(action, &error))
        }
        EngineEvent::FormSaved(result) => Msg::FormSaved(match result {
            Ok(form) => {
                engine_info!("Saved form {}", form.form_id);
                Ok(())
            }
            Err(err) => Err(notice_for("Could not save form", &err)),
        }),
        EngineEvent::ExtractionCompleted {
            template_code,
            result,
        } => Msg::ExtractionCompleted {
            template_code,
            result: result.map_err(|err| notice_for("Could not fill the form", &err)),
        },
    }
}

fn map_connection(state: formchat_engine::ConnectionState) -> formchat_core::ConnectionState {
    use formchat_core::ConnectionState as Core;
    use formchat_engine::ConnectionState as Engine;
    match state {
        Engine::Disconnected => Core::Disconnected,
        Engine::Connecting => Core::Connecting,
        Engine::Open => Core::Open,
        Engine::Closed => Core::Closed,
    }
}

fn notice_for(action: &str, error: &FetchError) -> Notice {
    match error.kind {
        FailureKind::Unauthorized => Notice::auth(),
        _ => {
            engine_warn!("{}: {}", action, error);
            Notice::network(format!("{action}: {error}"))
        }
    }
}

fn template_row(template: &Template) -> TemplateRow {
    TemplateRow {
        template_id: template.template_id.clone(),
        code: template.code().to_string(),
        title: template.title.clone(),
        required_fields: template.required_paths(),
    }
}

fn form_row(form: &FilledForm) -> FormRow {
    FormRow {
        form_id: form.form_id.clone(),
        template_code: form.template_code.clone(),
        created_at: form.created_at.as_ref().map(ToString::to_string),
        field_count: count_leaves(&form.data),
        data: form.data.clone(),
    }
}

/// Builds the template field tree; a dotted id nests the field in a section.
pub(crate) fn template_fields(specs: &[FieldSpec]) -> Vec<TemplateField> {
    let mut fields: Vec<TemplateField> = Vec::new();
    for spec in specs {
        let (section, id) = match spec.id.split_once('.') {
            Some((section, id)) => (Some(section), id),
            None => (None, spec.id.as_str()),
        };
        let field = TemplateField {
            id: id.to_string(),
            field_type: spec.field_type.clone(),
            label: spec.label.clone(),
            required: spec.required,
            options: None,
            fields: Vec::new(),
            columns: Vec::new(),
        };
        let Some(section) = section else {
            fields.push(field);
            continue;
        };
        match fields
            .iter_mut()
            .find(|existing| existing.field_type == "section" && existing.id == section)
        {
            Some(existing) => existing.fields.push(field),
            None => fields.push(TemplateField {
                id: section.to_string(),
                field_type: "section".to_string(),
                label: section.to_string(),
                required: false,
                options: None,
                fields: vec![field],
                columns: Vec::new(),
            }),
        }
    }
    fields
}

fn count_leaves(data: &Map<String, Value>) -> usize {
    data.values()
        .map(|value| match value {
            Value::Object(children) => count_leaves(children),
            _ => 1,
        })
        .sum()
}
