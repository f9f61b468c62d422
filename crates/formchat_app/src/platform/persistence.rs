use engine_logging::{engine_error, engine_info, engine_warn};
use formchat_core::Message;
use formchat_engine::{FilledForm, LocalCache, FORMS_KEY, MESSAGES_KEY};

/// Messages mirrored by a previous session; empty when absent or unreadable.
pub(crate) fn load_messages(cache: &LocalCache) -> Vec<Message> {
    match cache.load::<Vec<Message>>(MESSAGES_KEY) {
        Ok(Some(messages)) => {
            engine_info!("Loaded {} cached messages from {:?}", messages.len(), cache.dir());
            messages
        }
        Ok(None) => Vec::new(),
        Err(err) => {
            engine_warn!("Failed to read cached messages: {}", err);
            Vec::new()
        }
    }
}

pub(crate) fn save_messages(cache: &LocalCache, messages: &[Message]) {
    if let Err(err) = cache.store(MESSAGES_KEY, messages) {
        engine_error!("Failed to cache messages in {:?}: {}", cache.dir(), err);
    }
}

pub(crate) fn save_forms(cache: &LocalCache, forms: &[FilledForm]) {
    if let Err(err) = cache.store(FORMS_KEY, forms) {
        engine_error!("Failed to cache forms in {:?}: {}", cache.dir(), err);
    }
}
