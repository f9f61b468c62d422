use crate::{MessageId, MessageStore};

/// Message ids marked for handoff, kept in the order they were selected.
///
/// Selection mode starts with a long-press only; plain taps toggle entries
/// once at least one message is selected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    order: Vec<MessageId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selection with exactly `id`.
    pub fn long_press(&mut self, id: &MessageId, store: &MessageStore) -> bool {
        if !store.contains(id) {
            return false;
        }
        self.order.clear();
        self.order.push(id.clone());
        true
    }

    /// Toggles `id` while selection mode is active. No effect on an empty selection.
    pub fn tap(&mut self, id: &MessageId, store: &MessageStore) -> bool {
        if self.order.is_empty() || !store.contains(id) {
            return false;
        }
        match self.order.iter().position(|selected| selected == id) {
            Some(pos) => {
                self.order.remove(pos);
            }
            None => self.order.push(id.clone()),
        }
        true
    }

    pub fn cancel(&mut self) {
        self.order.clear();
    }

    /// Drops ids that no longer exist in `store`.
    pub fn retain_existing(&mut self, store: &MessageStore) {
        self.order.retain(|id| store.contains(id));
    }

    pub fn ids(&self) -> &[MessageId] {
        &self.order
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.order.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
