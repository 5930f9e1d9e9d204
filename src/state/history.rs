use super::Session;
use crate::types::HistoryItem;
use std::sync::Arc;

/// Completed rounds in completion order. Items are shared immutably once appended.
#[derive(Debug, Default, Clone)]
pub struct HistoryArchive {
    items: Vec<Arc<HistoryItem>>,
}

impl HistoryArchive {
    pub fn append(&mut self, item: HistoryItem) {
        self.items.push(Arc::new(item));
    }

    /// Drop every item, returning how many there were
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    pub fn items(&self) -> &[Arc<HistoryItem>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Session {
    pub fn clear_history(&mut self) {
        let cleared = self.history.clear();
        tracing::info!("History cleared ({} rounds)", cleared);
        if cleared > 0 {
            self.touch();
        }
    }
}
