//! Bounded in-memory record of recent predictions.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::labels::EmotionLabel;
use crate::pipelines::emotion::Prediction;

/// Minimal projection of one successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub original_text: String,
    pub emotion: EmotionLabel,
    pub confidence: f64,
    pub emoji: &'static str,
}

impl HistoryEntry {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            original_text: prediction.original_text.clone(),
            emotion: prediction.emotion.clone(),
            confidence: prediction.confidence,
            emoji: prediction.profile.emoji,
        }
    }
}

/// Most-recent-first list of predictions, capped at a fixed capacity.
///
/// All access goes through one lock, so recording from many threads keeps the cap.
#[derive(Debug)]
pub struct HistoryLedger {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert at the front, evicting the oldest entries beyond capacity.
    pub fn record(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Up to `limit` entries, newest first.
    pub fn list(&self, limit: usize) -> Vec<HistoryEntry> {
        self.entries.lock().iter().take(limit).cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
