//! Events emitted by the store and forgetting process for live observers
//!
//! Delivered over a `tokio::sync::broadcast` channel; slow subscribers lag
//! and drop events rather than blocking the producer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Maximum characters of content included in event previews
const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemoryEvent {
    /// An input was remembered under one or more keywords
    Remembered {
        created: Vec<String>,
        reinforced: Vec<String>,
        content_preview: String,
    },
    /// A keyword faded away during a forgetting cycle
    Forgotten {
        key: String,
        importance: f64,
        content_preview: String,
    },
    /// A keyword was removed on request
    Evicted { key: String },
    /// A forgetting cycle finished
    CycleCompleted {
        scanned: usize,
        forgotten: usize,
        skipped: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Create the broadcast sender shared by the service and forgetter
pub fn channel() -> broadcast::Sender<MemoryEvent> {
    let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}

/// Publish an event, ignoring the absence of subscribers
pub fn publish(tx: &broadcast::Sender<MemoryEvent>, event: MemoryEvent) {
    if tx.send(event).is_err() {
        tracing::trace!("No event subscribers");
    }
}

/// Shorten content for event payloads on a character boundary
pub fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{truncated}...")
    }
}
