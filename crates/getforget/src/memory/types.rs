//! Memory entry types for getforget
//!
//! Field names on the wire are part of the API contract: `content`,
//! `timestamp`, `initialImportance`, `useCount`, and the optional `keywords`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroU32;

/// A single remembered text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// The text fragment this entry remembers
    pub content: String,
    /// When the entry was first inserted; never updated on reuse
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Intrinsic salience sampled once at creation
    #[serde(rename = "initialImportance")]
    pub base_importance: f64,
    /// How many times the entry has been matched, including creation
    #[serde(rename = "useCount")]
    pub use_count: NonZeroU32,
    /// Every keyword extracted alongside this one from the same input
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub keywords: BTreeSet<String>,
}

impl MemoryEntry {
    /// Create a fresh entry with a use count of one
    pub fn new(content: String, created_at: DateTime<Utc>, base_importance: f64) -> Self {
        Self {
            content,
            created_at,
            base_importance,
            use_count: NonZeroU32::MIN,
            keywords: BTreeSet::new(),
        }
    }

    /// Attach the sibling keywords of the input that created this entry
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Record another match of this entry
    pub fn reinforce(&mut self) {
        self.use_count = self.use_count.saturating_add(1);
    }

    /// Use count as a plain integer (always at least 1)
    pub fn uses(&self) -> u32 {
        self.use_count.get()
    }

    /// Fractional hours since creation, clamped at zero for clock skew
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.created_at).num_milliseconds();
        (millis.max(0) as f64) / 3_600_000.0
    }

    /// Whether `keyword` is the key of this entry or one of its siblings
    pub fn mentions(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }
}
