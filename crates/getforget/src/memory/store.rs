//! In-memory keyword store
//!
//! One readers-writer lock guards the whole map. Reads (`lookup`,
//! `snapshot`, `related`) share it; every mutation (`upsert`, `remember`,
//! `evict`, `sweep`) takes it exclusively, so check-then-mutate sequences on
//! the same key can never lose an increment. Callers only ever receive
//! clones of entries.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use crate::memory::clock::{Clock, SystemClock};
use crate::memory::random::{RandomSource, ThreadRandom, sample_range};
use crate::memory::types::MemoryEntry;

/// Default lower bound (inclusive) of sampled base importance
pub const DEFAULT_MIN_BASE_IMPORTANCE: f64 = 50.0;
/// Default upper bound (exclusive) of sampled base importance
pub const DEFAULT_MAX_BASE_IMPORTANCE: f64 = 100.0;

/// Content recalled from an entry that already existed before an insert
#[derive(Debug, Clone, PartialEq)]
pub struct RecalledMemory {
    /// Key whose prior entry was matched
    pub key: String,
    /// Content stored in that entry
    pub content: String,
}

/// Outcome of inserting every keyword of one input under a single lock
#[derive(Debug, Clone, Default)]
pub struct Recall {
    /// First keyword (in input order) whose entry already existed
    pub recalled: Option<RecalledMemory>,
    /// Keywords that created a new entry
    pub created: Vec<String>,
    /// Keywords whose existing entry was reinforced
    pub reinforced: Vec<String>,
    /// Copies of every touched entry after mutation, in input order
    pub entries: Vec<(String, MemoryEntry)>,
}

/// Keyword → entry map with serialized mutation
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, MemoryEntry>>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    min_base_importance: f64,
    max_base_importance: f64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.len())
            .field("min_base_importance", &self.min_base_importance)
            .field("max_base_importance", &self.max_base_importance)
            .finish()
    }
}

impl MemoryStore {
    /// Empty store using wall-clock time and OS randomness
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            clock: Arc::new(SystemClock),
            random: Arc::new(ThreadRandom),
            min_base_importance: DEFAULT_MIN_BASE_IMPORTANCE,
            max_base_importance: DEFAULT_MAX_BASE_IMPORTANCE,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Range `[min, max)` from which new entries draw their base importance
    pub fn with_importance_range(mut self, min: f64, max: f64) -> Self {
        self.min_base_importance = min;
        self.max_base_importance = max;
        self
    }

    /// Current instant according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn new_entry(&self, content: &str) -> MemoryEntry {
        let base = sample_range(
            self.random.as_ref(),
            self.min_base_importance,
            self.max_base_importance,
        );
        MemoryEntry::new(content.to_string(), self.clock.now(), base)
    }

    /// Create the entry for `token` or reinforce the existing one.
    ///
    /// Returns a copy of the entry after the update.
    pub fn upsert(&self, token: &str, content: &str) -> MemoryEntry {
        let mut entries = self.entries.write();
        match entries.entry(token.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().reinforce();
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => vacant.insert(self.new_entry(content)).clone(),
        }
    }

    /// Insert every keyword of one input atomically.
    ///
    /// Existing entries are reinforced and keep their content; new entries
    /// record the full keyword set of the input. The first keyword that
    /// already existed supplies the recalled content.
    pub fn remember(&self, keywords: &[String], content: &str) -> Recall {
        let mut recall = Recall::default();
        let mut entries = self.entries.write();

        for keyword in keywords {
            let entry = match entries.entry(keyword.clone()) {
                Entry::Occupied(mut occupied) => {
                    let entry = occupied.get_mut();
                    entry.reinforce();
                    if recall.recalled.is_none() {
                        recall.recalled = Some(RecalledMemory {
                            key: keyword.clone(),
                            content: entry.content.clone(),
                        });
                    }
                    recall.reinforced.push(keyword.clone());
                    entry.clone()
                }
                Entry::Vacant(vacant) => {
                    let entry = self
                        .new_entry(content)
                        .with_keywords(keywords.iter().cloned());
                    recall.created.push(keyword.clone());
                    vacant.insert(entry).clone()
                }
            };
            recall.entries.push((keyword.clone(), entry));
        }

        tracing::debug!(
            created = recall.created.len(),
            reinforced = recall.reinforced.len(),
            "Remembered input"
        );
        recall
    }

    /// Read an entry without reinforcing it
    pub fn lookup(&self, token: &str) -> Option<MemoryEntry> {
        self.entries.read().get(token).cloned()
    }

    /// Entries keyed by `keyword` or listing it among their sibling keywords
    pub fn related(&self, keyword: &str) -> Vec<(String, MemoryEntry)> {
        self.entries
            .read()
            .iter()
            .filter(|(key, entry)| key.as_str() == keyword || entry.mentions(keyword))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Copy of every entry, detached from the live map
    pub fn snapshot(&self) -> BTreeMap<String, MemoryEntry> {
        self.entries.read().clone()
    }

    /// Remove an entry unconditionally
    pub fn evict(&self, token: &str) -> Option<MemoryEntry> {
        self.entries.write().remove(token)
    }

    /// Visit every entry under exclusive access, removing those for which
    /// `keep` returns false. Returns the removed entries in key order.
    pub fn sweep<F>(&self, mut keep: F) -> Vec<(String, MemoryEntry)>
    where
        F: FnMut(&str, &MemoryEntry) -> bool,
    {
        let mut entries = self.entries.write();
        let mut removed = Vec::new();
        entries.retain(|key, entry| {
            if keep(key, entry) {
                true
            } else {
                removed.push((key.clone(), entry.clone()));
                false
            }
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
