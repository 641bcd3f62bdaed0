//! Composite memory operations used by the HTTP adapter
//!
//! [`MemoryService`] ties the tokenizer, the keyword filter and the store
//! together:
//! - `handle_text`: chat-style insert that reports what was recalled
//! - `handle_store`: insert that returns the stored entry
//! - `handle_query`: read-only relevance search with a random threshold

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::config::{Config, QueryConfig, ReplyConfig};
use crate::error::{ForgetError, Result};
use crate::memory::events::{self, MemoryEvent};
use crate::memory::importance::{ExponentialDecay, ImportanceModel, retention_probability};
use crate::memory::random::{RandomSource, ThreadRandom};
use crate::memory::store::MemoryStore;
use crate::memory::types::MemoryEntry;
use crate::tokenizer::{self, KeywordFilter, Tokenizer, WhitespaceTokenizer};

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Ai,
    System,
}

/// A chat message as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_type,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Result of a chat-style insert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// The user's text as a chat message
    pub prompt: Message,
    /// Reply phrased from the recalled content
    pub message: Message,
    /// Content of the first keyword that was already remembered
    pub recalled: Option<String>,
    /// Every entry after the insert
    pub memories: BTreeMap<String, MemoryEntry>,
}

/// An entry together with the key it is stored under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMemory {
    pub key: String,
    #[serde(flatten)]
    pub entry: MemoryEntry,
}

/// A query hit with the importance it had when matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub key: String,
    pub importance: f64,
    #[serde(flatten)]
    pub entry: MemoryEntry,
}

/// Aggregate view of the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub count: usize,
    /// Mean importance over entries with a finite score, zero when none
    pub mean_importance: f64,
    /// Decay constant of the scoring model, when it has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_hours: Option<f64>,
}

/// Entry point for every operation the HTTP adapter exposes
pub struct MemoryService {
    store: Arc<MemoryStore>,
    tokenizer: Arc<dyn Tokenizer>,
    filter: KeywordFilter,
    model: Arc<dyn ImportanceModel>,
    random: Arc<dyn RandomSource>,
    query: QueryConfig,
    reply: ReplyConfig,
    events: broadcast::Sender<MemoryEvent>,
}

impl MemoryService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            tokenizer: Arc::new(WhitespaceTokenizer::default()),
            filter: KeywordFilter::default(),
            model: Arc::new(ExponentialDecay::default()),
            random: Arc::new(ThreadRandom),
            query: QueryConfig::default(),
            reply: ReplyConfig::default(),
            events: events::channel(),
        }
    }

    /// Build a service whose tokenizer, scoring and phrasing follow `config`
    pub fn from_config(
        config: &Config,
        store: Arc<MemoryStore>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self::new(store)
            .with_tokenizer(tokenizer::from_config(&config.tokenizer))
            .with_filter(KeywordFilter::from(&config.tokenizer))
            .with_model(Arc::new(ExponentialDecay::new(config.memory.decay_hours)))
            .with_random(random)
            .with_query_config(config.query.clone())
            .with_reply_config(config.reply.clone())
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_filter(mut self, filter: KeywordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_model(mut self, model: Arc<dyn ImportanceModel>) -> Self {
        self.model = model;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_query_config(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    pub fn with_reply_config(mut self, reply: ReplyConfig) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_events(mut self, events: broadcast::Sender<MemoryEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn model(&self) -> Arc<dyn ImportanceModel> {
        self.model.clone()
    }

    /// Sender shared with the forgetting process
    pub fn events(&self) -> broadcast::Sender<MemoryEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MemoryEvent> {
        self.events.subscribe()
    }

    async fn extract(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Err(ForgetError::InvalidInput("content must not be empty".to_string()));
        }
        let tokens = self
            .tokenizer
            .tokenize(text)
            .await
            .map_err(|e| match e {
                e @ ForgetError::Tokenizer(_) => e,
                other => ForgetError::Tokenizer(other.to_string()),
            })?;
        let keywords = self.filter.keywords(tokens);
        debug!(
            tokenizer = self.tokenizer.name(),
            "Extracted keywords: {:?}", keywords
        );
        Ok(keywords)
    }

    /// Remember `text` under each of its keywords and phrase a reply from
    /// the first one that was already known.
    pub async fn handle_text(&self, text: &str) -> Result<ChatReply> {
        let keywords = self.extract(text).await?;
        let recall = self.store.remember(&keywords, text);

        if !keywords.is_empty() {
            events::publish(
                &self.events,
                MemoryEvent::Remembered {
                    created: recall.created.clone(),
                    reinforced: recall.reinforced.clone(),
                    content_preview: events::preview(text),
                },
            );
        }

        let recalled = recall.recalled.map(|memory| memory.content);
        let reply = match &recalled {
            Some(content) => format!("{}{}", self.reply.recalled_prefix, content),
            None => self.reply.nothing_recalled.clone(),
        };

        Ok(ChatReply {
            prompt: Message::new(MessageType::User, text),
            message: Message::new(MessageType::Ai, reply),
            recalled,
            memories: self.store.snapshot(),
        })
    }

    /// Remember `text` and return the entry of its first keyword
    pub async fn handle_store(&self, text: &str) -> Result<StoredMemory> {
        let keywords = self.extract(text).await?;
        if keywords.is_empty() {
            return Err(ForgetError::NoKeywords);
        }

        let recall = self.store.remember(&keywords, text);
        events::publish(
            &self.events,
            MemoryEvent::Remembered {
                created: recall.created.clone(),
                reinforced: recall.reinforced.clone(),
                content_preview: events::preview(text),
            },
        );

        let (key, entry) = recall
            .entries
            .into_iter()
            .next()
            .ok_or(ForgetError::NoKeywords)?;
        Ok(StoredMemory { key, entry })
    }

    /// Entries related to the keywords of `text`, most important first.
    ///
    /// With `random_threshold` enabled each candidate survives with
    /// probability `importance / 100`. Never reinforces anything.
    pub async fn handle_query(&self, text: &str) -> Result<Vec<QueryMatch>> {
        let keywords = self.extract(text).await?;
        let now = self.store.now();

        let mut seen = BTreeSet::new();
        let mut matches = Vec::new();
        for keyword in &keywords {
            for (key, entry) in self.store.related(keyword) {
                if !seen.insert(key.clone()) {
                    continue;
                }
                let importance = self.model.importance(&entry, now);
                let Some(probability) = retention_probability(importance) else {
                    continue;
                };
                if self.query.random_threshold && self.random.next_float() >= probability {
                    continue;
                }
                matches.push(QueryMatch {
                    key,
                    importance,
                    entry,
                });
            }
        }

        matches.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        matches.truncate(self.query.max_results);
        debug!(
            candidates = seen.len(),
            returned = matches.len(),
            "Answered memory query"
        );
        Ok(matches)
    }

    /// Read one entry without reinforcing it
    pub fn lookup(&self, key: &str) -> Option<MemoryEntry> {
        self.store.lookup(key)
    }

    pub fn snapshot(&self) -> BTreeMap<String, MemoryEntry> {
        self.store.snapshot()
    }

    /// Remove an entry on request
    pub fn evict(&self, key: &str) -> Option<MemoryEntry> {
        let removed = self.store.evict(key);
        if removed.is_some() {
            events::publish(
                &self.events,
                MemoryEvent::Evicted {
                    key: key.to_string(),
                },
            );
        }
        removed
    }

    pub fn stats(&self) -> StoreStats {
        let now = self.store.now();
        let snapshot = self.store.snapshot();
        let (scored, total) = snapshot
            .values()
            .map(|entry| self.model.importance(entry, now))
            .filter(|importance| importance.is_finite())
            .fold((0usize, 0.0), |(n, sum), importance| (n + 1, sum + importance));
        let mean_importance = if scored == 0 {
            0.0
        } else {
            total / scored as f64
        };
        StoreStats {
            count: snapshot.len(),
            mean_importance,
            decay_hours: self.model.decay_hours(),
        }
    }

    /// System message announcing a memory that faded away, for chat views
    pub fn notice(event: &MemoryEvent) -> Option<Message> {
        match event {
            MemoryEvent::Forgotten { key, .. } => Some(Message::new(
                MessageType::System,
                format!("Forgot about '{key}'"),
            )),
            _ => None,
        }
    }
}

impl std::fmt::Debug for MemoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryService")
            .field("store", &self.store)
            .field("tokenizer", &self.tokenizer.name())
            .field("filter", &self.filter)
            .field("query", &self.query)
            .finish()
    }
}
