//! Keyword extraction strategies
//!
//! The store never sees raw text: a [`Tokenizer`] turns input into candidate
//! tokens and a [`KeywordFilter`] keeps the ones long enough to act as keys.
//! Tokenizers are async so an implementation can call out to an external
//! morphological analyzer.

mod script;
mod whitespace;

pub use script::{Script, ScriptTokenizer};
pub use whitespace::WhitespaceTokenizer;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{TokenizerConfig, TokenizerStrategy};
use crate::error::Result;

/// Maps text to an ordered sequence of candidate keywords.
#[async_trait]
pub trait Tokenizer: Send + Sync {
    async fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

/// Build the configured tokenizer strategy
pub fn from_config(config: &TokenizerConfig) -> Arc<dyn Tokenizer> {
    match config.strategy {
        TokenizerStrategy::Whitespace => Arc::new(WhitespaceTokenizer::new(config.lowercase)),
        TokenizerStrategy::Script => Arc::new(ScriptTokenizer::new(config.lowercase)),
    }
}

/// Minimum-length rule deciding which tokens become keys.
///
/// Tokens written entirely in scripts without word spacing (Han, kana,
/// Thai, ...) carry more meaning per character and use the shorter
/// `min_unspaced_len` threshold. Lengths count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordFilter {
    /// Spaced-script tokens must be strictly longer than this
    pub min_word_len: usize,
    /// Unspaced-script tokens must be strictly longer than this
    pub min_unspaced_len: usize,
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self {
            min_word_len: 3,
            min_unspaced_len: 1,
        }
    }
}

impl From<&TokenizerConfig> for KeywordFilter {
    fn from(config: &TokenizerConfig) -> Self {
        Self {
            min_word_len: config.min_word_len,
            min_unspaced_len: config.min_unspaced_len,
        }
    }
}

impl KeywordFilter {
    pub fn qualifies(&self, token: &str) -> bool {
        let len = token.chars().count();
        if is_unspaced_token(token) {
            len > self.min_unspaced_len
        } else {
            len > self.min_word_len
        }
    }

    /// Qualifying tokens in first-seen order, each at most once
    pub fn keywords(&self, tokens: Vec<String>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        tokens
            .into_iter()
            .filter(|token| self.qualifies(token))
            .filter(|token| seen.insert(token.clone()))
            .collect()
    }
}

fn is_unspaced_token(token: &str) -> bool {
    let mut letters = token.chars().filter(|c| c.is_alphanumeric()).peekable();
    letters.peek().is_some() && letters.all(|c| Script::of(c).is_some_and(Script::is_unspaced))
}
