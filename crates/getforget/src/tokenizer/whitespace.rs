use async_trait::async_trait;

use super::Tokenizer;
use crate::error::Result;

/// Splits on whitespace and strips punctuation from token edges.
///
/// Inner punctuation survives, so `don't` and `e-mail` stay whole.
#[derive(Debug, Clone, Copy)]
pub struct WhitespaceTokenizer {
    lowercase: bool,
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WhitespaceTokenizer {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|word| !word.is_empty())
            .map(|word| {
                if self.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_string()
                }
            })
            .collect()
    }
}

#[async_trait]
impl Tokenizer for WhitespaceTokenizer {
    async fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.split(text))
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}
