use async_trait::async_trait;

use super::Tokenizer;
use crate::error::Result;

/// Writing system of a character, as far as keyword extraction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Han,
    Hiragana,
    Katakana,
    Hangul,
    Thai,
    Lao,
    Khmer,
    Myanmar,
    /// Any other letter or digit
    Word,
}

impl Script {
    /// Script of a word character; `None` for whitespace and punctuation
    pub fn of(c: char) -> Option<Script> {
        let script = match c as u32 {
            0x3005 | 0x3007 | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF => Script::Han,
            0x20000..=0x2FA1F => Script::Han,
            0x3041..=0x309F => Script::Hiragana,
            0x30A0..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => Script::Katakana,
            0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => Script::Hangul,
            0x0E00..=0x0E7F => Script::Thai,
            0x0E80..=0x0EFF => Script::Lao,
            0x1780..=0x17FF => Script::Khmer,
            0x1000..=0x109F => Script::Myanmar,
            _ if c.is_alphanumeric() => Script::Word,
            _ => return None,
        };
        Some(script)
    }

    /// Whether the script is normally written without spaces between words
    pub fn is_unspaced(self) -> bool {
        matches!(
            self,
            Script::Han
                | Script::Hiragana
                | Script::Katakana
                | Script::Thai
                | Script::Lao
                | Script::Khmer
                | Script::Myanmar
        )
    }
}

/// Splits text into runs of a single script.
///
/// A cheap stand-in for morphological analysis of Japanese: kanji and
/// katakana runs approximate content words, while hiragana runs (mostly
/// particles and inflections) are dropped.
#[derive(Debug, Clone, Copy)]
pub struct ScriptTokenizer {
    lowercase: bool,
}

impl Default for ScriptTokenizer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ScriptTokenizer {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut current_script: Option<Script> = None;

        for c in text.chars() {
            let script = Script::of(c);
            if script != current_script {
                self.flush(&mut tokens, &mut current, current_script);
                current_script = script;
            }
            if script.is_some() {
                current.push(c);
            }
        }
        self.flush(&mut tokens, &mut current, current_script);

        tokens
    }

    fn flush(&self, tokens: &mut Vec<String>, current: &mut String, script: Option<Script>) {
        let run = std::mem::take(current);
        match script {
            None | Some(Script::Hiragana) => {}
            Some(_) if run.is_empty() => {}
            Some(_) if self.lowercase => tokens.push(run.to_lowercase()),
            Some(_) => tokens.push(run),
        }
    }
}

#[async_trait]
impl Tokenizer for ScriptTokenizer {
    async fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.split(text))
    }

    fn name(&self) -> &'static str {
        "script"
    }
}
