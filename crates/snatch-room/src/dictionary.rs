//! The dictionary oracle rooms validate words against.

use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Answers "is this a real word?". Must be case-insensitive.
pub trait Dictionary: Send + Sync + 'static {
    fn is_word(&self, word: &str) -> bool;
}

/// An in-memory word list.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    /// Builds a list from individual words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Parses newline-separated text. Blank lines and `#` comments are
    /// skipped.
    pub fn parse(text: &str) -> Self {
        let is_comment = |line: &&str| line.trim_start().starts_with('#');
        Self::from_words(text.lines().filter(|line| !is_comment(line)))
    }

    /// Reads a newline-separated word file.
    pub async fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let list = Self::parse(&text);
        tracing::info!(
            path = %path.display(), words = list.len(), "dictionary loaded"
        );
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Dictionary for WordList {
    fn is_word(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }
}
