//! Approximate language-model token counting.

use tiktoken_rs::CoreBPE;

use crate::{Result, SearchError};

/// Counts how many language-model tokens a text would consume.
///
/// Implementations must be deterministic. The count is informational only;
/// nothing in this crate truncates on it.
pub trait TokenCounter: Send + Sync {
    /// Returns the token count of `text`.
    fn count_tokens(&self, text: &str) -> usize;
}

/// Token counter backed by the `cl100k_base` BPE vocabulary.
///
/// Loading the vocabulary is not free, so build one and share it.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Loads the `cl100k_base` vocabulary.
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| SearchError::Other(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Formats a count with comma thousands separators, e.g. `1234` -> `1,234`.
pub fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234), "1,234");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(100000), "100,000");
    }

    #[test]
    fn test_tiktoken_counts_known_text() {
        let counter = TiktokenCounter::cl100k().unwrap();
        assert_eq!(counter.count_tokens(""), 0);
        assert_eq!(counter.count_tokens("hello world"), 2);
    }

    #[test]
    fn test_tiktoken_is_deterministic() {
        let counter = TiktokenCounter::cl100k().unwrap();
        let text = r#"[{"title":"Rust","link":"https://www.rust-lang.org/"}]"#;
        assert_eq!(counter.count_tokens(text), counter.count_tokens(text));
    }

    #[test]
    fn test_tiktoken_monotonic_under_appended_words() {
        let counter = TiktokenCounter::cl100k().unwrap();
        let mut text = String::from("Who won the world series");
        let mut previous = counter.count_tokens(&text);
        for word in [" today", "?", " The", " Dodgers", " won", " in", " five", " games."] {
            text.push_str(word);
            let current = counter.count_tokens(&text);
            assert!(current >= previous, "{:?}: {} < {}", text, current, previous);
            previous = current;
        }
    }

    #[test]
    fn test_tiktoken_is_not_a_word_count() {
        let counter = TiktokenCounter::cl100k().unwrap();
        assert!(counter.count_tokens("antidisestablishmentarianism") > 1);
    }
}
