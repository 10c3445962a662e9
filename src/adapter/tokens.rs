//! Usage accounting
//!
//! "Tokens" here are whitespace-delimited words. This is a cheap proxy for
//! clients that display usage, not a tokenizer count.

use crate::handlers::openai::types::Usage;

/// Count whitespace-delimited words, saturating at `u32::MAX`
pub fn count_words(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

/// Word-count usage for a prompt/completion pair
pub fn word_usage(prompt: &str, completion: &str) -> Usage {
    Usage::new(count_words(prompt), count_words(completion))
}
