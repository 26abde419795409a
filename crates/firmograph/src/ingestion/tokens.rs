//! Embedding token budget
//!
//! The embedding provider rejects oversized requests, so text is clamped to
//! the model's token budget before the call: encode with the model's
//! tokenizer, cut to the first `max_tokens` tokens, decode back to text.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::error::{Error, Result};

// The cl100k_base vocabulary ships inside the binary; loading it cannot
// fail at runtime.
static BPE: Lazy<CoreBPE> =
    Lazy::new(|| cl100k_base().expect("bundled cl100k_base vocabulary"));

/// Number of tokens the model's tokenizer produces for `text`.
pub fn token_count(text: &str) -> usize {
    BPE.encode_ordinary(text).len()
}

/// Clamp `text` to at most `max_tokens` tokens.
///
/// Returns the input unchanged (borrowed) when it already fits. Decoding a
/// token prefix can fail on a split multi-byte character; callers treat
/// that as a terminal per-record failure.
pub fn clamp_to_budget(text: &str, max_tokens: usize) -> Result<Cow<'_, str>> {
    let tokens = BPE.encode_ordinary(text);
    if tokens.len() <= max_tokens {
        return Ok(Cow::Borrowed(text));
    }
    let truncated = BPE
        .decode(tokens[..max_tokens].to_vec())
        .map_err(|e| Error::Embedding(format!("failed to decode truncated token stream: {e}")))?;
    Ok(Cow::Owned(truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_returned_borrowed() {
        let text = "a short company blurb";
        let clamped = clamp_to_budget(text, 8000).unwrap();
        assert!(matches!(clamped, Cow::Borrowed(_)));
        assert_eq!(clamped, text);
    }

    #[test]
    fn oversized_text_reencodes_to_exactly_the_budget() {
        let text = "alpha beta gamma delta epsilon ".repeat(200);
        let budget = 50;
        assert!(token_count(&text) > budget);

        let clamped = clamp_to_budget(&text, budget).unwrap();
        assert_eq!(token_count(&clamped), budget);
        assert!(text.starts_with(clamped.as_ref()));
    }

    #[test]
    fn budget_boundary_is_inclusive() {
        let text = "one two three";
        let count = token_count(text);
        let clamped = clamp_to_budget(text, count).unwrap();
        assert!(matches!(clamped, Cow::Borrowed(_)));
    }
}
