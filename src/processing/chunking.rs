//! Word-count chunking and token estimation helpers.
//!
//! Chunk boundaries use word count as a cheap proxy for provider tokens: the document is split
//! on whitespace and regrouped into contiguous runs of at most `max_words_per_chunk` words,
//! re-joined with single spaces. Original line breaks and spacing are not preserved.
//!
//! Token estimates are diagnostic only. They prefer `tiktoken-rs`'s `cl100k_base` encoding and
//! fall back to a whitespace count when the encoding cannot be loaded.

use std::sync::OnceLock;
use tiktoken_rs::{CoreBPE, cl100k_base};

use super::types::{Chunk, ChunkingError};

static ENCODING: OnceLock<Option<CoreBPE>> = OnceLock::new();

/// Split `document` into ordered chunks of at most `max_words_per_chunk` words.
///
/// Returns an empty vector when the document holds no words; only the last chunk may be
/// shorter than the budget.
pub fn chunk_document(
    document: &str,
    max_words_per_chunk: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    if max_words_per_chunk == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let words: Vec<&str> = document.split_whitespace().collect();
    Ok(words
        .chunks(max_words_per_chunk)
        .enumerate()
        .map(|(index, group)| Chunk {
            index,
            text: group.join(" "),
        })
        .collect())
}

/// Number of whitespace-separated words in `text`.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Approximate provider token count for `text`.
pub fn estimate_tokens(text: &str) -> usize {
    let encoding = ENCODING.get_or_init(|| match cl100k_base() {
        Ok(encoding) => Some(encoding),
        Err(error) => {
            tracing::warn!(
                error = %error,
                "Tokenizer unavailable; falling back to whitespace token estimates"
            );
            None
        }
    });

    match encoding {
        Some(encoding) => encoding.encode_ordinary(text).len(),
        None => count_words(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(chunks: &[Chunk]) -> Vec<&str> {
        chunks
            .iter()
            .flat_map(|chunk| chunk.text.split(' '))
            .collect()
    }

    #[test]
    fn chunk_document_respects_word_budget() {
        let chunks = chunk_document("one two three four five", 2).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["one two", "three four", "five"]);
        let indices: Vec<usize> = chunks.iter().map(|chunk| chunk.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn chunk_document_handles_empty_input() {
        assert!(chunk_document("", 4).unwrap().is_empty());
        assert!(chunk_document(" \n\t  ", 1).unwrap().is_empty());
    }

    #[test]
    fn chunk_document_rejects_zero_budget() {
        assert!(matches!(
            chunk_document("hello", 0),
            Err(ChunkingError::InvalidChunkSize)
        ));
    }

    #[test]
    fn chunk_document_normalizes_whitespace() {
        let chunks = chunk_document("  alpha\n\nbeta\t gamma   delta ", 3).unwrap();
        assert_eq!(chunks[0].text, "alpha beta gamma");
        assert_eq!(chunks[1].text, "delta");
    }

    #[test]
    fn chunks_preserve_every_word_in_order() {
        let document = (0..1_003)
            .map(|n| format!("w{n}"))
            .collect::<Vec<_>>()
            .join("  \n ");
        for budget in [1, 7, 100, 1_003, 5_000] {
            let chunks = chunk_document(&document, budget).unwrap();
            let original: Vec<&str> = document.split_whitespace().collect();
            assert_eq!(words(&chunks), original, "budget {budget}");

            let (last, full) = chunks.split_last().unwrap();
            assert!(full.iter().all(|chunk| count_words(&chunk.text) == budget));
            let tail = count_words(&last.text);
            assert!((1..=budget).contains(&tail));
        }
    }

    #[test]
    fn large_document_splits_into_expected_sizes() {
        let document = vec!["word"; 150_000].join(" ");
        let chunks = chunk_document(&document, 60_000).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(|chunk| count_words(&chunk.text)).collect();
        assert_eq!(sizes, vec![60_000, 60_000, 30_000]);
    }

    #[test]
    fn estimate_tokens_counts_something_for_text() {
        assert_eq!(estimate_tokens(""), 0);
        assert!(estimate_tokens("The quick brown fox jumps over the lazy dog.") >= 9);
    }
}
