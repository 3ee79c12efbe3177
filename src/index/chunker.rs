//! Splits ingested documents into overlapping passages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum passage size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive passages.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// A passage cut from a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub source: String,
    /// Character offset in the original document.
    pub start_offset: usize,
    pub chunk_index: usize,
}

/// Split text into overlapping chunks, snapping to sentence boundaries
/// where one falls near the end of a chunk.
pub fn split_into_chunks(text: &str, source: &str, config: &ChunkerConfig) -> Vec<TextChunk> {
    let chunk_size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap;

    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let total_chars = chars.len();

    if total_chars == 0 {
        return chunks;
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut start = 0;
    let mut chunk_index = 0;

    while start < total_chars {
        let end = (start + chunk_size).min(total_chars);
        let chunk_text: String = chars[start..end].iter().collect();

        let final_text = if end < total_chars {
            find_sentence_boundary(&chunk_text)
        } else {
            chunk_text
        };

        let trimmed = final_text.trim();
        if !trimmed.is_empty() {
            chunks.push(TextChunk {
                text: trimmed.to_string(),
                source: source.to_string(),
                start_offset: start,
                chunk_index,
            });
            chunk_index += 1;
        }

        start += step;
    }

    chunks
}

/// Cut the chunk at a sentence ending near its end, if there is one.
/// Handles both Latin punctuation and the Devanagari danda.
fn find_sentence_boundary(text: &str) -> String {
    let sentence_endings = [". ", "! ", "? ", ".\n", "!\n", "?\n", "। ", "।\n"];

    // Only look in the last 20% of the chunk.
    let search_start = floor_char_boundary(text, (text.len() * 80) / 100);
    let search_text = &text[search_start..];

    for ending in sentence_endings.iter() {
        if let Some(pos) = search_text.rfind(ending) {
            let cut_pos = search_start + pos + ending.len();
            return text[..cut_pos].to_string();
        }
    }

    text.to_string()
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_long_text_into_overlapping_chunks() {
        let config = ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 20,
        };
        let text = "This is a test. ".repeat(20);

        let chunks = split_into_chunks(&text, "test", &config);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert!(chunk.text.chars().count() <= 100);
        }
        // Steps advance by chunk_size - overlap.
        assert_eq!(chunks[1].start_offset, 80);
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_into_chunks("छोटो पाठ।", "doc", &ChunkerConfig::default());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "छोटो पाठ।");
        assert_eq!(chunks[0].start_offset, 0);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = split_into_chunks("", "doc", &ChunkerConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn devanagari_danda_is_a_sentence_boundary() {
        let config = ChunkerConfig {
            chunk_size: 60,
            chunk_overlap: 0,
        };
        let text = "नागरिकता लिन जिल्ला प्रशासन कार्यालय जानुहोस्। त्यसपछि फारम भर्नुहोस्। अन्त्यमा दस्तुर तिर्नुहोस्। थप जानकारीका लागि सोध्नुहोस्।";

        let chunks = split_into_chunks(text, "doc", &config);

        assert!(chunks.len() > 1);
        // Multi-byte Devanagari must never split inside a char.
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
        }
    }
}
