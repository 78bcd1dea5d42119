// corpus/mod.rs

pub mod memory;

use crate::types::VerseCandidate;

/// A begins-with hit returned by the corpus search primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusHit {
    pub matched_text: String,
    pub position_in_unit: usize,
    pub unit_number: u32,
    pub passage_number: u32,
}

/// The ReferenceCorpus trait is the lookup interface the aligner needs from
/// the reference text store. Units are numbered from 1 within each passage.
pub trait ReferenceCorpus: Send + Sync {
    /// Unit text exactly as stored, diacritics included
    fn text_with_diacritics(&self, passage: u32, unit: u32) -> Option<&str>;

    /// Unit text in canonical comparison form
    fn normalized_text(&self, passage: u32, unit: u32) -> Option<&str>;

    /// Number of units in a passage, 0 when the passage is unknown
    fn unit_count(&self, passage: u32) -> u32;

    /// Lowest passage number held by the corpus
    fn first_passage(&self) -> Option<u32>;

    /// All unit starts whose text, read on through the rest of the passage,
    /// begins with `batch` (already normalized words)
    fn find_unit_starts(&self, batch: &[String]) -> Vec<CorpusHit>;

    fn candidate(&self, passage: u32, unit: u32) -> Option<VerseCandidate> {
        let text = self.text_with_diacritics(passage, unit)?;
        let normalized = self.normalized_text(passage, unit)?;
        Some(VerseCandidate {
            passage_number: passage,
            unit_number: unit,
            text_with_diacritics: text.to_string(),
            normalized_text: normalized.to_string(),
            word_count: normalized.split_whitespace().count(),
            similarity: 0.0,
        })
    }

    /// Normalized words of the passage from `unit` onwards, at most `limit` of them
    fn passage_words_from(&self, passage: u32, unit: u32, limit: usize) -> Vec<String> {
        let mut words = Vec::with_capacity(limit);
        let mut current = unit;
        while words.len() < limit && current <= self.unit_count(passage) {
            if let Some(text) = self.normalized_text(passage, current) {
                for word in text.split_whitespace() {
                    if words.len() == limit {
                        break;
                    }
                    words.push(word.to_string());
                }
            }
            current += 1;
        }
        words
    }
}

pub use self::memory::InMemoryCorpus;
