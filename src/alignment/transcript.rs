use log::{debug, info, trace};
use std::collections::BTreeMap;
use std::ops::Range;

use crate::parser::TextNormalizer;
use crate::types::Chunk;

/// Closing formula some reciters append after the last unit.
pub const CLOSING_PHRASE: &str = "صَدَقَ ٱللَّهُ ٱلْعَظِيمُ";

/// Removes, for every adjacent chunk pair, the longest run of words that is
/// both a suffix of the first chunk and a prefix of the second from the start
/// of the second chunk's `transcribed_text`.
pub struct ChunkDeduplicator<'a> {
    normalizer: &'a dyn TextNormalizer,
}

impl<'a> ChunkDeduplicator<'a> {
    pub fn new(normalizer: &'a dyn TextNormalizer) -> Self {
        Self { normalizer }
    }

    /// Non-empty normalized tokens with their position in `original_text`
    fn words_with_positions(&self, text: &str) -> Vec<(usize, String)> {
        self.normalizer.tokenize(text)
            .into_iter()
            .filter(|token| !token.cleaned_text.is_empty())
            .map(|token| (token.index, token.cleaned_text))
            .collect()
    }

    /// Length of the longest suffix of `prev` equal to a prefix of `next`
    fn overlap_len(prev: &[(usize, String)], next: &[(usize, String)]) -> usize {
        let longest = prev.len().min(next.len());
        (1..=longest)
            .rev()
            .find(|&len| {
                prev[prev.len() - len..].iter()
                    .zip(&next[..len])
                    .all(|((_, a), (_, b))| a == b)
            })
            .unwrap_or(0)
    }

    /// Deduplicates in place and returns the number of removed words. Works
    /// from `original_text` only, so running it again changes nothing.
    pub fn deduplicate(&self, chunks: &mut [Chunk]) -> usize {
        let words: Vec<Vec<(usize, String)>> = chunks.iter()
            .map(|chunk| self.words_with_positions(&chunk.original_text))
            .collect();

        let mut removed_total = 0;
        for (i, chunk) in chunks.iter_mut().enumerate() {
            let overlap = if i == 0 { 0 } else { Self::overlap_len(&words[i - 1], &words[i]) };

            // the overlap ends at the original token holding its last word
            let removed = match overlap {
                0 => 0,
                len => words[i][len - 1].0 + 1,
            };

            if removed > 0 {
                trace!("Chunk {} repeats {} words of chunk {}", chunk.index, overlap, chunk.index - 1);
            }
            chunk.transcribed_text = chunk.original_text
                .split_whitespace()
                .skip(removed)
                .collect::<Vec<_>>()
                .join(" ");
            chunk.word_count = chunk.original_word_count - removed;
            removed_total += removed;
        }

        debug!("Removed {} duplicated boundary words across {} chunks", removed_total, chunks.len());
        removed_total
    }
}

/// Where a transcript word sits in the chunk list: chunk index and token
/// index in that chunk's `original_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordOrigin {
    pub chunk_index: usize,
    pub word_in_chunk: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptWord {
    pub text: String,
    pub origin: WordOrigin,
    /// Second position of a word that was also heard at the start of the
    /// next chunk and removed there as a duplicate
    pub alias: Option<WordOrigin>,
}

/// The combined, deduplicated, normalized transcript of one recitation.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    words: Vec<TranscriptWord>,
    texts: Vec<String>,
    dropped_chunk: Option<usize>,
}

impl Transcript {
    pub fn build(chunks: &[Chunk], normalizer: &dyn TextNormalizer, drop_closing_phrase: bool) -> Self {
        let closing = normalizer.normalize(CLOSING_PHRASE);
        let dropped_chunk = chunks.last()
            .filter(|_| drop_closing_phrase)
            .filter(|chunk| normalizer.normalize(&chunk.transcribed_text) == closing)
            .map(|chunk| chunk.index);
        if let Some(index) = dropped_chunk {
            info!("Ignoring closing formula in chunk {}", index);
        }

        let mut words: Vec<TranscriptWord> = Vec::new();
        for (position, chunk) in chunks.iter().enumerate() {
            if Some(chunk.index) == dropped_chunk {
                continue;
            }

            let tokens = normalizer.tokenize(&chunk.original_text);
            let chunk_start = words.len();
            words.extend(tokens.iter()
                .skip(chunk.removed_word_count())
                .filter(|token| !token.cleaned_text.is_empty())
                .map(|token| TranscriptWord {
                    text: token.cleaned_text.clone(),
                    origin: WordOrigin { chunk_index: chunk.index, word_in_chunk: token.index },
                    alias: None,
                }));

            // words the next chunk dropped as duplicates of this chunk's tail
            let Some(next) = chunks.get(position + 1) else {
                continue;
            };
            if next.removed_word_count() == 0 || Some(next.index) == dropped_chunk {
                continue;
            }
            let duplicates: Vec<usize> = normalizer.tokenize(&next.original_text)
                .into_iter()
                .take(next.removed_word_count())
                .filter(|token| !token.cleaned_text.is_empty())
                .map(|token| token.index)
                .collect();

            let own = &mut words[chunk_start..];
            let paired = duplicates.len().min(own.len());
            let own_len = own.len();
            for (word, &index) in own[own_len - paired..].iter_mut().zip(&duplicates[duplicates.len() - paired..]) {
                word.alias = Some(WordOrigin { chunk_index: next.index, word_in_chunk: index });
            }
        }

        let texts = words.iter().map(|w| w.text.clone()).collect();
        Self { words, texts, dropped_chunk }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[TranscriptWord] {
        &self.words
    }

    /// Normalized word texts, the form every matcher works on
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn dropped_chunk(&self) -> Option<usize> {
        self.dropped_chunk
    }

    /// Chunk word ranges (in `original_text` positions) covered by the
    /// transcript words in `range`, aliases included
    pub fn chunk_ranges(&self, range: Range<usize>) -> BTreeMap<usize, Range<usize>> {
        let mut ranges: BTreeMap<usize, Range<usize>> = BTreeMap::new();
        let end = range.end.min(self.words.len());
        let start = range.start.min(end);

        for word in &self.words[start..end] {
            for origin in std::iter::once(word.origin).chain(word.alias) {
                ranges.entry(origin.chunk_index)
                    .and_modify(|r| {
                        r.start = r.start.min(origin.word_in_chunk);
                        r.end = r.end.max(origin.word_in_chunk + 1);
                    })
                    .or_insert(origin.word_in_chunk..origin.word_in_chunk + 1);
            }
        }
        ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ArabicNormalizer;
    use crate::types::ChunkInput;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        let inputs: Vec<ChunkInput> = texts.iter()
            .enumerate()
            .map(|(i, text)| ChunkInput {
                start_time: i as f64,
                end_time: i as f64 + 1.0,
                text: text.to_string(),
            })
            .collect();
        Chunk::from_inputs(&inputs).unwrap()
    }

    #[test]
    fn removes_longest_boundary_overlap() {
        let normalizer = ArabicNormalizer::default();
        let mut chunks = chunks(&["قل هو الله احد الله", "اللهُ الصمد لم يلد", "ولم يولد"]);
        let removed = ChunkDeduplicator::new(&normalizer).deduplicate(&mut chunks);

        assert_eq!(removed, 1);
        assert_eq!(chunks[1].transcribed_text, "الصمد لم يلد");
        assert_eq!(chunks[1].word_count, 3);
        assert_eq!(chunks[1].original_text, "اللهُ الصمد لم يلد");
        assert_eq!(chunks[2].transcribed_text, "ولم يولد");
    }

    #[test]
    fn deduplication_is_idempotent() {
        let normalizer = ArabicNormalizer::default();
        let dedup = ChunkDeduplicator::new(&normalizer);
        let mut chunks = chunks(&["الحمد لله رب العالمين", "رب العالمين الرحمن الرحيم"]);

        dedup.deduplicate(&mut chunks);
        let once = chunks.clone();
        dedup.deduplicate(&mut chunks);
        assert_eq!(chunks, once);
        assert_eq!(chunks[1].transcribed_text, "الرحمن الرحيم");
    }

    #[test]
    fn transcript_keeps_provenance_of_removed_duplicates() {
        let normalizer = ArabicNormalizer::default();
        let mut chunks = chunks(&["الحمد لله رب العالمين", "رب العالمين الرحمن الرحيم"]);
        ChunkDeduplicator::new(&normalizer).deduplicate(&mut chunks);
        let transcript = Transcript::build(&chunks, &normalizer, true);

        assert_eq!(transcript.texts().join(" "), "الحمد لله رب العالمين الرحمن الرحيم");
        assert_eq!(transcript.words()[2].alias, Some(WordOrigin { chunk_index: 1, word_in_chunk: 0 }));
        assert_eq!(transcript.words()[4].origin, WordOrigin { chunk_index: 1, word_in_chunk: 2 });

        let ranges = transcript.chunk_ranges(2..4);
        assert_eq!(ranges[&0], 2..4);
        assert_eq!(ranges[&1], 0..2);
    }

    #[test]
    fn closing_formula_chunk_is_left_out() {
        let normalizer = ArabicNormalizer::default();
        let chunks = chunks(&["ملك الناس اله الناس", "صَدَقَ اللهُ العظيم"]);
        let transcript = Transcript::build(&chunks, &normalizer, true);
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.dropped_chunk(), Some(1));

        let kept = Transcript::build(&chunks, &normalizer, false);
        assert_eq!(kept.len(), 7);
    }
}
