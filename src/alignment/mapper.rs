use log::{debug, trace};
use std::collections::BTreeMap;

use crate::matcher::types::SpanMatch;
use crate::matcher::SimilarityCalculator;
use crate::parser::TextNormalizer;
use crate::types::{Chunk, ChunkMembership, MatchedUnit};
use super::transcript::Transcript;

/// chunk index -> positions (in the unit list) of the units it holds
pub type ChunkUnits = BTreeMap<usize, Vec<usize>>;

/// Determines which chunks contributed each matched unit's words.
pub struct AyahChunkMapper<'a> {
    calculator: &'a SimilarityCalculator,
    normalizer: &'a dyn TextNormalizer,
}

struct ChunkWords {
    /// (token index in original_text, normalized word), empty tokens left out
    words: Vec<(usize, String)>,
    /// first token not yet claimed by an earlier unit
    cursor: usize,
}

impl<'a> AyahChunkMapper<'a> {
    pub fn new(calculator: &'a SimilarityCalculator, normalizer: &'a dyn TextNormalizer) -> Self {
        Self { calculator, normalizer }
    }

    /// Fills `chunk_membership` of every unit and returns the chunk -> units view.
    /// `spans[i]` is the transcript span matched for `units[i]`.
    pub fn map(
        &self,
        units: &mut [MatchedUnit],
        spans: &[SpanMatch],
        chunks: &[Chunk],
        transcript: &Transcript,
    ) -> ChunkUnits {
        let mut chunk_words: Vec<ChunkWords> = chunks.iter()
            .map(|chunk| ChunkWords {
                words: self.normalizer.tokenize(&chunk.original_text)
                    .into_iter()
                    .filter(|t| !t.cleaned_text.is_empty())
                    .map(|t| (t.index, t.cleaned_text))
                    .collect(),
                cursor: 0,
            })
            .collect();

        let mut chunk_units = ChunkUnits::new();
        for (position, (unit, span)) in units.iter_mut().zip(spans).enumerate() {
            let unit_words = self.normalizer.words(&unit.text_with_diacritics);
            let unit_words: Vec<&str> = unit_words.iter().map(String::as_str).collect();
            unit.chunk_membership.clear();

            for (chunk_index, hint) in transcript.chunk_ranges(span.start..span.end) {
                let Some(state) = chunk_words.get_mut(chunk_index) else {
                    continue;
                };
                if let Some(membership) = self.place(&unit_words, state, chunk_index, hint) {
                    trace!(
                        "Unit {}:{} in chunk {} words {}..{}",
                        unit.passage_number, unit.unit_number, chunk_index,
                        membership.start_word_in_chunk, membership.end_word_in_chunk
                    );
                    state.cursor = membership.end_word_in_chunk;
                    unit.chunk_membership.push(membership);
                    chunk_units.entry(chunk_index).or_default().push(position);
                }
            }
        }

        debug!(
            "Mapped {} units onto {} chunks",
            units.iter().filter(|u| !u.chunk_membership.is_empty()).count(),
            chunk_units.len()
        );
        chunk_units
    }

    /// Places a unit inside one chunk. A full occurrence of the unit text at or
    /// after the chunk cursor that touches the transcript hint wins; otherwise
    /// the hint is narrowed to the words the fuzzy alignment matched, provided
    /// they cover enough of the shorter side.
    fn place(
        &self,
        unit_words: &[&str],
        state: &ChunkWords,
        chunk_index: usize,
        hint: std::ops::Range<usize>,
    ) -> Option<ChunkMembership> {
        let k = unit_words.len();
        if k == 0 {
            return None;
        }
        let available = &state.words;

        if available.len() >= k {
            for start in 0..=available.len() - k {
                let first = available[start].0;
                let last = available[start + k - 1].0;
                if first < state.cursor || first >= hint.end {
                    continue;
                }
                if last < hint.start {
                    continue;
                }
                if available[start..start + k].iter().map(|(_, w)| w.as_str()).eq(unit_words.iter().copied()) {
                    return Some(ChunkMembership {
                        chunk_index,
                        start_word_in_chunk: first,
                        end_word_in_chunk: last + 1,
                    });
                }
            }
        }

        let region: Vec<&(usize, String)> = available.iter()
            .filter(|(index, _)| *index >= state.cursor.max(hint.start) && *index < hint.end)
            .collect();
        if region.is_empty() {
            return None;
        }

        let region_words: Vec<&str> = region.iter().map(|(_, w)| w.as_str()).collect();
        let pairs = self.calculator.word_alignment(unit_words, &region_words);
        let overlap = pairs.len() as f64 / k.min(region.len()) as f64;
        if overlap < self.calculator.config().mapping_overlap_threshold {
            trace!("Chunk {} overlap {:.2} below threshold", chunk_index, overlap);
            return None;
        }

        let (_, first) = pairs.first()?;
        let (_, last) = pairs.last()?;
        Some(ChunkMembership {
            chunk_index,
            start_word_in_chunk: region[*first].0,
            end_word_in_chunk: region[*last].0 + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::transcript::ChunkDeduplicator;
    use crate::config::subsystems::MatcherConfig;
    use crate::parser::ArabicNormalizer;
    use crate::types::{ChunkInput, VerseCandidate};

    fn unit(number: u32, text: &str) -> MatchedUnit {
        let candidate = VerseCandidate {
            passage_number: 112,
            unit_number: number,
            text_with_diacritics: text.to_string(),
            normalized_text: text.to_string(),
            word_count: text.split_whitespace().count(),
            similarity: 1.0,
        };
        MatchedUnit::from_candidate(&candidate, 1.0)
    }

    fn span(start: usize, end: usize) -> SpanMatch {
        SpanMatch { start, end, score: 1.0 }
    }

    #[test]
    fn maps_shared_and_spanning_units() {
        let normalizer = ArabicNormalizer::default();
        let calc = SimilarityCalculator::new(MatcherConfig::default()).unwrap();
        let inputs = vec![
            ChunkInput { start_time: 0.0, end_time: 3.0, text: "قل هو الله احد الله الصمد".into() },
            ChunkInput { start_time: 3.5, end_time: 5.0, text: "لم يلد ولم".into() },
            ChunkInput { start_time: 5.0, end_time: 6.0, text: "يولد".into() },
        ];
        let mut chunks = Chunk::from_inputs(&inputs).unwrap();
        ChunkDeduplicator::new(&normalizer).deduplicate(&mut chunks);
        let transcript = Transcript::build(&chunks, &normalizer, true);

        let mut units = vec![unit(1, "قل هو الله احد"), unit(2, "الله الصمد"), unit(3, "لم يلد ولم يولد")];
        let spans = vec![span(0, 4), span(4, 6), span(6, 10)];
        let chunk_units = AyahChunkMapper::new(&calc, &normalizer).map(&mut units, &spans, &chunks, &transcript);

        assert_eq!(chunk_units[&0], vec![0, 1]);
        assert_eq!(chunk_units[&1], vec![2]);
        assert_eq!(chunk_units[&2], vec![2]);

        assert_eq!(units[1].chunk_membership, vec![ChunkMembership {
            chunk_index: 0, start_word_in_chunk: 4, end_word_in_chunk: 6,
        }]);
        assert_eq!(units[2].chunk_membership.len(), 2);
        assert_eq!(units[2].chunk_membership[0].end_word_in_chunk, 3);
        assert_eq!(units[2].chunk_membership[1].chunk_index, 2);
    }

    #[test]
    fn unit_without_words_stays_unmapped() {
        let normalizer = ArabicNormalizer::default();
        let calc = SimilarityCalculator::new(MatcherConfig::default()).unwrap();
        let chunks = Chunk::from_inputs(&[
            ChunkInput { start_time: 0.0, end_time: 1.0, text: "الله الصمد".into() },
        ]).unwrap();
        let transcript = Transcript::build(&chunks, &normalizer, true);

        let mut units = vec![unit(2, "الله الصمد"), unit(3, "لم يلد ولم يولد")];
        let spans = vec![span(0, 2), span(2, 2)];
        let chunk_units = AyahChunkMapper::new(&calc, &normalizer).map(&mut units, &spans, &chunks, &transcript);

        assert_eq!(chunk_units.len(), 1);
        assert!(units[1].chunk_membership.is_empty());
    }
}
