use log::{debug, info, trace};
use std::collections::BTreeMap;

use crate::config::subsystems::LocatorConfig;
use crate::corpus::ReferenceCorpus;
use super::similarity::SimilarityCalculator;
use super::types::LocatedStart;

/// Candidates produced by one word batch: passage -> earliest unit whose
/// text begins with the batch.
#[derive(Debug, Clone)]
struct BatchCandidates {
    offset: usize,
    passages: BTreeMap<u32, u32>,
}

/// Identifies the passage and starting unit of a recitation by constraint
/// propagation over fixed-size word batches.
pub struct SurahLocator<'a> {
    corpus: &'a dyn ReferenceCorpus,
    calculator: &'a SimilarityCalculator,
    config: LocatorConfig,
}

impl<'a> SurahLocator<'a> {
    pub fn new(
        corpus: &'a dyn ReferenceCorpus,
        calculator: &'a SimilarityCalculator,
        config: LocatorConfig,
    ) -> Self {
        Self { corpus, calculator, config }
    }

    fn batch_offsets(&self, len: usize) -> Vec<(usize, usize)> {
        let size = self.config.batch_size;
        if len < size {
            return vec![(0, len)];
        }
        (0..len / size)
            .take(self.config.max_batches)
            .map(|i| (i * size, size))
            .collect()
    }

    /// Locates the recitation in `transcript`, ignoring the first `skip`
    /// words (the invocation prefix). Returns None when no batch matches the
    /// start of any unit.
    pub fn locate(&self, transcript: &[String], skip: usize) -> Option<LocatedStart> {
        let words = transcript.get(skip..).filter(|w| !w.is_empty())?;

        let mut informative = Vec::new();
        for (offset, len) in self.batch_offsets(words.len()) {
            let batch = &words[offset..offset + len];
            let mut passages: BTreeMap<u32, u32> = BTreeMap::new();
            for hit in self.corpus.find_unit_starts(batch) {
                passages.entry(hit.passage_number)
                    .and_modify(|unit| *unit = (*unit).min(hit.unit_number))
                    .or_insert(hit.unit_number);
            }
            trace!("Batch at word {}: {} candidate passages", skip + offset, passages.len());

            // a batch falling mid-unit yields nothing and constrains nothing
            if !passages.is_empty() {
                informative.push(BatchCandidates { offset, passages });
            }
        }

        if informative.is_empty() {
            info!("No batch matched the start of any unit");
            return None;
        }

        let located = self.intersect(&informative)
            .or_else(|| self.fallback(words, &informative))?;

        info!(
            "Located passage {} from unit {} ({} informative batches)",
            located.passage_number, located.unit_number, informative.len()
        );
        Some(LocatedStart { word_offset: skip + located.word_offset, ..located })
    }

    /// Passages present in every informative batch, best one first by
    /// (strictly increasing units, tightest unit spread, lowest number)
    fn intersect(&self, batches: &[BatchCandidates]) -> Option<LocatedStart> {
        let (first, rest) = batches.split_first()?;

        let mut best: Option<((bool, u32, u32), u32)> = None;
        for &passage in first.passages.keys() {
            if !rest.iter().all(|b| b.passages.contains_key(&passage)) {
                continue;
            }

            let units: Vec<u32> = batches.iter().map(|b| b.passages[&passage]).collect();
            let increasing = units.windows(2).all(|w| w[0] < w[1]);
            let spread = units.last().copied().unwrap_or(0).saturating_sub(units[0]);
            // smaller keys win, so monotonic sequences rank with `false`
            let key = (!increasing, spread, passage);
            debug!("Surviving passage {} with units {:?}", passage, units);

            if best.map_or(true, |(best_key, _)| key < best_key) {
                best = Some((key, passage));
            }
        }

        best.map(|(_, passage)| LocatedStart {
            passage_number: passage,
            unit_number: first.passages[&passage],
            word_offset: first.offset,
        })
    }

    /// The batch with most candidates decides; its candidates are scored by
    /// how well the transcript reads against the passage from there
    fn fallback(&self, words: &[String], batches: &[BatchCandidates]) -> Option<LocatedStart> {
        let mut widest: Option<&BatchCandidates> = None;
        for batch in batches {
            if widest.map_or(true, |w| batch.passages.len() > w.passages.len()) {
                widest = Some(batch);
            }
        }
        let batch = widest?;
        debug!("Batch intersection empty, falling back to batch at word {}", batch.offset);

        let window = (self.config.batch_size * 2).min(words.len() - batch.offset);
        let spoken = words[batch.offset..batch.offset + window].join(" ");

        let mut best: Option<(f64, u32, u32)> = None;
        for (&passage, &unit) in &batch.passages {
            let reference = self.corpus.passage_words_from(passage, unit, window).join(" ");
            let score = self.calculator.ratio(&spoken, &reference);
            if best.map_or(true, |(best_score, _, _)| score > best_score) {
                best = Some((score, passage, unit));
            }
        }

        best.map(|(_, passage_number, unit_number)| LocatedStart {
            passage_number,
            unit_number,
            word_offset: batch.offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::subsystems::MatcherConfig;
    use crate::corpus::InMemoryCorpus;
    use crate::parser::ArabicNormalizer;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn corpus() -> InMemoryCorpus {
        InMemoryCorpus::from_entries(vec![
            (112, 1, "قل هو الله احد"),
            (112, 2, "الله الصمد"),
            (112, 3, "لم يلد ولم يولد"),
            (112, 4, "ولم يكن له كفوا احد"),
            (113, 1, "قل اعوذ برب الفلق"),
            (113, 2, "من شر ما خلق"),
            (114, 1, "قل اعوذ برب الناس"),
            (114, 2, "ملك الناس"),
            (114, 3, "اله الناس"),
        ], &ArabicNormalizer::default()).unwrap()
    }

    fn locate(text: &str, skip: usize) -> Option<LocatedStart> {
        let corpus = corpus();
        let calc = SimilarityCalculator::new(MatcherConfig::default()).unwrap();
        SurahLocator::new(&corpus, &calc, LocatorConfig::default()).locate(&words(text), skip)
    }

    #[test]
    fn intersects_batches_to_a_single_passage() {
        let located = locate("قل اعوذ برب الناس ملك الناس اله الناس", 0).unwrap();
        assert_eq!(located, LocatedStart { passage_number: 114, unit_number: 1, word_offset: 0 });
    }

    #[test]
    fn skips_invocation_and_mid_unit_batches() {
        // the first batch after the prefix starts mid-unit
        let located = locate("بسم الله الرحمن الرحيم هو الله احد الله الصمد لم يلد ولم يولد ولم", 4).unwrap();
        assert_eq!(located.passage_number, 112);
        assert_eq!(located.unit_number, 3);
        assert_eq!(located.word_offset, 4 + 5);
    }

    #[test]
    fn short_transcript_uses_a_single_batch() {
        let located = locate("من شر ما", 0).unwrap();
        assert_eq!((located.passage_number, located.unit_number), (113, 2));
    }

    #[test]
    fn unknown_text_is_a_locator_failure() {
        assert!(locate("كلمات لا توجد في النص المرجعي ابدا", 0).is_none());
        assert!(locate("قل هو", 2).is_none());
    }
}
