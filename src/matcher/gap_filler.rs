use log::{debug, trace};

use crate::corpus::ReferenceCorpus;
use super::similarity::SimilarityCalculator;
use super::types::{LocatedStart, SpannedUnit};

/// Walks backward from the located start to recover short early units the
/// batch locator stepped over. Stops at the first unit that does not match.
pub struct GapFiller<'a> {
    corpus: &'a dyn ReferenceCorpus,
    calculator: &'a SimilarityCalculator,
}

impl<'a> GapFiller<'a> {
    pub fn new(corpus: &'a dyn ReferenceCorpus, calculator: &'a SimilarityCalculator) -> Self {
        Self { corpus, calculator }
    }

    /// Units before `start`, in ascending order. Transcript words before
    /// `lower_bound` are never claimed.
    pub fn fill(&self, start: &LocatedStart, transcript: &[String], lower_bound: usize) -> Vec<SpannedUnit> {
        let threshold = self.calculator.config().backward_threshold;
        let mut filled = Vec::new();
        let mut cursor = start.word_offset;
        let mut unit = start.unit_number.saturating_sub(1);

        while unit >= 1 && cursor > lower_bound {
            let Some(text) = self.corpus.normalized_text(start.passage_number, unit) else {
                break;
            };

            match self.calculator.best_backward_span(text, transcript, cursor, lower_bound) {
                Some(span) if span.score >= threshold => {
                    trace!("Backfilled unit {} at words {}..{} ({:.3})", unit, span.start, span.end, span.score);
                    cursor = span.start;
                    filled.push(SpannedUnit { unit_number: unit, span, bridged: false });
                    unit -= 1;
                }
                other => {
                    trace!("Backfill stops at unit {} ({:?})", unit, other.map(|s| s.score));
                    break;
                }
            }
        }

        filled.reverse();
        if !filled.is_empty() {
            debug!("Gap filler recovered {} units before unit {}", filled.len(), start.unit_number);
        }
        filled
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
        ], &ArabicNormalizer::default()).unwrap()
    }

    #[test]
    fn recovers_units_before_the_locator_anchor() {
        let corpus = corpus();
        let calc = SimilarityCalculator::new(MatcherConfig::default()).unwrap();
        let transcript = words("بسم الله الرحمن الرحيم قل هو الله احد الله الصمد لم يلد ولم يولد");
        let start = LocatedStart { passage_number: 112, unit_number: 3, word_offset: 10 };

        let filled = GapFiller::new(&corpus, &calc).fill(&start, &transcript, 4);
        let units: Vec<u32> = filled.iter().map(|u| u.unit_number).collect();
        assert_eq!(units, vec![1, 2]);
        assert_eq!((filled[0].span.start, filled[0].span.end), (4, 8));
        assert_eq!((filled[1].span.start, filled[1].span.end), (8, 10));
    }

    #[test]
    fn stops_at_first_mismatch() {
        let corpus = corpus();
        let calc = SimilarityCalculator::new(MatcherConfig::default()).unwrap();
        // unit 1 is missing from the recording, unit 2 is there
        let transcript = words("اعوذ بالله من الشيطان الله الصمد لم يلد ولم يولد");
        let start = LocatedStart { passage_number: 112, unit_number: 3, word_offset: 6 };

        let filled = GapFiller::new(&corpus, &calc).fill(&start, &transcript, 0);
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].unit_number, 2);
    }
}
