use log::{debug, trace};

use crate::corpus::ReferenceCorpus;
use super::similarity::SimilarityCalculator;
use super::types::{LocatedStart, SpanMatch, SpannedUnit};

#[derive(Debug, Clone, Copy)]
struct Miss {
    unit_number: u32,
    word_count: usize,
    score: f64,
}

/// Walks forward from the located start through consecutive units,
/// tolerating up to `max_consecutive_misses` failed units in a row.
pub struct ForwardMatcher<'a> {
    corpus: &'a dyn ReferenceCorpus,
    calculator: &'a SimilarityCalculator,
}

impl<'a> ForwardMatcher<'a> {
    pub fn new(corpus: &'a dyn ReferenceCorpus, calculator: &'a SimilarityCalculator) -> Self {
        Self { corpus, calculator }
    }

    /// Matches units from `start` onwards. Misses followed by a match are
    /// bridged: they are emitted with their own (sub-threshold) score and a
    /// share of the words between the two matches, so unit numbers stay
    /// consecutive. Trailing misses are not emitted.
    pub fn walk(&self, start: &LocatedStart, transcript: &[String]) -> Vec<SpannedUnit> {
        let config = self.calculator.config();
        let unit_count = self.corpus.unit_count(start.passage_number);

        let mut matched = Vec::new();
        let mut pending: Vec<Miss> = Vec::new();
        let mut cursor = start.word_offset;
        let mut unit = start.unit_number;

        while unit <= unit_count && cursor < transcript.len() {
            let Some(text) = self.corpus.normalized_text(start.passage_number, unit) else {
                break;
            };
            let lookahead = config.span_slack_words + pending.iter().map(|m| m.word_count).sum::<usize>();
            let span = self.calculator.best_forward_span(text, transcript, cursor, lookahead);

            match span {
                Some(span) if span.score >= config.forward_threshold => {
                    trace!("Unit {} at words {}..{} ({:.3})", unit, span.start, span.end, span.score);
                    matched.extend(bridge(&pending, cursor, span.start));
                    pending.clear();
                    cursor = span.end;
                    matched.push(SpannedUnit { unit_number: unit, span, bridged: false });
                }
                other => {
                    pending.push(Miss {
                        unit_number: unit,
                        word_count: text.split_whitespace().count(),
                        score: other.map_or(0.0, |s| s.score),
                    });
                    trace!("Unit {} missed ({} in a row)", unit, pending.len());
                    if pending.len() >= config.max_consecutive_misses {
                        debug!("Forward walk stops after {} consecutive misses at unit {}", pending.len(), unit);
                        break;
                    }
                }
            }
            unit += 1;
        }

        if !pending.is_empty() {
            debug!("Dropping {} unmatched trailing units", pending.len());
        }
        matched
    }
}

/// Splits the words `[from, to)` between missed units in proportion to
/// their reference word counts.
fn bridge(misses: &[Miss], from: usize, to: usize) -> Vec<SpannedUnit> {
    if misses.is_empty() {
        return Vec::new();
    }

    let available = to.saturating_sub(from);
    let total: usize = misses.iter().map(|m| m.word_count.max(1)).sum();
    let mut bridged = Vec::with_capacity(misses.len());
    let mut cumulative = 0usize;

    for miss in misses {
        let begin = from + available * cumulative / total;
        cumulative += miss.word_count.max(1);
        let end = from + available * cumulative / total;
        debug!("Bridging missed unit {} over words {}..{}", miss.unit_number, begin, end);
        bridged.push(SpannedUnit {
            unit_number: miss.unit_number,
            span: SpanMatch { start: begin, end, score: miss.score },
            bridged: true,
        });
    }
    bridged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::subsystems::MatcherConfig;
    use crate::corpus::InMemoryCorpus;
    use crate::parser::{ArabicNormalizer, TextNormalizer};

    const REFRAIN: &str = "فبأي آلاء ربكما تكذبان";

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    /// A passage whose refrain recurs 31 times between distinct lines
    fn refrain_corpus() -> (InMemoryCorpus, Vec<String>) {
        let lines = [
            "الرحمن", "علم القرآن", "خلق الإنسان", "علمه البيان", "الشمس والقمر بحسبان",
            "والنجم والشجر يسجدان", "والسماء رفعها ووضع الميزان", "ألا تطغوا في الميزان",
        ];
        let mut texts: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        for i in 0..31 {
            texts.push(REFRAIN.to_string());
            if i < 30 {
                texts.push(format!("آية بين اللازمتين رقم {}", i + 1));
            }
        }
        let entries: Vec<(u32, u32, String)> = texts.iter()
            .enumerate()
            .map(|(i, text)| (55, i as u32 + 1, text.clone()))
            .collect();
        let normalizer = ArabicNormalizer::default();
        let corpus = InMemoryCorpus::from_entries(entries, &normalizer).unwrap();
        let transcript = texts.iter().flat_map(|t| normalizer.words(t)).collect();
        (corpus, transcript)
    }

    #[test]
    fn repeated_refrain_keeps_every_unit() {
        let (corpus, transcript) = refrain_corpus();
        let calc = SimilarityCalculator::new(MatcherConfig::default()).unwrap();
        let start = LocatedStart { passage_number: 55, unit_number: 1, word_offset: 0 };

        let matched = ForwardMatcher::new(&corpus, &calc).walk(&start, &transcript);
        assert_eq!(matched.len() as u32, corpus.unit_count(55));
        for (i, unit) in matched.iter().enumerate() {
            assert_eq!(unit.unit_number, i as u32 + 1);
        }
        assert_eq!(matched.last().unwrap().span.end, transcript.len());
    }

    #[test]
    fn bridges_a_misrecognised_unit() {
        let corpus = InMemoryCorpus::from_entries(vec![
            (112, 1, "قل هو الله احد"),
            (112, 2, "الله الصمد"),
            (112, 3, "لم يلد ولم يولد"),
            (112, 4, "ولم يكن له كفوا احد"),
        ], &ArabicNormalizer::default()).unwrap();
        let calc = SimilarityCalculator::new(MatcherConfig::default()).unwrap();
        let transcript = words("قل هو الله احد طيب الظهر لم يلد ولم يولد ولم يكن له كفوا احد");
        let start = LocatedStart { passage_number: 112, unit_number: 1, word_offset: 0 };

        let matched = ForwardMatcher::new(&corpus, &calc).walk(&start, &transcript);
        let units: Vec<u32> = matched.iter().map(|u| u.unit_number).collect();
        assert_eq!(units, vec![1, 2, 3, 4]);
        assert_eq!((matched[1].span.start, matched[1].span.end), (4, 6));
        assert!(matched[1].span.score < 0.70);
        assert!(matched[1].bridged);
        assert!(matched.iter().filter(|u| u.unit_number != 2).all(|u| !u.bridged));
    }

    #[test]
    fn unrelated_tail_stops_the_walk() {
        let corpus = InMemoryCorpus::from_entries(
            (1..=10).map(|i| (7, i, format!("نص الوحدة المرجعية {}", i))),
            &ArabicNormalizer::default(),
        ).unwrap();
        let calc = SimilarityCalculator::new(MatcherConfig::default()).unwrap();
        let transcript = words("نص الوحدة المرجعية 1 كلام اخر تماما بعد نهاية التلاوة هنا");
        let start = LocatedStart { passage_number: 7, unit_number: 1, word_offset: 0 };

        let matched = ForwardMatcher::new(&corpus, &calc).walk(&start, &transcript);
        assert_eq!(matched.len(), 1);
    }
}
