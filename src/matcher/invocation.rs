use log::debug;

use crate::corpus::ReferenceCorpus;
use crate::parser::TextNormalizer;
use crate::types::{MatchedUnit, VerseCandidate};
use super::similarity::SimilarityCalculator;

/// The invocation recited before most passages.
pub const INVOCATION_TEXT: &str = "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvocationMatch {
    /// Leading transcript words taken up by the invocation
    pub word_count: usize,
    pub score: f64,
}

pub struct InvocationDetector {
    normalized: String,
    word_count: usize,
    threshold: f64,
}

impl InvocationDetector {
    pub fn new(normalizer: &dyn TextNormalizer, threshold: f64) -> Self {
        let normalized = normalizer.normalize(INVOCATION_TEXT);
        let word_count = normalized.split_whitespace().count();
        Self { normalized, word_count, threshold }
    }

    /// Checks whether the transcript opens with the invocation. Detection is
    /// substring tolerant; the extent is the prefix length (within one word of
    /// the phrase length) with the best plain ratio.
    pub fn detect(&self, transcript: &[String], calculator: &SimilarityCalculator) -> Option<InvocationMatch> {
        if transcript.is_empty() {
            return None;
        }

        let head_len = (self.word_count + 1).min(transcript.len());
        let head = transcript[..head_len].join(" ");
        let partial = calculator.partial_ratio(&self.normalized, &head);
        if partial < self.threshold {
            debug!("No invocation prefix (partial similarity {:.3})", partial);
            return None;
        }

        let mut best: Option<InvocationMatch> = None;
        let lengths = [self.word_count, self.word_count.saturating_sub(1), self.word_count + 1];
        for len in lengths {
            if len == 0 || len > transcript.len() {
                continue;
            }
            let score = calculator.ratio(&self.normalized, &transcript[..len].join(" "));
            if best.map_or(true, |b| score > b.score) {
                best = Some(InvocationMatch { word_count: len, score });
            }
        }

        if let Some(found) = best {
            debug!("Invocation prefix covers {} words (similarity {:.3})", found.word_count, partial);
        }
        best.map(|found| InvocationMatch { score: partial, ..found })
    }

    /// The unit re-inserted in front of the matched units once the passage is
    /// known. In the first passage the invocation is an official unit (1);
    /// elsewhere it is the unofficial unit 0.
    pub fn unit_for_passage(
        &self,
        passage_number: u32,
        corpus: &dyn ReferenceCorpus,
        confidence: f64,
    ) -> MatchedUnit {
        if corpus.first_passage() == Some(passage_number) {
            if let Some(candidate) = corpus.candidate(passage_number, 1) {
                return MatchedUnit::from_candidate(&candidate, confidence);
            }
        }

        let text_with_diacritics = corpus.first_passage()
            .and_then(|first| corpus.text_with_diacritics(first, 1))
            .filter(|text| !text.is_empty())
            .unwrap_or(INVOCATION_TEXT)
            .to_string();

        let candidate = VerseCandidate {
            passage_number,
            unit_number: 0,
            text_with_diacritics,
            normalized_text: self.normalized.clone(),
            word_count: self.word_count,
            similarity: confidence,
        };
        let mut unit = MatchedUnit::from_candidate(&candidate, confidence);
        unit.is_invocation_prefix = true;
        unit
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

    fn setup() -> (InvocationDetector, SimilarityCalculator) {
        (
            InvocationDetector::new(&ArabicNormalizer::default(), 0.85),
            SimilarityCalculator::new(MatcherConfig::default()).unwrap(),
        )
    }

    #[test]
    fn detects_invocation_with_asr_noise() {
        let (detector, calc) = setup();
        let found = detector.detect(&words("بسم الله الرحمان الرحيم قل هو الله احد"), &calc).unwrap();
        assert_eq!(found.word_count, 4);
        assert!(found.score >= 0.85);
    }

    #[test]
    fn ignores_transcripts_without_invocation() {
        let (detector, calc) = setup();
        assert!(detector.detect(&words("قل اعوذ برب الناس ملك الناس"), &calc).is_none());
        assert!(detector.detect(&[], &calc).is_none());
    }

    #[test]
    fn invocation_unit_depends_on_passage() {
        let normalizer = ArabicNormalizer::default();
        let corpus = InMemoryCorpus::from_entries(vec![
            (1, 1, INVOCATION_TEXT),
            (1, 2, "ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ"),
            (112, 1, "قُلْ هُوَ ٱللَّهُ أَحَدٌ"),
        ], &normalizer).unwrap();
        let detector = InvocationDetector::new(&normalizer, 0.85);

        let official = detector.unit_for_passage(1, &corpus, 1.0);
        assert_eq!(official.unit_number, 1);
        assert!(!official.is_invocation_prefix);

        let marker = detector.unit_for_passage(112, &corpus, 0.95);
        assert_eq!((marker.passage_number, marker.unit_number), (112, 0));
        assert!(marker.is_invocation_prefix);
        assert_eq!(marker.word_count, 4);
        assert_eq!(marker.text_with_diacritics, INVOCATION_TEXT);
    }
}
