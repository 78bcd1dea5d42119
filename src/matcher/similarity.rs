use log::trace;

use crate::error::Result;
use crate::config::subsystems::MatcherConfig;
use super::algorithms::{SimilarityAlgorithm, SimilarityAlgorithmFactory};
use super::types::{SimilarityMetric, SpanMatch};

// Score given up per word of drift away from the expected position, so an
// equally good occurrence further down the transcript never wins over a
// nearby one
const DRIFT_PENALTY: f64 = 0.02;

/// Span-level similarity used by the matchers: where in the transcript a
/// unit's words sit, and how well.
pub struct SimilarityCalculator {
    config: MatcherConfig,
    ratio: Box<dyn SimilarityAlgorithm>,
    partial: Box<dyn SimilarityAlgorithm>,
}

fn length_tolerance(word_count: usize) -> usize {
    (word_count / 4).max(1)
}

fn reversed(text: &str) -> String {
    text.chars().rev().collect()
}

impl SimilarityCalculator {
    pub fn new(config: MatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ratio: SimilarityAlgorithmFactory::create(SimilarityMetric::Ratio),
            partial: SimilarityAlgorithmFactory::create(SimilarityMetric::PartialRatio),
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn ratio(&self, source: &str, target: &str) -> f64 {
        self.ratio.compare_texts(source, target)
    }

    pub fn partial_ratio(&self, source: &str, target: &str) -> f64 {
        self.partial.compare_texts(source, target)
    }

    /// Two transcript words count as the same word when equal or close
    /// enough at character level
    pub fn words_match(&self, a: &str, b: &str) -> bool {
        a == b || self.ratio(a, b) >= self.config.word_match_threshold
    }

    /// Best span for `unit_text` starting anywhere in `[from, from + lookahead]`,
    /// its length allowed to stretch or shrink by a quarter of the unit.
    pub fn best_forward_span(
        &self,
        unit_text: &str,
        transcript: &[String],
        from: usize,
        lookahead: usize,
    ) -> Option<SpanMatch> {
        let unit_words: Vec<&str> = unit_text.split_whitespace().collect();
        let k = unit_words.len();
        let n = transcript.len();
        if k == 0 || from >= n {
            return None;
        }

        let words: Vec<&str> = transcript.iter().map(String::as_str).collect();
        if from + k <= n && words[from..from + k] == unit_words[..] {
            return Some(SpanMatch { start: from, end: from + k, score: 1.0 });
        }

        let reference = unit_words.join(" ");
        let tolerance = length_tolerance(k);
        let min_len = k.saturating_sub(tolerance).max(1);
        let max_len = k + tolerance;
        let last_start = (from + lookahead).min(n - 1);

        let mut best: Option<(f64, SpanMatch)> = None;
        for start in from..=last_start {
            let upper = max_len.min(n - start);
            if upper < min_len {
                break;
            }

            let scores = self.ratio.prefix_scores(&reference, &words[start..start + upper]);
            let drift = (start - from) as f64 * DRIFT_PENALTY;
            for len in min_len..=upper {
                let score = scores[len - 1];
                let rank = score - drift;
                if best.map_or(true, |(best_rank, _)| rank > best_rank) {
                    best = Some((rank, SpanMatch { start, end: start + len, score }));
                }
            }
        }

        trace!("Forward span for '{}' from {}: {:?}", reference, from, best.map(|(_, s)| s));
        best.map(|(_, span)| span)
    }

    /// Best span for `unit_text` ending anywhere in `[end - slack, end]` and
    /// starting no earlier than `lower_bound`.
    pub fn best_backward_span(
        &self,
        unit_text: &str,
        transcript: &[String],
        end: usize,
        lower_bound: usize,
    ) -> Option<SpanMatch> {
        let unit_words: Vec<&str> = unit_text.split_whitespace().collect();
        let k = unit_words.len();
        let end = end.min(transcript.len());
        if k == 0 || end <= lower_bound {
            return None;
        }

        let words: Vec<&str> = transcript.iter().map(String::as_str).collect();
        if end >= lower_bound + k && words[end - k..end] == unit_words[..] {
            return Some(SpanMatch { start: end - k, end, score: 1.0 });
        }

        // LCS is invariant under reversing both strings, so suffixes of the
        // transcript are scored as prefixes of its reversal
        let reference = reversed(&unit_words.join(" "));
        let tolerance = length_tolerance(k);
        let min_len = k.saturating_sub(tolerance).max(1);
        let max_len = k + tolerance;
        let first_end = end.saturating_sub(self.config.span_slack_words).max(lower_bound + 1);

        let mut best: Option<(f64, SpanMatch)> = None;
        for stop in (first_end..=end).rev() {
            let upper = max_len.min(stop - lower_bound);
            if upper < min_len {
                continue;
            }

            let tail: Vec<String> = words[stop - upper..stop].iter().rev().map(|w| reversed(w)).collect();
            let tail: Vec<&str> = tail.iter().map(String::as_str).collect();
            let scores = self.ratio.prefix_scores(&reference, &tail);
            let drift = (end - stop) as f64 * DRIFT_PENALTY;
            for len in min_len..=upper {
                let score = scores[len - 1];
                let rank = score - drift;
                if best.map_or(true, |(best_rank, _)| rank > best_rank) {
                    best = Some((rank, SpanMatch { start: stop - len, end: stop, score }));
                }
            }
        }

        best.map(|(_, span)| span)
    }

    /// Fuzzy word-level LCS between a unit and a transcript region. Returns
    /// the matched `(unit_index, region_index)` pairs in order.
    pub fn word_alignment(&self, unit_words: &[&str], region: &[&str]) -> Vec<(usize, usize)> {
        let (m, n) = (unit_words.len(), region.len());
        if m == 0 || n == 0 {
            return Vec::new();
        }

        let matches: Vec<Vec<bool>> = unit_words.iter()
            .map(|u| region.iter().map(|r| self.words_match(u, r)).collect())
            .collect();

        let mut table = vec![vec![0usize; n + 1]; m + 1];
        for i in (0..m).rev() {
            for j in (0..n).rev() {
                table[i][j] = if matches[i][j] {
                    table[i + 1][j + 1] + 1
                } else {
                    table[i + 1][j].max(table[i][j + 1])
                };
            }
        }

        let mut pairs = Vec::with_capacity(table[0][0]);
        let (mut i, mut j) = (0, 0);
        while i < m && j < n {
            if matches[i][j] && table[i][j] == table[i + 1][j + 1] + 1 {
                pairs.push((i, j));
                i += 1;
                j += 1;
            } else if table[i + 1][j] >= table[i][j + 1] {
                i += 1;
            } else {
                j += 1;
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn calculator() -> SimilarityCalculator {
        SimilarityCalculator::new(MatcherConfig::default()).unwrap()
    }

    #[test]
    fn exact_span_at_cursor_short_circuits() {
        let transcript = words("قل هو الله احد الله الصمد");
        let span = calculator().best_forward_span("الله الصمد", &transcript, 4, 3).unwrap();
        assert_eq!((span.start, span.end, span.score), (4, 6, 1.0));
    }

    #[test]
    fn forward_span_survives_asr_errors_and_drift() {
        // one stray word before the unit, one misheard word inside it
        let transcript = words("ام لم يلد ولم يولت ولم يكن");
        let span = calculator().best_forward_span("لم يلد ولم يولد", &transcript, 0, 3).unwrap();
        assert_eq!((span.start, span.end), (1, 5));
        assert!(span.score > 0.9);
    }

    #[test]
    fn backward_span_ends_at_cursor() {
        let transcript = words("بسم الله الرحمن الرحيم الحمد لله رب العالمين الرحمن الرحيم");
        let calc = calculator();
        let span = calc.best_backward_span("الرحمن الرحيم", &transcript, 10, 4).unwrap();
        assert_eq!((span.start, span.end), (8, 10));
        let span = calc.best_backward_span("الحمد لله رب العالمين", &transcript, 8, 4).unwrap();
        assert_eq!((span.start, span.end, span.score), (4, 8, 1.0));
        assert!(calc.best_backward_span("الحمد", &transcript, 4, 4).is_none());
    }

    #[test]
    fn word_alignment_accepts_near_matches() {
        let calc = calculator();
        let pairs = calc.word_alignment(&["الرحمن", "الرحيم"], &["ملك", "الرحمان", "الرحيم"]);
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }
}
