use super::types::SimilarityMetric;

/// The SimilarityAlgorithm trait defines the interface for comparing text similarity.
/// All similarity scores are normalized between 0.0 (completely different) and 1.0 (identical).
pub trait SimilarityAlgorithm: Send + Sync {
    /// Returns the type of similarity metric this algorithm implements
    fn name(&self) -> SimilarityMetric;

    /// Compares two raw text strings and returns their similarity score
    fn compare_texts(&self, source: &str, target: &str) -> f64;

    /// Scores `reference` against every word prefix of `words`; element `i`
    /// holds the score of `words[..=i]` joined by single spaces.
    fn prefix_scores(&self, reference: &str, words: &[&str]) -> Vec<f64> {
        (1..=words.len())
            .map(|n| self.compare_texts(reference, &words[..n].join(" ")))
            .collect()
    }
}

fn lcs_len(source: &[char], target: &[char]) -> usize {
    if source.is_empty() || target.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; target.len() + 1];
    let mut curr = vec![0usize; target.len() + 1];
    for &s in source {
        for (j, &t) in target.iter().enumerate() {
            curr[j + 1] = if s == t {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[target.len()]
}

fn indel_ratio(source: &[char], target: &[char]) -> f64 {
    let total = source.len() + target.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(source, target) as f64 / total as f64
}

/// RatioMatcher scores by indel distance, normalised by combined length.
pub struct RatioMatcher;

impl RatioMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RatioMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityAlgorithm for RatioMatcher {
    fn name(&self) -> SimilarityMetric {
        SimilarityMetric::Ratio
    }

    fn compare_texts(&self, source: &str, target: &str) -> f64 {
        let source: Vec<char> = source.chars().collect();
        let target: Vec<char> = target.chars().collect();
        indel_ratio(&source, &target)
    }

    // One LCS table over the whole word run: after consuming a prefix of the
    // run, the last column holds its LCS against the full reference.
    fn prefix_scores(&self, reference: &str, words: &[&str]) -> Vec<f64> {
        let reference: Vec<char> = reference.chars().collect();
        let m = reference.len();
        let mut scores = Vec::with_capacity(words.len());

        let mut prev = vec![0usize; m + 1];
        let mut curr = vec![0usize; m + 1];
        let mut consumed = 0usize;

        for (i, word) in words.iter().enumerate() {
            let separator = if i == 0 { None } else { Some(' ') };
            for c in separator.into_iter().chain(word.chars()) {
                for (j, &r) in reference.iter().enumerate() {
                    curr[j + 1] = if c == r {
                        prev[j] + 1
                    } else {
                        prev[j + 1].max(curr[j])
                    };
                }
                std::mem::swap(&mut prev, &mut curr);
                consumed += 1;
            }

            let total = m + consumed;
            scores.push(if total == 0 { 1.0 } else { 2.0 * prev[m] as f64 / total as f64 });
        }
        scores
    }
}

/// PartialRatioMatcher is substring tolerant: the shorter text is compared
/// with every window of the longer one of the same length and the best
/// window wins, so containment scores 1.0.
pub struct PartialRatioMatcher;

impl PartialRatioMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PartialRatioMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityAlgorithm for PartialRatioMatcher {
    fn name(&self) -> SimilarityMetric {
        SimilarityMetric::PartialRatio
    }

    fn compare_texts(&self, source: &str, target: &str) -> f64 {
        let source: Vec<char> = source.chars().collect();
        let target: Vec<char> = target.chars().collect();
        let (shorter, longer) = if source.len() <= target.len() {
            (&source, &target)
        } else {
            (&target, &source)
        };

        if shorter.is_empty() {
            return if longer.is_empty() { 1.0 } else { 0.0 };
        }

        let mut best = 0.0f64;
        for window in longer.windows(shorter.len()) {
            let score = indel_ratio(shorter, window);
            if score > best {
                best = score;
                if best >= 1.0 {
                    break;
                }
            }
        }
        best
    }
}

/// Factory for creating similarity algorithm instances
pub struct SimilarityAlgorithmFactory;

impl SimilarityAlgorithmFactory {
    pub fn create(metric: SimilarityMetric) -> Box<dyn SimilarityAlgorithm> {
        match metric {
            SimilarityMetric::Ratio => Box::new(RatioMatcher::new()),
            SimilarityMetric::PartialRatio => Box::new(PartialRatioMatcher::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_matches_indel_definition() {
        let ratio = RatioMatcher::new();
        assert_eq!(ratio.compare_texts("الله", "الله"), 1.0);
        assert_eq!(ratio.compare_texts("", ""), 1.0);
        assert_eq!(ratio.compare_texts("abc", ""), 0.0);
        // lcs("abcd", "abed") = 3
        assert!((ratio.compare_texts("abcd", "abed") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn prefix_scores_agree_with_direct_comparison() {
        let ratio = RatioMatcher::new();
        let words = ["قل", "هو", "الله", "احد", "الله"];
        let fast = ratio.prefix_scores("قل هو الله احد", &words);
        let slow: Vec<f64> = (1..=words.len())
            .map(|n| ratio.compare_texts("قل هو الله احد", &words[..n].join(" ")))
            .collect();
        assert_eq!(fast.len(), 5);
        for (a, b) in fast.iter().zip(&slow) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(fast[3], 1.0);
    }

    #[test]
    fn partial_ratio_tolerates_containment() {
        let partial = PartialRatioMatcher::new();
        assert_eq!(partial.compare_texts("بسم الله", "بسم الله الرحمن"), 1.0);
        assert!(partial.compare_texts("بسم الله", "قل اعوذ") < 0.5);
        assert_eq!(partial.compare_texts("", "x"), 0.0);
    }

    #[test]
    fn factory_builds_requested_metric() {
        assert_eq!(SimilarityAlgorithmFactory::create(SimilarityMetric::Ratio).name(), SimilarityMetric::Ratio);
        assert_eq!(
            SimilarityAlgorithmFactory::create(SimilarityMetric::PartialRatio).name(),
            SimilarityMetric::PartialRatio
        );
    }
}
