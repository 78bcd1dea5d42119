// types.rs
use serde::{Serialize, Deserialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Indel-normalised ratio: 2 * LCS / (len_a + len_b)
    Ratio,
    /// Best ratio of the shorter string against any equally long window of the longer one
    PartialRatio,
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMetric::Ratio => "ratio",
            SimilarityMetric::PartialRatio => "partial_ratio",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transcript words `[start, end)` that best matched a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanMatch {
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl SpanMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Where the locator anchored the recitation. `word_offset` indexes the
/// combined transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedStart {
    pub passage_number: u32,
    pub unit_number: u32,
    pub word_offset: usize,
}

/// A unit accepted by the gap filler or forward matcher, with its
/// transcript span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedUnit {
    pub unit_number: u32,
    pub span: SpanMatch,
    /// Never matched on its own; placed between two matched neighbours
    pub bridged: bool,
}
