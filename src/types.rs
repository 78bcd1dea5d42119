use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};

/// One chunk as handed over by the upstream chunker once ASR has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkInput {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

/// A silence-bounded audio segment together with its transcription.
///
/// Word positions everywhere in the crate are indices into the
/// whitespace-separated tokens of `original_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub original_text: String,
    pub transcribed_text: String,
    pub original_word_count: usize,
    pub word_count: usize,
}

impl Chunk {
    pub fn new(index: usize, start_time: f64, end_time: f64, text: impl Into<String>) -> Result<Self> {
        if !start_time.is_finite() || !end_time.is_finite() || start_time < 0.0 {
            return Err(Error::malformed(format!(
                "chunk {} has invalid bounds [{}, {}]", index, start_time, end_time
            )));
        }
        if end_time <= start_time {
            return Err(Error::malformed(format!(
                "chunk {} ends at {} before it starts at {}", index, end_time, start_time
            )));
        }

        let original_text: String = text.into();
        let original_word_count = original_text.split_whitespace().count();

        Ok(Self {
            index,
            start_time,
            end_time,
            transcribed_text: original_text.clone(),
            original_text,
            original_word_count,
            word_count: original_word_count,
        })
    }

    /// Builds and validates the chunk list for one recitation.
    pub fn from_inputs(inputs: &[ChunkInput]) -> Result<Vec<Chunk>> {
        if inputs.is_empty() {
            return Err(Error::malformed("chunk list is empty"));
        }

        let mut chunks: Vec<Chunk> = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            let chunk = Chunk::new(index, input.start_time, input.end_time, input.text.as_str())?;
            if let Some(prev) = chunks.last() {
                if chunk.start_time < prev.end_time {
                    return Err(Error::malformed(format!(
                        "chunk {} starts at {} before chunk {} ends at {}",
                        index, chunk.start_time, prev.index, prev.end_time
                    )));
                }
            }
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    pub fn start_ms(&self) -> u64 {
        seconds_to_ms(self.start_time)
    }

    pub fn end_ms(&self) -> u64 {
        seconds_to_ms(self.end_time)
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms().saturating_sub(self.start_ms())
    }

    /// Number of leading original words removed as duplicates of the previous chunk.
    pub fn removed_word_count(&self) -> usize {
        self.original_word_count - self.word_count
    }
}

pub fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).round().max(0.0) as u64
}

/// Reference-corpus unit considered while locating, filling or matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseCandidate {
    pub passage_number: u32,
    pub unit_number: u32,
    pub text_with_diacritics: String,
    pub normalized_text: String,
    pub word_count: usize,
    #[serde(skip)]
    pub similarity: f64,
}

/// Words of one chunk's `original_text` that belong to a unit.
/// `end_word_in_chunk` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMembership {
    pub chunk_index: usize,
    pub start_word_in_chunk: usize,
    pub end_word_in_chunk: usize,
}

impl ChunkMembership {
    pub fn len(&self) -> usize {
        self.end_word_in_chunk - self.start_word_in_chunk
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedUnit {
    pub passage_number: u32,
    /// 0 marks the invocation prefix recited before a passage other than the first
    pub unit_number: u32,
    pub text_with_diacritics: String,
    pub word_count: usize,
    pub start_word: usize,
    pub end_word: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub match_confidence: f64,
    pub is_invocation_prefix: bool,
    pub cutoff_uncertain: bool,
    pub chunk_membership: Vec<ChunkMembership>,
}

impl MatchedUnit {
    pub fn from_candidate(candidate: &VerseCandidate, confidence: f64) -> Self {
        Self {
            passage_number: candidate.passage_number,
            unit_number: candidate.unit_number,
            text_with_diacritics: candidate.text_with_diacritics.clone(),
            word_count: candidate.word_count,
            start_word: 1,
            end_word: candidate.word_count,
            start_ms: 0,
            end_ms: 0,
            match_confidence: confidence,
            is_invocation_prefix: false,
            cutoff_uncertain: false,
            chunk_membership: Vec::new(),
        }
    }

    pub fn key(&self) -> (u32, u32) {
        (self.passage_number, self.unit_number)
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    LocatorFailure,
    MappingGap,
    BoundaryAmbiguity,
    DegenerateBoundary,
    /// Unit below the forward threshold, kept only to bridge two matched units
    BridgedUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub passage_number: Option<u32>,
    pub unit_number: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, unit: Option<(u32, u32)>, message: impl Into<String>) -> Self {
        Self {
            kind,
            passage_number: unit.map(|(p, _)| p),
            unit_number: unit.map(|(_, u)| u),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub passage_number: Option<u32>,
    pub units: Vec<MatchedUnit>,
    pub coverage_ratio: f64,
    pub trailing_unmatched_ms: u64,
    pub diagnostics: Vec<Diagnostic>,
}

impl AlignmentResult {
    /// Empty result for a recitation whose passage could not be identified.
    pub fn unrecognized(audio_end_ms: u64, message: impl Into<String>) -> Self {
        Self {
            passage_number: None,
            units: Vec::new(),
            coverage_ratio: 0.0,
            trailing_unmatched_ms: audio_end_ms,
            diagnostics: vec![Diagnostic::new(DiagnosticKind::LocatorFailure, None, message)],
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.passage_number.is_some()
    }

    pub fn uncertain_count(&self) -> usize {
        self.units.iter().filter(|u| u.cutoff_uncertain).count()
    }
}
