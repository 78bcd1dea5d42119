use log::{debug, info, warn};
use serde::{Serialize, Deserialize};

use crate::audio::{PcmTrack, SilenceProbe, Transcriber};
use crate::config::TartilConfig;
use crate::corpus::ReferenceCorpus;
use crate::error::Result;
use crate::matcher::{
    ForwardMatcher, GapFiller, InvocationDetector, SimilarityCalculator, SurahLocator,
};
use crate::matcher::types::{SpanMatch, SpannedUnit};
use crate::parser::ArabicNormalizer;
use crate::types::{
    seconds_to_ms, AlignmentResult, Chunk, ChunkInput, Diagnostic, DiagnosticKind, MatchedUnit,
};

use super::mapper::AyahChunkMapper;
use super::refiner::SilenceBoundaryRefiner;
use super::timestamps::TimestampResolver;
use super::transcript::{ChunkDeduplicator, Transcript};

/// Chunk bounds before ASR has run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    pub start_time: f64,
    pub end_time: f64,
}

/// Aligns one recitation against the reference corpus. Holds no state
/// between calls; one instance may serve many recitations concurrently.
pub struct Aligner<'a> {
    corpus: &'a dyn ReferenceCorpus,
    config: TartilConfig,
    normalizer: ArabicNormalizer,
    calculator: SimilarityCalculator,
    invocation: InvocationDetector,
}

impl<'a> Aligner<'a> {
    pub fn new(config: TartilConfig, corpus: &'a dyn ReferenceCorpus) -> Result<Self> {
        config.validate()?;
        let normalizer = ArabicNormalizer::new(config.text_processing.clone());
        let calculator = SimilarityCalculator::new(config.matcher.clone())?;
        let invocation = InvocationDetector::new(&normalizer, config.locator.invocation_threshold);

        Ok(Self { corpus, config, normalizer, calculator, invocation })
    }

    pub fn config(&self) -> &TartilConfig {
        &self.config
    }

    /// Runs the engine over transcribed chunks. `silence` is consulted for
    /// zero-gap cutoffs; without it those cutoffs are flagged uncertain.
    pub fn align(&self, inputs: &[ChunkInput], silence: Option<&dyn SilenceProbe>) -> Result<AlignmentResult> {
        let chunks = Chunk::from_inputs(inputs)?;
        Ok(self.align_chunks(chunks, silence))
    }

    /// Transcribes every chunk of `audio` with `transcriber`, then aligns.
    /// The chunk list is validated before the first transcription.
    pub fn align_audio(
        &self,
        raw_chunks: &[RawChunk],
        transcriber: &dyn Transcriber,
        audio: &PcmTrack,
    ) -> Result<AlignmentResult> {
        let mut inputs: Vec<ChunkInput> = raw_chunks.iter()
            .map(|raw| ChunkInput { start_time: raw.start_time, end_time: raw.end_time, text: String::new() })
            .collect();
        Chunk::from_inputs(&inputs)?;

        for (index, input) in inputs.iter_mut().enumerate() {
            let samples = audio.slice(seconds_to_ms(input.start_time), seconds_to_ms(input.end_time));
            input.text = transcriber.transcribe(samples, audio.sample_rate())?;
            debug!("Chunk {} [{:.2}s, {:.2}s]: {}", index, input.start_time, input.end_time, input.text);
        }
        self.align(&inputs, Some(audio))
    }

    fn matched_unit(&self, passage: u32, spanned: &SpannedUnit) -> Option<(MatchedUnit, SpanMatch)> {
        let candidate = self.corpus.candidate(passage, spanned.unit_number)?;
        Some((MatchedUnit::from_candidate(&candidate, spanned.span.score), spanned.span))
    }

    /// The pipeline proper over an already validated chunk list.
    pub fn align_chunks(&self, mut chunks: Vec<Chunk>, silence: Option<&dyn SilenceProbe>) -> AlignmentResult {
        let audio_end_ms = chunks.last().map_or(0, Chunk::end_ms);

        ChunkDeduplicator::new(&self.normalizer).deduplicate(&mut chunks);
        let transcript = Transcript::build(&chunks, &self.normalizer, self.config.matcher.drop_closing_phrase);
        let words = transcript.texts();
        if transcript.is_empty() {
            warn!("Transcript is empty, nothing to align");
            return AlignmentResult::unrecognized(audio_end_ms, "transcript is empty");
        }

        let invocation = self.invocation.detect(words, &self.calculator);
        let prefix_len = invocation.map_or(0, |found| found.word_count);

        let locator = SurahLocator::new(self.corpus, &self.calculator, self.config.locator.clone());
        let Some(start) = locator.locate(words, prefix_len) else {
            warn!("No recognizable passage in {} transcript words", words.len());
            return AlignmentResult::unrecognized(audio_end_ms, "no recognizable passage");
        };
        let passage = start.passage_number;

        let backfilled = GapFiller::new(self.corpus, &self.calculator).fill(&start, words, prefix_len);
        let forward = ForwardMatcher::new(self.corpus, &self.calculator).walk(&start, words);

        let mut diagnostics: Vec<Diagnostic> = forward.iter()
            .filter(|spanned| spanned.bridged)
            .map(|spanned| Diagnostic::new(
                DiagnosticKind::BridgedUnit,
                Some((passage, spanned.unit_number)),
                format!("unit scored {:.3}, placed between matched neighbours", spanned.span.score),
            ))
            .collect();

        let mut placed: Vec<(MatchedUnit, SpanMatch)> = backfilled.iter()
            .chain(&forward)
            .filter_map(|spanned| self.matched_unit(passage, spanned))
            .collect();

        if let Some(found) = invocation {
            let prefix = self.invocation.unit_for_passage(passage, self.corpus, found.score);
            let already_matched = placed.first().map_or(false, |(u, _)| u.unit_number <= prefix.unit_number);
            if !already_matched {
                placed.insert(0, (prefix, SpanMatch { start: 0, end: prefix_len, score: found.score }));
            }
        }

        let (mut units, spans): (Vec<MatchedUnit>, Vec<SpanMatch>) = placed.into_iter().unzip();
        let chunk_units = AyahChunkMapper::new(&self.calculator, &self.normalizer)
            .map(&mut units, &spans, &chunks, &transcript);

        let resolver = TimestampResolver::new(&chunks, &chunk_units);
        let mut kept = Vec::with_capacity(units.len());
        let mut covered_words = 0usize;
        for (position, (mut unit, span)) in units.into_iter().zip(spans).enumerate() {
            match resolver.resolve(position, &mut unit) {
                Some(diagnostic) => diagnostics.push(diagnostic),
                None => {
                    covered_words += span.len();
                    kept.push(unit);
                }
            }
        }

        let refiner = SilenceBoundaryRefiner::new(&self.config.refiner, &chunks, silence);
        diagnostics.extend(refiner.refine(&mut kept));

        let coverage_ratio = (covered_words as f64 / transcript.len() as f64).min(1.0);
        let trailing_unmatched_ms = kept.last().map_or(audio_end_ms, |u| audio_end_ms.saturating_sub(u.end_ms));

        let result = AlignmentResult {
            passage_number: Some(passage),
            units: kept,
            coverage_ratio,
            trailing_unmatched_ms,
            diagnostics,
        };
        info!(
            "Passage {}: {} units, coverage {:.1}%, {} uncertain cutoffs, {} ms unmatched at the end",
            passage,
            result.units.len(),
            result.coverage_ratio * 100.0,
            result.uncertain_count(),
            result.trailing_unmatched_ms
        );
        result
    }
}
