use log::{trace, warn};

use crate::types::{Chunk, ChunkMembership, Diagnostic, DiagnosticKind, MatchedUnit};
use super::mapper::ChunkUnits;

/// How a unit's boundaries are derived from its chunk membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingScenario {
    /// One chunk holding only this unit: the chunk's own bounds
    SingleExclusive { chunk: usize },
    /// Consecutive chunks holding only this unit: first start, last end
    MultiExclusive { first: usize, last: usize },
    /// One chunk shared with other units: proportional slice by word position
    SingleShared { chunk: usize },
    /// Several chunks, at least one shared: proportional start in the first,
    /// proportional end in the last
    MultiShared { first: usize, last: usize },
    /// No chunk membership at all
    Unmapped,
}

impl TimingScenario {
    pub fn classify(unit_position: usize, membership: &[ChunkMembership], chunk_units: &ChunkUnits) -> Self {
        let exclusive = |chunk: usize| {
            chunk_units.get(&chunk).map_or(true, |units| units.iter().all(|&u| u == unit_position))
        };

        match membership {
            [] => TimingScenario::Unmapped,
            [only] if exclusive(only.chunk_index) => TimingScenario::SingleExclusive { chunk: only.chunk_index },
            [only] => TimingScenario::SingleShared { chunk: only.chunk_index },
            [first, .., last] => {
                if membership.iter().all(|m| exclusive(m.chunk_index)) {
                    TimingScenario::MultiExclusive { first: first.chunk_index, last: last.chunk_index }
                } else {
                    TimingScenario::MultiShared { first: first.chunk_index, last: last.chunk_index }
                }
            }
        }
    }
}

/// Time of a word position inside a chunk, proportional to the chunk's word count
fn word_position_ms(chunk: &Chunk, word: usize) -> u64 {
    let total = chunk.original_word_count.max(1) as f64;
    let share = (word as f64 / total).min(1.0);
    let start = chunk.start_time * 1000.0;
    let duration = (chunk.end_time - chunk.start_time) * 1000.0;
    (start + share * duration).round() as u64
}

/// Assigns `start_ms`/`end_ms` to matched units from their chunk membership.
pub struct TimestampResolver<'a> {
    chunks: &'a [Chunk],
    chunk_units: &'a ChunkUnits,
}

impl<'a> TimestampResolver<'a> {
    pub fn new(chunks: &'a [Chunk], chunk_units: &'a ChunkUnits) -> Self {
        Self { chunks, chunk_units }
    }

    fn chunk(&self, index: usize) -> Option<&'a Chunk> {
        self.chunks.get(index)
    }

    fn slice_start(&self, membership: &ChunkMembership, exclusive: bool) -> Option<u64> {
        let chunk = self.chunk(membership.chunk_index)?;
        Some(if exclusive { chunk.start_ms() } else { word_position_ms(chunk, membership.start_word_in_chunk) })
    }

    fn slice_end(&self, membership: &ChunkMembership, exclusive: bool) -> Option<u64> {
        let chunk = self.chunk(membership.chunk_index)?;
        Some(if exclusive { chunk.end_ms() } else { word_position_ms(chunk, membership.end_word_in_chunk) })
    }

    fn is_exclusive(&self, unit_position: usize, chunk: usize) -> bool {
        self.chunk_units.get(&chunk).map_or(true, |units| units.iter().all(|&u| u == unit_position))
    }

    /// Resolves one unit in place. Returns the diagnostic explaining why the
    /// unit has to be dropped, if it does.
    pub fn resolve(&self, unit_position: usize, unit: &mut MatchedUnit) -> Option<Diagnostic> {
        let scenario = TimingScenario::classify(unit_position, &unit.chunk_membership, self.chunk_units);
        let key = Some(unit.key());

        let bounds = match scenario {
            TimingScenario::Unmapped => {
                warn!("Unit {}:{} has no chunk membership, dropping it", unit.passage_number, unit.unit_number);
                return Some(Diagnostic::new(DiagnosticKind::MappingGap, key, "unit has no chunk membership"));
            }
            TimingScenario::SingleExclusive { chunk } => self.chunk(chunk).map(|c| (c.start_ms(), c.end_ms())),
            TimingScenario::MultiExclusive { first, last } => self.chunk(first)
                .zip(self.chunk(last))
                .map(|(a, b)| (a.start_ms(), b.end_ms())),
            TimingScenario::SingleShared { .. } | TimingScenario::MultiShared { .. } => {
                let first = unit.chunk_membership.first();
                let last = unit.chunk_membership.last();
                first.zip(last).and_then(|(first, last)| {
                    let start = self.slice_start(first, self.is_exclusive(unit_position, first.chunk_index))?;
                    let end = self.slice_end(last, self.is_exclusive(unit_position, last.chunk_index))?;
                    Some((start, end))
                })
            }
        };

        let Some((start_ms, end_ms)) = bounds else {
            return Some(Diagnostic::new(DiagnosticKind::MappingGap, key, "unit refers to an unknown chunk"));
        };

        trace!("Unit {}:{} {:?} -> [{}, {}]", unit.passage_number, unit.unit_number, scenario, start_ms, end_ms);
        unit.start_ms = start_ms;
        unit.end_ms = end_ms;

        if start_ms >= end_ms {
            warn!(
                "Unit {}:{} resolved to an empty interval [{}, {}], dropping it",
                unit.passage_number, unit.unit_number, start_ms, end_ms
            );
            return Some(Diagnostic::new(
                DiagnosticKind::DegenerateBoundary,
                key,
                format!("resolved interval [{}, {}] is empty", start_ms, end_ms),
            ));
        }
        None
    }
}
