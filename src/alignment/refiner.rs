use log::{debug, warn};

use crate::audio::{SilenceProbe, SilenceQuery};
use crate::config::subsystems::RefinerConfig;
use crate::types::{Chunk, Diagnostic, DiagnosticKind, MatchedUnit};

/// Decides what happens to the gap between every pair of consecutive units.
pub struct SilenceBoundaryRefiner<'a> {
    config: &'a RefinerConfig,
    chunks: &'a [Chunk],
    silence: Option<&'a dyn SilenceProbe>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundaryAction {
    /// Both sides sit on chunk edges around a real pause: meet in the middle
    SplitGap(u64),
    /// Zero-gap cutoff moved to the middle of a detected silence
    MoveToSilence(u64),
    /// Zero-gap cutoff with no silence to anchor it
    Uncertain,
    /// Mid-chunk boundary with a positive gap
    Keep,
    /// Overlapping units, clamped to the middle of the overlap
    Clamp(u64),
}

impl<'a> SilenceBoundaryRefiner<'a> {
    pub fn new(config: &'a RefinerConfig, chunks: &'a [Chunk], silence: Option<&'a dyn SilenceProbe>) -> Self {
        Self { config, chunks, silence }
    }

    fn near_chunk_start(&self, ms: u64) -> bool {
        self.chunks.iter().any(|c| c.start_ms().abs_diff(ms) <= self.config.edge_tolerance_ms)
    }

    fn near_chunk_end(&self, ms: u64) -> bool {
        self.chunks.iter().any(|c| c.end_ms().abs_diff(ms) <= self.config.edge_tolerance_ms)
    }

    /// Midpoint of the silence closest to `cutoff`, strictly inside `(lower, upper)`
    fn closest_silence(&self, cutoff: u64, lower: u64, upper: u64) -> Option<u64> {
        let probe = self.silence?;
        let query = SilenceQuery {
            from_ms: cutoff.saturating_sub(self.config.search_window_ms),
            to_ms: cutoff + self.config.search_window_ms,
            min_silence_ms: self.config.min_silence_ms,
            silence_thresh_dbfs: self.config.silence_thresh_dbfs,
            seek_step_ms: self.config.seek_step_ms,
        };

        probe.find_silences(&query)
            .into_iter()
            .map(|span| span.midpoint_ms())
            .filter(|&mid| mid > lower && mid < upper)
            .min_by_key(|&mid| (mid.abs_diff(cutoff), mid))
    }

    fn decide(&self, a: &MatchedUnit, b: &MatchedUnit) -> BoundaryAction {
        let (end, start) = (a.end_ms, b.start_ms);
        if end > start {
            return BoundaryAction::Clamp(start + (end - start) / 2);
        }
        if end == start {
            return match self.closest_silence(end, a.start_ms, b.end_ms) {
                Some(mid) => BoundaryAction::MoveToSilence(mid),
                None => BoundaryAction::Uncertain,
            };
        }
        if self.near_chunk_end(end) && self.near_chunk_start(start) {
            return BoundaryAction::SplitGap(end + (start - end) / 2);
        }
        BoundaryAction::Keep
    }

    /// Refines boundaries in place and returns one diagnostic per boundary
    /// left ambiguous.
    pub fn refine(&self, units: &mut [MatchedUnit]) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for i in 1..units.len() {
            let (head, tail) = units.split_at_mut(i);
            let a = &mut head[i - 1];
            let b = &mut tail[0];

            let action = self.decide(a, b);
            debug!("Boundary {}:{} | {}:{} -> {:?}", a.passage_number, a.unit_number, b.passage_number, b.unit_number, action);

            match action {
                BoundaryAction::SplitGap(mid) | BoundaryAction::MoveToSilence(mid) => {
                    a.end_ms = mid;
                    b.start_ms = mid;
                }
                BoundaryAction::Clamp(mid) => {
                    a.end_ms = mid;
                    b.start_ms = mid;
                    a.cutoff_uncertain = true;
                    b.cutoff_uncertain = true;
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::BoundaryAmbiguity,
                        Some(b.key()),
                        format!("overlap with unit {} clamped at {} ms", a.unit_number, mid),
                    ));
                }
                BoundaryAction::Uncertain => {
                    a.cutoff_uncertain = true;
                    b.cutoff_uncertain = true;
                    warn!("No silence near cutoff {} ms between units {} and {}", a.end_ms, a.unit_number, b.unit_number);
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::BoundaryAmbiguity,
                        Some(b.key()),
                        format!("no silence found near cutoff at {} ms", a.end_ms),
                    ));
                }
                BoundaryAction::Keep => {}
            }
        }
        diagnostics
    }
}
