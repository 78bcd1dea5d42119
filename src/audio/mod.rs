// audio/mod.rs

pub mod pcm;

use serde::{Serialize, Deserialize};
use crate::error::Result;

/// A stretch of audio quieter than the silence threshold, in milliseconds
/// from the start of the recitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilenceSpan {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SilenceSpan {
    pub fn midpoint_ms(&self) -> u64 {
        self.start_ms + (self.end_ms - self.start_ms) / 2
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Parameters of a silence search, pydub style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceQuery {
    pub from_ms: u64,
    pub to_ms: u64,
    pub min_silence_ms: u64,
    pub silence_thresh_dbfs: f64,
    pub seek_step_ms: u64,
}

/// Audio collaborator queried by the boundary refiner.
pub trait SilenceProbe: Send + Sync {
    /// Silences of at least `min_silence_ms` inside `[from_ms, to_ms)`, in order
    fn find_silences(&self, query: &SilenceQuery) -> Vec<SilenceSpan>;
}

/// ASR collaborator: mono samples in, best-effort text out.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, samples: &[f32], sample_rate: u32) -> Result<String>;
}

pub use self::pcm::PcmTrack;
