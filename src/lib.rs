//! tartil aligns the ASR transcript of a recited passage against a reference
//! corpus of numbered passages and units, and resolves the start and end time
//! of every recited unit from the silence-bounded chunks of the recording.

// Module declarations
pub mod error;
pub mod types;
pub mod config;
pub mod parser;
pub mod corpus;
pub mod matcher;
pub mod alignment;
pub mod audio;
pub mod utils;

// Re-exports
pub use error::{Error, Result};
pub use alignment::{Aligner, RawChunk};
pub use audio::{PcmTrack, SilenceProbe, SilenceSpan, Transcriber};
pub use corpus::{InMemoryCorpus, ReferenceCorpus};
pub use parser::{ArabicNormalizer, TextNormalizer};
pub use types::{AlignmentResult, ChunkInput, Diagnostic, DiagnosticKind, MatchedUnit};

// Re-export the config from config module
pub use config::TartilConfig;
