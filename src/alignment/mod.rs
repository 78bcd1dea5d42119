pub mod transcript;
pub mod mapper;
pub mod timestamps;
pub mod refiner;
pub mod pipeline;

pub use self::transcript::{ChunkDeduplicator, Transcript};
pub use self::mapper::AyahChunkMapper;
pub use self::timestamps::{TimestampResolver, TimingScenario};
pub use self::refiner::SilenceBoundaryRefiner;
pub use self::pipeline::{Aligner, RawChunk};
