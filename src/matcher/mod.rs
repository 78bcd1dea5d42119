pub mod algorithms;
pub mod similarity;
pub mod types;
pub mod invocation;
pub mod locator;
pub mod gap_filler;
pub mod forward;
// Re-export the main types
pub use self::similarity::SimilarityCalculator;
pub use self::invocation::{InvocationDetector, InvocationMatch};
pub use self::locator::SurahLocator;
pub use self::gap_filler::GapFiller;
pub use self::forward::ForwardMatcher;
pub use self::types::{
    LocatedStart,
    SimilarityMetric,
    SpanMatch,
    SpannedUnit
};
