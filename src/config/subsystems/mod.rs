pub mod text_processing;
pub mod locator;
pub mod matcher;
pub mod refiner;

pub use text_processing::TextProcessingConfig;
pub use locator::LocatorConfig;
pub use matcher::MatcherConfig;
pub use refiner::RefinerConfig;
