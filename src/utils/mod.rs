pub mod logging;
pub mod report;

pub use self::logging::init_logging;
pub use self::report::{format_timestamp, ReportWriter};
