use chrono::Local;
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Installs the global logger: `<local time> [LEVEL] - message`, written to
/// a timestamped file under `log_dir` when one is given, to stderr otherwise.
/// Returns the log file path, if any.
pub fn init_logging(level: LevelFilter, log_dir: Option<&Path>, prefix: &str) -> Result<Option<PathBuf>> {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level);

    let log_path = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            let path = dir.join(format!("{}_{}.log", prefix, timestamp));
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            builder.target(env_logger::Target::Pipe(Box::new(log_file)));
            Some(path)
        }
        None => None,
    };

    // a second initialisation (tests, embedding hosts) keeps the first logger
    let _ = builder.try_init();
    Ok(log_path)
}
