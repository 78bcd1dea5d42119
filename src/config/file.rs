// src/config/file.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use log::LevelFilter;
use crate::error::Result;
use super::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub corpus_file: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub report_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            corpus_file: PathBuf::from("data/corpus.txt"),
            output_dir: PathBuf::from("data/alignments"),
            log_dir: None,
            report_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl FromIni for FileConfig {
    fn from_ini_section(&mut self, _section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        let value = value.trim_matches('"');
        match key {
            "corpus_file" => {
                self.corpus_file = PathBuf::from(value);
                Some(Ok(()))
            },
            "output_dir" => {
                self.output_dir = PathBuf::from(value);
                Some(Ok(()))
            },
            "log_dir" => {
                self.log_dir = Some(PathBuf::from(value));
                Some(Ok(()))
            },
            "report_file" => {
                self.report_file = Some(PathBuf::from(value));
                Some(Ok(()))
            },
            "log_level" => {
                self.log_level = value.to_string();
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl FileConfig {
    pub fn validate(&self) -> Result<()> {
        // Paths are checked when they are opened; only the level needs a sanity check here
        if !matches!(
            self.log_level.trim().to_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace" | "none"
        ) {
            log::warn!("Unknown log_level '{}', falling back to info", self.log_level);
        }
        Ok(())
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.log_level.trim().to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            "none" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }
}
