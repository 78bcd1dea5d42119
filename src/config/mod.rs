pub mod file;
pub mod subsystems;

use serde::{Serialize, Deserialize};
use std::path::Path;
use std::fs;
use std::str::FromStr;
use crate::error::{Error, Result};
use log::{info, warn, trace};

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

/// Parses one INI value into `target`, reporting the offending key on failure.
pub(crate) fn parse_ini_value<T: FromStr>(target: &mut T, key: &str, value: &str) -> Option<Result<()>> {
    match value.trim_matches('"').parse::<T>() {
        Ok(parsed) => {
            *target = parsed;
            Some(Ok(()))
        },
        Err(_) => Some(Err(Error::Config(
            format!("Invalid {} value: {}", key, value)
        ))),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TartilConfig {
    // File paths and logging
    pub files: file::FileConfig,

    // Subsystem configs
    pub text_processing: subsystems::TextProcessingConfig,
    pub locator: subsystems::LocatorConfig,
    pub matcher: subsystems::MatcherConfig,
    pub refiner: subsystems::RefinerConfig,
}

impl TartilConfig {
    pub fn validate(&self) -> Result<()> {
        self.files.validate()?;
        self.text_processing.validate()?;
        self.locator.validate()?;
        self.matcher.validate()?;
        self.refiner.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        let absolute_path = std::fs::canonicalize(&path)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        trace!("Loading configuration from: {:?}", absolute_path);

        let content = fs::read_to_string(&path)?;
        let config = Self::from_ini_str(&content)?;
        info!("Loaded configuration from {:?}", absolute_path);
        Ok(config)
    }

    pub fn from_ini_str(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len()-1].trim().to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                // Delegate to appropriate subsystem config
                if let Some(result) = match current_section.as_str() {
                    "file" => config.files.from_ini_section(&current_section, key, value),
                    "text_processing" => config.text_processing.from_ini_section(&current_section, key, value),
                    "locator" => config.locator.from_ini_section(&current_section, key, value),
                    "matcher" => config.matcher.from_ini_section(&current_section, key, value),
                    "refiner" => config.refiner.from_ini_section(&current_section, key, value),
                    _ => None,
                } {
                    if let Err(e) = result {
                        warn!("Error processing config key {}={}: {}", key, value, e);
                    }
                } else {
                    warn!("Unrecognized config key: {}={} in section [{}]", key, value, current_section);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}
