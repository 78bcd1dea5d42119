// src/config/subsystems/locator.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_ini_value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Words per constraint-propagation batch
    pub batch_size: usize,
    /// Ceiling on batches examined, bounds cost on long recitations
    pub max_batches: usize,
    /// Partial similarity needed to treat the transcript head as the invocation
    pub invocation_threshold: f64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_batches: 5,
            invocation_threshold: 0.85,
        }
    }
}

impl FromIni for LocatorConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "locator" {
            return None;
        }

        match key {
            "batch_size" => parse_ini_value(&mut self.batch_size, key, value),
            "max_batches" => parse_ini_value(&mut self.max_batches, key, value),
            "invocation_threshold" => parse_ini_value(&mut self.invocation_threshold, key, value),
            _ => None,
        }
    }
}

impl LocatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config(
                "batch_size must be greater than 0".to_string()
            ));
        }
        if self.max_batches == 0 {
            return Err(Error::Config(
                "max_batches must be greater than 0".to_string()
            ));
        }
        if self.invocation_threshold <= 0.0 || self.invocation_threshold > 1.0 {
            return Err(Error::Config(
                format!("Invalid invocation_threshold: {}", self.invocation_threshold)
            ));
        }
        Ok(())
    }
}
