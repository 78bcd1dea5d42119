// src/config/subsystems/refiner.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_ini_value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinerConfig {
    /// How close a boundary must sit to a chunk edge to count as chunk-exact
    pub edge_tolerance_ms: u64,
    /// Half-width of the secondary silence search around a zero-gap cutoff
    pub search_window_ms: u64,
    pub min_silence_ms: u64,
    pub silence_thresh_dbfs: f64,
    pub seek_step_ms: u64,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            edge_tolerance_ms: 100,
            search_window_ms: 10_000,
            min_silence_ms: 500,
            silence_thresh_dbfs: -40.0,
            seek_step_ms: 10,
        }
    }
}

impl FromIni for RefinerConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "refiner" {
            return None;
        }

        match key {
            "edge_tolerance_ms" => parse_ini_value(&mut self.edge_tolerance_ms, key, value),
            "search_window_ms" => parse_ini_value(&mut self.search_window_ms, key, value),
            "min_silence_ms" => parse_ini_value(&mut self.min_silence_ms, key, value),
            "silence_thresh_dbfs" => parse_ini_value(&mut self.silence_thresh_dbfs, key, value),
            "seek_step_ms" => parse_ini_value(&mut self.seek_step_ms, key, value),
            _ => None,
        }
    }
}

impl RefinerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_silence_ms == 0 {
            return Err(Error::Config(
                "min_silence_ms must be greater than 0".to_string()
            ));
        }
        if self.seek_step_ms == 0 {
            return Err(Error::Config(
                "seek_step_ms must be greater than 0".to_string()
            ));
        }
        if self.silence_thresh_dbfs >= 0.0 {
            return Err(Error::Config(
                format!("silence_thresh_dbfs must be negative: {}", self.silence_thresh_dbfs)
            ));
        }
        Ok(())
    }
}
