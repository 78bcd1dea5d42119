// src/config/subsystems/matcher.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::{FromIni, parse_ini_value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    // Backward gap filling
    pub backward_threshold: f64,

    // Forward walk
    pub forward_threshold: f64,
    pub max_consecutive_misses: usize,
    /// Extra words a unit's span may drift or stretch by in the transcript
    pub span_slack_words: usize,

    // Unit to chunk mapping
    pub mapping_overlap_threshold: f64,
    /// Character ratio above which two transcript words count as the same word
    pub word_match_threshold: f64,

    /// Drop a trailing chunk that only holds the closing formula
    pub drop_closing_phrase: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            backward_threshold: 0.75,
            forward_threshold: 0.70,
            max_consecutive_misses: 5,
            span_slack_words: 3,
            mapping_overlap_threshold: 0.5,
            word_match_threshold: 0.8,
            drop_closing_phrase: true,
        }
    }
}

impl FromIni for MatcherConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "matcher" {
            return None;
        }

        match key {
            "backward_threshold" => parse_ini_value(&mut self.backward_threshold, key, value),
            "forward_threshold" => parse_ini_value(&mut self.forward_threshold, key, value),
            "max_consecutive_misses" => parse_ini_value(&mut self.max_consecutive_misses, key, value),
            "span_slack_words" => parse_ini_value(&mut self.span_slack_words, key, value),
            "mapping_overlap_threshold" => parse_ini_value(&mut self.mapping_overlap_threshold, key, value),
            "word_match_threshold" => parse_ini_value(&mut self.word_match_threshold, key, value),
            "drop_closing_phrase" => parse_ini_value(&mut self.drop_closing_phrase, key, value),
            _ => None,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        // Validate confidence thresholds
        for (name, value) in [
            ("backward_threshold", self.backward_threshold),
            ("forward_threshold", self.forward_threshold),
            ("mapping_overlap_threshold", self.mapping_overlap_threshold),
            ("word_match_threshold", self.word_match_threshold),
        ] {
            if value <= 0.0 || value > 1.0 {
                return Err(Error::Config(
                    format!("Invalid {}: {}", name, value)
                ));
            }
        }

        if self.max_consecutive_misses == 0 {
            return Err(Error::Config(
                "max_consecutive_misses must be greater than 0".to_string()
            ));
        }
        Ok(())
    }
}
