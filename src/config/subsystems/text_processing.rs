// src/config/subsystems/text_processing.rs

use serde::{Serialize, Deserialize};
use crate::error::Result;
use crate::config::{FromIni, parse_ini_value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextProcessingConfig {
    #[serde(default = "default_remove_diacritics")]
    pub remove_diacritics: bool,

    #[serde(default = "default_remove_tatweel")]
    pub remove_tatweel: bool,

    #[serde(default = "default_normalize_arabic")]
    pub normalize_arabic: bool,

    #[serde(default = "default_preserve_punctuation")]
    pub preserve_punctuation: bool,
}

// Default functions
fn default_remove_diacritics() -> bool { true }
fn default_remove_tatweel() -> bool { true }
fn default_normalize_arabic() -> bool { true }
fn default_preserve_punctuation() -> bool { false }

impl Default for TextProcessingConfig {
    fn default() -> Self {
        Self {
            remove_diacritics: default_remove_diacritics(),
            remove_tatweel: default_remove_tatweel(),
            normalize_arabic: default_normalize_arabic(),
            preserve_punctuation: default_preserve_punctuation(),
        }
    }
}

impl FromIni for TextProcessingConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "text_processing" {
            return None;
        }

        match key {
            "remove_diacritics" => parse_ini_value(&mut self.remove_diacritics, key, value),
            "remove_tatweel" => parse_ini_value(&mut self.remove_tatweel, key, value),
            "normalize_arabic" => parse_ini_value(&mut self.normalize_arabic, key, value),
            "preserve_punctuation" => parse_ini_value(&mut self.preserve_punctuation, key, value),
            _ => None,
        }
    }
}

impl TextProcessingConfig {
    pub fn validate(&self) -> Result<()> {
        // Currently no validation needed for boolean flags
        Ok(())
    }

    /// Returns a description of which processing options are enabled
    pub fn describe(&self) -> String {
        let mut enabled = Vec::new();

        if self.remove_diacritics { enabled.push("removing diacritics"); }
        if self.remove_tatweel { enabled.push("removing tatweel"); }
        if self.normalize_arabic { enabled.push("folding letter variants"); }
        if !self.preserve_punctuation { enabled.push("removing punctuation"); }

        if enabled.is_empty() {
            "no text processing enabled".to_string()
        } else {
            enabled.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_enabled_steps() {
        let config = TextProcessingConfig::default();
        assert_eq!(
            config.describe(),
            "removing diacritics, removing tatweel, folding letter variants, removing punctuation"
        );

        let bare = TextProcessingConfig {
            remove_diacritics: false,
            remove_tatweel: false,
            normalize_arabic: false,
            preserve_punctuation: true,
        };
        assert_eq!(bare.describe(), "no text processing enabled");
    }
}
