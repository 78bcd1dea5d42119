// Arabic normalisation shared by reference text and ASR output

use lazy_static::lazy_static;
use regex::Regex;
use crate::config::subsystems::TextProcessingConfig;

use super::TextNormalizer;

lazy_static! {
    // Harakat, tanween, shadda, sukun, superscript alef and the Quranic
    // annotation marks (small high letters, pause marks)
    static ref DIACRITICS: Regex =
        Regex::new(r"[\u{0610}-\u{061A}\u{064B}-\u{065F}\u{0670}\u{06D6}-\u{06ED}]").unwrap();
    static ref TATWEEL: Regex = Regex::new(r"\u{0640}").unwrap();
    static ref PUNCTUATION: Regex = Regex::new(r"[^\p{L}\p{N}\p{M}\s]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone)]
pub struct ArabicNormalizer {
    settings: TextProcessingConfig,
}

impl ArabicNormalizer {
    pub fn new(settings: TextProcessingConfig) -> Self {
        Self { settings }
    }

    pub fn new_with_defaults() -> Self {
        Self::new(TextProcessingConfig::default())
    }

    fn normalize_char(&self, c: char) -> char {
        if !self.settings.normalize_arabic {
            return c;
        }

        match c {
            'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
            'ئ' | 'ى' => 'ي',
            'ة' => 'ه',
            'ؤ' => 'و',
            _ => c
        }
    }
}

impl Default for ArabicNormalizer {
    fn default() -> Self {
        Self::new_with_defaults()
    }
}

impl TextNormalizer for ArabicNormalizer {
    fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut cleaned = text.to_string();
        if self.settings.remove_diacritics {
            cleaned = DIACRITICS.replace_all(&cleaned, "").into_owned();
        }
        if self.settings.remove_tatweel {
            cleaned = TATWEEL.replace_all(&cleaned, "").into_owned();
        }
        if !self.settings.preserve_punctuation {
            cleaned = PUNCTUATION.replace_all(&cleaned, "").into_owned();
        }

        let folded: String = cleaned.chars().map(|c| self.normalize_char(c)).collect();
        WHITESPACE.replace_all(folded.trim(), " ").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_uthmani_marks_from_invocation() {
        let normalizer = ArabicNormalizer::default();
        assert_eq!(
            normalizer.normalize("بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ"),
            "بسم الله الرحمن الرحيم"
        );
    }

    #[test]
    fn removes_tatweel_and_folds_letter_variants() {
        let normalizer = ArabicNormalizer::default();
        assert_eq!(normalizer.normalize("الرحمـــن"), "الرحمن");
        assert_eq!(normalizer.normalize("إِيَّاكَ"), "اياك");
        assert_eq!(normalizer.normalize("الصلاة"), "الصلاه");
        assert_eq!(normalizer.normalize("موسى"), "موسي");
    }

    #[test]
    fn collapses_whitespace_and_punctuation() {
        let normalizer = ArabicNormalizer::default();
        assert_eq!(normalizer.normalize("  قل ، هو   الله\tأحد. "), "قل هو الله احد");
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize(" ۖ "), "");
    }

    #[test]
    fn honours_disabled_folding() {
        let settings = TextProcessingConfig { normalize_arabic: false, ..Default::default() };
        let normalizer = ArabicNormalizer::new(settings);
        assert_eq!(normalizer.normalize("أحد"), "أحد");
    }

    #[test]
    fn tokenize_keeps_positions_of_empty_tokens() {
        let normalizer = ArabicNormalizer::default();
        let tokens = normalizer.tokenize("ٱلْحَمْدُ ۚ لِلَّهِ");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].cleaned_text, "الحمد");
        assert_eq!(tokens[1].cleaned_text, "");
        assert_eq!(tokens[2].index, 2);
        assert_eq!(tokens[2].cleaned_text, "لله");
    }
}
