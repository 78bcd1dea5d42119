pub mod arabic;

/// A whitespace token of the input together with its canonical form.
/// `cleaned_text` is empty when the token held only marks or punctuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextToken {
    pub index: usize,
    pub original_text: String,
    pub cleaned_text: String,
}

pub trait TextNormalizer: Sync + Send {
    /// Canonical comparison form: marks stripped, letter variants folded,
    /// whitespace collapsed
    fn normalize(&self, text: &str) -> String;

    /// Tokenize on whitespace, keeping the original token next to its canonical form
    fn tokenize(&self, text: &str) -> Vec<TextToken> {
        text.split_whitespace()
            .enumerate()
            .map(|(index, token)| TextToken {
                index,
                original_text: token.to_string(),
                cleaned_text: self.normalize(token),
            })
            .collect()
    }

    /// Canonical words of `text`, empty tokens dropped
    fn words(&self, text: &str) -> Vec<String> {
        self.normalize(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Consonantal skeleton of a normalized word: every alef after the first
/// letter is dropped, so plene and defective spellings (`العالمين` and
/// `العلمين`, `الرحمان` and `الرحمن`) compare equal.
pub fn skeleton(word: &str) -> String {
    let mut chars = word.chars();
    let first = chars.next();
    first.into_iter()
        .chain(chars.filter(|&c| c != 'ا'))
        .collect()
}

pub use self::arabic::ArabicNormalizer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_ignores_medial_alef() {
        assert_eq!(skeleton("العالمين"), skeleton("العلمين"));
        assert_eq!(skeleton("الرحمان"), skeleton("الرحمن"));
        assert_eq!(skeleton("اياك"), "ايك");
        assert_eq!(skeleton("كفوا"), "كفو");
        assert_ne!(skeleton("الناس"), skeleton("الفلق"));
        assert_eq!(skeleton(""), "");
    }
}
