use ahash::AHashMap;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::parser::{skeleton, TextNormalizer};
use super::{CorpusHit, ReferenceCorpus};

#[derive(Debug, Clone)]
struct UnitEntry {
    text: String,
    normalized: String,
    /// alef-insensitive form of every normalized word, for begins-with search
    skeleton: Vec<String>,
}

/// Reference corpus held in memory, indexed by the skeleton of the first
/// normalized word of every unit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    passages: BTreeMap<u32, Vec<UnitEntry>>,
    first_word_index: AHashMap<String, Vec<(u32, u32)>>,
}

impl InMemoryCorpus {
    /// Builds the corpus from `(passage, unit, text)` triples. Units of a
    /// passage must be numbered 1..=n without gaps.
    pub fn from_entries<I, S>(entries: I, normalizer: &dyn TextNormalizer) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32, S)>,
        S: Into<String>,
    {
        let mut staged: BTreeMap<u32, BTreeMap<u32, String>> = BTreeMap::new();
        for (passage, unit, text) in entries {
            if passage == 0 || unit == 0 {
                return Err(Error::corpus(format!(
                    "passage and unit numbers start at 1, got {}:{}", passage, unit
                )));
            }
            if staged.entry(passage).or_default().insert(unit, text.into()).is_some() {
                return Err(Error::corpus(format!("duplicate unit {}:{}", passage, unit)));
            }
        }

        let mut corpus = InMemoryCorpus::default();
        for (passage, units) in staged {
            let mut entries = Vec::with_capacity(units.len());
            for (expected, (unit, text)) in (1u32..).zip(units) {
                if unit != expected {
                    return Err(Error::corpus(format!(
                        "passage {} skips from unit {} to {}", passage, expected - 1, unit
                    )));
                }
                let normalized = normalizer.normalize(&text);
                let skeleton_words: Vec<String> = normalized.split_whitespace().map(skeleton).collect();
                if let Some(first) = skeleton_words.first() {
                    corpus.first_word_index
                        .entry(first.clone())
                        .or_default()
                        .push((passage, unit));
                } else {
                    warn!("Unit {}:{} is empty after normalization", passage, unit);
                }
                entries.push(UnitEntry { text, normalized, skeleton: skeleton_words });
            }
            corpus.passages.insert(passage, entries);
        }

        debug!("Indexed {} distinct unit-initial words", corpus.first_word_index.len());
        Ok(corpus)
    }

    /// Loads a `passage|unit|text` file; blank lines and `#` comments are skipped,
    /// malformed lines are logged and skipped.
    pub fn from_file<P: AsRef<Path>>(path: P, normalizer: &dyn TextNormalizer) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading reference corpus from: {:?}", path);

        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.splitn(3, '|').collect();
            if parts.len() != 3 {
                warn!("Invalid line format at line {}: {}", line_num + 1, line);
                continue;
            }

            match (parts[0].trim().parse::<u32>(), parts[1].trim().parse::<u32>()) {
                (Ok(passage), Ok(unit)) => entries.push((passage, unit, parts[2].trim().to_string())),
                _ => warn!("Error parsing unit key at line {}: {}", line_num + 1, line),
            }
        }

        let corpus = Self::from_entries(entries, normalizer)?;
        info!("Loaded {} passages, {} units", corpus.passage_count(), corpus.total_units());
        Ok(corpus)
    }

    pub fn passage_count(&self) -> usize {
        self.passages.len()
    }

    pub fn total_units(&self) -> usize {
        self.passages.values().map(Vec::len).sum()
    }

    fn entry(&self, passage: u32, unit: u32) -> Option<&UnitEntry> {
        let index = unit.checked_sub(1)? as usize;
        self.passages.get(&passage)?.get(index)
    }

    /// True when the passage word stream starting at `unit` begins with `batch`,
    /// both compared as skeletons
    fn stream_begins_with(&self, passage: u32, unit: u32, batch: &[String]) -> bool {
        let Some(units) = self.passages.get(&passage) else {
            return false;
        };

        let mut stream = units[(unit as usize - 1)..]
            .iter()
            .flat_map(|entry| entry.skeleton.iter());

        batch.iter().all(|expected| stream.next() == Some(expected))
    }
}

impl ReferenceCorpus for InMemoryCorpus {
    fn text_with_diacritics(&self, passage: u32, unit: u32) -> Option<&str> {
        self.entry(passage, unit).map(|e| e.text.as_str())
    }

    fn normalized_text(&self, passage: u32, unit: u32) -> Option<&str> {
        self.entry(passage, unit).map(|e| e.normalized.as_str())
    }

    fn unit_count(&self, passage: u32) -> u32 {
        self.passages.get(&passage).map_or(0, |units| units.len() as u32)
    }

    fn first_passage(&self) -> Option<u32> {
        self.passages.keys().next().copied()
    }

    fn find_unit_starts(&self, batch: &[String]) -> Vec<CorpusHit> {
        let Some(first) = batch.first() else {
            return Vec::new();
        };
        let Some(starts) = self.first_word_index.get(&skeleton(first)) else {
            return Vec::new();
        };

        let matched_text = batch.join(" ");
        let batch: Vec<String> = batch.iter().map(|word| skeleton(word)).collect();
        starts.iter()
            .filter(|(passage, unit)| self.stream_begins_with(*passage, *unit, &batch))
            .map(|&(passage_number, unit_number)| CorpusHit {
                matched_text: matched_text.clone(),
                position_in_unit: 0,
                unit_number,
                passage_number,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ArabicNormalizer;
    use std::io::Write;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn sample() -> InMemoryCorpus {
        let normalizer = ArabicNormalizer::default();
        InMemoryCorpus::from_entries(vec![
            (112, 1, "قُلْ هُوَ ٱللَّهُ أَحَدٌ"),
            (112, 2, "ٱللَّهُ ٱلصَّمَدُ"),
            (112, 3, "لَمْ يَلِدْ وَلَمْ يُولَدْ"),
            (112, 4, "وَلَمْ يَكُن لَّهُۥ كُفُوًا أَحَدٌۢ"),
            (113, 1, "قُلْ أَعُوذُ بِرَبِّ ٱلْفَلَقِ"),
        ], &normalizer).unwrap()
    }

    #[test]
    fn looks_up_both_text_forms() {
        let corpus = sample();
        assert_eq!(corpus.text_with_diacritics(112, 2), Some("ٱللَّهُ ٱلصَّمَدُ"));
        assert_eq!(corpus.normalized_text(112, 2), Some("الله الصمد"));
        assert_eq!(corpus.unit_count(112), 4);
        assert_eq!(corpus.unit_count(1), 0);
        assert_eq!(corpus.first_passage(), Some(112));
        assert!(corpus.normalized_text(112, 0).is_none());
    }

    #[test]
    fn begins_with_search_reads_across_unit_boundaries() {
        let corpus = sample();
        let hits = corpus.find_unit_starts(&words("الله الصمد لم يلد ولم"));
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].passage_number, hits[0].unit_number), (112, 2));
        assert_eq!(hits[0].position_in_unit, 0);

        // "قل" starts two passages; the second word disambiguates
        let hits = corpus.find_unit_starts(&words("قل اعوذ"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].passage_number, 113);

        // mid-unit text never matches
        assert!(corpus.find_unit_starts(&words("هو الله احد")).is_empty());
    }

    #[test]
    fn begins_with_search_ignores_alef_spelling() {
        let corpus = InMemoryCorpus::from_entries(vec![
            (1, 1, "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ"),
            (1, 2, "ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ"),
            (1, 3, "ٱلرَّحْمَٰنِ ٱلرَّحِيمِ"),
        ], &ArabicNormalizer::default()).unwrap();
        assert_eq!(corpus.normalized_text(1, 2), Some("الحمد لله رب العلمين"));

        let hits = corpus.find_unit_starts(&words("الحمد لله رب العالمين الرحمان"));
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].passage_number, hits[0].unit_number), (1, 2));
        assert_eq!(hits[0].matched_text, "الحمد لله رب العالمين الرحمان");

        let hits = corpus.find_unit_starts(&words("الرحمان الرحيم"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].unit_number, 3);
    }

    #[test]
    fn rejects_gaps_in_unit_numbering() {
        let normalizer = ArabicNormalizer::default();
        let result = InMemoryCorpus::from_entries(vec![(1, 1, "a"), (1, 3, "b")], &normalizer);
        assert!(matches!(result, Err(Error::Corpus(_))));
    }

    #[test]
    fn loads_pipe_separated_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# passage|unit|text").unwrap();
        writeln!(file, "114|1|قُلْ أَعُوذُ بِرَبِّ ٱلنَّاسِ").unwrap();
        writeln!(file, "114|2|مَلِكِ ٱلنَّاسِ").unwrap();
        writeln!(file, "not a record").unwrap();

        let corpus = InMemoryCorpus::from_file(file.path(), &ArabicNormalizer::default()).unwrap();
        assert_eq!(corpus.total_units(), 2);
        assert_eq!(corpus.passage_words_from(114, 1, 5), words("قل اعوذ برب الناس ملك"));
    }
}
