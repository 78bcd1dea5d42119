// src/utils/report.rs
use chrono::Local;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::Result;
use crate::types::AlignmentResult;

/// `HH:MM:SS.mmm`
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, ms % 1000)
}

/// Writes one CSV row per matched unit of every aligned job.
pub struct ReportWriter {
    writer: csv::Writer<BufWriter<File>>,
    generated_at: String,
    rows: usize,
}

impl ReportWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(BufWriter::new(file));

        writer.write_record([
            "job_id",
            "passage_number",
            "unit_number",
            "start",
            "end",
            "duration_ms",
            "match_confidence",
            "is_invocation_prefix",
            "cutoff_uncertain",
            "chunks",
            "generated_at",
        ])?;

        Ok(Self {
            writer,
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            rows: 0,
        })
    }

    pub fn write_result(&mut self, job_id: &str, result: &AlignmentResult) -> Result<()> {
        if result.units.is_empty() {
            // keep a trace of unrecognized jobs
            self.writer.write_record([
                job_id, "", "", "", "", "", "", "", "", "", self.generated_at.as_str(),
            ])?;
            self.rows += 1;
            return Ok(());
        }

        for unit in &result.units {
            let chunks = unit.chunk_membership.iter()
                .map(|m| m.chunk_index.to_string())
                .collect::<Vec<_>>()
                .join(";");
            self.writer.write_record(&[
                job_id.to_string(),
                unit.passage_number.to_string(),
                unit.unit_number.to_string(),
                format_timestamp(unit.start_ms),
                format_timestamp(unit.end_ms),
                unit.duration_ms().to_string(),
                format!("{:.3}", unit.match_confidence),
                unit.is_invocation_prefix.to_string(),
                unit.cutoff_uncertain.to_string(),
                chunks,
                self.generated_at.clone(),
            ])?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        info!("Report written with {} rows", self.rows);
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMembership, MatchedUnit, VerseCandidate};

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_timestamp(0), "00:00:00.000");
        assert_eq!(format_timestamp(3_723_045), "01:02:03.045");
    }

    #[test]
    fn writes_one_row_per_unit() {
        let candidate = VerseCandidate {
            passage_number: 112,
            unit_number: 0,
            text_with_diacritics: "بسم الله".into(),
            normalized_text: "بسم الله".into(),
            word_count: 2,
            similarity: 1.0,
        };
        let mut unit = MatchedUnit::from_candidate(&candidate, 0.97);
        unit.is_invocation_prefix = true;
        unit.end_ms = 1500;
        unit.chunk_membership = vec![ChunkMembership { chunk_index: 0, start_word_in_chunk: 0, end_word_in_chunk: 2 }];
        let result = AlignmentResult { passage_number: Some(112), units: vec![unit], ..Default::default() };

        let file = tempfile::NamedTempFile::new().unwrap();
        let mut report = ReportWriter::create(file.path()).unwrap();
        report.write_result("job-1", &result).unwrap();
        report.write_result("job-2", &AlignmentResult::default()).unwrap();
        assert_eq!(report.finish().unwrap(), 2);

        let mut reader = csv::Reader::from_path(file.path()).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "job-1");
        assert_eq!(&rows[0][4], "00:00:01.500");
        assert_eq!(&rows[0][7], "true");
        assert_eq!(&rows[1][1], "");
    }
}
