use hound::{SampleFormat, WavReader};
use log::{debug, info};
use std::path::Path;

use crate::error::{Error, Result};
use super::{SilenceProbe, SilenceQuery, SilenceSpan};

/// Mono PCM audio normalised to [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct PcmTrack {
    sample_rate: u32,
    samples: Vec<f32>,
    /// prefix sums of squared samples, for O(1) window RMS
    energy: Vec<f64>,
}

impl PcmTrack {
    pub fn from_samples(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::audio("sample rate must be greater than 0"));
        }

        let mut energy = Vec::with_capacity(samples.len() + 1);
        energy.push(0.0);
        let mut running = 0.0f64;
        for &s in &samples {
            running += (s as f64) * (s as f64);
            energy.push(running);
        }

        Ok(Self { sample_rate, samples, energy })
    }

    /// Loads a WAV file, downmixing every channel to mono
    pub fn from_wav<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            SampleFormat::Int => {
                let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let samples: Vec<f32> = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect()
        };

        info!(
            "Loaded {:?}: {} Hz, {} channel(s), {:.2}s",
            path, spec.sample_rate, spec.channels, samples.len() as f64 / spec.sample_rate as f64
        );
        Self::from_samples(spec.sample_rate, samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    fn sample_at(&self, ms: u64) -> usize {
        let index = (ms as f64 * self.sample_rate as f64 / 1000.0).round() as usize;
        index.min(self.samples.len())
    }

    /// Samples in `[start_ms, end_ms)`
    pub fn slice(&self, start_ms: u64, end_ms: u64) -> &[f32] {
        let start = self.sample_at(start_ms);
        let end = self.sample_at(end_ms).max(start);
        &self.samples[start..end]
    }

    fn rms(&self, start_ms: u64, end_ms: u64) -> f64 {
        let start = self.sample_at(start_ms);
        let end = self.sample_at(end_ms);
        if end <= start {
            return 0.0;
        }
        ((self.energy[end] - self.energy[start]) / (end - start) as f64).sqrt()
    }

    /// Windows of `min_silence_ms`, stepped by `seek_step_ms`, whose RMS is
    /// at or under the threshold; overlapping or adjacent silent windows are
    /// merged into one span.
    pub fn detect_silences(&self, query: &SilenceQuery) -> Vec<SilenceSpan> {
        let to_ms = query.to_ms.min(self.duration_ms());
        let min_len = query.min_silence_ms;
        if min_len == 0 || query.seek_step_ms == 0 || to_ms < query.from_ms + min_len {
            return Vec::new();
        }

        let threshold = 10f64.powf(query.silence_thresh_dbfs / 20.0);
        let last_start = to_ms - min_len;

        let mut starts: Vec<u64> = (query.from_ms..=last_start).step_by(query.seek_step_ms as usize).collect();
        if (last_start - query.from_ms) % query.seek_step_ms != 0 {
            starts.push(last_start);
        }

        let silent: Vec<u64> = starts.into_iter()
            .filter(|&start| self.rms(start, start + min_len) <= threshold)
            .collect();

        let mut spans = Vec::new();
        let Some((&first, rest)) = silent.split_first() else {
            return spans;
        };

        let mut range_start = first;
        let mut prev = first;
        for &start in rest {
            let continuous = start == prev + query.seek_step_ms;
            let has_gap = start > prev + min_len;
            if !continuous && has_gap {
                spans.push(SilenceSpan { start_ms: range_start, end_ms: prev + min_len });
                range_start = start;
            }
            prev = start;
        }
        spans.push(SilenceSpan { start_ms: range_start, end_ms: prev + min_len });

        debug!("Found {} silences in [{}, {}] ms", spans.len(), query.from_ms, to_ms);
        spans
    }
}

impl SilenceProbe for PcmTrack {
    fn find_silences(&self, query: &SilenceQuery) -> Vec<SilenceSpan> {
        self.detect_silences(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn tone(ms: u64) -> Vec<f32> {
        vec![0.3f32; (RATE as u64 * ms / 1000) as usize]
    }

    fn quiet(ms: u64) -> Vec<f32> {
        vec![0.001f32; (RATE as u64 * ms / 1000) as usize]
    }

    fn query(from_ms: u64, to_ms: u64) -> SilenceQuery {
        SilenceQuery { from_ms, to_ms, min_silence_ms: 500, silence_thresh_dbfs: -40.0, seek_step_ms: 10 }
    }

    #[test]
    fn finds_silence_between_speech() {
        let mut samples = tone(2000);
        samples.extend(quiet(700));
        samples.extend(tone(2000));
        let track = PcmTrack::from_samples(RATE, samples).unwrap();

        let spans = track.detect_silences(&query(0, track.duration_ms()));
        assert_eq!(spans, vec![SilenceSpan { start_ms: 2000, end_ms: 2700 }]);
        assert_eq!(spans[0].midpoint_ms(), 2350);
    }

    #[test]
    fn short_pauses_are_not_silence() {
        let mut samples = tone(1000);
        samples.extend(quiet(300));
        samples.extend(tone(1000));
        let track = PcmTrack::from_samples(RATE, samples).unwrap();
        assert!(track.detect_silences(&query(0, track.duration_ms())).is_empty());
    }

    #[test]
    fn search_window_is_respected() {
        let mut samples = quiet(1000);
        samples.extend(tone(3000));
        let track = PcmTrack::from_samples(RATE, samples).unwrap();
        assert!(track.detect_silences(&query(1500, 4000)).is_empty());
        assert_eq!(track.slice(0, 1000).len(), RATE as usize);
    }

    #[test]
    fn reads_and_downmixes_stereo_wav() {
        let file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(file.path(), spec).unwrap();
        for _ in 0..8000 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let track = PcmTrack::from_wav(file.path()).unwrap();
        assert_eq!(track.sample_rate(), 8000);
        assert_eq!(track.duration_ms(), 1000);
        assert!((track.slice(0, 10)[0] - 0.25).abs() < 1e-6);
    }
}
