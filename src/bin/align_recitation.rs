use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tartil::{
    Aligner, AlignmentResult, ArabicNormalizer, ChunkInput, InMemoryCorpus, PcmTrack,
    Result, SilenceProbe, TartilConfig,
};
use tartil::utils::{init_logging, ReportWriter};

/// Align recitation transcripts against the reference corpus
#[derive(Parser, Debug)]
#[command(name = "align_recitation", version)]
struct Args {
    /// INI configuration file
    #[arg(short, long, default_value = "default.ini")]
    config: PathBuf,

    /// Reference corpus (`passage|unit|text` lines), overrides [file] corpus_file
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Directory for the JSON results, overrides [file] output_dir
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// CSV report of every aligned unit, overrides [file] report_file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Job files: {"job_id", "audio_path"?, "chunks": [{start_time, end_time, text}]}
    #[arg(required = true)]
    jobs: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Job {
    job_id: String,
    #[serde(default)]
    audio_path: Option<PathBuf>,
    chunks: Vec<ChunkInput>,
}

#[derive(Debug, Serialize)]
struct JobOutput<'a> {
    job_id: &'a str,
    #[serde(flatten)]
    result: &'a AlignmentResult,
}

fn load_config(path: &Path) -> Result<TartilConfig> {
    if path.exists() {
        TartilConfig::from_ini(path)
    } else {
        eprintln!("Configuration file {:?} not found, using defaults", path);
        Ok(TartilConfig::default())
    }
}

fn run_job(aligner: &Aligner, path: &Path, output_dir: &Path) -> Result<(String, AlignmentResult)> {
    let job: Job = serde_json::from_str(&fs::read_to_string(path)?)?;
    let started = Instant::now();

    let audio = job.audio_path.as_deref().map(PcmTrack::from_wav).transpose()?;
    let silence = audio.as_ref().map(|track| track as &dyn SilenceProbe);
    let result = aligner.align(&job.chunks, silence)?;

    let output_path = output_dir.join(format!("{}.json", job.job_id));
    let output = JobOutput { job_id: &job.job_id, result: &result };
    fs::write(&output_path, serde_json::to_string_pretty(&output)?)?;

    info!(
        "Job {} aligned in {:.2}s -> {:?}",
        job.job_id,
        started.elapsed().as_secs_f64(),
        output_path
    );
    Ok((job.job_id, result))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(corpus) = args.corpus {
        config.files.corpus_file = corpus;
    }
    if let Some(output_dir) = args.output_dir {
        config.files.output_dir = output_dir;
    }
    if let Some(report) = args.report {
        config.files.report_file = Some(report);
    }

    let log_path = init_logging(config.files.get_log_level(), config.files.log_dir.as_deref(), "alignment")?;
    if let Some(path) = log_path {
        eprintln!("Logging to {:?}", path);
    }
    info!("Starting alignment of {} jobs with log level: {:?}", args.jobs.len(), config.files.get_log_level());

    info!("Text processing: {}", config.text_processing.describe());
    let normalizer = ArabicNormalizer::new(config.text_processing.clone());
    let corpus = InMemoryCorpus::from_file(&config.files.corpus_file, &normalizer)?;
    fs::create_dir_all(&config.files.output_dir)?;

    let aligner = Aligner::new(config.clone(), &corpus)?;

    let progress = ProgressBar::new(args.jobs.len() as u64);
    progress.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} jobs {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar()));

    let outcomes: Vec<(PathBuf, Result<(String, AlignmentResult)>)> = args.jobs
        .par_iter()
        .progress_with(progress.clone())
        .map(|path| (path.clone(), run_job(&aligner, path, &config.files.output_dir)))
        .collect();
    progress.finish_with_message("done");

    let mut report = match &config.files.report_file {
        Some(path) => Some(ReportWriter::create(path)?),
        None => None,
    };

    let mut failed = 0usize;
    let mut unrecognized = 0usize;
    for (path, outcome) in &outcomes {
        match outcome {
            Ok((job_id, result)) => {
                if !result.is_recognized() {
                    warn!("Job {} ({:?}): no recognizable passage", job_id, path);
                    unrecognized += 1;
                }
                if let Some(report) = report.as_mut() {
                    report.write_result(job_id, result)?;
                }
            }
            Err(e) => {
                error!("Job {:?} failed: {}", path, e);
                eprintln!("Job {:?} failed: {}", path, e);
                failed += 1;
            }
        }
    }

    if let Some(report) = report {
        report.finish()?;
    }

    info!(
        "Finished: {} jobs, {} failed, {} without a recognizable passage",
        outcomes.len(), failed, unrecognized
    );
    eprintln!(
        "Aligned {} of {} jobs ({} unrecognized)",
        outcomes.len() - failed, outcomes.len(), unrecognized
    );
    Ok(())
}
