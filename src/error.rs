use thiserror::Error;
use std::io;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    // The only failure the alignment engine itself raises; everything
    // downstream assumes a non-empty, ordered chunk list.
    #[error("Malformed chunk input: {0}")]
    MalformedChunkInput(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report error: {0}")]
    Report(String),
}

// Type alias for Result
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error conversions
impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        Error::Corpus(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedChunkInput(msg.into())
    }

    pub fn transcription<S: Into<String>>(msg: S) -> Self {
        Error::Transcription(msg.into())
    }

    pub fn audio<S: Into<String>>(msg: S) -> Self {
        Error::Audio(msg.into())
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        Error::Audio(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Report(err.to_string())
    }
}
