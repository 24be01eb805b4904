use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while driving the external transcription backend.
///
/// In batch mode every per-file error is caught and recorded in the summary;
/// the single-file binary treats `FileNotFound` and `Io` as fatal. `ModelLoad`
/// always aborts before any transcription starts.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// Input path does not exist
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// No usable Whisper backend could be located
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The backend ran but produced no usable result
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// Filesystem failure while reading backend output or writing results
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
