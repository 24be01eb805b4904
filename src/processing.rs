use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::outputs::write_outputs;
use crate::transcription::Transcriber;

/// Extensions picked up when a positional argument is a directory.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "m4a", "flac", "ogg", "opus", "aac", "wma", "mp4", "mkv", "webm",
];

/// One recorded per-file failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    pub file: PathBuf,
    pub error: String,
}

/// Summary of a batch run, also persisted as `summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// ISO-8601 timestamp of the run
    pub date: String,
    /// Model size used
    pub model: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Files transcribed successfully
    pub results: Vec<PathBuf>,
    /// One entry per failed file
    pub errors: Vec<BatchError>,
}

/// Expand positional CLI arguments into a deduplicated list of existing files.
///
/// Glob patterns are expanded, directories are walked for audio files, and
/// literal paths are kept as-is; anything that does not resolve to an existing
/// file is dropped.
pub fn collect_input_files(patterns: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            match glob::glob(pattern) {
                Ok(paths) => files.extend(paths.flatten()),
                Err(e) => warn!("Invalid glob pattern {}: {}", pattern, e),
            }
            continue;
        }

        let path = PathBuf::from(pattern);
        if path.is_dir() {
            for entry in WalkDir::new(&path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && has_audio_extension(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path);
        }
    }

    files.retain(|p| p.is_file());
    files.sort();
    files.dedup();
    files
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)))
        .unwrap_or(false)
}

/// Batch driver applying one transcription + write cycle per input file.
///
/// Failures are isolated per file: a single bad input is recorded in the
/// summary and never aborts its siblings.
pub struct BatchProcessor {
    config: Config,
    transcriber: Arc<dyn Transcriber>,
    worker_semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl BatchProcessor {
    pub fn new(config: Config, transcriber: Arc<dyn Transcriber>, max_workers: usize) -> Self {
        let max_concurrent = max_workers.max(1);
        Self {
            config,
            transcriber,
            worker_semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Transcribe all files, write their outputs, and persist a summary to
    /// `<output_dir>/summary.json`.
    pub async fn process_files(
        &self,
        files: Vec<PathBuf>,
        output_dir: &Path,
    ) -> Result<BatchSummary> {
        let start_time = Instant::now();
        tokio::fs::create_dir_all(output_dir).await?;

        let total = files.len();
        info!("🚀 Starting batch transcription of {} files", total);

        let outcomes = if self.max_concurrent > 1 {
            self.process_parallel(files, output_dir).await
        } else {
            let mut outcomes = Vec::new();
            for (index, file) in files.into_iter().enumerate() {
                info!("🎙️ File {}/{}: {}", index + 1, total, file.display());
                let outcome =
                    transcribe_one(Arc::clone(&self.transcriber), &self.config, &file, output_dir)
                        .await;
                outcomes.push((file, outcome));
            }
            outcomes
        };

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for (file, outcome) in outcomes {
            match outcome {
                Ok(_) => results.push(file),
                Err(e) => {
                    warn!("❌ {}: {}", file.display(), e);
                    errors.push(BatchError {
                        file,
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = BatchSummary {
            date: Utc::now().to_rfc3339(),
            model: self.config.transcription.model.to_string(),
            total,
            successful: results.len(),
            failed: errors.len(),
            results,
            errors,
        };

        let summary_path = output_dir.join("summary.json");
        tokio::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?).await?;
        info!("📄 Summary saved to {}", summary_path.display());
        info!(
            "🎉 Batch finished in {:.1}s: {} successful, {} failed",
            start_time.elapsed().as_secs_f64(),
            summary.successful,
            summary.failed
        );

        Ok(summary)
    }

    /// Fan out over a semaphore-bounded worker pool. Outcomes arrive in
    /// completion order; per-file order is not significant to the summary.
    async fn process_parallel(
        &self,
        files: Vec<PathBuf>,
        output_dir: &Path,
    ) -> Vec<(PathBuf, Result<Vec<PathBuf>>)> {
        let (tx, mut rx) = mpsc::channel(self.max_concurrent);
        let total = files.len();

        for (index, file) in files.into_iter().enumerate() {
            let transcriber = Arc::clone(&self.transcriber);
            let config = self.config.clone();
            let output_dir = output_dir.to_path_buf();
            let tx = tx.clone();
            let semaphore = Arc::clone(&self.worker_semaphore);

            tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();

                info!("🎙️ File {}/{}: {}", index + 1, total, file.display());
                let outcome = transcribe_one(transcriber, &config, &file, &output_dir).await;

                if let Err(e) = tx.send((file, outcome)).await {
                    error!("Failed to send batch outcome: {}", e);
                }
            });
        }

        // Closing the original sender ends the stream once every task is done.
        drop(tx);

        let mut outcomes = Vec::new();
        while let Some(item) = rx.recv().await {
            outcomes.push(item);
        }
        outcomes
    }
}

/// One full transcription + file-write cycle. Every failure, including a
/// write failure, is returned for recording rather than raised.
async fn transcribe_one(
    transcriber: Arc<dyn Transcriber>,
    config: &Config,
    file: &Path,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let result = transcriber.transcribe(file).await?;
    let written = write_outputs(&result, file, output_dir, &config.output.formats).await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_has_audio_extension() {
        assert!(has_audio_extension(Path::new("a.mp3")));
        assert!(has_audio_extension(Path::new("a.WAV")));
        assert!(!has_audio_extension(Path::new("a.txt")));
        assert!(!has_audio_extension(Path::new("noext")));
    }

    #[test]
    fn test_collect_literal_paths_filters_missing() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("a.mp3");
        std::fs::write(&existing, b"x").unwrap();

        let patterns = vec![
            existing.to_string_lossy().into_owned(),
            temp_dir
                .path()
                .join("missing.mp3")
                .to_string_lossy()
                .into_owned(),
        ];

        let files = collect_input_files(&patterns);
        assert_eq!(files, vec![existing]);
    }

    #[test]
    fn test_collect_glob_pattern() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.mp3", "b.mp3", "c.txt"] {
            std::fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let pattern = temp_dir.path().join("*.mp3").to_string_lossy().into_owned();
        let files = collect_input_files(&[pattern]);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "mp3"));
    }

    #[test]
    fn test_collect_directory_walks_audio_files() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(temp_dir.path().join("a.wav"), b"x").unwrap();
        std::fs::write(nested.join("b.flac"), b"x").unwrap();
        std::fs::write(nested.join("notes.md"), b"x").unwrap();

        let files =
            collect_input_files(&[temp_dir.path().to_string_lossy().into_owned()]);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_collect_deduplicates() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.mp3");
        std::fs::write(&file, b"x").unwrap();

        let literal = file.to_string_lossy().into_owned();
        let pattern = temp_dir.path().join("*.mp3").to_string_lossy().into_owned();
        let files = collect_input_files(&[literal, pattern]);
        assert_eq!(files.len(), 1);
    }
}
