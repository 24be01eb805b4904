use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::TranscriptionConfig;
use crate::error::TranscribeError;

/// A contiguous span of transcribed speech with start/end time and text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

/// Complete result of one transcription request.
///
/// Owned by the caller for the lifetime of the request and discarded once
/// the output files are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Full concatenated transcript
    pub text: String,
    /// Segments in chronological playback order
    pub segments: Vec<Segment>,
    /// Detected or hinted language tag
    pub language: String,
    /// Audio duration in seconds; falls back to the last segment's end when
    /// the backend does not report one
    pub duration: f64,
}

/// Whisper model size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            other => Err(anyhow::anyhow!("unknown model size: {}", other)),
        }
    }
}

/// Whether to transcribe in the source language or translate to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Transcribe,
    Translate,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Transcribe => "transcribe",
            Task::Translate => "translate",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcribe" => Ok(Task::Transcribe),
            "translate" => Ok(Task::Translate),
            other => Err(anyhow::anyhow!("unknown task: {}", other)),
        }
    }
}

/// Seam over the external speech-to-text backend.
///
/// The backend is treated as opaque: potentially slow, memory-hungry, and
/// free to fail on bad input. Implementations must be shareable across
/// worker tasks.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<TranscriptionResult, TranscribeError>;
}

/// Installed Whisper implementations, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    /// whisper.cpp via Homebrew
    WhisperCli,
    /// whisper.cpp
    WhisperCpp,
    /// Python OpenAI Whisper
    PythonWhisper,
}

impl Backend {
    fn command(&self) -> &'static str {
        match self {
            Backend::WhisperCli => "whisper-cli",
            Backend::WhisperCpp => "whisper-cpp",
            Backend::PythonWhisper => "whisper",
        }
    }

    fn is_cpp(&self) -> bool {
        !matches!(self, Backend::PythonWhisper)
    }
}

/// Handle to an external Whisper backend.
///
/// Constructed once at startup, then shared (`Arc`) into every transcription
/// call and dropped at process shutdown.
pub struct WhisperModel {
    config: TranscriptionConfig,
    backend: Backend,
}

impl WhisperModel {
    /// Detect an installed backend and build a model handle.
    ///
    /// Fails with [`TranscribeError::ModelLoad`] when no backend is found,
    /// before any transcription is attempted.
    pub async fn load(config: TranscriptionConfig) -> Result<Self, TranscribeError> {
        info!("🔄 Loading {} model...", config.model);

        let backends = [Backend::WhisperCli, Backend::WhisperCpp, Backend::PythonWhisper];
        for backend in backends {
            if Self::check_command_available(backend.command()).await {
                info!("✅ Using {} backend", backend.command());
                return Ok(Self { config, backend });
            }
            debug!("{} not available", backend.command());
        }

        Err(TranscribeError::ModelLoad(
            "no Whisper backend found; install whisper.cpp or openai-whisper".to_string(),
        ))
    }

    async fn check_command_available(cmd_name: &str) -> bool {
        Command::new(cmd_name)
            .arg("--help")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Build the whisper.cpp invocation writing JSON into `work_dir`.
    fn cpp_command(&self, audio: &Path, work_dir: &Path) -> Command {
        let stem = audio
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let output_base = work_dir.join(&stem);

        let mut cmd = Command::new(self.backend.command());
        cmd.arg("-f")
            .arg(audio)
            .arg("-oj")
            .arg("-of")
            .arg(&output_base);

        let model_path = self
            .config
            .model_dir
            .join(format!("ggml-{}.bin", self.config.model));
        if model_path.exists() {
            cmd.arg("-m").arg(&model_path);
        } else {
            warn!(
                "⚠️ Model file {} not found, relying on backend default",
                model_path.display()
            );
        }

        if let Some(language) = &self.config.language {
            cmd.arg("-l").arg(language);
        }
        if self.config.task == Task::Translate {
            cmd.arg("--translate");
        }

        cmd
    }

    /// Build the Python Whisper invocation writing JSON into `work_dir`.
    fn python_command(&self, audio: &Path, work_dir: &Path) -> Command {
        let mut cmd = Command::new(self.backend.command());
        cmd.arg(audio)
            .arg("--model")
            .arg(self.config.model.as_str())
            .arg("--output_dir")
            .arg(work_dir)
            .arg("--output_format")
            .arg("json")
            .arg("--task")
            .arg(self.config.task.as_str())
            .arg("--verbose")
            .arg("False");

        // A language hint only applies when transcribing; translation always
        // targets English.
        if self.config.task == Task::Transcribe {
            if let Some(language) = &self.config.language {
                cmd.arg("--language").arg(language);
            }
        }

        cmd
    }

    /// Run the backend and wait for it. There is deliberately no timeout:
    /// a call is bounded only by the backend's own behavior.
    async fn run_backend(
        &self,
        audio: &Path,
        work_dir: &Path,
    ) -> Result<WhisperOutput, TranscribeError> {
        let mut cmd = if self.backend.is_cpp() {
            self.cpp_command(audio, work_dir)
        } else {
            self.python_command(audio, work_dir)
        };

        debug!("Executing backend command: {:?}", cmd);
        let output = cmd.output().await.map_err(|e| {
            TranscribeError::Transcription(format!(
                "failed to run {}: {}",
                self.backend.command(),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Transcription(format!(
                "{} exited with {}: {}",
                self.backend.command(),
                output.status,
                stderr.trim()
            )));
        }

        let json_path = self.find_json_output(work_dir).await?;
        debug!("Parsing backend output: {}", json_path.display());
        let json_content = tokio::fs::read_to_string(&json_path).await?;

        serde_json::from_str::<WhisperOutput>(&json_content).map_err(|e| {
            TranscribeError::Transcription(format!("failed to parse backend JSON output: {}", e))
        })
    }

    async fn find_json_output(
        &self,
        work_dir: &Path,
    ) -> Result<std::path::PathBuf, TranscribeError> {
        let mut entries = tokio::fs::read_dir(work_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                return Ok(path);
            }
        }
        Err(TranscribeError::Transcription(format!(
            "no JSON output produced in {}",
            work_dir.display()
        )))
    }
}

#[async_trait]
impl Transcriber for WhisperModel {
    async fn transcribe(&self, audio: &Path) -> Result<TranscriptionResult, TranscribeError> {
        if !audio.exists() {
            return Err(TranscribeError::FileNotFound(audio.to_path_buf()));
        }

        info!("🎙️ Transcribing {} ({} task)", audio.display(), self.config.task);

        // Backends write their JSON next to a caller-chosen base path, so
        // each call gets a private scratch directory.
        let work_dir = TempDir::new()?;
        let output = self.run_backend(audio, work_dir.path()).await?;
        let result = output.into_result();

        info!(
            "✅ Transcribed {}: {} segments, {} chars, language {}",
            audio.display(),
            result.segments.len(),
            result.text.len(),
            result.language
        );

        Ok(result)
    }
}

/// JSON emitted by the backends. Python Whisper reports `text`/`segments`/
/// `language` at top level; whisper.cpp nests segments under `transcription`
/// with millisecond offsets and the language under `result`.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<RawSegment>,
    #[serde(default)]
    transcription: Vec<CppSegment>,
    #[serde(default)]
    result: Option<CppResult>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct CppResult {
    language: String,
}

#[derive(Debug, Deserialize)]
struct CppSegment {
    offsets: CppOffsets,
    text: String,
}

/// Segment boundaries in milliseconds
#[derive(Debug, Deserialize)]
struct CppOffsets {
    from: u64,
    to: u64,
}

impl WhisperOutput {
    fn into_result(self) -> TranscriptionResult {
        let reported_duration = self.duration;

        let (segments, text, language) = if !self.transcription.is_empty() {
            let segments: Vec<Segment> = self
                .transcription
                .into_iter()
                .map(|seg| Segment {
                    start: seg.offsets.from as f64 / 1000.0,
                    end: seg.offsets.to as f64 / 1000.0,
                    text: seg.text.trim().to_string(),
                })
                .collect();

            let text = segments
                .iter()
                .map(|seg| seg.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let language = self
                .result
                .map(|r| r.language)
                .or(self.language)
                .unwrap_or_else(|| "auto".to_string());

            (segments, text, language)
        } else {
            let segments: Vec<Segment> = self
                .segments
                .into_iter()
                .map(|seg| Segment {
                    start: seg.start,
                    end: seg.end,
                    text: seg.text,
                })
                .collect();

            let text = self.text.unwrap_or_else(|| {
                segments
                    .iter()
                    .map(|seg| seg.text.trim())
                    .collect::<Vec<_>>()
                    .join(" ")
            });

            let language = self.language.unwrap_or_else(|| "auto".to_string());

            (segments, text, language)
        };

        let duration = reported_duration
            .unwrap_or_else(|| segments.last().map(|seg| seg.end).unwrap_or(0.0));

        TranscriptionResult {
            text,
            segments,
            language,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_size_round_trip() {
        for name in ["tiny", "base", "small", "medium", "large"] {
            let size: ModelSize = name.parse().unwrap();
            assert_eq!(size.to_string(), name);
        }
        assert!("huge".parse::<ModelSize>().is_err());
    }

    #[test]
    fn test_task_parsing() {
        assert_eq!("transcribe".parse::<Task>().unwrap(), Task::Transcribe);
        assert_eq!("translate".parse::<Task>().unwrap(), Task::Translate);
        assert!("summarize".parse::<Task>().is_err());
    }

    #[test]
    fn test_missing_command_not_available() {
        tokio_test::block_on(async {
            let available =
                WhisperModel::check_command_available("definitely-not-a-real-backend").await;
            assert!(!available);
        });
    }

    #[test]
    fn test_python_whisper_output_parsing() {
        let json = r#"{
            "text": " Hello world.",
            "language": "en",
            "duration": 2.4,
            "segments": [
                {"id": 0, "start": 0.0, "end": 1.2, "text": " Hello"},
                {"id": 1, "start": 1.2, "end": 2.4, "text": " world."}
            ]
        }"#;

        let output: WhisperOutput = serde_json::from_str(json).unwrap();
        let result = output.into_result();

        assert_eq!(result.text, " Hello world.");
        assert_eq!(result.language, "en");
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[1].start, 1.2);
        assert_eq!(result.duration, 2.4);
    }

    #[test]
    fn test_whisper_cpp_output_parsing() {
        let json = r#"{
            "result": {"language": "he"},
            "transcription": [
                {
                    "timestamps": {"from": "00:00:00,000", "to": "00:00:01,500"},
                    "offsets": {"from": 0, "to": 1500},
                    "text": " שלום"
                }
            ]
        }"#;

        let output: WhisperOutput = serde_json::from_str(json).unwrap();
        let result = output.into_result();

        assert_eq!(result.language, "he");
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].start, 0.0);
        assert_eq!(result.segments[0].end, 1.5);
        assert_eq!(result.segments[0].text, "שלום");
        // No reported duration, so it comes from the last segment.
        assert_eq!(result.duration, 1.5);
    }

    #[test]
    fn test_missing_text_rebuilt_from_segments() {
        let json = r#"{
            "language": "en",
            "segments": [
                {"start": 0.0, "end": 1.0, "text": " one "},
                {"start": 1.0, "end": 2.0, "text": " two "}
            ]
        }"#;

        let output: WhisperOutput = serde_json::from_str(json).unwrap();
        let result = output.into_result();
        assert_eq!(result.text, "one two");
    }
}
