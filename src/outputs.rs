use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::transcription::srt::build_srt;
use crate::transcription::vtt::build_vtt;
use crate::transcription::{Segment, TranscriptionResult};

/// Output file formats written per transcribed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Srt,
    Vtt,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "txt" | "text" => Ok(OutputFormat::Text),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" => Ok(OutputFormat::Vtt),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow::anyhow!("unknown output format: {}", other)),
        }
    }
}

/// Metadata record persisted as the `.json` output for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    /// Source audio file
    pub file: PathBuf,
    /// ISO-8601 timestamp of the transcription run
    pub date: String,
    /// Audio duration in seconds
    pub duration: f64,
    /// Detected or hinted language
    pub language: String,
    /// Full transcript text
    pub text: String,
    /// Timestamped segments
    pub segments: Vec<Segment>,
}

/// Write the requested output files for one transcription result.
///
/// Files are named after the audio file's stem inside `output_dir`. Returns
/// the paths written; any filesystem failure propagates to the caller.
pub async fn write_outputs(
    result: &TranscriptionResult,
    audio_path: &Path,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>> {
    let stem = audio_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript".to_string());

    let mut written = Vec::new();
    for format in formats {
        let path = output_dir.join(format!("{}.{}", stem, format.extension()));
        let content = match format {
            OutputFormat::Text => result.text.clone(),
            OutputFormat::Srt => build_srt(&result.segments),
            OutputFormat::Vtt => build_vtt(&result.segments),
            OutputFormat::Json => {
                let metadata = TranscriptMetadata {
                    file: audio_path.to_path_buf(),
                    date: Utc::now().to_rfc3339(),
                    duration: result.duration,
                    language: result.language.clone(),
                    text: result.text.clone(),
                    segments: result.segments.clone(),
                };
                serde_json::to_string_pretty(&metadata)?
            }
        };

        tokio::fs::write(&path, content).await?;
        debug!("💾 Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}
