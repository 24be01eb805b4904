use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::outputs::OutputFormat;
use crate::transcription::{ModelSize, Task};

/// Configuration for the transcription toolkit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transcription backend settings
    pub transcription: TranscriptionConfig,

    /// Output and storage settings
    pub output: OutputConfig,

    /// Performance and resource settings
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Model size passed to the backend
    pub model: ModelSize,

    /// Language hint; None lets the backend auto-detect
    pub language: Option<String>,

    /// Transcribe in the source language or translate to English
    pub task: Task,

    /// Directory searched for whisper.cpp ggml model files
    pub model_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base output directory for batch runs
    pub base_dir: PathBuf,

    /// Formats written per transcribed file
    pub formats: Vec<OutputFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Maximum number of concurrent transcriptions
    pub max_workers: usize,
}

impl Config {
    /// Load configuration from the first TOML file found, falling back to
    /// environment variables.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "whisper-batch.toml",
            "config/whisper-batch.toml",
            "~/.config/whisper-batch/config.toml",
            "/etc/whisper-batch/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        if let Ok(config) = Self::from_env() {
            return Ok(config);
        }

        Err(anyhow!("no configuration file found"))
    }

    /// Build configuration from environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("WHISPER_BATCH_MODEL") {
            config.transcription.model = model.parse()?;
        }

        if let Ok(language) = std::env::var("WHISPER_BATCH_LANGUAGE") {
            config.transcription.language = Some(language);
        }

        if let Ok(workers) = std::env::var("WHISPER_BATCH_WORKERS") {
            config.performance.max_workers = workers.parse().unwrap_or(1);
        }

        if let Ok(output_dir) = std::env::var("WHISPER_BATCH_OUTPUT_DIR") {
            config.output.base_dir = PathBuf::from(output_dir);
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.performance.max_workers == 0 {
            return Err(anyhow!("max_workers must be greater than 0"));
        }

        if self.output.formats.is_empty() {
            return Err(anyhow!("at least one output format must be enabled"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcription: TranscriptionConfig {
                model: ModelSize::Base,
                language: None,
                task: Task::Transcribe,
                model_dir: PathBuf::from("models"),
            },
            output: OutputConfig {
                base_dir: PathBuf::from("batch_output"),
                formats: vec![OutputFormat::Text, OutputFormat::Srt, OutputFormat::Json],
            },
            performance: PerformanceConfig {
                max_workers: num_cpus::get().min(4),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transcription.model, ModelSize::Base);
        assert_eq!(config.transcription.task, Task::Transcribe);
        assert!(config.transcription.language.is_none());
        assert_eq!(config.output.formats.len(), 3);
        assert!(config.performance.max_workers >= 1);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut bad = Config::default();
        bad.performance.max_workers = 0;
        assert!(bad.validate().is_err());

        let mut bad = Config::default();
        bad.output.formats.clear();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.transcription.model, config.transcription.model);
        assert_eq!(parsed.output.formats, config.output.formats);
    }
}
