//! Whisper transcription toolkit.
//!
//! Drives an external Whisper backend to transcribe or translate audio files
//! and renders the results as plain text, SRT/VTT subtitles, and JSON
//! metadata. The speech recognition itself stays in the backend; this crate
//! owns subtitle formatting, output writing, and the batch driver.

pub mod config;
pub mod error;
pub mod outputs;
pub mod processing;
pub mod transcription;

// Re-export main types for easy access
pub use crate::config::Config;
pub use crate::error::TranscribeError;
pub use crate::outputs::{write_outputs, OutputFormat, TranscriptMetadata};
pub use crate::processing::{collect_input_files, BatchProcessor, BatchSummary};
pub use crate::transcription::{
    build_srt, build_vtt, format_srt_timestamp, format_vtt_timestamp, parse_srt, ModelSize,
    Segment, Task, Transcriber, TranscriptionResult, WhisperModel,
};
