pub mod srt;
pub mod vtt;
pub mod whisper;

pub use srt::{build_srt, format_srt_timestamp, parse_srt};
pub use vtt::{build_vtt, format_vtt_timestamp};
pub use whisper::{ModelSize, Segment, Task, Transcriber, TranscriptionResult, WhisperModel};
