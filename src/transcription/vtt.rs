use super::srt::format_timestamp;
use super::whisper::Segment;

/// Format seconds as a WebVTT timestamp (`HH:MM:SS.mmm`).
///
/// Identical to the SRT rendering except the decimal separator stays a dot.
pub fn format_vtt_timestamp(seconds: f64) -> String {
    format_timestamp(seconds)
}

/// Assemble segments into WebVTT subtitle text.
///
/// Same block structure as SRT, prefixed with the `WEBVTT` header; cue text
/// is passed through untrimmed.
pub fn build_vtt(segments: &[Segment]) -> String {
    let mut vtt_content = String::from("WEBVTT\n\n");

    for (i, segment) in segments.iter().enumerate() {
        vtt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_vtt_timestamp(segment.start),
            format_vtt_timestamp(segment.end),
            segment.text
        ));
    }

    vtt_content
}
