use anyhow::{anyhow, Result};

use super::whisper::Segment;

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Hours past 99 widen the field instead of clamping; extremely long inputs
/// are passed through untouched.
pub fn format_srt_timestamp(seconds: f64) -> String {
    format_timestamp(seconds).replace('.', ",")
}

/// Shared HH:MM:SS.mmm rendering; SRT swaps the decimal separator afterwards.
pub(crate) fn format_timestamp(seconds: f64) -> String {
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = seconds % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
}

/// Assemble segments into SRT subtitle text.
///
/// Each block is `"{index}\n{start} --> {end}\n{text}\n\n"` with a 1-based
/// index and trimmed text. An empty segment list yields an empty string.
pub fn build_srt(segments: &[Segment]) -> String {
    let mut srt_content = String::new();

    for (i, segment) in segments.iter().enumerate() {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            segment.text.trim()
        ));
    }

    srt_content
}

/// Parse SRT subtitle text back into segments.
pub fn parse_srt(content: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();

    for block in content.split("\n\n").filter(|b| !b.trim().is_empty()) {
        let mut lines = block.lines();

        let index_line = lines
            .next()
            .ok_or_else(|| anyhow!("missing index line in SRT block"))?;
        index_line
            .trim()
            .parse::<u32>()
            .map_err(|_| anyhow!("invalid SRT index: {}", index_line))?;

        let timing_line = lines
            .next()
            .ok_or_else(|| anyhow!("missing timestamp line in SRT block"))?;
        let (start, end) = parse_timing_line(timing_line)?;

        let text = lines.collect::<Vec<_>>().join("\n");
        segments.push(Segment { start, end, text });
    }

    Ok(segments)
}

fn parse_timing_line(line: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = line.split(" --> ").collect();
    if parts.len() != 2 {
        return Err(anyhow!("invalid SRT timing line: {}", line));
    }
    Ok((parse_srt_timestamp(parts[0])?, parse_srt_timestamp(parts[1])?))
}

/// Parse a single `HH:MM:SS,mmm` timestamp to seconds.
pub fn parse_srt_timestamp(timestamp: &str) -> Result<f64> {
    let (hms, millis) = timestamp
        .trim()
        .split_once(',')
        .ok_or_else(|| anyhow!("invalid SRT timestamp: {}", timestamp))?;

    let fields: Vec<&str> = hms.split(':').collect();
    if fields.len() != 3 {
        return Err(anyhow!("invalid SRT timestamp: {}", timestamp));
    }

    let hours: f64 = fields[0].parse()?;
    let minutes: f64 = fields[1].parse()?;
    let seconds: f64 = fields[2].parse()?;
    let millis: f64 = millis.parse()?;

    Ok(hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_srt_timestamp_zero() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
    }

    #[test]
    fn test_srt_timestamp_with_fraction() {
        assert_eq!(format_srt_timestamp(3661.5), "01:01:01,500");
        assert_eq!(format_srt_timestamp(1.5), "00:00:01,500");
        assert_eq!(format_srt_timestamp(59.001), "00:00:59,001");
    }

    #[test]
    fn test_srt_timestamp_hour_overflow_not_clamped() {
        // Past 99h59m59.999s the hour field simply widens.
        assert_eq!(format_srt_timestamp(360000.0), "100:00:00,000");
    }

    #[test]
    fn test_build_srt_empty() {
        assert_eq!(build_srt(&[]), "");
    }

    #[test]
    fn test_build_srt_single_block() {
        let srt = build_srt(&[segment(0.0, 1.5, " hi ")]);
        assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,500\nhi\n\n");
    }

    #[test]
    fn test_build_srt_indexes_from_one() {
        let srt = build_srt(&[
            segment(0.0, 1.0, "first"),
            segment(1.0, 2.0, "second"),
        ]);
        assert!(srt.starts_with("1\n"));
        assert!(srt.contains("\n\n2\n"));
        assert!(srt.ends_with("second\n\n"));
    }

    #[test]
    fn test_parse_srt_timestamp() {
        assert_eq!(parse_srt_timestamp("01:01:01,500").unwrap(), 3661.5);
        assert_eq!(parse_srt_timestamp("00:00:00,000").unwrap(), 0.0);
        assert!(parse_srt_timestamp("01:01:01.500").is_err());
        assert!(parse_srt_timestamp("01:01,500").is_err());
    }

    #[test]
    fn test_srt_round_trip() {
        let original = vec![
            segment(0.0, 1.5, "hi"),
            segment(1.5, 3.25, "there"),
            segment(3600.0, 3661.5, "over an hour in"),
        ];

        let parsed = parse_srt(&build_srt(&original)).unwrap();
        assert_eq!(parsed.len(), original.len());
        for (a, b) in original.iter().zip(&parsed) {
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn test_parse_srt_rejects_garbage() {
        assert!(parse_srt("not\nan srt\nfile\n\n").is_err());
    }
}
