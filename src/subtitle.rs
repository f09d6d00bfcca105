use std::path::Path;
use tokio::fs;
use tracing::{error, info};

use crate::error::{Result, KaptionError};
use crate::segment::Segment;

/// Render segments as SRT text
pub fn render_srt(segments: &[Segment]) -> String {
    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        let start_time = format_srt_time(segment.start);
        let end_time = format_srt_time(segment.end);

        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            start_time,
            end_time,
            segment.text.trim()
        ));
    }

    srt_content
}

/// Generate SRT subtitle file from segments
pub async fn generate_srt<P: AsRef<Path>>(segments: &[Segment], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|e| {
            error!("SRT generation failed for {}: {}", output_path.display(), e);
            KaptionError::Io(e)
        })?;
    }

    fs::write(output_path, render_srt(segments)).await.map_err(|e| {
        error!("SRT generation failed for {}: {}", output_path.display(), e);
        KaptionError::Io(e)
    })?;

    info!("SRT file generated with {} entries", segments.len());
    Ok(())
}

/// Read an SRT file back into segments
pub async fn read_srt<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(KaptionError::SubtitleNotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path).await?;
    parse_srt(&content)
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm), truncating to the millisecond
pub fn format_srt_time(seconds: f64) -> String {
    // 1.001 * 1000.0 is 1000.999..., nudge before truncating
    let total_milliseconds = (seconds.max(0.0) * 1000.0 + 1e-6).floor() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse an SRT timestamp (HH:MM:SS,mmm) into seconds
pub fn parse_srt_time(value: &str) -> Result<f64> {
    let invalid = || KaptionError::Subtitle(format!("Invalid timestamp: {}", value));

    let (clock, millis) = value.trim().split_once(',').ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let hours: u64 = h.parse().map_err(|_| invalid())?;
    let minutes: u64 = m.parse().map_err(|_| invalid())?;
    let secs: u64 = s.parse().map_err(|_| invalid())?;
    let millis: u64 = millis.parse().map_err(|_| invalid())?;
    if minutes >= 60 || secs >= 60 || millis >= 1000 {
        return Err(invalid());
    }

    let total_milliseconds = hours * 3_600_000 + minutes * 60_000 + secs * 1_000 + millis;
    Ok(total_milliseconds as f64 / 1000.0)
}

/// Parse SRT text into segments. Multi-line cue text is joined with newlines.
pub fn parse_srt(content: &str) -> Result<Vec<Segment>> {
    let normalized = content.replace("\r\n", "\n");
    let mut segments = Vec::new();

    for block in normalized.split("\n\n") {
        let mut lines = block.lines().map(str::trim_end).skip_while(|l| l.trim().is_empty());

        let Some(index_line) = lines.next() else {
            continue;
        };
        index_line.trim().parse::<u64>().map_err(|_| {
            KaptionError::Subtitle(format!("Expected cue number, found: {}", index_line))
        })?;

        let timing = lines
            .next()
            .ok_or_else(|| KaptionError::Subtitle(format!("Cue {} has no timing line", index_line)))?;
        let (start, end) = timing
            .split_once("-->")
            .ok_or_else(|| KaptionError::Subtitle(format!("Invalid timing line: {}", timing)))?;

        let text = lines.collect::<Vec<_>>().join("\n");
        segments.push(Segment::new(parse_srt_time(start)?, parse_srt_time(end)?, text));
    }

    Ok(segments)
}
