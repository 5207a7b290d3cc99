use anyhow::{Context, Result, bail};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::{CaptionLine, WordTiming};

/// `HH:MM:SS,mmm`, rounded to the nearest millisecond. Negative input clamps to zero.
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

pub fn write_srt(lines: &[CaptionLine]) -> String {
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            idx + 1,
            format_srt_timestamp(line.start),
            format_srt_timestamp(line.end),
            line.text
        );
    }
    out
}

pub fn save_srt(lines: &[CaptionLine], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating subtitle directory {}", parent.display()))?;
    }
    fs::write(path, write_srt(lines))
        .with_context(|| format!("writing subtitles to {}", path.display()))
}

pub fn parse_srt(input: &str) -> Result<Vec<CaptionLine>> {
    let mut cues = Vec::new();
    let mut lines = input.lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }

        // The index line is optional
        let times = if line.contains("-->") {
            line
        } else {
            lines
                .next()
                .context("SRT cue is missing a timestamp line")?
        };

        let (start_raw, end_raw) = times
            .split_once("-->")
            .map(|(a, b)| (a.trim(), b.trim()))
            .context("SRT cue timestamp line must contain '-->'")?;

        let start = parse_timestamp(start_raw)
            .with_context(|| format!("Failed to parse SRT start timestamp '{start_raw}'"))?;
        let end = parse_timestamp(end_raw)
            .with_context(|| format!("Failed to parse SRT end timestamp '{end_raw}'"))?;

        if end < start {
            bail!("SRT cue ends before it starts: {start_raw} --> {end_raw}");
        }

        let mut text_lines = Vec::new();
        while let Some(next) = lines.next_if(|next| !next.is_empty()) {
            text_lines.push(next);
        }

        cues.push(CaptionLine {
            text: text_lines.join(" "),
            start,
            end,
        });
    }

    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(cues)
}

/// Approximate word timings for existing cues so they can be segmented again.
///
/// Each cue's span is shared between its words in proportion to their length, counting
/// one separator per word.
pub fn cue_words(cues: &[CaptionLine]) -> Vec<WordTiming> {
    let mut words = Vec::new();
    for cue in cues {
        let parts: Vec<&str> = cue.text.split_whitespace().collect();
        let weight: usize = parts.iter().map(|word| word.chars().count() + 1).sum();
        if weight == 0 {
            continue;
        }

        let per_char = (cue.end - cue.start) / weight as f64;
        let mut cursor = cue.start;
        for (idx, word) in parts.iter().enumerate() {
            let end = if idx + 1 == parts.len() {
                cue.end
            } else {
                cursor + per_char * (word.chars().count() + 1) as f64
            };
            words.push(WordTiming::new(*word, cursor, end));
            cursor = end;
        }
    }
    words
}

fn parse_timestamp(value: &str) -> Result<f64> {
    let cleaned = value.trim().replace(',', ".");
    let (time_part, fractional_part) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), "0"));

    let mut hms = time_part.split(':');
    let mut component = |name: &str| -> Result<u64> {
        hms.next()
            .with_context(|| format!("Timestamp missing {name}"))?
            .parse::<u64>()
            .with_context(|| format!("Invalid {name} in timestamp"))
    };
    let hours = component("hours")?;
    let minutes = component("minutes")?;
    let seconds = component("seconds")?;

    if hms.next().is_some() {
        bail!("Timestamp has more than three components: {value}");
    }

    let millis = format!("{fractional_part:0<3}")
        .chars()
        .take(3)
        .collect::<String>()
        .parse::<u64>()
        .context("Invalid millisecond component in timestamp")?;

    let total_ms = (hours * 3600 + minutes * 60 + seconds) * 1000 + millis;
    Ok(total_ms as f64 / 1000.0)
}
