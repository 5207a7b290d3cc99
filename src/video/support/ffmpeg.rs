use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

use crate::video::planner::{FootageSource, MediaSource, TargetFrame};

/// Fail early with a readable message when an external tool is missing.
pub fn ensure_tool(name: &str) -> Result<()> {
    which::which(name)
        .map(|_| ())
        .with_context(|| format!("`{name}` was not found on PATH; install it and try again"))
}

pub fn probe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run ffprobe for {}", path.display()))?;

    if !output.status.success() {
        bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("Unexpected ffprobe duration for {}", path.display()))
}

pub fn probe_video_dimensions(video_path: &Path) -> Result<TargetFrame> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(video_path)
        .output()
        .with_context(|| {
            format!(
                "Failed to probe video dimensions for {}",
                video_path.display()
            )
        })?;

    if !output.status.success() {
        bail!(
            "ffprobe exited with status {:?} while probing {}",
            output.status.code(),
            video_path.display()
        );
    }

    let stdout = String::from_utf8(output.stdout)
        .context("ffprobe returned non-UTF8 output for video dimensions")?;
    parse_dimensions(&stdout)
        .with_context(|| format!("Unexpected ffprobe dimensions for {}", video_path.display()))
}

/// Reads durations and frame sizes of input media.
pub trait MediaProber: Send + Sync {
    /// Duration and frame size of a background clip.
    fn footage(&self, path: &Path) -> Result<FootageSource>;

    fn media(&self, path: &Path) -> Result<MediaSource>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeProber;

impl MediaProber for FfprobeProber {
    fn footage(&self, path: &Path) -> Result<FootageSource> {
        Ok(FootageSource {
            path: path.to_path_buf(),
            duration: probe_duration_seconds(path)?,
            size: probe_video_dimensions(path)?,
        })
    }

    fn media(&self, path: &Path) -> Result<MediaSource> {
        Ok(MediaSource {
            path: path.to_path_buf(),
            duration: probe_duration_seconds(path)?,
        })
    }
}

fn parse_duration(stdout: &str) -> Result<f64> {
    let value = stdout.trim();
    if value == "N/A" {
        bail!("container reports no duration");
    }
    let duration: f64 = value
        .parse()
        .with_context(|| format!("Failed to parse ffprobe duration '{value}' as f64"))?;
    Ok(duration)
}

fn parse_dimensions(stdout: &str) -> Result<TargetFrame> {
    // Some containers print one line per stream; the first is v:0.
    let value = stdout.lines().next().unwrap_or_default().trim();
    let (width_str, height_str) = value
        .trim_end_matches('x')
        .split_once('x')
        .with_context(|| format!("ffprobe did not return WIDTHxHEIGHT, got '{value}'"))?;

    let width: u32 = width_str
        .parse()
        .with_context(|| format!("Unable to parse ffprobe width '{width_str}'"))?;
    let height: u32 = height_str
        .parse()
        .with_context(|| format!("Unable to parse ffprobe height '{height_str}'"))?;

    Ok(TargetFrame::new(width, height))
}
