use anyhow::{Context, Result};

use super::{FfmpegCompiler, FilterChain};
use super::inputs::SourceMap;
use super::util::format_time;
use crate::video::planner::{AudioTrack, CompositionPlan};

impl FfmpegCompiler {
    /// Narration delayed by the title, music looped and ducked, mixed into `[outa]`.
    pub(super) fn build_audio_mix_filters(
        &self,
        filters: &mut FilterChain,
        plan: &CompositionPlan,
        source_map: &SourceMap,
    ) -> Result<()> {
        let total = plan.total_duration;
        let mut labels = Vec::new();

        if let Some(track) = plan.narration() {
            let input = source_map
                .narration
                .context("narration track has no ffmpeg input")?;
            filters.push(build_track_filter(track, input, total, "a_narration"));
            labels.push("a_narration");
        }

        if let Some(track) = plan.music() {
            let input = source_map.music.context("music track has no ffmpeg input")?;
            filters.push(build_track_filter(track, input, total, "a_music"));
            labels.push("a_music");
        }

        match labels.as_slice() {
            [] => filters.push(format!(
                "anullsrc=r=48000:cl=stereo,atrim=duration={}[outa]",
                format_time(total)
            )),
            [single] => filters.push(format!("[{single}]anull[outa]")),
            _ => {
                let inputs = labels
                    .iter()
                    .map(|label| format!("[{label}]"))
                    .collect::<String>();
                filters.push(format!(
                    "{inputs}amix=inputs={count}:normalize=0:dropout_transition=0:duration=longest[outa]",
                    count = labels.len(),
                ));
            }
        }

        Ok(())
    }
}

/// Delay, pad and trim one track so it spans exactly its planned window on a timeline of
/// `total` seconds.
fn build_track_filter(track: &AudioTrack, input_index: usize, total: f64, label: &str) -> String {
    let delay_ms = (track.window.start * 1000.0).round().max(0.0) as u64;
    format!(
        "[{input}:a]asetpts=PTS-STARTPTS,atrim=duration={length},aresample=async=1:first_pts=0,volume={gain:.6},adelay={delay}|{delay},apad,atrim=duration={total}[{label}]",
        input = input_index,
        length = format_time(track.window.duration()),
        gain = track.gain,
        delay = delay_ms,
        total = format_time(total),
    )
}
