mod audio;
mod inputs;
mod util;
mod video;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use anyhow::Result;

use self::inputs::SourceMap;
use self::util::format_time;
use crate::video::config::VideoConfig;
use crate::video::planner::CompositionPlan;

#[derive(Debug, Clone)]
pub struct FfmpegCompileOutput {
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: String) {
        self.filters.push(filter);
    }

    pub fn join(&self) -> String {
        self.filters.join("; ")
    }
}

/// Encoder settings for the final file.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub video_bitrate: String,
    pub audio_bitrate: String,
    pub fps: u32,
    pub preset: String,
    pub threads: u32,
}

impl EncodeSettings {
    pub fn from_config(config: &VideoConfig) -> Self {
        Self {
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
            video_bitrate: config.video_bitrate.clone(),
            audio_bitrate: config.audio_bitrate.clone(),
            fps: config.fps,
            preset: config.encoder_preset.clone(),
            threads: config.encoder_threads,
        }
    }

    fn push_to(&self, args: &mut Vec<String>) {
        let pairs = [
            ("-c:v", self.video_codec.clone()),
            ("-preset", self.preset.clone()),
            ("-b:v", self.video_bitrate.clone()),
            ("-r", self.fps.to_string()),
            ("-pix_fmt", "yuv420p".to_string()),
            ("-c:a", self.audio_codec.clone()),
            ("-b:a", self.audio_bitrate.clone()),
            ("-threads", self.threads.to_string()),
            ("-movflags", "+faststart".to_string()),
        ];
        for (flag, value) in pairs {
            args.push(flag.to_string());
            args.push(value);
        }
    }
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::from_config(&VideoConfig::default())
    }
}

/// Turns a [`CompositionPlan`] into ffmpeg arguments.
pub struct FfmpegCompiler {
    settings: EncodeSettings,
    fonts_dir: Option<PathBuf>,
}

impl FfmpegCompiler {
    pub fn new(settings: EncodeSettings, fonts_dir: Option<PathBuf>) -> Self {
        Self {
            settings,
            fonts_dir,
        }
    }

    pub fn compile(
        &self,
        plan: &CompositionPlan,
        subtitles: Option<&Path>,
        output: &Path,
    ) -> Result<FfmpegCompileOutput> {
        let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];

        let source_map = SourceMap::build(plan);
        args.extend(source_map.input_args());

        let filter_complex = self.build_filter_complex(plan, &source_map, subtitles)?;
        args.push("-filter_complex".to_string());
        args.push(filter_complex);

        args.push("-map".to_string());
        args.push("[outv]".to_string());
        args.push("-map".to_string());
        args.push("[outa]".to_string());

        self.settings.push_to(&mut args);
        args.push("-t".to_string());
        args.push(format_time(plan.total_duration));
        args.push(output.to_string_lossy().into_owned());

        Ok(FfmpegCompileOutput { args })
    }

    fn build_filter_complex(
        &self,
        plan: &CompositionPlan,
        source_map: &SourceMap,
        subtitles: Option<&Path>,
    ) -> Result<String> {
        let mut filters = FilterChain::new();

        let mut current_video_label = "bg".to_string();
        filters.push(self.build_background_filter(plan, source_map.background, &current_video_label));

        if let Some(ass_path) = subtitles {
            let next_label = "subtitled_v";
            filters.push(self.build_subtitle_filter(&current_video_label, ass_path, next_label));
            current_video_label = next_label.to_string();
        }

        filters.push(format!("[{}]copy[outv]", current_video_label));

        self.build_audio_mix_filters(&mut filters, plan, source_map)?;

        Ok(filters.join())
    }
}
