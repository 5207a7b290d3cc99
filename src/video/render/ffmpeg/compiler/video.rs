use std::path::Path;

use super::FfmpegCompiler;
use super::util::{escape_ffmpeg_path, format_time};
use crate::video::planner::CompositionPlan;

impl FfmpegCompiler {
    /// Crop, resize, zoom, slow down and trim the background footage.
    pub(super) fn build_background_filter(
        &self,
        plan: &CompositionPlan,
        input_index: usize,
        output_label: &str,
    ) -> String {
        let bg = &plan.background;
        let output = bg.frame.output;
        let mut steps = Vec::new();

        if let Some(crop) = bg.frame.crop {
            steps.push(format!(
                "crop={}:{}:{}:{}",
                crop.width, crop.height, crop.x, crop.y
            ));
        }
        steps.push(format!(
            "scale={}:{}:flags=lanczos",
            output.width, output.height
        ));
        if let Some(zoomed) = bg.frame.zoomed {
            steps.push(format!(
                "scale={}:{}:flags=lanczos,crop={}:{}",
                zoomed.width, zoomed.height, output.width, output.height
            ));
        }

        steps.push(format!(
            "setpts=(PTS-STARTPTS)/{speed:.6}",
            speed = bg.speed_factor
        ));
        steps.push(format!(
            "trim=start={start}:duration={duration}",
            start = format_time(bg.subclip_start),
            duration = format_time(bg.subclip_duration)
        ));
        steps.push("setpts=PTS-STARTPTS".to_string());
        steps.push(format!("fps={}", self.settings.fps));
        steps.push("setsar=1".to_string());

        format!(
            "[{input}:v]{chain}[{output_label}]",
            input = input_index,
            chain = steps.join(",")
        )
    }

    /// Burn the caption/title script into the video.
    pub(super) fn build_subtitle_filter(
        &self,
        input_label: &str,
        ass_path: &Path,
        output_label: &str,
    ) -> String {
        let mut filter = format!(
            "[{input_label}]ass='{path}'",
            path = escape_ffmpeg_path(ass_path)
        );
        if let Some(fonts_dir) = &self.fonts_dir {
            filter.push_str(&format!(":fontsdir='{}'", escape_ffmpeg_path(fonts_dir)));
        }
        filter.push_str(&format!("[{output_label}]"));
        filter
    }
}
