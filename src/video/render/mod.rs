pub mod ffmpeg;

use std::path::{Path, PathBuf};

use anyhow::Result;

use self::ffmpeg::compiler::{EncodeSettings, FfmpegCompiler};
use self::ffmpeg::services::{FfmpegRunOptions, FfmpegRunner, SystemFfmpegRunner};
use crate::video::planner::CompositionPlan;

/// Executes a [`CompositionPlan`] against an external renderer.
pub trait Compositor: Send + Sync {
    /// The command that would be run, for dry runs.
    fn command(&self, plan: &CompositionPlan, subtitles: Option<&Path>, output: &Path)
    -> Result<Vec<String>>;

    fn render(&self, plan: &CompositionPlan, subtitles: Option<&Path>, output: &Path) -> Result<()>;
}

pub struct FfmpegCompositor<R: FfmpegRunner = SystemFfmpegRunner> {
    compiler: FfmpegCompiler,
    runner: R,
    verbose: bool,
    quiet: bool,
}

impl FfmpegCompositor<SystemFfmpegRunner> {
    pub fn system(settings: EncodeSettings, fonts_dir: Option<PathBuf>) -> Self {
        Self::with_runner(settings, fonts_dir, SystemFfmpegRunner)
    }
}

impl<R: FfmpegRunner> FfmpegCompositor<R> {
    pub fn with_runner(settings: EncodeSettings, fonts_dir: Option<PathBuf>, runner: R) -> Self {
        Self {
            compiler: FfmpegCompiler::new(settings, fonts_dir),
            runner,
            verbose: false,
            quiet: false,
        }
    }

    /// Echo raw ffmpeg output instead of drawing a progress bar.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// No progress bar; used when several videos render in parallel.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

impl<R: FfmpegRunner> Compositor for FfmpegCompositor<R> {
    fn command(
        &self,
        plan: &CompositionPlan,
        subtitles: Option<&Path>,
        output: &Path,
    ) -> Result<Vec<String>> {
        Ok(self.compiler.compile(plan, subtitles, output)?.args)
    }

    fn render(&self, plan: &CompositionPlan, subtitles: Option<&Path>, output: &Path) -> Result<()> {
        let args = self.command(plan, subtitles, output)?;
        let options =
            FfmpegRunOptions::new(Some(plan.total_duration), self.verbose).quiet(self.quiet);
        self.runner.run(&args, options)
    }
}

/// Render arguments as a copy-pasteable shell command.
pub fn format_command(args: &[String]) -> String {
    let quoted: Vec<String> = args
        .iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains([' ', '\'', '"', ';', '[', '|', '(']) {
                format!("'{}'", arg.replace('\'', "'\\''"))
            } else {
                arg.clone()
            }
        })
        .collect();
    format!("ffmpeg {}", quoted.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::captions::CaptionLine;
    use crate::video::planner::{
        AspectRatio, FootageSource, MediaSource, PlanRequest, Quality, TargetFrame,
        TimelinePlanner, TimelinePolicy,
    };
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<(Vec<String>, Option<f64>)>>,
    }

    impl FfmpegRunner for &RecordingRunner {
        fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((args.to_vec(), options.total_duration));
            Ok(())
        }
    }

    fn plan() -> CompositionPlan {
        let request = PlanRequest {
            narration: MediaSource {
                path: PathBuf::from("voice.wav"),
                duration: 8.0,
            },
            background: FootageSource {
                path: PathBuf::from("clip.mp4"),
                duration: 30.0,
                size: TargetFrame::new(1080, 1080),
            },
            music: None,
            title: Some("Title".to_string()),
            captions: vec![CaptionLine {
                text: "Hi".to_string(),
                start: 0.0,
                end: 0.5,
            }],
            aspect: AspectRatio::Square,
            quality: Quality::Standard,
        };
        TimelinePlanner::new(TimelinePolicy::default())
            .plan(&request, &mut StdRng::seed_from_u64(9))
            .unwrap()
    }

    #[test]
    fn render_hands_compiled_args_to_runner() {
        let runner = RecordingRunner::default();
        let compositor =
            FfmpegCompositor::with_runner(EncodeSettings::default(), None, &runner).quiet(true);
        let plan = plan();

        compositor
            .render(&plan, None, Path::new("/exports/out.mp4"))
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.last().unwrap(), "/exports/out.mp4");
        assert_eq!(calls[0].1, Some(12.0));
    }

    #[test]
    fn dry_run_command_is_shell_quoted() {
        let compositor = FfmpegCompositor::system(EncodeSettings::default(), None);
        let args = compositor
            .command(&plan(), None, Path::new("/exports/my video.mp4"))
            .unwrap();
        let printed = format_command(&args);

        assert!(printed.starts_with("ffmpeg -y -hide_banner -i clip.mp4"));
        assert!(printed.ends_with("'/exports/my video.mp4'"));
        assert!(printed.contains("-filter_complex '[0:v]"));
    }
}
