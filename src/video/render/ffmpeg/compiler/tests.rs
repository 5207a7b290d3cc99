use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{EncodeSettings, FfmpegCompiler};
use crate::video::captions::CaptionLine;
use crate::video::planner::{
    AspectRatio, CompositionPlan, FootageSource, MediaSource, PlanRequest, Quality, TargetFrame,
    TimelinePlanner, TimelinePolicy,
};

fn plan(footage: f64, music: Option<f64>, title: Option<&str>) -> CompositionPlan {
    let request = PlanRequest {
        narration: MediaSource {
            path: PathBuf::from("/work/voiceover.wav"),
            duration: 10.0,
        },
        background: FootageSource {
            path: PathBuf::from("/data/clip.mp4"),
            duration: footage,
            size: TargetFrame::new(1920, 1080),
        },
        music: music.map(|duration| MediaSource {
            path: PathBuf::from("/data/bed.mp3"),
            duration,
        }),
        title: title.map(str::to_string),
        captions: vec![CaptionLine {
            text: "Hello".to_string(),
            start: 0.0,
            end: 1.0,
        }],
        aspect: AspectRatio::Vertical,
        quality: Quality::High,
    };
    TimelinePlanner::new(TimelinePolicy::default())
        .plan(&request, &mut StdRng::seed_from_u64(42))
        .unwrap()
}

fn compiler() -> FfmpegCompiler {
    FfmpegCompiler::new(EncodeSettings::default(), Some(PathBuf::from("/cache/fonts")))
}

fn filter_graph(args: &[String]) -> &str {
    let idx = args.iter().position(|arg| arg == "-filter_complex").unwrap();
    &args[idx + 1]
}

#[test]
fn compiler_includes_output_path_in_args() {
    let output = compiler()
        .compile(&plan(60.0, None, None), None, Path::new("out.mp4"))
        .unwrap();
    assert_eq!(output.args.last().unwrap(), "out.mp4");
    assert!(output.args.windows(2).any(|w| w[0] == "-t" && w[1] == "10.000000"));
}

#[test]
fn short_footage_is_looped_at_the_input() {
    let plan = plan(2.0, None, Some("Title"));
    let loops = plan.background.loop_count;
    let output = compiler().compile(&plan, None, Path::new("out.mp4")).unwrap();

    assert_eq!(output.args[2], "-stream_loop");
    assert_eq!(output.args[3], (loops - 1).to_string());
    assert_eq!(output.args[5], "/data/clip.mp4");
}

#[test]
fn background_chain_crops_zooms_and_slows() {
    let plan = plan(60.0, None, None);
    let output = compiler().compile(&plan, None, Path::new("out.mp4")).unwrap();
    let graph = filter_graph(&output.args);

    assert!(graph.starts_with("[0:v]crop=606:1080:657:0,scale=1080:1920:flags=lanczos,"));
    assert!(graph.contains("scale=1134:2016:flags=lanczos,crop=1080:1920"));
    assert!(graph.contains("setpts=(PTS-STARTPTS)/0.700000"));
    assert!(graph.contains(&format!(
        "trim=start={:.6}:duration=10.000000",
        plan.background.subclip_start
    )));
    assert!(graph.contains("fps=30"));
    assert!(graph.contains("[bg]copy[outv]"));
}

#[test]
fn subtitles_are_burned_with_font_directory() {
    let output = compiler()
        .compile(
            &plan(60.0, None, None),
            Some(Path::new("/work/captions.ass")),
            Path::new("out.mp4"),
        )
        .unwrap();
    let graph = filter_graph(&output.args);

    assert!(graph.contains("[bg]ass='/work/captions.ass':fontsdir='/cache/fonts'[subtitled_v]"));
    assert!(graph.contains("[subtitled_v]copy[outv]"));
}

#[test]
fn narration_and_music_are_mixed() {
    let plan = plan(60.0, Some(6.0), Some("Title"));
    let output = compiler().compile(&plan, None, Path::new("out.mp4")).unwrap();
    let graph = filter_graph(&output.args);

    assert!(graph.contains("[1:a]"));
    assert!(graph.contains("volume=1.000000,adelay=4000|4000"));
    assert!(graph.contains("[2:a]"));
    assert!(graph.contains("volume=0.150000,adelay=0|0"));
    assert!(graph.contains("[a_narration][a_music]amix=inputs=2"));

    // music input loops: 14s / 6s -> 3 plays
    let music_idx = output.args.iter().position(|a| a == "/data/bed.mp3").unwrap();
    assert_eq!(output.args[music_idx - 3], "2");
}

#[test]
fn narration_only_passes_through() {
    let output = compiler()
        .compile(&plan(60.0, None, None), None, Path::new("out.mp4"))
        .unwrap();
    let graph = filter_graph(&output.args);
    assert!(graph.contains("[a_narration]anull[outa]"));
    assert!(!graph.contains("amix"));
}

#[test]
fn encoder_settings_follow_config() {
    let output = compiler()
        .compile(&plan(60.0, None, None), None, Path::new("out.mp4"))
        .unwrap();
    let joined = output.args.join(" ");
    assert!(joined.contains("-c:v libx264 -preset medium -b:v 5000k -r 30"));
    assert!(joined.contains("-c:a aac -b:a 192k -threads 4"));
}
