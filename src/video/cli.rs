use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

use super::planner::{AspectRatio, Quality};
use super::speech::Voice;

#[derive(Subcommand, Debug, Clone)]
pub enum VideoCommands {
    /// Turn a narration script into a captioned video (`---` separates batch scripts)
    Generate(GenerateArgs),
    /// Synthesize narration only and save it as WAV
    Voiceover(VoiceoverArgs),
    /// Transcribe an audio file into caption lines (SRT)
    Subtitles(SubtitlesArgs),
    /// Segment word timings (JSON) or re-flow an existing SRT file into SRT captions
    Segment(SegmentArgs),
    /// List footage and music datasets
    Datasets(DatasetsArgs),
    /// Inspect or rotate the Gemini API keys
    Keys {
        #[command(subcommand)]
        command: KeysCommands,
    },
    /// Show the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Narration script text
    #[arg(required_unless_present = "script_file")]
    pub script: Option<String>,

    /// Read the script from a file instead
    #[arg(short = 'f', long = "script-file", value_hint = ValueHint::FilePath, conflicts_with = "script")]
    pub script_file: Option<PathBuf>,

    /// Narration voice (defaults to default_voice from video.toml)
    #[arg(long, ignore_case = true)]
    pub voice: Option<Voice>,

    /// Title shown before the narration starts
    #[arg(short, long)]
    pub title: Option<String>,

    /// Dataset directory or name to take background footage from
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub video_dataset: Option<PathBuf>,

    /// Dataset directory or name to take music from
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub music_dataset: Option<PathBuf>,

    /// Output aspect ratio
    #[arg(short, long)]
    pub aspect: Option<AspectRatio>,

    /// Output quality
    #[arg(short, long, ignore_case = true)]
    pub quality: Option<Quality>,

    /// Output file (a directory when the script contains several videos)
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::AnyPath)]
    pub out_file: Option<PathBuf>,

    /// Plan the video and print the ffmpeg command; skips speech synthesis, transcription
    /// and rendering, estimating the narration length from the word count
    #[arg(long)]
    pub dry_run: bool,

    /// Show raw ffmpeg output instead of a progress bar
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct VoiceoverArgs {
    /// Text to speak
    pub text: String,

    #[arg(long, ignore_case = true)]
    pub voice: Option<Voice>,

    /// Output WAV file; defaults to voiceover_<voice>_<timestamp>.wav in the exports directory
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SubtitlesArgs {
    /// Audio file to transcribe
    #[arg(value_hint = ValueHint::FilePath)]
    pub audio: PathBuf,

    /// Output SRT file; defaults to <audio>.srt
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Language hint passed to WhisperX (e.g. en, es, zh)
    #[arg(short, long)]
    pub language: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    /// JSON array of {"word"|"text", "start", "end"} records, or an .srt file to re-flow
    #[arg(value_hint = ValueHint::FilePath)]
    pub words: PathBuf,

    /// Output SRT file; printed to stdout when omitted
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Seconds
    #[arg(long)]
    pub max_duration: Option<f64>,

    /// Seconds
    #[arg(long)]
    pub min_gap: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct DatasetsArgs {
    /// Datasets directory (defaults to datasets_dir from video.toml)
    #[arg(value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum KeysCommands {
    /// Show which key is in use
    Status,
    /// Switch to the next key
    Next,
    /// Start over at a random key
    Reset,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommands {
    /// Print the config file location
    Path,
    /// Print the effective configuration
    Show,
}
