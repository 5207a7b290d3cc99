use std::path::{Path, PathBuf};

use crate::video::planner::CompositionPlan;

#[derive(Debug, Clone, PartialEq)]
struct InputSource {
    path: PathBuf,
    /// Total plays of the file; ffmpeg's `-stream_loop` takes the number of extra plays.
    plays: u32,
}

/// Input files in ffmpeg argument order, with the index each one gets.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    sources: Vec<InputSource>,
    pub background: usize,
    pub narration: Option<usize>,
    pub music: Option<usize>,
}

impl SourceMap {
    pub fn build(plan: &CompositionPlan) -> Self {
        let mut map = SourceMap::default();

        map.background = map.push(&plan.background_source, plan.background.loop_count);
        if let Some(narration) = plan.narration() {
            map.narration = Some(map.push(&narration.source, 1));
        }
        if let Some(music) = plan.music() {
            map.music = Some(map.push(&music.source, music.loop_count));
        }

        map
    }

    fn push(&mut self, path: &Path, plays: u32) -> usize {
        self.sources.push(InputSource {
            path: path.to_path_buf(),
            plays: plays.max(1),
        });
        self.sources.len() - 1
    }

    pub fn input_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for source in &self.sources {
            if source.plays > 1 {
                args.push("-stream_loop".to_string());
                args.push((source.plays - 1).to_string());
            }
            args.push("-i".to_string());
            args.push(source.path.to_string_lossy().into_owned());
        }
        args
    }
}
