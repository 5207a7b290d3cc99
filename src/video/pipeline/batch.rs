use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::report::{ReportLine, emit_report};
use super::{GenerationOutcome, GenerationRequest, Generator};
use crate::ui::prelude::*;
use crate::video::support::utils::file_timestamp;

pub const BATCH_SEPARATOR: &str = "---";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[GenerationOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Split a script on lines made of `---`. Blank parts are dropped; a script without a
/// separator yields one part.
pub fn split_batch(script: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for line in script.lines() {
        if line.trim() == BATCH_SEPARATOR {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn batch_output(dir: &Path, index: usize, timestamp: &str) -> PathBuf {
    dir.join(format!("video_{index:03}_{timestamp}.mp4"))
}

impl Generator {
    /// Render every script with the settings of `template`, at most
    /// `max_concurrent_videos` at a time. Outcomes are returned in input order.
    ///
    /// In batch mode `template.output` names the output directory.
    pub async fn generate_batch(
        &self,
        scripts: Vec<String>,
        template: &GenerationRequest,
    ) -> (Vec<GenerationOutcome>, BatchSummary) {
        let total = scripts.len();
        let output_dir = template
            .output
            .clone()
            .unwrap_or_else(|| self.exports_dir.clone());
        let timestamp = file_timestamp();
        let concurrency = self.config.max_concurrent_videos.max(1);

        emit(
            Level::Info,
            "video.batch.start",
            &format!("Generating {total} videos ({concurrency} at a time)"),
            None,
        );

        let mut indexed: Vec<(usize, GenerationOutcome)> =
            stream::iter(scripts.into_iter().enumerate())
                .map(|(i, script)| {
                    let request = GenerationRequest {
                        script,
                        output: Some(batch_output(&output_dir, i + 1, &timestamp)),
                        ..template.clone()
                    };
                    async move {
                        emit(
                            Level::Info,
                            "video.batch.item",
                            &format!("Starting video {}/{total}", i + 1),
                            None,
                        );
                        (i, self.generate(request).await)
                    }
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        indexed.sort_by_key(|(i, _)| *i);

        let outcomes: Vec<GenerationOutcome> =
            indexed.into_iter().map(|(_, outcome)| outcome).collect();
        let summary = BatchSummary::from_outcomes(&outcomes);

        emit_report(&batch_report(&outcomes));
        emit(
            if summary.all_succeeded() {
                Level::Success
            } else {
                Level::Warn
            },
            "video.batch.summary",
            &format!(
                "Batch complete: {}/{} succeeded, {} failed",
                summary.succeeded,
                summary.total(),
                summary.failed
            ),
            serde_json::to_value(summary).ok(),
        );

        (outcomes, summary)
    }
}

fn batch_report(outcomes: &[GenerationOutcome]) -> Vec<ReportLine> {
    outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            if outcome.success {
                let path = outcome
                    .video_path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "(dry run)".to_string());
                ReportLine::new(
                    Level::Success,
                    "video.batch.item_done",
                    format!(
                        "#{} {path} ({:.1}s, {} captions)",
                        i + 1,
                        outcome.duration.unwrap_or_default(),
                        outcome.subtitle_count
                    ),
                )
            } else {
                ReportLine::new(
                    Level::Error,
                    "video.batch.item_failed",
                    format!("#{} failed: {}", i + 1, outcome.message),
                )
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_separator_lines() {
        let script = "First story.\n---\n\n  \n---\nSecond story\nwith two lines.\n---\n";
        assert_eq!(
            split_batch(script),
            vec![
                "First story.".to_string(),
                "Second story\nwith two lines.".to_string()
            ]
        );
    }

    #[test]
    fn script_without_separator_is_single_mode() {
        assert_eq!(split_batch("  Only one.  "), vec!["Only one.".to_string()]);
        assert!(split_batch("---\n---").is_empty());
        // Dashes inside a sentence are not separators
        assert_eq!(split_batch("a --- b").len(), 1);
    }

    #[test]
    fn batch_outputs_are_numbered() {
        let path = batch_output(Path::new("/exports"), 7, "20250101_120000");
        assert_eq!(path, PathBuf::from("/exports/video_007_20250101_120000.mp4"));
    }

    #[test]
    fn summary_counts_failures() {
        let outcomes = vec![
            GenerationOutcome {
                success: true,
                duration: Some(14.0),
                subtitle_count: 3,
                video_path: Some(PathBuf::from("/exports/video_001.mp4")),
                ..GenerationOutcome::default()
            },
            GenerationOutcome::failed("speech service is rate limited: 429".to_string()),
        ];

        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(
            summary,
            BatchSummary {
                succeeded: 1,
                failed: 1
            }
        );
        assert!(!summary.all_succeeded());

        let report = batch_report(&outcomes);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].level, Level::Success);
        assert_eq!(report[0].message, "#1 /exports/video_001.mp4 (14.0s, 3 captions)");
        assert_eq!(report[1].level, Level::Error);
        assert_eq!(report[1].message, "#2 failed: speech service is rate limited: 429");
    }
}
