use super::{CaptionLine, WordTiming};
use crate::video::config::VideoConfig;

/// Trailing characters that end a sentence in the supported scripts.
const SENTENCE_TERMINALS: &[char] = &['.', '!', '?', '。', '！', '？', '।'];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLimits {
    /// Characters per line, counting one separator per word.
    pub max_chars: usize,
    /// Seconds from the first word's start to the current word's end.
    pub max_duration: f64,
    /// A pause at least this long before the next word ends the line.
    pub min_gap: f64,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            max_chars: 60,
            max_duration: 2.5,
            min_gap: 1.5,
        }
    }
}

impl SegmentLimits {
    pub fn from_config(config: &VideoConfig) -> Self {
        Self {
            max_chars: config.max_chars_per_line,
            max_duration: config.max_duration_per_line,
            min_gap: config.min_gap_between_lines,
        }
    }
}

/// Why a caption line was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    CharLimit,
    DurationLimit,
    SentenceEnd,
    Pause,
    EndOfStream,
}

#[derive(Default)]
struct LineAccumulator<'a> {
    words: Vec<&'a str>,
    start: f64,
    chars: usize,
}

impl<'a> LineAccumulator<'a> {
    fn push(&mut self, word: &'a WordTiming) {
        if self.words.is_empty() {
            self.start = word.start;
        }
        self.words.push(&word.text);
        self.chars += word.text.chars().count() + 1;
    }

    fn flush(&mut self, end: f64) -> CaptionLine {
        let line = CaptionLine {
            text: self.words.join(" "),
            start: self.start,
            end,
        };
        self.words.clear();
        self.chars = 0;
        line
    }
}

/// Greedy single pass over the word stream; a line closes as soon as any limit is reached.
///
/// The closing line always ends at the current word's end, even when the break comes from
/// a pause before the next word.
pub fn segment(words: &[WordTiming], limits: &SegmentLimits) -> Vec<CaptionLine> {
    segment_with_reasons(words, limits)
        .into_iter()
        .map(|(line, _)| line)
        .collect()
}

pub(crate) fn segment_with_reasons(
    words: &[WordTiming],
    limits: &SegmentLimits,
) -> Vec<(CaptionLine, BreakReason)> {
    let mut lines = Vec::new();
    let mut acc = LineAccumulator::default();

    for (idx, word) in words.iter().enumerate() {
        acc.push(word);
        if let Some(reason) = break_reason(&acc, word, words.get(idx + 1), limits) {
            lines.push((acc.flush(word.end), reason));
        }
    }

    lines
}

fn break_reason(
    acc: &LineAccumulator<'_>,
    current: &WordTiming,
    next: Option<&WordTiming>,
    limits: &SegmentLimits,
) -> Option<BreakReason> {
    if acc.chars >= limits.max_chars {
        return Some(BreakReason::CharLimit);
    }
    if current.end - acc.start >= limits.max_duration {
        return Some(BreakReason::DurationLimit);
    }
    if ends_sentence(&current.text) {
        return Some(BreakReason::SentenceEnd);
    }
    match next {
        Some(next) if next.start - current.end >= limits.min_gap => Some(BreakReason::Pause),
        Some(_) => None,
        None => Some(BreakReason::EndOfStream),
    }
}

fn ends_sentence(word: &str) -> bool {
    word.chars()
        .last()
        .is_some_and(|c| SENTENCE_TERMINALS.contains(&c))
}
