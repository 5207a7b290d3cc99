use crate::ui::prelude::*;

#[derive(Debug, Clone)]
pub(crate) struct ReportLine {
    pub(crate) level: Level,
    pub(crate) code: &'static str,
    pub(crate) message: String,
}

impl ReportLine {
    pub(crate) fn new(level: Level, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
        }
    }
}

/// Emit a block of report lines; text output gets a separator and level tags.
pub(crate) fn emit_report(lines: &[ReportLine]) {
    if get_output_format() == OutputFormat::Json {
        for line in lines {
            emit(line.level, line.code, &line.message, None);
        }
        return;
    }

    separator();
    for line in lines {
        for text in format_report_line(line) {
            emit(line.level, line.code, &text, None);
        }
    }
}

/// Level tag on the first line, continuation lines indented under it.
fn format_report_line(line: &ReportLine) -> Vec<String> {
    let prefix = format!("[{}] ", level_label(line.level));
    let mut message_lines = line.message.lines();
    let Some(first) = message_lines.next() else {
        return vec![prefix.trim_end().to_string()];
    };

    let mut formatted = vec![format!("{prefix}{first}")];
    let indent = " ".repeat(prefix.len());
    formatted.extend(message_lines.map(|rest| format!("{indent}{rest}")));
    formatted
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Info => "INFO",
        Level::Success => "OK",
        Level::Warn => "WARN",
        Level::Error => "ERROR",
        Level::Debug => "DEBUG",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_lines_are_indented() {
        let lines = format_report_line(&ReportLine::new(
            Level::Warn,
            "video.batch.item_failed",
            "first\nsecond",
        ));
        assert_eq!(lines, vec!["[WARN] first", "       second"]);
    }
}
