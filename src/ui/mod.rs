//! Event output shared by every command.
//!
//! Everything the tool reports goes through [`emit`]: a level, a dotted event code and a
//! human readable message, optionally with structured data. In text mode the message is
//! coloured by level; in JSON mode each event becomes one line of JSON so batch runs can
//! be piped into `jq`.

use colored::*;
use lazy_static::lazy_static;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Level::Warn | Level::Error)
    }
}

#[derive(Debug, Clone, Copy)]
struct Renderer {
    format: OutputFormat,
    color: bool,
}

lazy_static! {
    static ref RENDERER: RwLock<Renderer> = RwLock::new(Renderer {
        format: OutputFormat::Text,
        color: true,
    });
}

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

pub fn init(format: OutputFormat, color: bool) {
    if let Ok(mut renderer) = RENDERER.write() {
        renderer.format = format;
        renderer.color = color;
    }
}

pub fn get_output_format() -> OutputFormat {
    current_renderer().format
}

fn current_renderer() -> Renderer {
    RENDERER.read().map(|r| *r).unwrap_or(Renderer {
        format: OutputFormat::Text,
        color: false,
    })
}

#[derive(Serialize)]
struct Event<'a> {
    level: &'a str,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn colorize(level: Level, message: &str) -> String {
    match level {
        Level::Info => message.normal().to_string(),
        Level::Success => message.green().bold().to_string(),
        Level::Warn => message.yellow().bold().to_string(),
        Level::Error => message.red().bold().to_string(),
        Level::Debug => message.cyan().to_string(),
    }
}

fn format_event(
    renderer: Renderer,
    level: Level,
    code: &str,
    message: &str,
    data: Option<serde_json::Value>,
) -> String {
    match renderer.format {
        OutputFormat::Text if renderer.color => colorize(level, message),
        OutputFormat::Text => message.to_string(),
        OutputFormat::Json => {
            let event = Event {
                level: level.as_str(),
                code,
                message,
                data,
            };
            serde_json::to_string(&event).unwrap_or_else(|_| {
                format!(r#"{{"level":"{}","code":"{}"}}"#, level.as_str(), code)
            })
        }
    }
}

pub fn emit(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) {
    if level == Level::Debug && !is_debug_enabled() {
        return;
    }

    let line = format_event(current_renderer(), level, code, message, data);
    if level.to_stderr() {
        let _ = writeln!(io::stderr(), "{line}");
    } else {
        let _ = writeln!(io::stdout(), "{line}");
    }
}

pub fn separator() {
    let renderer = current_renderer();
    if renderer.format == OutputFormat::Json {
        return;
    }
    let _ = writeln!(io::stdout(), "{}", "━".repeat(70));
}

pub mod prelude {
    pub use super::{Level, OutputFormat, emit, get_output_format, separator};
}
