mod common;
mod ui;
mod video;

use clap::Parser;
use std::io::IsTerminal;

use crate::ui::prelude::*;
use crate::video::VideoCommands;
use crate::video::speech::CancellationFlag;

/// Reelsmith: turn narration scripts into captioned short-form videos
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for events
    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: VideoCommands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    ui::init(cli.output, std::io::stdout().is_terminal());
    ui::set_debug_mode(cli.debug);
    emit(Level::Debug, "app.debug", "Debug mode is on", None);

    let cancel = CancellationFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
            emit(
                Level::Warn,
                "app.cancelled",
                "Cancelling: work already in progress will finish first",
                None,
            );
        }
    });

    match video::handle_video_command(cli.command, cancel).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            emit(Level::Error, "app.error", &format!("Error: {err:#}"), None);
            std::process::exit(1);
        }
    }
}
