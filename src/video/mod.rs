pub mod cache;
pub mod captions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datasets;
pub mod errors;
pub mod pipeline;
pub mod planner;
pub mod render;
pub mod speech;
pub mod support;
pub mod transcribe;

pub use cli::VideoCommands;
pub use commands::handle_video_command;
