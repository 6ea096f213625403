//! Terminal feedback on stderr

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while agents run
///
/// Draws to stderr and hides itself when stderr is not a terminal.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
    pb.set_style(style);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn info(message: &str) {
    eprintln!("{}", message.cyan());
}

pub fn success(message: &str) {
    eprintln!("{}", format!("✅ {}", message).green());
}

pub fn warn(message: &str) {
    eprintln!("{}", format!("⚠ {}", message).yellow());
}

pub fn error(message: &str) {
    eprintln!("{}", format!("Error: {}", message).red());
}
