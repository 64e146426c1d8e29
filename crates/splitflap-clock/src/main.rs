#![forbid(unsafe_code)]

//! Terminal split-flap clock.
//!
//! Shows the local time on an eight-position split-flap display. Press `m`
//! to switch between the flap grid and a plain text clock, `f` to switch
//! between 12- and 24-hour faces, and `q` or `Esc` to quit.

mod app;
mod clock;
mod config;
mod surface;
mod widget;

use std::fs::File;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;

use crossterm::cursor;
use crossterm::execute;
use crossterm::style::ResetColor;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::{ClockConfig, ENV_LOG};

fn main() -> io::Result<()> {
    let parse = ClockConfig::from_env();
    if let Some(path) = parse.config.log_file.as_deref() {
        init_logging(path)?;
    }
    for err in &parse.errors {
        warn!(field = err.field, value = %err.value, "ignoring config value: {}", err.message);
    }
    info!(
        typography = %parse.config.typography,
        format = %parse.config.format,
        "starting splitflap clock"
    );

    let mut out = io::stdout();
    execute!(out, EnterAlternateScreen, cursor::Hide)?;
    terminal::enable_raw_mode()?;

    let res = run(parse.config, &mut out);

    terminal::disable_raw_mode().ok();
    execute!(out, ResetColor, cursor::Show, LeaveAlternateScreen).ok();

    if let Err(err) = &res {
        error!(error = %err, "clock exited with error");
    }
    res
}

fn run(config: ClockConfig, out: &mut Stdout) -> io::Result<()> {
    let mut app = App::new(config, out);
    app.run()
}

/// Log to `path`. The terminal is in the alternate screen, so nothing may be
/// written to stdout or stderr while the clock runs.
fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
