#![forbid(unsafe_code)]

//! Event loop: input, signals, timers, and repaint.
//!
//! The loop blocks on terminal input for at most the time until the widget's
//! next deadline, so flap steps and second updates fire on time without a
//! fixed frame rate.

use std::io::{self, Write};
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use splitflap_core::{FlapDisplay, SegmentView, TilePhase};
use tracing::{debug, info, trace};
use unicode_width::UnicodeWidthStr;
use web_time::Instant;

use crate::config::ClockConfig;
use crate::surface::{Surface, TermRenderer, layout, layout_width};
use crate::widget::{ClockWidget, Typography};

/// Longest the loop blocks waiting for input.
const MAX_IDLE: Duration = Duration::from_millis(250);

const HELP: &str = "m: typography  f: 12/24h  q: quit";

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleTypography,
    ToggleFormat,
    Quit,
    None,
}

/// Map a key press to an [`Action`].
#[must_use]
pub fn action_for(key: &KeyEvent) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('m' | 'M') => Action::ToggleTypography,
        KeyCode::Char('f' | 'F') => Action::ToggleFormat,
        _ => Action::None,
    }
}

/// How long to wait for input before the next deadline.
#[must_use]
pub fn effective_timeout(deadline: Option<Instant>, now: Instant) -> Duration {
    deadline.map_or(MAX_IDLE, |at| at.saturating_duration_since(now).min(MAX_IDLE))
}

pub struct App<W: Write> {
    widget: ClockWidget<TermRenderer>,
    surface: Surface<W>,
    initial: Typography,
    running: bool,
    redraw_pending: bool,
}

impl<W: Write> App<W> {
    pub fn new(config: ClockConfig, out: W) -> Self {
        Self {
            widget: ClockWidget::new(config.display, config.format),
            surface: Surface::new(out),
            initial: config.typography,
            running: true,
            redraw_pending: false,
        }
    }

    /// Run until a quit key or a termination signal.
    pub fn run(&mut self) -> io::Result<()> {
        let mut signals = ShutdownSignals::install()?;
        self.widget
            .set_typography(self.initial, &Local::now(), Instant::now());
        self.surface.clear()?;
        self.draw()?;

        while self.running {
            let timeout = effective_timeout(self.widget.next_deadline(), Instant::now());
            if event::poll(timeout)? {
                loop {
                    match event::read()? {
                        Event::Key(key) => self.apply(action_for(&key))?,
                        Event::Resize(..) => {
                            self.surface.clear()?;
                            self.redraw_pending = true;
                        }
                        _ => {}
                    }
                    if !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
            if signals.received() {
                info!("termination signal received");
                self.running = false;
            }

            let changed = self.widget.tick(&Local::now(), Instant::now());
            let dirty = self.take_dirty();
            if changed || dirty {
                self.draw()?;
            }
        }

        self.widget.shutdown();
        Ok(())
    }

    fn apply(&mut self, action: Action) -> io::Result<()> {
        debug!(?action, "key action");
        match action {
            Action::Quit => self.running = false,
            Action::ToggleTypography => {
                let next = self.typography().toggled();
                self.widget.set_typography(next, &Local::now(), Instant::now());
                self.surface.clear()?;
                self.redraw_pending = true;
            }
            Action::ToggleFormat => {
                self.widget.toggle_format(&Local::now(), Instant::now());
                self.redraw_pending = true;
            }
            Action::None => {}
        }
        Ok(())
    }

    fn typography(&self) -> Typography {
        self.widget.typography().unwrap_or(self.initial)
    }

    fn take_dirty(&mut self) -> bool {
        let registry = self
            .widget
            .display_mut()
            .is_some_and(|display| display.renderer_mut().take_dirty());
        std::mem::take(&mut self.redraw_pending) | registry
    }

    fn draw(&mut self) -> io::Result<()> {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let mid = rows / 2;
        match self.widget.display() {
            Some(display) => {
                let widths = cell_widths(display);
                let views: Vec<SegmentView<'_>> = display.views().collect();
                let x = cols.saturating_sub(layout_width(&widths)) / 2;
                let cells = layout(&views, &widths, x);
                self.surface.draw_tiles(&cells, mid.saturating_sub(1))?;
                let renderer = display.renderer();
                trace!(
                    tiles = renderer.live(),
                    falling = ?renderer
                        .in_phase(TilePhase::Falling)
                        .map(|tile| (tile.half, tile.glyph.as_str()))
                        .collect::<Vec<_>>(),
                    "repaint"
                );
            }
            None => {
                let text = self.widget.text();
                let x = cols.saturating_sub(u16::try_from(text.width()).unwrap_or(cols)) / 2;
                self.surface.draw_text(text, x, mid)?;
            }
        }
        let status = format!("{HELP}  [{} {}]", self.typography(), self.widget.format());
        self.surface.draw_text(&status, 0, rows.saturating_sub(1))?;
        self.surface.flush()
    }
}

fn cell_widths(display: &FlapDisplay<TermRenderer>) -> Vec<usize> {
    display
        .segments()
        .iter()
        .map(|segment| segment.glyph_set().cell_width())
        .collect()
}

/// SIGINT/SIGTERM watcher. Raw mode turns Ctrl-C into a key event, so these
/// only arrive from outside the terminal.
#[cfg(unix)]
struct ShutdownSignals(signal_hook::iterator::Signals);

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> io::Result<Self> {
        use signal_hook::consts::{SIGINT, SIGTERM};
        Ok(Self(signal_hook::iterator::Signals::new([SIGINT, SIGTERM])?))
    }

    fn received(&mut self) -> bool {
        self.0.pending().next().is_some()
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> io::Result<Self> {
        Ok(Self)
    }

    fn received(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(action_for(&press(KeyCode::Char('m'))), Action::ToggleTypography);
        assert_eq!(action_for(&press(KeyCode::Char('F'))), Action::ToggleFormat);
        assert_eq!(action_for(&press(KeyCode::Esc)), Action::Quit);
        assert_eq!(action_for(&press(KeyCode::Char('x'))), Action::None);
        assert_eq!(
            action_for(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn key_release_is_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(action_for(&key), Action::None);
    }

    #[test]
    fn timeout_tracks_deadline_with_cap() {
        let now = Instant::now();
        assert_eq!(effective_timeout(None, now), MAX_IDLE);
        assert_eq!(
            effective_timeout(Some(now + Duration::from_millis(40)), now),
            Duration::from_millis(40)
        );
        assert_eq!(effective_timeout(Some(now + Duration::from_secs(3)), now), MAX_IDLE);
        assert_eq!(effective_timeout(Some(now), now + Duration::from_millis(5)), Duration::ZERO);
    }
}
