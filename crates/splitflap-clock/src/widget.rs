#![forbid(unsafe_code)]

//! The clock widget: a split-flap display that only exists in monospace
//! typography.
//!
//! Proportional fonts cannot hold a flap grid, so switching to
//! [`Typography::Proportional`] tears the display down and leaves a plain
//! text clock. Switching back builds a fresh display seeded with the current
//! time. Updates are fed once per second, aligned to the wall clock's second
//! boundary.

use std::fmt;

use chrono::Timelike;
use splitflap_core::{DisplayConfig, FlapDisplay, TileRenderer};
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::clock::{CLOCK_WIDTH, ClockFormat, clock_glyphs, format_clock, until_next_second};

/// Font family the host is rendering with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Typography {
    #[default]
    Mono,
    Proportional,
}

impl Typography {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Mono => Self::Proportional,
            Self::Proportional => Self::Mono,
        }
    }

    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "mono" | "monospace" => Some(Self::Mono),
            "proportional" | "sans" => Some(Self::Proportional),
            _ => None,
        }
    }
}

impl fmt::Display for Typography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mono => f.write_str("mono"),
            Self::Proportional => f.write_str("proportional"),
        }
    }
}

/// Owns the clock display and decides when it exists.
pub struct ClockWidget<R: TileRenderer + Default> {
    base: DisplayConfig,
    format: ClockFormat,
    typography: Option<Typography>,
    display: Option<FlapDisplay<R>>,
    text: String,
    next_update: Option<Instant>,
}

impl<R: TileRenderer + Default> ClockWidget<R> {
    /// A hidden widget. Step interval and transition timing come from
    /// `base`; glyph layout and width are fixed by the clock face.
    #[must_use]
    pub fn new(base: DisplayConfig, format: ClockFormat) -> Self {
        Self {
            base,
            format,
            typography: None,
            display: None,
            text: String::new(),
            next_update: None,
        }
    }

    /// React to a typography signal. Repeating the active mode does nothing.
    pub fn set_typography<T: Timelike>(&mut self, typography: Typography, time: &T, now: Instant) {
        if self.typography == Some(typography) {
            debug!(%typography, "typography unchanged");
            return;
        }
        self.typography = Some(typography);
        info!(%typography, "typography changed");

        match typography {
            Typography::Mono => {
                if self.display.is_none() {
                    self.display = self.build(time);
                }
            }
            Typography::Proportional => {
                if let Some(mut display) = self.display.take() {
                    display.teardown();
                }
            }
        }
        self.update(time, now);
    }

    /// Switch between 12- and 24-hour faces, updating immediately.
    pub fn toggle_format<T: Timelike>(&mut self, time: &T, now: Instant) {
        self.format = self.format.toggled();
        info!(format = %self.format, "clock format changed");
        if self.typography.is_some() {
            self.update(time, now);
        }
    }

    /// Advance to `now`: feed a new time if the second turned, then run any
    /// due flap steps. Returns whether anything visible may have changed.
    pub fn tick<T: Timelike>(&mut self, time: &T, now: Instant) -> bool {
        let mut changed = false;
        if self.next_update.is_some_and(|at| at <= now) {
            self.update(time, now);
            changed = true;
        }
        if let Some(display) = self.display.as_mut() {
            changed |= display.poll(now) > 0;
        }
        changed
    }

    /// Earliest instant the widget needs attention.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        let flaps = self.display.as_ref().and_then(FlapDisplay::next_deadline);
        match (flaps, self.next_update) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    #[must_use]
    pub fn display(&self) -> Option<&FlapDisplay<R>> {
        self.display.as_ref()
    }

    pub fn display_mut(&mut self) -> Option<&mut FlapDisplay<R>> {
        self.display.as_mut()
    }

    /// The plain-text clock, used when no display exists.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn typography(&self) -> Option<Typography> {
        self.typography
    }

    #[must_use]
    pub const fn format(&self) -> ClockFormat {
        self.format
    }

    /// Tear down the display, if any, and stop updating.
    pub fn shutdown(&mut self) {
        if let Some(mut display) = self.display.take() {
            display.teardown();
        }
        self.next_update = None;
    }

    fn build<T: Timelike>(&self, time: &T) -> Option<FlapDisplay<R>> {
        let config = DisplayConfig {
            segments: Some(CLOCK_WIDTH),
            glyphs: clock_glyphs(),
            initial: format_clock(time, self.format),
            ..self.base.clone()
        };
        match FlapDisplay::new(config, R::default()) {
            Ok(display) => Some(display),
            Err(err) => {
                warn!(error = %err, "clock display construction failed, staying hidden");
                None
            }
        }
    }

    fn update<T: Timelike>(&mut self, time: &T, now: Instant) {
        self.text = format_clock(time, self.format);
        if let Some(display) = self.display.as_mut() {
            display.set_value_at(&self.text, now);
        }
        self.next_update = Some(now + until_next_second(time));
    }
}

impl<R: TileRenderer + Default> fmt::Debug for ClockWidget<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClockWidget")
            .field("format", &self.format)
            .field("typography", &self.typography)
            .field("text", &self.text)
            .field("has_display", &self.display.is_some())
            .field("next_update", &self.next_update)
            .finish()
    }
}
