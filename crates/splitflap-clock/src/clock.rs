#![forbid(unsafe_code)]

//! Clock text and the per-position glyph layout that displays it.
//!
//! The face is eight positions wide: `HH:MM AM` in 12-hour mode and
//! `HH:MM` followed by three blanks in 24-hour mode, so switching modes never
//! changes the display width.

use std::fmt;
use std::time::Duration;

use chrono::Timelike;
use splitflap_core::{GlyphConfig, GlyphSet, PositionSelector, catalog};

/// Positions on the clock face.
pub const CLOCK_WIDTH: usize = 8;

/// Hour convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockFormat {
    #[default]
    Twelve,
    TwentyFour,
}

impl ClockFormat {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Twelve => Self::TwentyFour,
            Self::TwentyFour => Self::Twelve,
        }
    }

    /// Parse `12` or `24` (an `h` suffix is accepted).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().trim_end_matches(['h', 'H']) {
            "12" => Some(Self::Twelve),
            "24" => Some(Self::TwentyFour),
            _ => None,
        }
    }
}

impl fmt::Display for ClockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Twelve => f.write_str("12h"),
            Self::TwentyFour => f.write_str("24h"),
        }
    }
}

/// Render `time` as eight clock-face glyphs.
#[must_use]
pub fn format_clock<T: Timelike>(time: &T, format: ClockFormat) -> String {
    let minute = time.minute();
    match format {
        ClockFormat::Twelve => {
            let (pm, hour) = time.hour12();
            let meridiem = if pm { "PM" } else { "AM" };
            format!("{hour:02}:{minute:02} {meridiem}")
        }
        ClockFormat::TwentyFour => format!("{:02}:{minute:02}   ", time.hour()),
    }
}

/// Glyph sets for each clock-face position.
///
/// Hours and minutes use digits, position 2 the colon, position 5 a fixed
/// blank, and positions 6 and 7 the meridiem letters.
#[must_use]
pub fn clock_glyphs() -> GlyphConfig {
    GlyphConfig::PerPosition(vec![
        (PositionSelector::List(vec![0, 1, 3, 4]), catalog::digits()),
        (PositionSelector::At(2), face_set(" :")),
        (PositionSelector::At(5), face_set(" ")),
        (PositionSelector::At(6), face_set(" AP")),
        (PositionSelector::At(7), face_set(" M")),
    ])
}

fn face_set(chars: &str) -> GlyphSet {
    GlyphSet::from_chars(chars).unwrap_or_else(|_| catalog::digits())
}

/// Time left until the next whole second, given the current sub-second
/// offset.
#[must_use]
pub fn until_next_second<T: Timelike>(time: &T) -> Duration {
    // leap seconds report nanoseconds past 1e9
    let nanos = time.nanosecond() % 1_000_000_000;
    Duration::from_nanos(u64::from(1_000_000_000 - nanos))
}
