#![forbid(unsafe_code)]

//! Tile pool depths derived from transition timing.
//!
//! A tile stays allocated for as long as its fall transition can still be
//! on screen. With a step every `interval`, that is
//!
//! ```text
//! upper = floor(upper_fall / interval) + 1
//! lower = floor((lower_fall + lower_delay) / interval) + 2
//! ```
//!
//! Each pool additionally holds [`CACHE_FRAMES`] visible tiles.

use std::time::Duration;

use crate::error::FlapError;

/// Visible tiles queued ahead of the history window on each half.
pub const CACHE_FRAMES: usize = 2;

/// Durations of the two half-tile fall transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionTiming {
    /// How long the upper half takes to fall.
    pub upper_fall: Duration,
    /// How long the lower half takes to fall.
    pub lower_fall: Duration,
    /// Delay before the lower half starts falling.
    pub lower_delay: Duration,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            upper_fall: Duration::from_millis(120),
            lower_fall: Duration::from_millis(120),
            lower_delay: Duration::from_millis(120),
        }
    }
}

/// History window sizes for the upper and lower tile pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileWindows {
    pub upper: usize,
    pub lower: usize,
}

impl TileWindows {
    /// Derive window sizes for a step interval. Runs once per display.
    pub fn derive(timing: &TransitionTiming, interval: Duration) -> Result<Self, FlapError> {
        let step = interval.as_nanos();
        if step == 0 {
            return Err(FlapError::ZeroStepInterval);
        }
        let upper = timing.upper_fall.as_nanos() / step + 1;
        let lower = (timing.lower_fall + timing.lower_delay).as_nanos() / step + 2;
        Ok(Self {
            upper: saturate(upper),
            lower: saturate(lower),
        })
    }

    /// Total tiles held by the upper pool.
    #[must_use]
    pub const fn upper_capacity(&self) -> usize {
        self.upper + CACHE_FRAMES
    }

    /// Total tiles held by the lower pool.
    #[must_use]
    pub const fn lower_capacity(&self) -> usize {
        self.lower + CACHE_FRAMES
    }
}

fn saturate(value: u128) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Parse a CSS-style time value into whole milliseconds, rounding up.
///
/// Accepts `"110ms"`, `"0.18s"` and bare numbers (milliseconds).
///
/// ```
/// use std::time::Duration;
/// use splitflap_core::timing::parse_time;
///
/// assert_eq!(parse_time("0.18s"), Some(Duration::from_millis(180)));
/// assert_eq!(parse_time("110ms"), Some(Duration::from_millis(110)));
/// assert_eq!(parse_time("fast"), None);
/// ```
#[must_use]
pub fn parse_time(text: &str) -> Option<Duration> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number.parse().ok()?;
    let millis = match unit.trim().to_ascii_lowercase().as_str() {
        "s" => value * 1000.0,
        "ms" | "" => value,
        _ => return None,
    };
    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    // drop float noise below a microsecond so 0.18s is 180ms, not 181ms
    let millis = (millis * 1000.0).round() / 1000.0;
    Some(Duration::from_millis(millis.ceil() as u64))
}
