#![forbid(unsafe_code)]

//! A row of segments driven by per-segment step timers.
//!
//! [`FlapDisplay`] owns its segments, the tile renderer, and a
//! [`StepScheduler`]. Setting a value hands one glyph to each segment; each
//! segment then converges on its own chain of one-shot timers, so segments
//! that start at different distances settle at different times and flip out
//! of phase with one another.
//!
//! The display never reads a clock by itself except in the convenience
//! wrappers ([`set_value`](FlapDisplay::set_value),
//! [`poll_now`](FlapDisplay::poll_now)). Everything else takes `now`, so tests
//! can drive it with a virtual clock.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use splitflap_core::{DisplayConfig, FlapDisplay, GlyphSet, HeadlessRenderer};
//! use web_time::Instant;
//!
//! let config = DisplayConfig::new()
//!     .glyphs(GlyphSet::from_chars(" 0123456789:").unwrap())
//!     .initial("00:00");
//! let mut display = FlapDisplay::new(config, HeadlessRenderer::new()).unwrap();
//!
//! let t0 = Instant::now();
//! display.set_value_at("12:34", t0);
//! assert_eq!(display.value(), "12:34");
//!
//! display.poll(t0 + Duration::from_secs(2));
//! assert!(display.is_settled());
//! ```

use std::time::Duration;

use tracing::{debug, debug_span, info};
use unicode_segmentation::UnicodeSegmentation;
use web_time::Instant;

use crate::config::DisplayConfig;
use crate::error::FlapError;
use crate::scheduler::StepScheduler;
use crate::segment::{FlipOutcome, Segment, SegmentView, StepOutcome};
use crate::tile::{HeadlessRenderer, TileRenderer};
use crate::timing::TileWindows;

/// A split-flap display of fixed width.
pub struct FlapDisplay<R: TileRenderer = HeadlessRenderer> {
    segments: Vec<Segment>,
    renderer: R,
    scheduler: StepScheduler,
    windows: TileWindows,
    step_interval: Duration,
    torn_down: bool,
}

impl<R: TileRenderer> FlapDisplay<R> {
    /// Build a display from `config`, rendering tiles through `renderer`.
    ///
    /// Fails if the glyph configuration is empty, the step interval is zero,
    /// the segment count is zero, or the renderer cannot create the initial
    /// tiles.
    pub fn new(config: DisplayConfig, mut renderer: R) -> Result<Self, FlapError> {
        let count = config.segment_count();
        if count == 0 {
            return Err(FlapError::ZeroSegments);
        }
        let windows = TileWindows::derive(&config.timing, config.step_interval)?;
        let sets = config.glyphs.resolve(count)?;
        let initial: Vec<&str> = config.initial.graphemes(true).collect();

        let mut segments = Vec::with_capacity(count);
        for (position, set) in sets.into_iter().enumerate() {
            let glyph = initial.get(position).copied();
            match Segment::new(set, glyph, windows, &mut renderer) {
                Ok(segment) => segments.push(segment),
                Err(err) => {
                    for segment in &mut segments {
                        segment.release(&mut renderer);
                    }
                    return Err(err);
                }
            }
        }

        info!(
            segments = count,
            step_ms = config.step_interval.as_millis() as u64,
            upper_window = windows.upper,
            lower_window = windows.lower,
            "flap display created"
        );

        Ok(Self {
            segments,
            renderer,
            scheduler: StepScheduler::new(count),
            windows,
            step_interval: config.step_interval,
            torn_down: false,
        })
    }

    /// The most recently requested value, one glyph per segment.
    ///
    /// This reflects requests, not what is currently visible, so it is stable
    /// while tiles are still flipping.
    #[must_use]
    pub fn value(&self) -> String {
        self.segments.iter().map(Segment::target).collect()
    }

    /// What the segments currently show.
    #[must_use]
    pub fn visible(&self) -> String {
        self.segments.iter().map(Segment::visible).collect()
    }

    /// Request `value` using the wall clock.
    pub fn set_value(&mut self, value: &str) {
        self.set_value_at(value, Instant::now());
    }

    /// Request `value`, one grapheme per segment, as of `now`.
    ///
    /// Extra graphemes are dropped; missing positions flip to their set's
    /// rest glyph. Glyphs a segment cannot show leave that segment alone.
    pub fn set_value_at(&mut self, value: &str, now: Instant) {
        let glyphs: Vec<&str> = value.graphemes(true).collect();
        self.set_glyphs_at(&glyphs, now);
    }

    /// Request one glyph per position. Use this for sets whose glyphs span
    /// several characters.
    pub fn set_glyphs_at(&mut self, glyphs: &[&str], now: Instant) {
        if self.torn_down {
            debug!("set on torn-down display ignored");
            return;
        }
        for position in 0..self.segments.len() {
            let segment = &mut self.segments[position];
            let requested = match glyphs.get(position) {
                Some(glyph) => segment.glyph_set().normalize(glyph).into_owned(),
                None => segment.glyph_set().blank().to_string(),
            };
            match segment.flip_to(&requested, &mut self.renderer) {
                FlipOutcome::Started => {
                    self.scheduler.schedule(position, now + self.step_interval);
                }
                FlipOutcome::Ignored => {
                    debug!(position, glyph = %requested, "glyph not in segment set");
                }
                FlipOutcome::Settled | FlipOutcome::Redirected | FlipOutcome::Stalled => {}
            }
        }
    }

    /// Fire every timer due at `now`, returning the number of steps taken.
    ///
    /// A continuing loop is re-armed one interval after the deadline that
    /// fired, so infrequent polling replays missed ticks in order.
    pub fn poll(&mut self, now: Instant) -> usize {
        if self.torn_down {
            return 0;
        }
        let _span = debug_span!("flap_poll", pending = self.scheduler.pending()).entered();

        let mut steps = 0;
        while let Some((position, deadline)) = self.scheduler.pop_due(now) {
            let Some(segment) = self.segments.get_mut(position) else {
                continue;
            };
            if segment.tick(&mut self.renderer) == StepOutcome::Continue {
                steps += 1;
                self.scheduler
                    .schedule(position, deadline + self.step_interval);
            }
        }
        steps
    }

    /// [`poll`](Self::poll) with the wall clock.
    pub fn poll_now(&mut self) -> usize {
        self.poll(Instant::now())
    }

    /// When the next step is due, if any loop is running.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Whether every segment shows its target and no loop is running.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.scheduler.is_idle() && self.segments.iter().all(Segment::is_settled)
    }

    /// Cancel every pending step and release all tiles. Safe to call more
    /// than once; also runs on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let cancelled = self.scheduler.cancel_all();
        for segment in &mut self.segments {
            segment.release(&mut self.renderer);
        }
        let segments = self.segments.len();
        self.segments.clear();
        self.torn_down = true;
        info!(segments, cancelled, "flap display torn down");
    }

    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn segment(&self, position: usize) -> Option<&Segment> {
        self.segments.get(position)
    }

    /// Drawing views, left to right.
    pub fn views(&self) -> impl Iterator<Item = SegmentView<'_>> {
        self.segments.iter().map(Segment::view)
    }

    #[must_use]
    pub const fn windows(&self) -> TileWindows {
        self.windows
    }

    #[must_use]
    pub const fn step_interval(&self) -> Duration {
        self.step_interval
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Steps still needed before the display settles, summed over segments.
    #[must_use]
    pub fn remaining_steps(&self) -> usize {
        self.segments.iter().map(Segment::remaining).sum()
    }
}

impl<R: TileRenderer> Drop for FlapDisplay<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<R: TileRenderer> std::fmt::Debug for FlapDisplay<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlapDisplay")
            .field("value", &self.value())
            .field("visible", &self.visible())
            .field("windows", &self.windows)
            .field("step_interval", &self.step_interval)
            .field("pending", &self.scheduler.pending())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
