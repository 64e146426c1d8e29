#![forbid(unsafe_code)]

//! Split-flap display engine.
//!
//! # Role in splitflap
//! `splitflap-core` models a row of mechanical split-flap segments. It owns
//! no terminal and no clock: callers pass the current instant in, and tiles
//! are drawn through the [`TileRenderer`] seam. The `splitflap-clock` binary
//! is one such caller.
//!
//! # Primary responsibilities
//! - **GlyphSet**: the ordered alphabet a segment cycles through, plus the
//!   built-in [`catalog`].
//! - **Segment**: two tile pools and a forward-only convergence loop.
//! - **FlapDisplay**: grapheme splitting, per-segment timers, teardown.
//!
//! # How it fits together
//! [`FlapDisplay::set_value_at`] hands each [`Segment`] its target glyph.
//! Segments that need to move take their first step immediately and arm a
//! timer in the [`StepScheduler`]; [`FlapDisplay::poll`] fires due timers
//! until every segment has arrived.

pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod glyphs;
pub mod scheduler;
pub mod segment;
pub mod tile;
pub mod tile_pool;
pub mod timing;

pub use config::{ConfigError, ConfigParse, DisplayConfig, GlyphConfig, PositionSelector};
pub use display::FlapDisplay;
pub use error::{FlapError, RenderError};
pub use glyphs::GlyphSet;
pub use scheduler::StepScheduler;
pub use segment::{FlipOutcome, Segment, SegmentView, StepOutcome};
pub use tile::{Half, HeadlessRenderer, Tile, TileHandle, TilePhase, TileRenderer};
pub use tile_pool::TilePool;
pub use timing::{CACHE_FRAMES, TileWindows, TransitionTiming};
