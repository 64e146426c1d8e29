#![forbid(unsafe_code)]

//! Tiles and the rendering seam.
//!
//! The engine never draws anything itself. Every tile it keeps in a pool is
//! backed by an opaque [`TileHandle`] issued by a [`TileRenderer`], and every
//! phase change is reported back through the same trait.

use std::fmt;

use crate::error::RenderError;

/// Which half of a flap a tile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    Upper,
    Lower,
}

impl Half {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of a pooled tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TilePhase {
    /// History kept allocated but not shown.
    Hidden,
    /// Loaded ahead of the cursor, waiting to be shown.
    Queued,
    /// The tile under the cursor.
    Current,
    /// Left the cursor and is playing its exit transition.
    Falling,
}

/// Opaque identifier for a rendered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileHandle(pub u64);

/// One pooled tile: a glyph index plus its rendered handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub glyph: usize,
    pub phase: TilePhase,
    pub handle: TileHandle,
}

/// Creates, updates, and releases rendered tiles.
///
/// Implementations must treat a failed call as having had no effect; the
/// engine relies on that to keep its pools consistent.
pub trait TileRenderer {
    /// Render a new tile showing `glyph`, starting in `phase`.
    fn create(
        &mut self,
        half: Half,
        glyph: &str,
        phase: TilePhase,
    ) -> Result<TileHandle, RenderError>;

    /// Move a tile into `phase`.
    fn transition(
        &mut self,
        half: Half,
        handle: TileHandle,
        phase: TilePhase,
    ) -> Result<(), RenderError>;

    /// Release a tile that left its pool. Infallible: a release that cannot
    /// be honored is the renderer's own problem.
    fn release(&mut self, half: Half, handle: TileHandle);
}

/// In-memory renderer: sequential handles and live-tile accounting.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    next_handle: u64,
    live: usize,
    created: u64,
    released: u64,
    transitions: u64,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tiles created and not yet released.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.live
    }

    /// Tiles created over the renderer's lifetime.
    #[must_use]
    pub const fn created(&self) -> u64 {
        self.created
    }

    /// Tiles released over the renderer's lifetime.
    #[must_use]
    pub const fn released(&self) -> u64 {
        self.released
    }

    /// Phase changes applied over the renderer's lifetime.
    #[must_use]
    pub const fn transitions(&self) -> u64 {
        self.transitions
    }
}

impl TileRenderer for HeadlessRenderer {
    fn create(
        &mut self,
        _half: Half,
        _glyph: &str,
        _phase: TilePhase,
    ) -> Result<TileHandle, RenderError> {
        let handle = TileHandle(self.next_handle);
        self.next_handle += 1;
        self.created += 1;
        self.live += 1;
        Ok(handle)
    }

    fn transition(
        &mut self,
        _half: Half,
        _handle: TileHandle,
        _phase: TilePhase,
    ) -> Result<(), RenderError> {
        self.transitions += 1;
        Ok(())
    }

    fn release(&mut self, _half: Half, _handle: TileHandle) {
        self.released += 1;
        self.live = self.live.saturating_sub(1);
    }
}

impl<R: TileRenderer + ?Sized> TileRenderer for &mut R {
    fn create(
        &mut self,
        half: Half,
        glyph: &str,
        phase: TilePhase,
    ) -> Result<TileHandle, RenderError> {
        (**self).create(half, glyph, phase)
    }

    fn transition(
        &mut self,
        half: Half,
        handle: TileHandle,
        phase: TilePhase,
    ) -> Result<(), RenderError> {
        (**self).transition(half, handle, phase)
    }

    fn release(&mut self, half: Half, handle: TileHandle) {
        (**self).release(half, handle);
    }
}
