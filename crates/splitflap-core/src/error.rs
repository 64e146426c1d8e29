#![forbid(unsafe_code)]

//! Error types for display construction and tile rendering.
//!
//! Construction is the only fallible public surface: once a
//! [`FlapDisplay`](crate::FlapDisplay) exists, runtime operations log
//! failures instead of returning them.

use std::fmt;

/// A tile renderer failed to create or update a tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    message: String,
}

impl RenderError {
    /// Create a render error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile render failed: {}", self.message)
    }
}

impl std::error::Error for RenderError {}

/// Errors from building glyph sets and displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlapError {
    /// A glyph set was built from zero symbols.
    EmptyGlyphSet,
    /// A glyph set contained the empty string as a symbol.
    EmptyGlyph,
    /// A symbol appears more than once in the same glyph set.
    DuplicateGlyph(String),
    /// A per-position glyph configuration listed no sets.
    EmptyGlyphConfig,
    /// The step interval was zero.
    ZeroStepInterval,
    /// The display was asked for zero segments.
    ZeroSegments,
    /// The renderer refused to create the initial tiles.
    Render(RenderError),
}

impl fmt::Display for FlapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGlyphSet => write!(f, "glyph set is empty"),
            Self::EmptyGlyph => write!(f, "glyph set contains an empty symbol"),
            Self::DuplicateGlyph(glyph) => write!(f, "duplicate glyph '{glyph}' in glyph set"),
            Self::EmptyGlyphConfig => write!(f, "per-position glyph configuration is empty"),
            Self::ZeroStepInterval => write!(f, "step interval must be greater than zero"),
            Self::ZeroSegments => write!(f, "display needs at least one segment"),
            Self::Render(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FlapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderError> for FlapError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}
