#![forbid(unsafe_code)]

//! Ordered, immutable glyph sets.
//!
//! A [`GlyphSet`] is the alphabet a segment cycles through. Index 0 is the
//! rest glyph: positions past the end of a supplied value flip to it.
//!
//! # Invariants
//!
//! 1. A set is never empty and never contains the empty string.
//! 2. Symbols are distinct (compared exactly, before any case folding).
//! 3. Clones share storage; a set is never mutated after construction.
//!
//! # Example
//!
//! ```
//! use splitflap_core::GlyphSet;
//!
//! let set = GlyphSet::from_chars(" 0123456789").unwrap();
//! assert_eq!(set.len(), 11);
//! assert_eq!(set.blank(), " ");
//! assert_eq!(set.position("7"), Some(8));
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::error::FlapError;

const NBSP: &str = "\u{a0}";

/// An ordered sequence of distinct displayable symbols.
#[derive(Clone, PartialEq, Eq)]
pub struct GlyphSet {
    glyphs: Arc<[Box<str>]>,
    case_insensitive: bool,
}

impl GlyphSet {
    /// Build a set from individual symbols. Symbols may span several
    /// characters (`"00"`, `"12"`).
    pub fn new<I, S>(glyphs: I) -> Result<Self, FlapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let glyphs: Vec<Box<str>> = glyphs
            .into_iter()
            .map(|g| g.into().into_boxed_str())
            .collect();
        if glyphs.is_empty() {
            return Err(FlapError::EmptyGlyphSet);
        }

        {
            let mut seen = HashSet::with_capacity(glyphs.len());
            for glyph in &glyphs {
                if glyph.is_empty() {
                    return Err(FlapError::EmptyGlyph);
                }
                if !seen.insert(&**glyph) {
                    return Err(FlapError::DuplicateGlyph(glyph.to_string()));
                }
            }
        }

        let has_lower = glyphs.iter().any(|g| g.chars().any(char::is_lowercase));
        let has_upper = glyphs.iter().any(|g| g.chars().any(char::is_uppercase));

        Ok(Self {
            glyphs: glyphs.into(),
            case_insensitive: !(has_lower && has_upper),
        })
    }

    /// Build a set with one symbol per grapheme cluster of `chars`.
    pub fn from_chars(chars: &str) -> Result<Self, FlapError> {
        Self::new(chars.graphemes(true))
    }

    pub(crate) fn single_space() -> Self {
        Self {
            glyphs: vec![Box::<str>::from(" ")].into(),
            case_insensitive: true,
        }
    }

    /// Number of symbols in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always false; kept for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The rest glyph (index 0).
    #[must_use]
    pub fn blank(&self) -> &str {
        &self.glyphs[0]
    }

    /// Symbol at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.glyphs.get(index).map(|g| &**g)
    }

    /// Symbol at `index` modulo the set length.
    #[must_use]
    pub fn cyclic(&self, index: usize) -> &str {
        &self.glyphs[index % self.glyphs.len()]
    }

    /// Whether matching ignores case. True unless the set carries both
    /// lowercase and uppercase letters.
    #[must_use]
    pub const fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Index of `glyph`, matching the whole symbol.
    #[must_use]
    pub fn position(&self, glyph: &str) -> Option<usize> {
        if let Some(exact) = self.glyphs.iter().position(|g| &**g == glyph) {
            return Some(exact);
        }
        if self.case_insensitive {
            let folded = glyph.to_lowercase();
            return self.glyphs.iter().position(|g| g.to_lowercase() == folded);
        }
        None
    }

    /// Whether `glyph` resolves to a symbol of this set.
    #[must_use]
    pub fn contains(&self, glyph: &str) -> bool {
        self.position(glyph).is_some()
    }

    /// Map a whitespace symbol the set lacks onto the set's own blank.
    ///
    /// Some sets spell their blank as a no-break space; callers feeding plain
    /// spaces should not have to know which.
    #[must_use]
    pub fn normalize<'a>(&self, glyph: &'a str) -> Cow<'a, str> {
        if !is_whitespace_glyph(glyph) || self.contains(glyph) {
            return Cow::Borrowed(glyph);
        }
        match self.glyphs.iter().find(|g| is_whitespace_glyph(g)) {
            Some(blank) => Cow::Owned(blank.to_string()),
            None => Cow::Borrowed(glyph),
        }
    }

    /// Iterate over symbols in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.glyphs.iter().map(|g| &**g)
    }

    /// Terminal cells needed to draw the widest symbol.
    #[must_use]
    pub fn cell_width(&self) -> usize {
        self.iter().map(UnicodeWidthStr::width).max().unwrap_or(0)
    }

    /// Forward distance from `from` to `to` through the cycle.
    #[must_use]
    pub fn forward_distance(&self, from: usize, to: usize) -> usize {
        let len = self.glyphs.len();
        (to % len + len - from % len) % len
    }
}

fn is_whitespace_glyph(glyph: &str) -> bool {
    glyph == " " || glyph == NBSP
}

impl fmt::Debug for GlyphSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlyphSet")
            .field("len", &self.glyphs.len())
            .field("blank", &self.blank())
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}

impl fmt::Display for GlyphSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for glyph in self.iter() {
            f.write_str(glyph)?;
        }
        Ok(())
    }
}
