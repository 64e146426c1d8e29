#![forbid(unsafe_code)]

//! Built-in glyph sets.
//!
//! Character sets are listed as strings; numeric range sets are generated by
//! [`num_range`] and carry multi-character glyphs.

use crate::error::FlapError;
use crate::glyphs::GlyphSet;

pub const ALPHABETIC: &str = " ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const ALPHANUMERIC: &str = " ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const EXTENDED: &str = " ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%&*.?\"+-=/<>:)(";
pub const HUGE: &str =
    " abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%&*.?\"+-=/<>:)(";
pub const DECIMAL: &str = " 0123456789.";
pub const DIGITS: &str = " 0123456789";
pub const HEX: &str = " 0123456789ABCDEF";
pub const CLOCK: &str = " 0123456789:APM";

const NAMES: [&str; 11] = [
    "alphabetic",
    "alphanumeric",
    "extended",
    "huge",
    "decimal",
    "digits",
    "hex",
    "clock",
    "twelve",
    "twentyfour",
    "minutes",
];

/// Names accepted by [`by_name`], in catalog order.
#[must_use]
pub fn names() -> &'static [&'static str] {
    &NAMES
}

/// Look up a catalog set by name (case-insensitive).
#[must_use]
pub fn by_name(name: &str) -> Option<GlyphSet> {
    let chars = match name.trim().to_ascii_lowercase().as_str() {
        "alphabetic" => ALPHABETIC,
        "alphanumeric" => ALPHANUMERIC,
        "extended" => EXTENDED,
        "huge" => HUGE,
        "decimal" => DECIMAL,
        "digits" => DIGITS,
        "hex" => HEX,
        "clock" => CLOCK,
        "twelve" => return Some(twelve()),
        "twentyfour" => return Some(twentyfour()),
        "minutes" => return Some(minutes()),
        _ => return None,
    };
    GlyphSet::from_chars(chars).ok()
}

/// Inclusive numeric range as glyphs.
///
/// When `start` has a leading zero every entry is zero-padded to the width of
/// `start`, so `num_range("00", "59")` yields `"00"`, `"01"`, .. `"59"`.
///
/// # Errors
///
/// Unparseable bounds or an inverted range yield no glyphs and fail with
/// [`FlapError::EmptyGlyphSet`].
pub fn num_range(start: &str, end: &str) -> Result<GlyphSet, FlapError> {
    let width = if start.starts_with('0') { start.len() } else { 0 };
    let glyphs: Vec<String> = match (start.parse::<u32>(), end.parse::<u32>()) {
        (Ok(lo), Ok(hi)) if lo <= hi => (lo..=hi).map(|n| format!("{n:0width$}")).collect(),
        _ => Vec::new(),
    };
    GlyphSet::new(glyphs)
}

fn blank_fallback() -> GlyphSet {
    GlyphSet::single_space()
}

pub fn alphanumeric() -> GlyphSet {
    from_builtin(ALPHANUMERIC)
}

pub fn digits() -> GlyphSet {
    from_builtin(DIGITS)
}

pub fn clock() -> GlyphSet {
    from_builtin(CLOCK)
}

pub fn twelve() -> GlyphSet {
    num_range("1", "12").unwrap_or_else(|_| blank_fallback())
}

pub fn twentyfour() -> GlyphSet {
    num_range("0", "23").unwrap_or_else(|_| blank_fallback())
}

pub fn minutes() -> GlyphSet {
    num_range("00", "59").unwrap_or_else(|_| blank_fallback())
}

fn from_builtin(chars: &str) -> GlyphSet {
    GlyphSet::from_chars(chars).unwrap_or_else(|_| blank_fallback())
}
