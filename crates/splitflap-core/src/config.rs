#![forbid(unsafe_code)]

//! Display configuration.
//!
//! [`DisplayConfig`] is a plain builder. [`DisplayConfig::from_env`] layers
//! environment overrides on top of the defaults and reports every value it
//! could not use instead of failing.
//!
//! | Variable | Meaning | Example |
//! |----------|---------|---------|
//! | `SPLITFLAP_STEP` | step interval | `120ms` |
//! | `SPLITFLAP_UPPER_FALL` | upper half fall duration | `0.12s` |
//! | `SPLITFLAP_LOWER_FALL` | lower half fall duration | `120` |
//! | `SPLITFLAP_LOWER_DELAY` | lower half start delay | `120ms` |
//! | `SPLITFLAP_GLYPHS` | catalog set name | `digits` |
//! | `SPLITFLAP_SEGMENTS` | segment count | `8` |

use std::env;
use std::fmt;
use std::ops::Range;
use std::time::Duration;

use unicode_segmentation::UnicodeSegmentation;

use crate::catalog;
use crate::error::FlapError;
use crate::glyphs::GlyphSet;
use crate::timing::{TransitionTiming, parse_time};

pub const ENV_STEP: &str = "SPLITFLAP_STEP";
pub const ENV_UPPER_FALL: &str = "SPLITFLAP_UPPER_FALL";
pub const ENV_LOWER_FALL: &str = "SPLITFLAP_LOWER_FALL";
pub const ENV_LOWER_DELAY: &str = "SPLITFLAP_LOWER_DELAY";
pub const ENV_GLYPHS: &str = "SPLITFLAP_GLYPHS";
pub const ENV_SEGMENTS: &str = "SPLITFLAP_SEGMENTS";

/// Segment count used when neither a count nor an initial value is given.
pub const DEFAULT_SEGMENTS: usize = 5;

/// Step interval used unless configured.
pub const DEFAULT_STEP: Duration = Duration::from_millis(120);

/// Which positions a per-position glyph set applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionSelector {
    At(usize),
    Span(Range<usize>),
    List(Vec<usize>),
}

impl PositionSelector {
    #[must_use]
    pub fn matches(&self, position: usize) -> bool {
        match self {
            Self::At(at) => *at == position,
            Self::Span(range) => range.contains(&position),
            Self::List(list) => list.contains(&position),
        }
    }
}

/// Glyph sets for a display: one for every position, or one per selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphConfig {
    Uniform(GlyphSet),
    /// Positions no selector matches use the first set. When selectors
    /// overlap, the later entry wins.
    PerPosition(Vec<(PositionSelector, GlyphSet)>),
}

impl GlyphConfig {
    /// Resolve to exactly one set per position.
    pub fn resolve(&self, segments: usize) -> Result<Vec<GlyphSet>, FlapError> {
        match self {
            Self::Uniform(set) => Ok(vec![set.clone(); segments]),
            Self::PerPosition(entries) => {
                let (_, fallback) = entries.first().ok_or(FlapError::EmptyGlyphConfig)?;
                Ok((0..segments)
                    .map(|position| {
                        entries
                            .iter()
                            .rev()
                            .find(|(selector, _)| selector.matches(position))
                            .map_or(fallback, |(_, set)| set)
                            .clone()
                    })
                    .collect())
            }
        }
    }
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self::Uniform(catalog::alphanumeric())
    }
}

impl From<GlyphSet> for GlyphConfig {
    fn from(set: GlyphSet) -> Self {
        Self::Uniform(set)
    }
}

/// Everything needed to build a [`FlapDisplay`](crate::FlapDisplay).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    pub segments: Option<usize>,
    pub glyphs: GlyphConfig,
    pub initial: String,
    pub step_interval: Duration,
    pub timing: TransitionTiming,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            segments: None,
            glyphs: GlyphConfig::default(),
            initial: String::new(),
            step_interval: DEFAULT_STEP,
            timing: TransitionTiming::default(),
        }
    }
}

impl DisplayConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the number of segments.
    #[must_use]
    pub fn segments(mut self, count: usize) -> Self {
        self.segments = Some(count);
        self
    }

    #[must_use]
    pub fn glyphs(mut self, glyphs: impl Into<GlyphConfig>) -> Self {
        self.glyphs = glyphs.into();
        self
    }

    /// Value shown before the first update.
    #[must_use]
    pub fn initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = initial.into();
        self
    }

    #[must_use]
    pub fn step_interval(mut self, interval: Duration) -> Self {
        self.step_interval = interval;
        self
    }

    #[must_use]
    pub fn timing(mut self, timing: TransitionTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Number of segments to build: the explicit count, else the grapheme
    /// count of the initial value, else [`DEFAULT_SEGMENTS`].
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.unwrap_or_else(|| match self.initial.graphemes(true).count() {
            0 => DEFAULT_SEGMENTS,
            n => n,
        })
    }

    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> ConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Defaults overridden by `get`. Invalid values keep the default and are
    /// reported in [`ConfigParse::errors`].
    #[must_use]
    pub fn from_env_with<F>(mut get: F) -> ConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        let mut duration = |key: &str, field: &'static str, errors: &mut Vec<ConfigError>| {
            let value = get(key)?;
            match parse_time(&value) {
                Some(parsed) => Some((parsed, value)),
                None => {
                    errors.push(ConfigError::new(
                        field,
                        value,
                        "expected a duration like 120ms or 0.12s",
                    ));
                    None
                }
            }
        };

        if let Some((step, raw)) = duration(ENV_STEP, "step_interval", &mut errors) {
            if step.is_zero() {
                errors.push(ConfigError::new(
                    "step_interval",
                    raw,
                    "must be greater than zero",
                ));
            } else {
                config.step_interval = step;
            }
        }
        if let Some((value, _)) = duration(ENV_UPPER_FALL, "upper_fall", &mut errors) {
            config.timing.upper_fall = value;
        }
        if let Some((value, _)) = duration(ENV_LOWER_FALL, "lower_fall", &mut errors) {
            config.timing.lower_fall = value;
        }
        if let Some((value, _)) = duration(ENV_LOWER_DELAY, "lower_delay", &mut errors) {
            config.timing.lower_delay = value;
        }

        if let Some(value) = get(ENV_GLYPHS) {
            match catalog::by_name(&value) {
                Some(set) => config.glyphs = GlyphConfig::Uniform(set),
                None => errors.push(ConfigError::new(
                    "glyphs",
                    value,
                    format!("expected one of {}", catalog::names().join("|")),
                )),
            }
        }

        if let Some(value) = get(ENV_SEGMENTS) {
            match value.trim().parse::<usize>() {
                Ok(count) if count > 0 => config.segments = Some(count),
                _ => errors.push(ConfigError::new("segments", value, "expected positive integer")),
            }
        }

        ConfigParse { config, errors }
    }
}

/// Result of environment parsing: the usable config plus diagnostics.
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: DisplayConfig,
    pub errors: Vec<ConfigError>,
}

/// A configuration value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}
