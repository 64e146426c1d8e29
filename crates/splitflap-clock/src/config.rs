#![forbid(unsafe_code)]

//! Clock settings from the environment.
//!
//! The display variables understood by [`DisplayConfig::from_env_with`] still
//! apply, except that the clock face fixes its own glyph layout and width.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SPLITFLAP_TYPOGRAPHY` | `mono` or `proportional` | `mono` |
//! | `SPLITFLAP_CLOCK` | `12` or `24` | `12` |
//! | `SPLITFLAP_LOG` | tracing filter directives | `info` |
//! | `SPLITFLAP_LOG_FILE` | log destination; logging is off without it | unset |

use std::env;
use std::path::PathBuf;

use splitflap_core::{ConfigError, DisplayConfig};

use crate::clock::ClockFormat;
use crate::widget::Typography;

pub const ENV_TYPOGRAPHY: &str = "SPLITFLAP_TYPOGRAPHY";
pub const ENV_CLOCK: &str = "SPLITFLAP_CLOCK";
pub const ENV_LOG: &str = "SPLITFLAP_LOG";
pub const ENV_LOG_FILE: &str = "SPLITFLAP_LOG_FILE";

#[derive(Debug, Clone)]
pub struct ClockConfig {
    pub display: DisplayConfig,
    pub typography: Typography,
    pub format: ClockFormat,
    pub log_file: Option<PathBuf>,
}

/// Parsed settings plus every value that had to be ignored.
#[derive(Debug, Clone)]
pub struct ClockConfigParse {
    pub config: ClockConfig,
    pub errors: Vec<ConfigError>,
}

impl ClockConfig {
    #[must_use]
    pub fn from_env() -> ClockConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn from_env_with<F>(mut get: F) -> ClockConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let display = DisplayConfig::from_env_with(&mut get);
        let mut errors = display.errors;

        let typography = match get(ENV_TYPOGRAPHY) {
            None => Typography::default(),
            Some(value) => Typography::parse(&value).unwrap_or_else(|| {
                errors.push(ConfigError::new("typography", value, "expected mono|proportional"));
                Typography::default()
            }),
        };

        let format = match get(ENV_CLOCK) {
            None => ClockFormat::default(),
            Some(value) => ClockFormat::parse(&value).unwrap_or_else(|| {
                errors.push(ConfigError::new("clock", value, "expected 12|24"));
                ClockFormat::default()
            }),
        };

        let log_file = get(ENV_LOG_FILE)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        ClockConfigParse {
            config: ClockConfig {
                display: display.config,
                typography,
                format,
                log_file,
            },
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    fn parse(pairs: &[(&str, &str)]) -> ClockConfigParse {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        ClockConfig::from_env_with(|key| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_without_environment() {
        let parse = parse(&[]);
        assert!(parse.errors.is_empty());
        assert_eq!(parse.config.typography, Typography::Mono);
        assert_eq!(parse.config.format, ClockFormat::Twelve);
        assert_eq!(parse.config.log_file, None);
    }

    #[test]
    fn clock_and_display_variables_combine() {
        let parse = parse(&[
            (ENV_TYPOGRAPHY, "proportional"),
            (ENV_CLOCK, "24"),
            (ENV_LOG_FILE, "/tmp/flap.log"),
            ("SPLITFLAP_STEP", "80ms"),
        ]);
        assert!(parse.errors.is_empty(), "{:?}", parse.errors);
        assert_eq!(parse.config.typography, Typography::Proportional);
        assert_eq!(parse.config.format, ClockFormat::TwentyFour);
        assert_eq!(parse.config.log_file, Some(PathBuf::from("/tmp/flap.log")));
        assert_eq!(parse.config.display.step_interval, Duration::from_millis(80));
    }

    #[test]
    fn bad_values_are_reported() {
        let parse = parse(&[(ENV_TYPOGRAPHY, "serif"), (ENV_CLOCK, "13"), ("SPLITFLAP_STEP", "x")]);
        let fields: Vec<&str> = parse.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["step_interval", "typography", "clock"]);
        assert_eq!(parse.config.typography, Typography::Mono);
    }
}
