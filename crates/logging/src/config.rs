//! Verbosity configuration built from `-v` counts and `--debug` tokens.

use std::fmt;

use super::levels::{DebugFlag, DebugLevels};

/// Error returned when a `--debug` token cannot be applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagError {
    /// The token was empty.
    Empty,
    /// The trailing digits did not form a level.
    InvalidLevel(String),
    /// The flag name is not one of [`DebugFlag::ALL`], `all` or `none`.
    UnknownFlag(String),
}

impl fmt::Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty debug flag token"),
            Self::InvalidLevel(token) => write!(f, "invalid level in debug flag: {token}"),
            Self::UnknownFlag(name) => write!(f, "unknown debug flag: {name}"),
        }
    }
}

impl std::error::Error for FlagError {}

/// Combined verbosity configuration.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Debug flag levels.
    pub debug: DebugLevels,
}

impl VerbosityConfig {
    /// Create a configuration from a `-v` count.
    ///
    /// `0` keeps every flag off, `1` enables `walk`, `2` adds `queue` and
    /// `flow`, and `3` or more enables everything at level 2.
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        match level {
            0 => {}
            1 => {
                config.debug.walk = 1;
            }
            2 => {
                config.debug.walk = 2;
                config.debug.queue = 1;
                config.debug.flow = 1;
            }
            _ => {
                config.debug.set_all(2);
            }
        }
        config
    }

    /// Apply a comma-separated list of debug tokens (e.g. `walk,flow2`).
    pub fn apply_debug_flags(&mut self, list: &str) -> Result<(), FlagError> {
        list.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .try_for_each(|token| self.apply_debug_flag(token))
    }

    /// Apply a single debug flag token (e.g. `queue2`, `fs`, `all`, `none`).
    pub fn apply_debug_flag(&mut self, token: &str) -> Result<(), FlagError> {
        let (name, level) = parse_flag_token(token)?;
        match name.to_ascii_lowercase().as_str() {
            "all" => self.debug.set_all(level),
            "none" => self.debug.set_all(0),
            other => {
                let flag = DebugFlag::from_name(other)
                    .ok_or_else(|| FlagError::UnknownFlag(name.to_string()))?;
                self.debug.set(flag, level);
            }
        }
        Ok(())
    }

    /// Renders the configuration as `EnvFilter` directives.
    ///
    /// Everything defaults to `warn`. An enabled flag raises its target to
    /// `debug` at level 1 and `trace` from level 2. Targets whose macros only
    /// emit at trace level get `trace` from level 1.
    #[must_use]
    pub fn to_env_filter_directives(&self) -> String {
        let mut directives = String::from("warn");
        for flag in DebugFlag::ALL {
            let level = self.debug.get(flag);
            if level == 0 {
                continue;
            }
            let filter = if level >= 2 || flag != DebugFlag::Walk {
                "trace"
            } else {
                "debug"
            };
            directives.push(',');
            directives.push_str(flag.target());
            directives.push('=');
            directives.push_str(filter);
        }
        directives
    }
}

/// Parse a flag token like `queue2` into `("queue", 2)` or `walk` into `("walk", 1)`.
fn parse_flag_token(token: &str) -> Result<(&str, u8), FlagError> {
    if token.is_empty() {
        return Err(FlagError::Empty);
    }

    match token.find(|c: char| c.is_ascii_digit()) {
        Some(pos) => {
            let level = token[pos..]
                .parse::<u8>()
                .map_err(|_| FlagError::InvalidLevel(token.to_string()))?;
            Ok((&token[..pos], level))
        }
        None => Ok((token, 1)),
    }
}
