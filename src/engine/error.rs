// Configuration errors.
//
// Everything that can go wrong is caught while loading or validating a
// `SceneConfig`. Once a scene is built the per-frame path never fails.

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for `SceneConfig`.
    Parse(toml::de::Error),

    /// Canvas dimensions must both be positive and finite.
    InvalidCanvas { width: f32, height: f32 },

    /// A numeric option is outside the range the simulation can handle.
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// A color string is not `#rgb` / `#rrggbb` hex.
    InvalidColor {
        value: String,
        reason: &'static str,
    },

    /// `follow_index` names a ship that does not exist.
    FollowIndexOutOfRange { index: usize, count: usize },

    /// Multi-color star mode was selected without any palette entries.
    EmptyPalette,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config '{}': {}", path, source)
            }
            ConfigError::Parse(err) => write!(f, "failed to parse config: {}", err),
            ConfigError::InvalidCanvas { width, height } => write!(
                f,
                "canvas size {} x {} is invalid (both dimensions must be > 0)",
                width, height
            ),
            ConfigError::OutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "option '{}' = {} is out of range (expected {})",
                field, value, expected
            ),
            ConfigError::InvalidColor { value, reason } => {
                write!(f, "invalid color {:?}: {}", value, reason)
            }
            ConfigError::FollowIndexOutOfRange { index, count } => write!(
                f,
                "follow_index {} does not name a ship (swarm has {} ships)",
                index, count
            ),
            ConfigError::EmptyPalette => {
                write!(f, "multi-color stars need at least one palette color")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ── Validation helpers ───────────────────────────────────────────────────────

/// Rejects negative or non-finite values.
pub fn non_negative(field: &'static str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
            expected: "[0, ∞)",
        })
    }
}

/// Rejects zero, negative or non-finite values.
pub fn positive(field: &'static str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
            expected: "(0, ∞)",
        })
    }
}

/// Rejects values outside [0, 1].
pub fn unit_interval(field: &'static str, value: f32) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
            expected: "[0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_reject_nan() {
        assert!(non_negative("speed", f32::NAN).is_err());
        assert!(positive("edge_distance", f32::NAN).is_err());
        assert!(unit_interval("tail_opacity", f32::NAN).is_err());
    }

    #[test]
    fn helpers_accept_bounds() {
        assert!(non_negative("speed", 0.0).is_ok());
        assert!(positive("edge_distance", 0.0).is_err());
        assert!(unit_interval("tail_opacity", 0.0).is_ok());
        assert!(unit_interval("tail_opacity", 1.0).is_ok());
        assert!(unit_interval("tail_opacity", 1.01).is_err());
    }

    #[test]
    fn display_names_the_field() {
        let err = positive("follow_distance", -3.0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("follow_distance"), "{msg}");
        assert!(msg.contains("-3"), "{msg}");
    }
}
