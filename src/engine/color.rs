// Color types shared by the star field, ships and trails.
// Configured colors are `#rrggbb` / `#rgb` hex strings parsed up front;
// drawing uses straight-alpha `Rgba` in [0, 1].

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::error::ConfigError;

/// 8-bit RGB color as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation in RGB space. `t` is clamped to [0, 1], so
    /// `lerp(a, b, 0.0) == a` and `lerp(a, b, 1.0) == b` exactly.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| -> u8 {
            let a = a as f32;
            let b = b as f32;
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
        }
    }

    pub fn with_alpha(self, alpha: f32) -> Rgba {
        Rgba {
            r: self.r as f32 / 255.0,
            g: self.g as f32 / 255.0,
            b: self.b as f32 / 255.0,
            a: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn opaque(self) -> Rgba {
        self.with_alpha(1.0)
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &'static str| ConfigError::InvalidColor {
            value: s.to_string(),
            reason,
        };

        let digits = s.trim().strip_prefix('#').ok_or_else(|| invalid("missing leading '#'"))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("non-hex digit"));
        }

        match digits.len() {
            6 => {
                let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
                match (byte(0), byte(2), byte(4)) {
                    (Ok(r), Ok(g), Ok(b)) => Ok(Rgb::new(r, g, b)),
                    _ => Err(invalid("non-hex digit")),
                }
            }
            3 => {
                // #abc is shorthand for #aabbcc
                let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).map(|n| n * 17);
                match (nibble(0), nibble(1), nibble(2)) {
                    (Ok(r), Ok(g), Ok(b)) => Ok(Rgb::new(r, g, b)),
                    _ => Err(invalid("non-hex digit")),
                }
            }
            _ => Err(invalid("expected 3 or 6 hex digits")),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Straight (non-premultiplied) RGBA color used by every `Canvas`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
