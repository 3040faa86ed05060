// Scene configuration, optionally loaded from a TOML file.
//
// Every struct is `#[serde(default)]`, so a file only needs the keys it wants
// to override. Unknown keys are a parse error. `SceneConfig::validate` is the
// single gate between user input and the frame loop: anything that would
// turn into NaN or a division by zero later is rejected here.

use std::path::Path;

use serde::Deserialize;

use super::color::Rgb;
use super::error::{non_negative, positive, unit_interval, ConfigError, ConfigResult};

// ============================================================================
// SCENE
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Fixed RNG seed. `None` draws a fresh seed from the OS on every rebuild.
    pub seed: Option<u64>,
    pub stars: StarFieldConfig,
    pub ships: ShipConfig,
    pub swarm: SwarmConfig,
}

impl SceneConfig {
    /// Read, parse and validate a TOML config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: SceneConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.stars.enabled {
            self.stars.validate()?;
        }
        if self.swarm.enabled {
            self.swarm.validate()?;
            self.ships.validate()?;
            if let Some(index) = self.ships.follow_index {
                if index >= self.swarm.count {
                    return Err(ConfigError::FollowIndexOutOfRange {
                        index,
                        count: self.swarm.count,
                    });
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// STAR FIELD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StarColorMode {
    /// Every star uses `StarFieldConfig::color`.
    Single,
    /// Each star picks a random entry from `StarFieldConfig::palette`.
    Multi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StarFieldConfig {
    pub enabled: bool,
    pub count: usize,
    /// Depth units per 1/60 s.
    pub speed: f32,
    /// Disk radius of a star at zero depth, in pixels.
    pub size: f32,
    pub color_mode: StarColorMode,
    pub color: Rgb,
    pub palette: Vec<Rgb>,
}

impl Default for StarFieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 400,
            speed: 2.0,
            size: 2.5,
            color_mode: StarColorMode::Single,
            color: Rgb::WHITE,
            palette: vec![
                Rgb::WHITE,
                Rgb::new(0xff, 0xe9, 0xc4),
                Rgb::new(0xd4, 0xfb, 0xff),
                Rgb::new(0x9b, 0xb0, 0xff),
            ],
        }
    }
}

impl StarFieldConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        positive("stars.speed", self.speed)?;
        non_negative("stars.size", self.size)?;
        if self.color_mode == StarColorMode::Multi && self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(())
    }
}

// ============================================================================
// SHIPS
// ============================================================================

/// Per-ship behaviour. Shared by every ship in the swarm and immutable once
/// the swarm is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShipConfig {
    /// Pixels per 1/60 s.
    pub speed: f32,
    /// Body length in pixels.
    pub size: f32,
    pub color: Rgb,

    // ── Trail ────────────────────────────────────────────────────────────────
    pub tail_start_color: Rgb,
    pub tail_end_color: Rgb,
    /// Maximum number of stored trail samples.
    pub tail_length: usize,
    /// Trail drawing stops once this much path length has been covered.
    pub tail_max_distance: f32,
    /// Opacity of the newest trail segment.
    pub tail_opacity: f32,

    // ── Edge avoidance ───────────────────────────────────────────────────────
    pub edge_distance: f32,
    pub edge_curve_intensity: f32,

    // ── Wander ───────────────────────────────────────────────────────────────
    pub curve_intensity: f32,
    /// Per-tick probability of resampling the wander bias.
    pub curve_change_rate: f32,

    // ── Stuck recovery (in ticks) ────────────────────────────────────────────
    pub stuck_threshold: u32,
    pub stuck_escape_multiplier: f32,

    // ── Following ────────────────────────────────────────────────────────────
    pub follow_enabled: bool,
    pub follow_strength: f32,
    pub follow_distance: f32,
    /// Ship every other ship follows. `None` means "the next ship".
    pub follow_index: Option<usize>,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            size: 8.0,
            color: Rgb::WHITE,
            tail_start_color: Rgb::new(0x66, 0xcc, 0xff),
            tail_end_color: Rgb::new(0x1a, 0x1a, 0x66),
            tail_length: 80,
            tail_max_distance: 150.0,
            tail_opacity: 0.8,
            edge_distance: 100.0,
            edge_curve_intensity: 0.06,
            curve_intensity: 0.03,
            curve_change_rate: 0.02,
            stuck_threshold: 30,
            stuck_escape_multiplier: 3.0,
            follow_enabled: true,
            follow_strength: 0.02,
            follow_distance: 250.0,
            follow_index: None,
        }
    }
}

impl ShipConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        positive("ships.speed", self.speed)?;
        positive("ships.size", self.size)?;
        if self.tail_length == 0 {
            return Err(ConfigError::OutOfRange {
                field: "ships.tail_length",
                value: 0.0,
                expected: "at least 1 sample",
            });
        }
        positive("ships.tail_max_distance", self.tail_max_distance)?;
        unit_interval("ships.tail_opacity", self.tail_opacity)?;
        positive("ships.edge_distance", self.edge_distance)?;
        non_negative("ships.edge_curve_intensity", self.edge_curve_intensity)?;
        non_negative("ships.curve_intensity", self.curve_intensity)?;
        unit_interval("ships.curve_change_rate", self.curve_change_rate)?;
        if self.stuck_threshold == 0 {
            return Err(ConfigError::OutOfRange {
                field: "ships.stuck_threshold",
                value: 0.0,
                expected: "at least 1 tick",
            });
        }
        non_negative("ships.stuck_escape_multiplier", self.stuck_escape_multiplier)?;
        non_negative("ships.follow_strength", self.follow_strength)?;
        positive("ships.follow_distance", self.follow_distance)?;
        Ok(())
    }
}

// ============================================================================
// SWARM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Bottom-anchored fan: spread horizontally and stepped upward by index.
    Fan,
    /// Random inside the central half of the canvas plus an index offset.
    Central,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwarmConfig {
    pub enabled: bool,
    pub count: usize,
    pub placement: Placement,
    /// Horizontal distance between neighbouring ships at spawn.
    pub spread: f32,
    /// Vertical step between neighbouring ships in the fan layout.
    pub offset: f32,
    /// Start every ship pointing up (with a little jitter) instead of a
    /// uniformly random heading.
    pub upward_bias: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 6,
            placement: Placement::Central,
            spread: 60.0,
            offset: 15.0,
            upward_bias: false,
        }
    }
}

impl SwarmConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        non_negative("swarm.spread", self.spread)?;
        non_negative("swarm.offset", self.offset)?;
        Ok(())
    }
}
