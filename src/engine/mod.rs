// Engine module - star field, ship swarm and the pieces that draw them

pub mod canvas;
pub mod color;
pub mod config;
pub mod debug_overlay;
pub mod error;
pub mod random;
pub mod renderer;
pub mod resize;
pub mod scene;
pub mod shapes;
pub mod ship;
pub mod star_field;
pub mod steering;
pub mod swarm;
pub mod systems;
pub mod trail;

// Re-export commonly used items
pub use canvas::{Canvas, CanvasSize, DrawCommand, DrawList};
pub use color::{Rgb, Rgba};
pub use config::{Placement, SceneConfig, ShipConfig, StarColorMode, StarFieldConfig, SwarmConfig};
pub use error::{ConfigError, ConfigResult};
pub use scene::{Scene, SceneStats, MAX_FRAME_DT};
pub use steering::{DecisionTally, SteeringDecision};
