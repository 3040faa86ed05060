// Scene: the host-facing entry point.
//
// Owns a bevy_ecs `World` holding the star field, the swarm, the RNG and the
// frame's draw list as resources, plus a single-threaded schedule that runs
// the frame systems in order. Hosts call `initialize` once (and again after
// a resize), `tick` once per animation frame, and replay `draw_list` onto
// their surface.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

use super::canvas::{CanvasSize, DrawList};
use super::config::SceneConfig;
use super::error::ConfigResult;
use super::random::SceneRng;
use super::star_field::StarField;
use super::steering::DecisionTally;
use super::swarm::ShipSwarm;
use super::systems::{begin_frame_system, ship_swarm_system, star_field_system, FrameTime, SteeringStats};

/// Longest frame the simulation will integrate. Longer gaps (a minimised
/// window, a debugger pause) are dropped rather than caught up.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Read-only summary for overlays and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneStats {
    pub frame: u64,
    pub stars: usize,
    pub ships: usize,
    pub stuck_ships: usize,
    pub decisions: DecisionTally,
}

pub struct Scene {
    world: World,
    schedule: Schedule,
    config: SceneConfig,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// An empty scene. Nothing is simulated until `initialize` succeeds.
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(DrawList::new());
        world.insert_resource(FrameTime::default());
        world.insert_resource(SteeringStats::default());

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems((begin_frame_system, star_field_system, ship_swarm_system).chain());

        Self {
            world,
            schedule,
            config: SceneConfig::default(),
        }
    }

    /// Validate `config` against `size` and rebuild every population from
    /// scratch. On error the previous scene is left untouched.
    pub fn initialize(&mut self, size: CanvasSize, config: SceneConfig) -> ConfigResult<()> {
        size.validate()?;
        config.validate()?;

        let mut rng = SceneRng::new(config.seed);

        self.world.remove_resource::<StarField>();
        self.world.remove_resource::<ShipSwarm>();

        if config.stars.enabled {
            let field = StarField::initialize(size, config.stars.clone(), &mut rng.0);
            self.world.insert_resource(field);
        }
        if config.swarm.enabled {
            let swarm = ShipSwarm::initialize(size, config.ships.clone(), &config.swarm, &mut rng.0);
            self.world.insert_resource(swarm);
        }

        self.world.insert_resource(rng);
        self.world.insert_resource(size);
        self.world.insert_resource(FrameTime::default());
        self.world.insert_resource(SteeringStats::default());
        self.world.resource_mut::<DrawList>().clear();
        self.config = config;

        let stats = self.stats();
        log::info!(
            "Scene initialized at {}x{}: {} stars, {} ships",
            size.width,
            size.height,
            stats.stars,
            stats.ships
        );
        Ok(())
    }

    /// Rebuild with the current config for a new canvas size.
    pub fn rebuild(&mut self, size: CanvasSize) -> ConfigResult<()> {
        let config = self.config.clone();
        self.initialize(size, config)
    }

    pub fn is_initialized(&self) -> bool {
        self.world.contains_resource::<CanvasSize>()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn canvas_size(&self) -> Option<CanvasSize> {
        self.world.get_resource::<CanvasSize>().copied()
    }

    /// Advance and draw one frame. A missed call simply means a missed
    /// frame of motion. A non-finite `dt` skips the frame entirely and keeps
    /// the previous drawing.
    pub fn tick(&mut self, dt: f32) {
        if !self.is_initialized() {
            return;
        }
        if !dt.is_finite() {
            log::warn!("skipping frame with non-finite dt {dt}");
            return;
        }
        let delta = dt.clamp(0.0, MAX_FRAME_DT);
        {
            let mut time = self.world.resource_mut::<FrameTime>();
            time.delta = delta;
            time.frame += 1;
        }
        self.schedule.run(&mut self.world);
    }

    /// Drawing recorded by the last `tick`.
    pub fn draw_list(&self) -> &DrawList {
        self.world.resource::<DrawList>()
    }

    pub fn star_field(&self) -> Option<&StarField> {
        self.world.get_resource::<StarField>()
    }

    pub fn swarm(&self) -> Option<&ShipSwarm> {
        self.world.get_resource::<ShipSwarm>()
    }

    pub fn stats(&self) -> SceneStats {
        let swarm = self.swarm();
        SceneStats {
            frame: self.world.resource::<FrameTime>().frame,
            stars: self.star_field().map_or(0, StarField::len),
            ships: swarm.map_or(0, ShipSwarm::len),
            stuck_ships: swarm.map_or(0, ShipSwarm::stuck_count),
            decisions: self.world.resource::<SteeringStats>().0,
        }
    }
}
