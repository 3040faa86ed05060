// ECS systems for one scene frame.
// Run in a fixed chain: clear the frame, draw/advance stars, then ships.

use bevy_ecs::prelude::*;

use super::canvas::{Canvas, CanvasSize, DrawList};
use super::random::SceneRng;
use super::star_field::StarField;
use super::steering::DecisionTally;
use super::swarm::ShipSwarm;

/// Elapsed time for the frame being simulated.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct FrameTime {
    /// Seconds since the previous tick, already sanitized by the scene.
    pub delta: f32,
    /// Ticks since the last (re)initialization.
    pub frame: u64,
}

/// Steering decisions taken by the swarm on the last tick.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SteeringStats(pub DecisionTally);

/// Start a fresh display list covering the whole canvas.
pub fn begin_frame_system(size: Res<CanvasSize>, mut draw: ResMut<DrawList>) {
    draw.clear();
    draw.clear_rect(0.0, 0.0, size.width, size.height);
}

/// Draw stars, then pull them toward the viewer.
pub fn star_field_system(
    time: Res<FrameTime>,
    field: Option<ResMut<StarField>>,
    mut rng: ResMut<SceneRng>,
    mut draw: ResMut<DrawList>,
) {
    let Some(mut field) = field else { return };
    field.tick(time.delta, &mut *draw, &mut rng.0);
}

/// Steer every ship, then draw trails and bodies.
pub fn ship_swarm_system(
    time: Res<FrameTime>,
    swarm: Option<ResMut<ShipSwarm>>,
    mut rng: ResMut<SceneRng>,
    mut draw: ResMut<DrawList>,
    mut stats: ResMut<SteeringStats>,
) {
    let Some(mut swarm) = swarm else {
        stats.0 = DecisionTally::default();
        return;
    };
    stats.0 = swarm.tick(time.delta, &mut *draw, &mut rng.0);
}
