// Ship swarm: an index-addressed arena of ships plus their shared config.
//
// Following is resolved through arena indices. Each tick the swarm first
// snapshots every ship's position, then updates ships one by one against
// that snapshot, so a ship never sees a sibling's half-finished frame and
// update order does not matter.

use std::f32::consts::{FRAC_PI_2, TAU};

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;

use super::canvas::{Canvas, CanvasSize};
use super::config::{Placement, ShipConfig, SwarmConfig};
use super::random::{symmetric, unit};
use super::ship::Ship;
use super::star_field::REFERENCE_FPS;
use super::steering::DecisionTally;
use super::trail::TrailStyle;

/// Half-width of the heading jitter used with `upward_bias`.
pub const UPWARD_JITTER: f32 = 0.25;

/// Fan layout: distance of the first ship above the bottom edge, as a
/// fraction of canvas height.
const FAN_BASE_FRACTION: f32 = 0.1;

#[derive(Resource, Debug)]
pub struct ShipSwarm {
    ships: Vec<Ship>,
    config: ShipConfig,
    trail_style: TrailStyle,
    bounds: CanvasSize,
    last_tally: DecisionTally,
}

impl ShipSwarm {
    /// Build `swarm.count` ships, then wire up follow targets once the
    /// whole arena exists.
    pub fn initialize<R: Rng + ?Sized>(
        bounds: CanvasSize,
        config: ShipConfig,
        swarm: &SwarmConfig,
        rng: &mut R,
    ) -> Self {
        let ships = (0..swarm.count)
            .map(|i| {
                let position = spawn_position(i, swarm, bounds, rng);
                let heading = spawn_heading(swarm, rng);
                Ship::new(i, position, heading)
            })
            .collect();

        let mut out = Self {
            ships,
            trail_style: TrailStyle::from_config(&config),
            config,
            bounds,
            last_tally: DecisionTally::default(),
        };
        out.assign_follow_targets();
        out
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ships_mut(&mut self) -> &mut [Ship] {
        &mut self.ships
    }

    pub fn config(&self) -> &ShipConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn stuck_count(&self) -> usize {
        self.ships.iter().filter(|s| s.is_stuck()).count()
    }

    /// Decisions taken during the most recent `tick`.
    pub fn last_tally(&self) -> DecisionTally {
        self.last_tally
    }

    pub fn assign_follow_targets(&mut self) {
        let count = self.ships.len();
        let explicit = self.config.follow_index;
        for ship in &mut self.ships {
            ship.set_target(follow_target(ship.index(), count, explicit));
        }
    }

    /// Update every ship against the start-of-frame snapshot, then draw.
    pub fn tick<C, R>(&mut self, dt: f32, canvas: &mut C, rng: &mut R) -> DecisionTally
    where
        C: Canvas + ?Sized,
        R: Rng + ?Sized,
    {
        let frame_scale = REFERENCE_FPS * dt;
        let snapshot: Vec<Vec2> = self.ships.iter().map(Ship::position).collect();

        let mut tally = DecisionTally::default();
        for ship in &mut self.ships {
            let target = ship.target().and_then(|i| snapshot.get(i).copied());
            let decision = ship.update(target, self.bounds, frame_scale, &self.config, rng);
            tally.record(&decision);
        }

        for ship in &self.ships {
            ship.draw(canvas, &self.config, &self.trail_style);
        }

        self.last_tally = tally;
        tally
    }
}

/// Follow target for ship `index`: the explicit index when it names another
/// ship, otherwise the next ship round the ring. A lone ship follows nobody.
pub fn follow_target(index: usize, count: usize, explicit: Option<usize>) -> Option<usize> {
    if count < 2 {
        return None;
    }
    match explicit {
        Some(target) if target != index && target < count => Some(target),
        _ => Some((index + 1) % count),
    }
}

fn spawn_position<R: Rng + ?Sized>(index: usize, swarm: &SwarmConfig, bounds: CanvasSize, rng: &mut R) -> Vec2 {
    // Centre the spread term so the formation is symmetric about the middle.
    let lane = index as f32 - (swarm.count.saturating_sub(1)) as f32 * 0.5;
    let (w, h) = (bounds.width, bounds.height);

    match swarm.placement {
        Placement::Fan => {
            let x = w * 0.5 + lane * swarm.spread;
            let y = h * (1.0 - FAN_BASE_FRACTION) - index as f32 * swarm.offset;
            Vec2::new(x, y).clamp(Vec2::ZERO, bounds.as_vec2())
        }
        Placement::Central => {
            let min = Vec2::new(w * 0.25, h * 0.25);
            let max = Vec2::new(w * 0.75, h * 0.75);
            let x = min.x + unit(rng) * w * 0.5 + lane * swarm.spread * 0.5;
            let y = min.y + unit(rng) * h * 0.5;
            Vec2::new(x, y).clamp(min, max)
        }
    }
}

fn spawn_heading<R: Rng + ?Sized>(swarm: &SwarmConfig, rng: &mut R) -> f32 {
    if swarm.upward_bias {
        -FRAC_PI_2 + symmetric(rng, UPWARD_JITTER)
    } else {
        unit(rng) * TAU
    }
}
