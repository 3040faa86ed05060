// A single steered ship.
//
// Ships hold only their own state. Configuration is shared and lives on the
// swarm; sibling ships are referenced by arena index (`target`) and their
// positions are handed in by the swarm each tick.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;

use super::canvas::{Canvas, CanvasSize};
use super::config::ShipConfig;
use super::steering::{
    edge_avoidance, follow, normalize_angle, stuck_escape, wander, EdgeCounters, SteeringDecision, StuckDetector,
};
use super::trail::{draw_trail, trail_segments, TrailSample, TrailStyle};

#[derive(Debug, Clone)]
pub struct Ship {
    index: usize,
    position: Vec2,
    /// Radians in [0, 2π). 0 points along +x, π/2 points down the canvas.
    heading: f32,
    /// Persistent wander bias added to the heading every wander tick.
    curve_value: f32,
    /// Newest first.
    trail: VecDeque<TrailSample>,
    edge_counters: EdgeCounters,
    stuck: StuckDetector,
    target: Option<usize>,
}

impl Ship {
    pub fn new(index: usize, position: Vec2, heading: f32) -> Self {
        Self {
            index,
            position,
            heading: normalize_angle(heading),
            curve_value: 0.0,
            trail: VecDeque::new(),
            edge_counters: EdgeCounters::default(),
            stuck: StuckDetector::default(),
            target: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn curve_value(&self) -> f32 {
        self.curve_value
    }

    pub fn trail(&self) -> &VecDeque<TrailSample> {
        &self.trail
    }

    pub fn edge_counters(&self) -> &EdgeCounters {
        &self.edge_counters
    }

    pub fn stuck_frames(&self) -> u32 {
        self.stuck.frames()
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck.is_stuck()
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<usize>) {
        self.target = target;
    }

    /// Teleport without touching steering state. Used by spawn placement and
    /// to pin ships in tests.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn set_heading(&mut self, heading: f32) {
        self.heading = normalize_angle(heading);
    }

    /// Advance one tick.
    ///
    /// `target_position` is the followed ship's position as of the end of the
    /// previous tick. `frame_scale` is `60 · dt`.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        target_position: Option<Vec2>,
        bounds: CanvasSize,
        frame_scale: f32,
        config: &ShipConfig,
        rng: &mut R,
    ) -> SteeringDecision {
        let step = config.speed * frame_scale;
        let threshold = config.stuck_threshold;
        self.stuck.observe(self.position, step, threshold);

        // Edge counters advance every tick, even when an escape takes over.
        let edge = edge_avoidance(
            self.position,
            self.heading,
            bounds,
            &mut self.edge_counters,
            self.stuck.is_stuck(),
            config,
            rng,
        );

        // A due escape overrides every other controller, including edge
        // avoidance for a ship pinned against a wall.
        let decision = if self.stuck.escape_due(threshold) {
            log::debug!(
                "ship {} stuck for {} ticks at ({:.1}, {:.1}), escaping",
                self.index,
                self.stuck.frames(),
                self.position.x,
                self.position.y
            );
            self.stuck.reset_after_escape(threshold);
            stuck_escape(rng)
        } else if let Some(edge) = edge {
            edge
        } else if let Some(follow) = follow(self.position, self.heading, target_position, config) {
            follow
        } else {
            wander(&mut self.curve_value, config, rng)
        };

        let heading = self.heading + decision.heading_delta();
        self.position += Vec2::from_angle(heading) * step;
        self.heading = normalize_angle(heading);
        self.position = self.position.clamp(Vec2::ZERO, bounds.as_vec2());

        self.trail.push_front(TrailSample {
            position: self.position,
            heading: self.heading,
        });
        self.trail.truncate(config.tail_length);

        decision
    }

    /// Trail first, then the body on top.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C, config: &ShipConfig, style: &TrailStyle) {
        let segments = trail_segments(self.trail.iter().map(|s| s.position), style);
        draw_trail(canvas, &segments, style);
        self.draw_body(canvas, config);
    }

    fn draw_body<C: Canvas + ?Sized>(&self, canvas: &mut C, config: &ShipConfig) {
        let size = config.size;
        canvas.save();
        canvas.translate(self.position);
        canvas.rotate(self.heading);
        canvas.set_fill(config.color.opaque());
        // Dart pointing along +x; fan-triangulates cleanly from the nose.
        canvas.fill_polygon(&[
            Vec2::new(size, 0.0),
            Vec2::new(-size * 0.5, size * 0.5),
            Vec2::new(-size * 0.2, 0.0),
            Vec2::new(-size * 0.5, -size * 0.5),
        ]);
        canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::canvas::{DrawCommand, DrawList};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f32::consts::{PI, TAU};

    const BOUNDS: CanvasSize = CanvasSize { width: 800.0, height: 600.0 };

    fn quiet_config() -> ShipConfig {
        ShipConfig {
            curve_change_rate: 0.0,
            follow_enabled: false,
            ..Default::default()
        }
    }

    #[test]
    fn straight_line_without_edges_or_target() {
        let config = ShipConfig {
            speed: 1.0,
            edge_distance: 50.0,
            ..quiet_config()
        };
        let bounds = CanvasSize::new(2000.0, 2000.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ship = Ship::new(0, Vec2::new(1000.0, 1000.0), 0.7);
        let start = ship.position();

        for _ in 0..300 {
            let decision = ship.update(None, bounds, 1.0, &config, &mut rng);
            assert_eq!(decision, SteeringDecision::Wander { delta: 0.0 });
            assert_eq!(ship.heading(), normalize_angle(0.7));
        }

        let travelled = ship.position() - start;
        let expected = Vec2::from_angle(0.7) * 300.0;
        assert!(travelled.distance(expected) < 0.05, "{travelled:?} vs {expected:?}");
    }

    #[test]
    fn turns_away_from_left_edge() {
        let config = quiet_config();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut ship = Ship::new(0, Vec2::new(config.edge_distance / 2.0, 300.0), PI);

        let max_turn = config.edge_curve_intensity * config.stuck_escape_multiplier;
        let mut prev_cos = ship.heading().cos();
        let mut left_zone = false;
        for _ in 0..2000 {
            let decision = ship.update(None, BOUNDS, 1.0, &config, &mut rng);
            if ship.position().x > config.edge_distance {
                left_zone = true;
                break;
            }
            assert!(matches!(decision, SteeringDecision::EdgeAvoid { .. }), "{decision:?}");
            let cos = ship.heading().cos();
            // Monotonic until the bang-bang controller starts dithering
            // around the ideal heading.
            if prev_cos < max_turn.cos() {
                assert!(cos >= prev_cos - 1e-6, "heading turned back toward the wall: {prev_cos} -> {cos}");
            }
            prev_cos = cos;
        }
        assert!(left_zone, "ship never escaped the edge zone");
        assert!(ship.heading().cos() > 0.0);
    }

    #[test]
    fn first_tick_turns_toward_positive_x() {
        let config = quiet_config();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ship = Ship::new(0, Vec2::new(config.edge_distance / 2.0, 300.0), PI);
        ship.update(None, BOUNDS, 1.0, &config, &mut rng);
        assert!(ship.heading().cos() > PI.cos());
    }

    #[test]
    fn heading_and_position_invariants_hold() {
        let config = ShipConfig {
            curve_change_rate: 0.5,
            curve_intensity: 1.5,
            speed: 6.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut ship = Ship::new(0, Vec2::new(5.0, 5.0), 3.9);
        for i in 0..5000 {
            let target = Some(Vec2::new((i % 800) as f32, 300.0));
            ship.update(target, BOUNDS, 1.0, &config, &mut rng);
            let h = ship.heading();
            let p = ship.position();
            assert!((0.0..TAU).contains(&h), "heading {h}");
            assert!((0.0..=800.0).contains(&p.x) && (0.0..=600.0).contains(&p.y), "{p:?}");
        }
    }

    #[test]
    fn trail_is_capped() {
        let config = ShipConfig {
            tail_length: 25,
            ..quiet_config()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ship = Ship::new(0, Vec2::new(400.0, 300.0), 0.0);
        for tick in 1..=500 {
            ship.update(None, BOUNDS, 1.0, &config, &mut rng);
            assert_eq!(ship.trail().len(), tick.min(25));
        }
        assert_eq!(ship.trail()[0].position, ship.position());
    }

    #[test]
    fn held_ship_becomes_stuck_then_recovers() {
        let config = ShipConfig {
            stuck_threshold: 10,
            ..quiet_config()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let pin = Vec2::new(400.0, 300.0);
        let mut ship = Ship::new(0, pin, 0.0);

        for _ in 0..12 {
            ship.set_position(pin);
            ship.update(None, BOUNDS, 1.0, &config, &mut rng);
        }
        assert_eq!(ship.stuck_frames(), 11);
        assert!(ship.is_stuck());

        let mut ticks = 0;
        while ship.stuck_frames() > 0 {
            ship.update(None, BOUNDS, 1.0, &config, &mut rng);
            ticks += 1;
            assert!(ticks <= 6, "decay too slow");
        }
        assert_eq!(ticks, 6);
        assert!(!ship.is_stuck());
    }

    #[test]
    fn long_stuck_triggers_single_escape() {
        let config = ShipConfig {
            stuck_threshold: 5,
            ..quiet_config()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let pin = Vec2::new(400.0, 300.0);
        let mut ship = Ship::new(0, pin, 0.0);

        let mut escapes = 0;
        for _ in 0..12 {
            ship.set_position(pin);
            let decision = ship.update(None, BOUNDS, 1.0, &config, &mut rng);
            if matches!(decision, SteeringDecision::StuckEscape { .. }) {
                escapes += 1;
                assert_eq!(ship.stuck_frames(), config.stuck_threshold);
                assert!(decision.heading_delta().abs() <= std::f32::consts::FRAC_PI_2);
            }
        }
        assert_eq!(escapes, 1);
    }

    #[test]
    fn ship_pinned_in_corner_still_escapes() {
        let config = ShipConfig {
            stuck_threshold: 5,
            ..quiet_config()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut ship = Ship::new(0, Vec2::ZERO, PI);

        let mut escapes = 0;
        for _ in 0..40 {
            ship.set_position(Vec2::ZERO);
            let decision = ship.update(None, BOUNDS, 1.0, &config, &mut rng);
            if matches!(decision, SteeringDecision::StuckEscape { .. }) {
                escapes += 1;
                assert_eq!(ship.stuck_frames(), config.stuck_threshold);
            }
            assert!(ship.stuck_frames() <= 2 * config.stuck_threshold + 1);
            assert!(ship.edge_counters().get(crate::engine::steering::Edge::Left) > 0);
        }
        assert!(escapes >= 2, "escapes = {escapes}");
    }

    #[test]
    fn follows_target_in_range() {
        let config = ShipConfig {
            curve_change_rate: 0.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut ship = Ship::new(0, Vec2::new(400.0, 300.0), 0.0);
        let decision = ship.update(Some(Vec2::new(400.0, 400.0)), BOUNDS, 1.0, &config, &mut rng);
        assert!(matches!(decision, SteeringDecision::Follow { delta } if delta > 0.0));
    }

    #[test]
    fn edge_outranks_follow() {
        let config = ShipConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut ship = Ship::new(0, Vec2::new(10.0, 300.0), PI);
        let decision = ship.update(Some(Vec2::new(5.0, 320.0)), BOUNDS, 1.0, &config, &mut rng);
        assert!(matches!(decision, SteeringDecision::EdgeAvoid { .. }));
    }

    #[test]
    fn draws_trail_then_transformed_body() {
        let config = quiet_config();
        let style = TrailStyle::from_config(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut ship = Ship::new(0, Vec2::new(400.0, 300.0), 0.0);
        for _ in 0..5 {
            ship.update(None, BOUNDS, 1.0, &config, &mut rng);
        }

        let mut canvas = DrawList::new();
        ship.draw(&mut canvas, &config, &style);
        let commands = canvas.commands();
        let save = commands.iter().position(|c| *c == DrawCommand::Save).unwrap();
        assert!(commands[..save].iter().any(|c| matches!(c, DrawCommand::StrokePolyline(_))));
        assert_eq!(commands[save + 1], DrawCommand::Translate(ship.position()));
        assert_eq!(commands[save + 2], DrawCommand::Rotate(ship.heading()));
        assert_eq!(commands.last(), Some(&DrawCommand::Restore));
    }
}
