// Ship steering controllers.
//
// A ship's heading is driven by a priority chain evaluated once per tick:
//
//   stuck escape  >  edge avoidance  >  following  >  wander
//
// Each controller is a small function (or, for stuck detection, a small
// state holder) that produces a heading delta. `Ship::update` picks the
// first controller that fires and records which one it was as a
// `SteeringDecision`. Hard clamping to the canvas happens after integration
// and never touches the heading.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::canvas::CanvasSize;
use super::config::ShipConfig;
use super::random::{symmetric, unit};

/// Half-width of the random heading kick added when two or more edges are
/// near at once.
pub const CORNER_JITTER: f32 = 0.05;

/// Movement below this fraction of the expected per-tick step counts as
/// "not moving".
pub const STUCK_DISPLACEMENT_RATIO: f32 = 0.2;

/// Half-width of the heading perturbation applied by a stuck escape
/// (a full half turn overall).
pub const STUCK_ESCAPE_HALF_RANGE: f32 = FRAC_PI_2;

// ============================================================================
// ANGLES
// ============================================================================

/// Wrap an angle into [0, 2π). Non-finite input collapses to 0.
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Signed shortest rotation taking `from` onto `to`, in [-π, π).
pub fn shortest_angle_diff(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

/// -1, 0 or +1. Unlike `f32::signum`, zero maps to zero.
#[inline]
fn turn_sign(diff: f32) -> f32 {
    if diff > 0.0 {
        1.0
    } else if diff < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// ============================================================================
// DECISIONS
// ============================================================================

/// Which controller steered a ship this tick, and by how much.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteeringDecision {
    EdgeAvoid { delta: f32, near_edges: u8 },
    StuckEscape { delta: f32 },
    Follow { delta: f32 },
    Wander { delta: f32 },
}

impl SteeringDecision {
    pub fn heading_delta(&self) -> f32 {
        match *self {
            SteeringDecision::EdgeAvoid { delta, .. }
            | SteeringDecision::StuckEscape { delta }
            | SteeringDecision::Follow { delta }
            | SteeringDecision::Wander { delta } => delta,
        }
    }
}

/// Per-tick count of decisions across a swarm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionTally {
    pub edge_avoid: u32,
    pub stuck_escape: u32,
    pub follow: u32,
    pub wander: u32,
}

impl DecisionTally {
    pub fn record(&mut self, decision: &SteeringDecision) {
        match decision {
            SteeringDecision::EdgeAvoid { .. } => self.edge_avoid += 1,
            SteeringDecision::StuckEscape { .. } => self.stuck_escape += 1,
            SteeringDecision::Follow { .. } => self.follow += 1,
            SteeringDecision::Wander { .. } => self.wander += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.edge_avoid + self.stuck_escape + self.follow + self.wander
    }
}

// ============================================================================
// EDGE AVOIDANCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    /// Unit vector pointing away from this edge, into the canvas (+y is down).
    pub fn away(self) -> Vec2 {
        match self {
            Edge::Left => Vec2::X,
            Edge::Right => Vec2::NEG_X,
            Edge::Top => Vec2::Y,
            Edge::Bottom => Vec2::NEG_Y,
        }
    }

    fn perpendicular(self) -> [Edge; 2] {
        match self {
            Edge::Left | Edge::Right => [Edge::Top, Edge::Bottom],
            Edge::Top | Edge::Bottom => [Edge::Left, Edge::Right],
        }
    }

    fn distance(self, position: Vec2, bounds: CanvasSize) -> f32 {
        match self {
            Edge::Left => position.x,
            Edge::Right => bounds.width - position.x,
            Edge::Top => position.y,
            Edge::Bottom => bounds.height - position.y,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Consecutive ticks spent within `edge_distance` of each edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCounters {
    frames: [u32; 4],
}

impl EdgeCounters {
    pub fn get(&self, edge: Edge) -> u32 {
        self.frames[edge.slot()]
    }

    fn update(&mut self, edge: Edge, near: bool) {
        let slot = &mut self.frames[edge.slot()];
        *slot = if near { slot.saturating_add(1) } else { 0 };
    }
}

/// Bang-bang turn away from every edge closer than `edge_distance`.
///
/// Updates `counters` for all four edges. Returns `None` when no edge is
/// near, otherwise the summed heading delta and how many edges contributed.
pub fn edge_avoidance<R: Rng + ?Sized>(
    position: Vec2,
    heading: f32,
    bounds: CanvasSize,
    counters: &mut EdgeCounters,
    is_stuck: bool,
    config: &ShipConfig,
    rng: &mut R,
) -> Option<SteeringDecision> {
    let edge_distance = config.edge_distance;
    let near = Edge::ALL.map(|edge| edge.distance(position, bounds) < edge_distance);
    for (edge, &is_near) in Edge::ALL.iter().zip(near.iter()) {
        counters.update(*edge, is_near);
    }

    let near_edges = near.iter().filter(|&&n| n).count() as u8;
    if near_edges == 0 {
        return None;
    }

    let mut delta = 0.0;
    for (edge, _) in Edge::ALL.iter().zip(near.iter()).filter(|(_, n)| **n) {
        let distance_factor = (edge.distance(position, bounds) / edge_distance).clamp(0.0, 1.0);
        let mut strength = config.edge_curve_intensity * (1.0 - distance_factor);
        if counters.get(*edge) > config.stuck_threshold || is_stuck {
            strength *= config.stuck_escape_multiplier;
        }

        // In a corner, head diagonally out of it rather than straight along
        // the other wall.
        let mut away = edge.away();
        for other in edge.perpendicular() {
            if near[other.slot()] {
                away += other.away();
            }
        }
        let ideal = away.y.atan2(away.x);

        delta += turn_sign(shortest_angle_diff(heading, ideal)) * strength;
    }

    if near_edges >= 2 {
        delta += symmetric(rng, CORNER_JITTER);
    }

    Some(SteeringDecision::EdgeAvoid { delta, near_edges })
}

// ============================================================================
// STUCK DETECTION
// ============================================================================

/// Tracks how long a ship has been (nearly) stationary.
#[derive(Debug, Clone, Default)]
pub struct StuckDetector {
    frames: u32,
    stuck: bool,
    last_position: Option<Vec2>,
}

impl StuckDetector {
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    /// Feed the position at the start of a tick. `expected_step` is how far
    /// the ship should have moved since the previous observation.
    pub fn observe(&mut self, position: Vec2, expected_step: f32, threshold: u32) {
        if let Some(last) = self.last_position {
            let moved = position.distance(last);
            if moved < STUCK_DISPLACEMENT_RATIO * expected_step {
                self.frames = self.frames.saturating_add(1);
            } else {
                self.frames = self.frames.saturating_sub(2);
            }
            self.stuck = self.frames > threshold;
        }
        self.last_position = Some(position);
    }

    /// Stuck for more than twice the threshold.
    pub fn escape_due(&self, threshold: u32) -> bool {
        self.stuck && self.frames > threshold.saturating_mul(2)
    }

    /// Give an escape one full threshold window before it can re-trigger.
    pub fn reset_after_escape(&mut self, threshold: u32) {
        self.frames = threshold;
        self.stuck = false;
    }
}

/// Large random kick used to shake a ship loose.
pub fn stuck_escape<R: Rng + ?Sized>(rng: &mut R) -> SteeringDecision {
    SteeringDecision::StuckEscape {
        delta: symmetric(rng, STUCK_ESCAPE_HALF_RANGE),
    }
}

// ============================================================================
// FOLLOWING
// ============================================================================

/// Proportional turn toward `target`, stronger the closer it is. Returns
/// `None` when following is disabled, there is no target, or the target is
/// out of range (or exactly on top of the ship).
pub fn follow(
    position: Vec2,
    heading: f32,
    target: Option<Vec2>,
    config: &ShipConfig,
) -> Option<SteeringDecision> {
    if !config.follow_enabled {
        return None;
    }
    let target = target?;
    let offset = target - position;
    let distance = offset.length();
    if !(distance > 0.0 && distance < config.follow_distance) {
        return None;
    }

    let bearing = offset.y.atan2(offset.x);
    let diff = shortest_angle_diff(heading, bearing);
    let delta = diff * config.follow_strength * (1.0 - distance / config.follow_distance);
    Some(SteeringDecision::Follow { delta })
}

// ============================================================================
// WANDER
// ============================================================================

/// Persistent random walk: occasionally resample the bias, always apply it.
pub fn wander<R: Rng + ?Sized>(curve_value: &mut f32, config: &ShipConfig, rng: &mut R) -> SteeringDecision {
    if config.curve_change_rate > 0.0 && unit(rng) < config.curve_change_rate {
        *curve_value = symmetric(rng, config.curve_intensity * 0.5);
    }
    SteeringDecision::Wander { delta: *curve_value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const BOUNDS: CanvasSize = CanvasSize { width: 800.0, height: 600.0 };

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn normalize_wraps_into_range() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!((normalize_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-5);
        assert!((normalize_angle(TAU + 1.0) - 1.0).abs() < 1e-5);
        assert!(normalize_angle(-1e-9) < TAU);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
        for i in -50..50 {
            let a = normalize_angle(i as f32 * 0.77);
            assert!((0.0..TAU).contains(&a), "{a}");
        }
    }

    #[test]
    fn shortest_diff_picks_short_way() {
        assert!((shortest_angle_diff(0.1, TAU - 0.1) + 0.2).abs() < 1e-5);
        assert!((shortest_angle_diff(TAU - 0.1, 0.1) - 0.2).abs() < 1e-5);
        assert!((shortest_angle_diff(0.0, FRAC_PI_2) - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn no_edge_means_no_decision_and_counters_reset() {
        let config = ShipConfig::default();
        let mut counters = EdgeCounters::default();
        let mut rng = rng();
        edge_avoidance(Vec2::new(10.0, 300.0), 0.0, BOUNDS, &mut counters, false, &config, &mut rng);
        assert_eq!(counters.get(Edge::Left), 1);

        let decision = edge_avoidance(Vec2::new(400.0, 300.0), 0.0, BOUNDS, &mut counters, false, &config, &mut rng);
        assert!(decision.is_none());
        assert_eq!(counters, EdgeCounters::default());
    }

    #[test]
    fn left_edge_turns_toward_positive_x() {
        let config = ShipConfig::default();
        let mut counters = EdgeCounters::default();
        // Heading up-left (canvas y down): the short way round to 0 is
        // through 3π/2, i.e. a positive delta.
        let heading = 5.0 * PI / 4.0;
        let decision = edge_avoidance(Vec2::new(25.0, 300.0), heading, BOUNDS, &mut counters, false, &config, &mut rng())
            .unwrap();
        let SteeringDecision::EdgeAvoid { delta, near_edges } = decision else {
            panic!("expected edge avoidance, got {decision:?}");
        };
        assert_eq!(near_edges, 1);
        let expected = config.edge_curve_intensity * (1.0 - 25.0 / config.edge_distance);
        assert!((delta - expected).abs() < 1e-6, "{delta} vs {expected}");
    }

    #[test]
    fn strength_is_bang_bang_not_proportional() {
        let config = ShipConfig::default();
        let pos = Vec2::new(50.0, 300.0);
        let small = edge_avoidance(pos, 0.2, BOUNDS, &mut EdgeCounters::default(), false, &config, &mut rng()).unwrap();
        let large = edge_avoidance(pos, 2.5, BOUNDS, &mut EdgeCounters::default(), false, &config, &mut rng()).unwrap();
        assert!((small.heading_delta().abs() - large.heading_delta().abs()).abs() < 1e-6);
    }

    #[test]
    fn stuck_multiplies_edge_strength() {
        let config = ShipConfig::default();
        let pos = Vec2::new(50.0, 300.0);
        let normal = edge_avoidance(pos, PI, BOUNDS, &mut EdgeCounters::default(), false, &config, &mut rng()).unwrap();
        let stuck = edge_avoidance(pos, PI, BOUNDS, &mut EdgeCounters::default(), true, &config, &mut rng()).unwrap();
        let ratio = stuck.heading_delta() / normal.heading_delta();
        assert!((ratio - config.stuck_escape_multiplier).abs() < 1e-4);

        let mut counters = EdgeCounters::default();
        for _ in 0..=config.stuck_threshold {
            edge_avoidance(pos, PI, BOUNDS, &mut counters, false, &config, &mut rng());
        }
        assert!(counters.get(Edge::Left) > config.stuck_threshold);
        let lingering = edge_avoidance(pos, PI, BOUNDS, &mut counters, false, &config, &mut rng()).unwrap();
        assert!((lingering.heading_delta() - stuck.heading_delta()).abs() < 1e-6);
    }

    #[test]
    fn corner_steers_diagonally_out() {
        let config = ShipConfig {
            edge_curve_intensity: 0.5,
            ..Default::default()
        };
        // Near left + top, heading straight down (π/2). The diagonal ideal is
        // π/4 (down-right), so both edges should turn the ship clockwise
        // toward smaller angles, modulo the small corner jitter.
        let decision = edge_avoidance(
            Vec2::new(20.0, 20.0),
            FRAC_PI_2,
            BOUNDS,
            &mut EdgeCounters::default(),
            false,
            &config,
            &mut rng(),
        )
        .unwrap();
        let SteeringDecision::EdgeAvoid { delta, near_edges } = decision else {
            panic!("expected edge avoidance");
        };
        assert_eq!(near_edges, 2);
        let strength = 0.5 * (1.0 - 20.0 / config.edge_distance);
        assert!((delta + 2.0 * strength).abs() <= CORNER_JITTER + 1e-6, "{delta}");
    }

    #[test]
    fn stuck_detector_counts_and_decays() {
        let threshold = 10;
        let mut detector = StuckDetector::default();
        let p = Vec2::new(100.0, 100.0);

        // First observation only primes the detector.
        for _ in 0..=threshold + 1 {
            detector.observe(p, 2.0, threshold);
        }
        assert_eq!(detector.frames(), threshold + 1);
        assert!(detector.is_stuck());

        // Moving again decays twice as fast as it grew.
        let mut pos = p;
        let mut ticks = 0;
        while detector.frames() > 0 {
            pos.x += 2.0;
            detector.observe(pos, 2.0, threshold);
            ticks += 1;
        }
        assert_eq!(ticks, (threshold + 2) / 2);
        assert!(!detector.is_stuck());
    }

    #[test]
    fn escape_due_after_twice_threshold() {
        let threshold = 3;
        let mut detector = StuckDetector::default();
        let p = Vec2::ZERO;
        detector.observe(p, 1.0, threshold);
        for _ in 0..2 * threshold {
            detector.observe(p, 1.0, threshold);
            assert!(!detector.escape_due(threshold));
        }
        detector.observe(p, 1.0, threshold);
        assert!(detector.escape_due(threshold));

        detector.reset_after_escape(threshold);
        assert_eq!(detector.frames(), threshold);
        assert!(!detector.escape_due(threshold));
    }

    #[test]
    fn follow_is_proportional_and_ranged() {
        let config = ShipConfig {
            follow_strength: 0.5,
            follow_distance: 200.0,
            ..Default::default()
        };
        let pos = Vec2::new(100.0, 100.0);
        let close = follow(pos, 0.0, Some(Vec2::new(100.0, 150.0)), &config).unwrap();
        let far = follow(pos, 0.0, Some(Vec2::new(100.0, 250.0)), &config).unwrap();
        // Target straight below: bearing π/2.
        assert!((close.heading_delta() - FRAC_PI_2 * 0.5 * 0.75).abs() < 1e-5);
        assert!(close.heading_delta() > far.heading_delta());

        assert!(follow(pos, 0.0, Some(Vec2::new(100.0, 400.0)), &config).is_none());
        assert!(follow(pos, 0.0, Some(pos), &config).is_none());
        assert!(follow(pos, 0.0, None, &config).is_none());

        let disabled = ShipConfig { follow_enabled: false, ..config };
        assert!(follow(pos, 0.0, Some(Vec2::new(100.0, 150.0)), &disabled).is_none());
    }

    #[test]
    fn wander_keeps_bias_between_resamples() {
        let config = ShipConfig {
            curve_change_rate: 0.0,
            ..Default::default()
        };
        let mut curve = 0.01;
        for _ in 0..10 {
            assert_eq!(wander(&mut curve, &config, &mut rng()).heading_delta(), 0.01);
        }

        let always = ShipConfig {
            curve_change_rate: 1.0,
            curve_intensity: 0.4,
            ..Default::default()
        };
        let mut rng = rng();
        for _ in 0..100 {
            let delta = wander(&mut curve, &always, &mut rng).heading_delta();
            assert!((-0.2..0.2).contains(&delta));
            assert_eq!(delta, curve);
        }
    }

    #[test]
    fn tally_counts_each_kind() {
        let mut tally = DecisionTally::default();
        tally.record(&SteeringDecision::Follow { delta: 0.1 });
        tally.record(&SteeringDecision::Wander { delta: 0.0 });
        tally.record(&SteeringDecision::Wander { delta: 0.0 });
        assert_eq!(tally.follow, 1);
        assert_eq!(tally.wander, 2);
        assert_eq!(tally.total(), 3);
    }
}
