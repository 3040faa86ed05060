// Fading ship trails.
//
// A trail is the ship's recent history, newest first. Rendering walks it
// from the ship backwards, accumulating path length: opacity falls off
// linearly with that length and the color blends from the start color to
// the end color over the first quarter of `tail_max_distance`.

use glam::Vec2;

use super::canvas::Canvas;
use super::color::Rgb;
use super::config::ShipConfig;

/// Trail stroke width as a fraction of ship body size.
pub const TRAIL_WIDTH_FRACTION: f32 = 0.3;

/// Fraction of `tail_max_distance` after which the trail is solid end color.
pub const COLOR_BLEND_FRACTION: f32 = 0.25;

/// One committed ship state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    pub position: Vec2,
    pub heading: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailStyle {
    pub start_color: Rgb,
    pub end_color: Rgb,
    pub max_distance: f32,
    pub opacity: f32,
    pub width: f32,
}

impl TrailStyle {
    pub fn from_config(config: &ShipConfig) -> Self {
        Self {
            start_color: config.tail_start_color,
            end_color: config.tail_end_color,
            max_distance: config.tail_max_distance,
            opacity: config.tail_opacity,
            width: config.size * TRAIL_WIDTH_FRACTION,
        }
    }

    /// Color for a point `distance` along the trail.
    pub fn color_at(&self, distance: f32) -> Rgb {
        let t = (distance / (self.max_distance * COLOR_BLEND_FRACTION)).min(1.0);
        self.start_color.lerp(self.end_color, t)
    }

    /// Opacity for a point `distance` along the trail.
    pub fn opacity_at(&self, distance: f32) -> f32 {
        (self.opacity * (1.0 - distance / self.max_distance)).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSegment {
    pub from: Vec2,
    pub to: Vec2,
    pub color: Rgb,
    pub opacity: f32,
    /// Path length from the head of the trail to `to`.
    pub distance: f32,
}

/// Build the visible segments for a newest-first list of points.
///
/// Stops once the accumulated length passes `max_distance` or the opacity
/// reaches zero. Non-finite points are skipped; the walk bridges over them.
pub fn trail_segments<I>(points: I, style: &TrailStyle) -> Vec<TrailSegment>
where
    I: IntoIterator<Item = Vec2>,
{
    let mut segments = Vec::new();
    let mut points = points.into_iter().filter(|p| {
        let ok = p.is_finite();
        if !ok {
            log::trace!("skipping non-finite trail sample {p:?}");
        }
        ok
    });

    let Some(mut prev) = points.next() else {
        return segments;
    };

    let mut cumulative = 0.0;
    for point in points {
        cumulative += prev.distance(point);
        if cumulative > style.max_distance {
            break;
        }
        let opacity = style.opacity_at(cumulative);
        if opacity <= 0.0 {
            break;
        }
        segments.push(TrailSegment {
            from: prev,
            to: point,
            color: style.color_at(cumulative),
            opacity,
            distance: cumulative,
        });
        prev = point;
    }
    segments
}

pub fn draw_trail<C: Canvas + ?Sized>(canvas: &mut C, segments: &[TrailSegment], style: &TrailStyle) {
    if segments.is_empty() {
        return;
    }
    canvas.set_line_width(style.width);
    for segment in segments {
        canvas.set_stroke(segment.color.with_alpha(segment.opacity));
        canvas.stroke_polyline(&[segment.from, segment.to]);
    }
}
