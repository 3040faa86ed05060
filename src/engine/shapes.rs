// CPU tessellation of canvas drawing into a triangle list.
//
// `ShapeBatch` is the `Canvas` the window host replays each frame's
// `DrawList` onto. Everything is flattened into colored triangles in pixel
// coordinates; the renderer uploads the whole batch and issues one draw.

use glam::{Affine2, Vec2};

use super::canvas::Canvas;
use super::color::Rgba;

// ============================================================================
// VERTEX DEFINITION
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeVertex {
    /// Pixel coordinates, origin top-left.
    pub position: [f32; 2],
    /// Straight RGBA in sRGB space.
    pub color: [f32; 4],
}

impl ShapeVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShapeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position (location 0)
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // Color (location 1)
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// ============================================================================
// SHAPE BATCH
// ============================================================================

const MIN_CIRCLE_SEGMENTS: usize = 8;
const MAX_CIRCLE_SEGMENTS: usize = 48;

/// Segment count for a circle of `radius` pixels. Tiny stars get octagons.
pub fn circle_segments(radius: f32) -> usize {
    ((radius * 4.0).ceil() as usize).clamp(MIN_CIRCLE_SEGMENTS, MAX_CIRCLE_SEGMENTS)
}

pub struct ShapeBatch {
    vertices: Vec<ShapeVertex>,
    viewport: Vec2,
    background: Rgba,
    fill: Rgba,
    stroke: Rgba,
    line_width: f32,
    transform: Affine2,
    saved: Vec<Affine2>,
}

impl ShapeBatch {
    pub fn new(viewport: Vec2, background: Rgba) -> Self {
        Self {
            vertices: Vec::new(),
            viewport,
            background,
            fill: Rgba::TRANSPARENT,
            stroke: Rgba::TRANSPARENT,
            line_width: 1.0,
            transform: Affine2::IDENTITY,
            saved: Vec::new(),
        }
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn vertices(&self) -> &[ShapeVertex] {
        &self.vertices
    }

    /// Drop all geometry and drawing state ahead of a new frame.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.transform = Affine2::IDENTITY;
        self.saved.clear();
    }

    fn point(&self, local: Vec2) -> [f32; 2] {
        self.transform.transform_point2(local).to_array()
    }

    fn triangle(&mut self, a: [f32; 2], b: [f32; 2], c: [f32; 2], color: Rgba) {
        let color = color.to_array();
        self.vertices.extend([
            ShapeVertex { position: a, color },
            ShapeVertex { position: b, color },
            ShapeVertex { position: c, color },
        ]);
    }
}

impl Canvas for ShapeBatch {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let covers = x <= 0.0 && y <= 0.0 && x + width >= self.viewport.x && y + height >= self.viewport.y;
        if covers {
            // The render pass clears to the background already.
            self.vertices.clear();
            return;
        }
        let corners = [
            Vec2::new(x, y),
            Vec2::new(x + width, y),
            Vec2::new(x + width, y + height),
            Vec2::new(x, y + height),
        ];
        let [a, b, c, d] = corners.map(|p| self.point(p));
        let background = self.background;
        self.triangle(a, b, c, background);
        self.triangle(a, c, d, background);
    }

    fn set_fill(&mut self, color: Rgba) {
        self.fill = color;
    }

    fn set_stroke(&mut self, color: Rgba) {
        self.stroke = color;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    fn save(&mut self) {
        self.saved.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.saved.pop() {
            self.transform = transform;
        }
    }

    fn translate(&mut self, offset: Vec2) {
        self.transform = self.transform * Affine2::from_translation(offset);
    }

    fn rotate(&mut self, radians: f32) {
        self.transform = self.transform * Affine2::from_angle(radians);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32) {
        if !(radius > 0.0) || !center.is_finite() {
            return;
        }
        let segments = circle_segments(radius);
        let c = self.point(center);
        let step = std::f32::consts::TAU / segments as f32;
        let rim = |i: usize| center + Vec2::from_angle(i as f32 * step) * radius;
        let fill = self.fill;
        for i in 0..segments {
            let a = self.point(rim(i));
            let b = self.point(rim(i + 1));
            self.triangle(c, a, b, fill);
        }
    }

    fn fill_polygon(&mut self, points: &[Vec2]) {
        if points.len() < 3 {
            return;
        }
        let fill = self.fill;
        let origin = self.point(points[0]);
        for pair in points[1..].windows(2) {
            let b = self.point(pair[0]);
            let c = self.point(pair[1]);
            self.triangle(origin, b, c, fill);
        }
    }

    fn stroke_polyline(&mut self, points: &[Vec2]) {
        let half = self.line_width * 0.5;
        if !(half > 0.0) {
            return;
        }
        let stroke = self.stroke;
        for pair in points.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let Some(dir) = (to - from).try_normalize() else {
                continue;
            };
            let offset = dir.perp() * half;
            let a = self.point(from + offset);
            let b = self.point(to + offset);
            let c = self.point(to - offset);
            let d = self.point(from - offset);
            self.triangle(a, b, c, stroke);
            self.triangle(a, c, d, stroke);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::color::Rgb;

    fn batch() -> ShapeBatch {
        ShapeBatch::new(Vec2::new(800.0, 600.0), Rgb::BLACK.opaque())
    }

    #[test]
    fn circle_segment_count_is_bounded() {
        assert_eq!(circle_segments(0.1), MIN_CIRCLE_SEGMENTS);
        assert_eq!(circle_segments(5.0), 20);
        assert_eq!(circle_segments(500.0), MAX_CIRCLE_SEGMENTS);
    }

    #[test]
    fn circle_is_a_triangle_fan() {
        let mut b = batch();
        b.set_fill(Rgb::WHITE.opaque());
        b.fill_circle(Vec2::new(10.0, 10.0), 1.0);
        assert_eq!(b.vertices().len(), MIN_CIRCLE_SEGMENTS * 3);
        for v in b.vertices() {
            let p = Vec2::from_array(v.position);
            assert!(p.distance(Vec2::new(10.0, 10.0)) <= 1.0 + 1e-4);
            assert_eq!(v.color, [1.0, 1.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn transform_stack_applies_and_restores() {
        let mut b = batch();
        b.save();
        b.translate(Vec2::new(100.0, 50.0));
        b.rotate(std::f32::consts::FRAC_PI_2);
        b.fill_polygon(&[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]);
        b.restore();
        b.fill_polygon(&[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]);

        let rotated = Vec2::from_array(b.vertices()[1].position);
        assert!(rotated.distance(Vec2::new(100.0, 60.0)) < 1e-4, "{rotated:?}");
        let plain = Vec2::from_array(b.vertices()[4].position);
        assert!(plain.distance(Vec2::new(10.0, 0.0)) < 1e-4, "{plain:?}");
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut b = batch();
        b.restore();
        b.fill_polygon(&[Vec2::ZERO, Vec2::X, Vec2::Y]);
        assert_eq!(b.vertices()[1].position, [1.0, 0.0]);
    }

    #[test]
    fn stroke_emits_quad_per_non_degenerate_segment() {
        let mut b = batch();
        b.set_line_width(2.0);
        b.stroke_polyline(&[Vec2::ZERO, Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]);
        assert_eq!(b.vertices().len(), 12);
        let ys: Vec<f32> = b.vertices()[..6].iter().map(|v| v.position[1]).collect();
        assert!(ys.iter().all(|y| (y.abs() - 1.0).abs() < 1e-5), "{ys:?}");
    }

    #[test]
    fn full_clear_drops_geometry_partial_clear_paints_background() {
        let mut b = batch();
        b.fill_polygon(&[Vec2::ZERO, Vec2::X, Vec2::Y]);
        b.clear_rect(0.0, 0.0, 800.0, 600.0);
        assert!(b.vertices().is_empty());

        b.clear_rect(10.0, 10.0, 20.0, 20.0);
        assert_eq!(b.vertices().len(), 6);
        assert!(b.vertices().iter().all(|v| v.color == [0.0, 0.0, 0.0, 1.0]));
    }
}
