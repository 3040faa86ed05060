// Drawing surface abstraction.
//
// The simulation never talks to the GPU. It draws through `Canvas`, a small
// immediate-mode API in the spirit of a 2D canvas context: fill/stroke
// state, a save/restore transform stack, circles, polygons and polylines.
//
// `DrawList` records those calls so a frame can be produced inside the ECS
// schedule and replayed onto the real surface (or inspected by tests).

use bevy_ecs::prelude::*;
use glam::Vec2;

use super::color::Rgba;
use super::error::{ConfigError, ConfigResult};

// ============================================================================
// CANVAS SIZE
// ============================================================================

/// Canvas dimensions in pixels. Origin is top-left, +y points down.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(ConfigError::InvalidCanvas {
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

// ============================================================================
// CANVAS TRAIT
// ============================================================================

pub trait Canvas {
    /// Reset the given rectangle to the background.
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    fn set_fill(&mut self, color: Rgba);
    fn set_stroke(&mut self, color: Rgba);
    fn set_line_width(&mut self, width: f32);

    /// Push the current transform.
    fn save(&mut self);
    /// Pop back to the last saved transform. Unbalanced calls are ignored.
    fn restore(&mut self);
    fn translate(&mut self, offset: Vec2);
    fn rotate(&mut self, radians: f32);

    fn fill_circle(&mut self, center: Vec2, radius: f32);
    /// Fill a convex polygon given in current-transform coordinates.
    fn fill_polygon(&mut self, points: &[Vec2]);
    /// Stroke an open path with the current stroke color and line width.
    fn stroke_polyline(&mut self, points: &[Vec2]);
}

// ============================================================================
// DRAW LIST
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    ClearRect { x: f32, y: f32, width: f32, height: f32 },
    SetFill(Rgba),
    SetStroke(Rgba),
    SetLineWidth(f32),
    Save,
    Restore,
    Translate(Vec2),
    Rotate(f32),
    FillCircle { center: Vec2, radius: f32 },
    FillPolygon(Vec<Vec2>),
    StrokePolyline(Vec<Vec2>),
}

/// One frame's worth of recorded drawing.
#[derive(Resource, Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Issue every recorded command, in order, against `canvas`.
    pub fn replay<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        for command in &self.commands {
            match command {
                DrawCommand::ClearRect { x, y, width, height } => {
                    canvas.clear_rect(*x, *y, *width, *height)
                }
                DrawCommand::SetFill(color) => canvas.set_fill(*color),
                DrawCommand::SetStroke(color) => canvas.set_stroke(*color),
                DrawCommand::SetLineWidth(width) => canvas.set_line_width(*width),
                DrawCommand::Save => canvas.save(),
                DrawCommand::Restore => canvas.restore(),
                DrawCommand::Translate(offset) => canvas.translate(*offset),
                DrawCommand::Rotate(radians) => canvas.rotate(*radians),
                DrawCommand::FillCircle { center, radius } => canvas.fill_circle(*center, *radius),
                DrawCommand::FillPolygon(points) => canvas.fill_polygon(points),
                DrawCommand::StrokePolyline(points) => canvas.stroke_polyline(points),
            }
        }
    }
}

impl Canvas for DrawList {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::ClearRect { x, y, width, height });
    }

    fn set_fill(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::SetFill(color));
    }

    fn set_stroke(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::SetStroke(color));
    }

    fn set_line_width(&mut self, width: f32) {
        self.commands.push(DrawCommand::SetLineWidth(width));
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
    }

    fn rotate(&mut self, radians: f32) {
        self.commands.push(DrawCommand::Rotate(radians));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32) {
        self.commands.push(DrawCommand::FillCircle { center, radius });
    }

    fn fill_polygon(&mut self, points: &[Vec2]) {
        self.commands.push(DrawCommand::FillPolygon(points.to_vec()));
    }

    fn stroke_polyline(&mut self, points: &[Vec2]) {
        self.commands.push(DrawCommand::StrokePolyline(points.to_vec()));
    }
}
