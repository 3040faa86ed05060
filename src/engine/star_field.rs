// Receding star field.
//
// Stars live in canvas-centred coordinates with a depth `z` in (0, width].
// Each tick they are perspective-projected and drawn, then pulled toward the
// viewer; a star whose depth runs out is respawned at the back in place.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;

use super::canvas::{Canvas, CanvasSize};
use super::color::Rgb;
use super::config::{StarColorMode, StarFieldConfig};
use super::random::{index, unit};

/// Motion constants are expressed per 1/60 s.
pub const REFERENCE_FPS: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Canvas-centred position at depth `z`.
    pub position: Vec2,
    pub z: f32,
    pub color: Rgb,
}

#[derive(Resource, Debug)]
pub struct StarField {
    stars: Vec<Star>,
    size: CanvasSize,
    config: StarFieldConfig,
}

impl StarField {
    /// Populate `config.count` stars spread over the whole canvas at random
    /// depths in (0, width].
    pub fn initialize<R: Rng + ?Sized>(size: CanvasSize, config: StarFieldConfig, rng: &mut R) -> Self {
        let mut field = Self {
            stars: Vec::with_capacity(config.count),
            size,
            config,
        };
        for _ in 0..field.config.count {
            let mut star = field.spawn(rng);
            // (0, width]: unit() never returns 1.0
            star.z = size.width * (1.0 - unit(rng));
            field.stars.push(star);
        }
        field
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Draw every star, then advance depth by `speed · 60 · dt`.
    pub fn tick<C, R>(&mut self, dt: f32, canvas: &mut C, rng: &mut R)
    where
        C: Canvas + ?Sized,
        R: Rng + ?Sized,
    {
        self.draw(canvas);

        let step = self.config.speed * REFERENCE_FPS * dt;
        for i in 0..self.stars.len() {
            self.stars[i].z -= step;
            if self.stars[i].z <= 0.0 {
                self.stars[i] = self.spawn(rng);
            }
        }
    }

    /// Project a star to screen space. Returns the disk centre and radius.
    pub fn project(&self, star: &Star) -> (Vec2, f32) {
        let w = self.size.width;
        let h = self.size.height;
        let screen = self.size.center() + Vec2::new(star.position.x / star.z * w, star.position.y / star.z * h);
        let radius = (self.config.size * (1.0 - star.z / w)).max(0.0);
        (screen, radius)
    }

    fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        let mut current_fill: Option<Rgb> = None;
        for star in &self.stars {
            let (screen, radius) = self.project(star);
            if radius <= 0.0 || !self.on_screen(screen, radius) {
                continue;
            }
            if current_fill != Some(star.color) {
                canvas.set_fill(star.color.opaque());
                current_fill = Some(star.color);
            }
            canvas.fill_circle(screen, radius);
        }
    }

    fn on_screen(&self, p: Vec2, radius: f32) -> bool {
        p.x >= -radius
            && p.y >= -radius
            && p.x <= self.size.width + radius
            && p.y <= self.size.height + radius
    }

    /// A fresh star at the back of the field.
    fn spawn<R: Rng + ?Sized>(&self, rng: &mut R) -> Star {
        let position = Vec2::new(
            (unit(rng) - 0.5) * self.size.width,
            (unit(rng) - 0.5) * self.size.height,
        );
        let color = match self.config.color_mode {
            StarColorMode::Single => self.config.color,
            StarColorMode::Multi => self
                .config
                .palette
                .get(index(rng, self.config.palette.len().max(1)))
                .copied()
                .unwrap_or(self.config.color),
        };
        Star {
            position,
            z: self.size.width,
            color,
        }
    }
}
