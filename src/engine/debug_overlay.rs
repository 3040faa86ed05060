use std::time::{Duration, Instant};

use egui::epaint::Shadow;

use super::scene::SceneStats;
use super::steering::DecisionTally;
use super::swarm::ShipSwarm;

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub resolution: (u32, u32),
    pub seed: Option<u64>,
    pub stars: usize,
    pub ships: usize,
    pub stuck_ships: usize,
    /// Steering decisions taken on the last tick.
    pub decisions: DecisionTally,
    /// Triangle vertices uploaded for the last frame.
    pub vertex_count: usize,
}

impl DebugStats {
    pub fn new(timing: &FrameTimes, scene: &SceneStats, resolution: (u32, u32), seed: Option<u64>, vertex_count: usize) -> Self {
        Self {
            fps: timing.fps(),
            frame_time_avg_ms: timing.avg_ms(),
            frame_time_min_ms: timing.min_ms(),
            frame_time_max_ms: timing.max_ms(),
            resolution,
            seed,
            stars: scene.stars,
            ships: scene.ships,
            stuck_ships: scene.stuck_ships,
            decisions: scene.decisions,
            vertex_count,
        }
    }
}

// ============================================================================
// FRAME TIMING
// ============================================================================

/// Frame durations gathered over one-second windows.
///
/// The published numbers only change once per window so the overlay text
/// stays readable.
pub struct FrameTimes {
    window_start: Instant,
    samples: Vec<f32>,
    fps: u32,
    avg_ms: f32,
    min_ms: f32,
    max_ms: f32,
}

impl FrameTimes {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            samples: Vec::with_capacity(240),
            fps: 0,
            avg_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        }
    }

    /// Record one frame. Returns true when a new window was published.
    pub fn record(&mut self, frame_time: Duration, now: Instant) -> bool {
        self.samples.push(frame_time.as_secs_f32() * 1000.0);
        if now.saturating_duration_since(self.window_start) < Self::WINDOW {
            return false;
        }

        let n = self.samples.len().max(1) as f32;
        self.fps = self.samples.len() as u32;
        self.avg_ms = self.samples.iter().sum::<f32>() / n;
        self.min_ms = self.samples.iter().copied().fold(f32::INFINITY, f32::min);
        self.max_ms = self.samples.iter().copied().fold(0.0, f32::max);
        self.samples.clear();
        self.window_start = now;
        true
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn avg_ms(&self) -> f32 {
        self.avg_ms
    }

    pub fn min_ms(&self) -> f32 {
        self.min_ms
    }

    pub fn max_ms(&self) -> f32 {
        self.max_ms
    }
}

// ============================================================================
// SHIP DEBUG DRAWS
// ============================================================================

/// One ship's debug draw data, already converted to egui screen points.
pub struct ShipDebugDraw {
    /// Ship position in egui screen points.
    pub pos: egui::Pos2,
    /// Tip of the heading arrow.
    pub heading_tip: egui::Pos2,
    /// Where the ship's follow target sits, if it has one.
    pub target: Option<egui::Pos2>,
    pub stuck: bool,
}

/// Heading arrow length in screen points.
const HEADING_ARROW_LEN: f32 = 24.0;

/// Build F4 draw data for every ship. `pixels_per_point` converts canvas
/// pixels to egui points.
pub fn ship_debug_draws(swarm: &ShipSwarm, pixels_per_point: f32) -> Vec<ShipDebugDraw> {
    let scale = 1.0 / pixels_per_point.max(f32::EPSILON);
    let to_pos = |v: glam::Vec2| egui::pos2(v.x * scale, v.y * scale);
    let ships = swarm.ships();

    ships
        .iter()
        .map(|ship| {
            let pos = to_pos(ship.position());
            let dir = glam::Vec2::from_angle(ship.heading()) * HEADING_ARROW_LEN;
            ShipDebugDraw {
                pos,
                heading_tip: pos + egui::vec2(dir.x, dir.y),
                target: ship
                    .target()
                    .and_then(|i| ships.get(i))
                    .map(|t| to_pos(t.position())),
                stuck: ship.is_stuck(),
            }
        })
        .collect()
}

// ============================================================================
// OVERLAY
// ============================================================================

pub struct DebugOverlay {
    pub visible: bool,
    pub show_ships: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            visible: false,
            show_ships: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn toggle_ships(&mut self) {
        self.show_ships = !self.show_ships;
    }

    /// Anything to draw this frame?
    pub fn is_active(&self) -> bool {
        self.visible || self.show_ships
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame:
    ///
    /// - `ship_draws`: F4 per-ship heading arrows and follow links (`None` = hidden).
    /// - `stats`: F3 stats panel (`None` = hidden).
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&DebugStats>,
        ship_draws: Option<&[ShipDebugDraw]>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            // ── F4: ship debug drawn on a background layer ───────────────────
            if let Some(draws) = ship_draws {
                let painter = ctx.layer_painter(egui::LayerId::new(
                    egui::Order::Background,
                    egui::Id::new("ship_debug"),
                ));
                let link_stroke = egui::Stroke::new(
                    1.0,
                    egui::Color32::from_rgba_unmultiplied(255, 220, 0, 120),
                );
                let heading_stroke = egui::Stroke::new(
                    2.0,
                    egui::Color32::from_rgba_unmultiplied(80, 255, 140, 220),
                );
                let stuck_color = egui::Color32::from_rgba_unmultiplied(255, 60, 60, 220);
                for draw in draws {
                    if let Some(target) = draw.target {
                        painter.line_segment([draw.pos, target], link_stroke);
                    }
                    painter.line_segment([draw.pos, draw.heading_tip], heading_stroke);
                    painter.circle_filled(
                        draw.heading_tip,
                        2.5,
                        egui::Color32::from_rgba_unmultiplied(80, 255, 140, 220),
                    );
                    if draw.stuck {
                        painter.circle_stroke(draw.pos, 10.0, egui::Stroke::new(2.0, stuck_color));
                    }
                }
            }

            // ── F3: stats panel ──────────────────────────────────────────────
            if let Some(stats) = stats {
                egui::Area::new(egui::Id::new("debug_overlay"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                            .inner_margin(egui::Margin::same(8.0))
                            .rounding(4.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.label(format!("FPS: {}", stats.fps));
                                ui.label(format!(
                                    "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                                    stats.frame_time_avg_ms,
                                    stats.frame_time_min_ms,
                                    stats.frame_time_max_ms
                                ));
                                ui.label(format!(
                                    "Resolution: {} x {}",
                                    stats.resolution.0, stats.resolution.1
                                ));
                                match stats.seed {
                                    Some(seed) => ui.label(format!("Seed: {seed}")),
                                    None => ui.label("Seed: entropy"),
                                };
                                ui.label(format!("Stars: {}", stats.stars));
                                ui.label(format!(
                                    "Ships: {}  stuck: {}",
                                    stats.ships, stats.stuck_ships
                                ));
                                let d = &stats.decisions;
                                ui.label(format!(
                                    "Steering: edge {}  escape {}  follow {}  wander {}",
                                    d.edge_avoid, d.stuck_escape, d.follow, d.wander
                                ));
                                ui.label(format!("Vertices: {}", stats.vertex_count));
                            });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::canvas::CanvasSize;
    use crate::engine::config::{ShipConfig, SwarmConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn frame_times_publish_once_per_window() {
        let start = Instant::now();
        let mut times = FrameTimes::new(start);
        let frame = Duration::from_millis(10);
        for i in 1..100u64 {
            assert!(!times.record(frame, start + Duration::from_millis(i * 10)));
        }
        assert!(times.record(Duration::from_millis(20), start + Duration::from_millis(1000)));
        assert_eq!(times.fps(), 100);
        assert!((times.min_ms() - 10.0).abs() < 1e-3);
        assert!((times.max_ms() - 20.0).abs() < 1e-3);
        assert!((times.avg_ms() - 10.1).abs() < 1e-3);
    }

    #[test]
    fn ship_draws_scale_to_points_and_link_targets() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let swarm_config = SwarmConfig {
            count: 3,
            ..Default::default()
        };
        let swarm = ShipSwarm::initialize(
            CanvasSize::new(800.0, 600.0),
            ShipConfig::default(),
            &swarm_config,
            &mut rng,
        );
        let draws = ship_debug_draws(&swarm, 2.0);
        assert_eq!(draws.len(), 3);
        for (draw, ship) in draws.iter().zip(swarm.ships()) {
            assert!((draw.pos.x - ship.position().x * 0.5).abs() < 1e-4);
            assert!((draw.pos.distance(draw.heading_tip) - HEADING_ARROW_LEN).abs() < 1e-3);
            assert!(!draw.stuck);
        }
        let next = swarm.ships()[1].position() * 0.5;
        let link = draws[0].target.unwrap();
        assert!((link.x - next.x).abs() < 1e-4 && (link.y - next.y).abs() < 1e-4);
    }
}
