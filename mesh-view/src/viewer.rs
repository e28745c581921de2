//! Interactive growth mesh viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation [`Engine`] and
//! the start-up [`Settings`] and implements [`eframe::App`] to render and
//! control the simulation through an egui UI.

use std::time::{Duration, Instant};

use eframe::App;
use glam::Vec2;
use mesh_core::{
    config::{Config, CrowdTracking, DeathRule, GrowthPolicy},
    engine::Engine,
    mesh::NodeStatus,
    types::NodeId,
};
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::headless::SLOW_TICK;
use crate::settings::Settings;

/// How edges are coloured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    /// Hue cycles with the edge's age.
    Age,
    /// Dark grey between dead nodes, red between crowded ones, green otherwise.
    Status,
}

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`Engine`] and the [`Settings`] it is rebuilt from.
/// - UI configuration (pan/zoom, colour scheme, timing).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render the mesh.
///
/// ### Fields
/// - `engine` - Simulation being displayed.
/// - `settings` - Ring size, jitter and the config edited in the side panel.
/// - `rng` - Random number generator used for jittered rings on reset.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `last_new_ids` - Nodes created in the last simulation step (for highlighting).
/// - `color_scheme` - How edges are coloured.
/// - `show_points` - Whether nodes are drawn on top of the edges.
/// - `batch_ticks` - Number of ticks run by the "Batch" button.
/// - `config_error` - Why the last config edit or reset was rejected, if it was.
///
/// - `step_interval` - Target time step between automatic simulation steps (seconds).
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_step_dt` - Actual time delta between the last two steps (for display only).
/// - `last_step_cost` - Wall-clock time spent inside the last step or batch.
pub struct Viewer {
    engine: Engine,
    settings: Settings,
    rng: StdRng,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    last_new_ids: Vec<NodeId>,
    color_scheme: ColorScheme,
    show_points: bool,
    batch_ticks: u64,
    config_error: Option<String>,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
    last_step_cost: Duration,
}

/// Converts an HSL colour (`h` in degrees, `s` and `l` in `[0, 1]`) to RGB.
fn hsl(h: f32, s: f32, l: f32) -> egui::Color32 {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    egui::Color32::from_rgb(channel(r), channel(g), channel(b))
}

impl Viewer {
    /// Creates a viewer around a fresh ring built from `settings`.
    ///
    /// The camera starts zoomed so the initial ring is comfortably visible,
    /// with no pan, and the simulation paused.
    ///
    /// ### Errors
    /// Fails if `settings` cannot produce a ring (too few nodes or an
    /// invalid config).
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let mut rng = settings.rng();
        let engine = settings.build_engine(&mut rng)?;

        Ok(Self {
            engine,
            settings,
            rng,
            running: false,
            zoom: 150.0,
            pan: egui::vec2(0.0, 0.0),
            last_new_ids: Vec::with_capacity(16),
            color_scheme: ColorScheme::Age,
            show_points: false,
            batch_ticks: 300,
            config_error: None,
            step_interval: 0.0,
            last_step_time: 0.0,
            last_step_dt: 0.0,
            last_step_cost: Duration::ZERO,
        })
    }

    /// Replaces the engine with a fresh ring built from the current settings.
    ///
    /// Camera and display settings are kept. Auto-run stops and the
    /// highlight list is cleared. If the settings are unusable the old
    /// engine stays and the error is shown in the config panel.
    fn reset(&mut self) {
        match self.settings.build_engine(&mut self.rng) {
            Ok(engine) => {
                self.engine = engine;
                self.config_error = None;
                info!(nodes = self.settings.nodes, "reset to a fresh ring");
            }
            Err(e) => {
                self.config_error = Some(e.to_string());
            }
        }
        self.last_new_ids.clear();
        self.running = false;
    }

    /// Pushes the edited config into the engine, or records why it was refused.
    fn apply_config(&mut self) {
        self.config_error = self
            .engine
            .set_config(self.settings.cfg)
            .err()
            .map(|e| e.to_string());
    }

    /// Advances the simulation by a single tick.
    ///
    /// The ids of nodes created in this tick are stored in `last_new_ids`
    /// so they can be highlighted in the next frame.
    fn step_once(&mut self) {
        let started = Instant::now();
        let report = self.engine.step();
        self.last_step_cost = started.elapsed();

        if self.last_step_cost > SLOW_TICK {
            warn!(
                tick = report.tick,
                ms = self.last_step_cost.as_millis() as u64,
                nodes = self.engine.mesh().nodes.len(),
                "slow tick"
            );
        }
        self.last_new_ids = report.new_nodes;
    }

    /// Runs `batch_ticks` ticks synchronously before the next redraw.
    fn run_batch(&mut self) {
        let started = Instant::now();
        self.engine.run(self.batch_ticks);
        self.last_step_cost = started.elapsed();
        self.last_new_ids.clear();
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    fn edge_color(&self, e: usize) -> egui::Color32 {
        let edge = &self.engine.mesh().edges[e];
        match self.color_scheme {
            ColorScheme::Age => hsl((edge.age as f32 / 2.0) % 180.0 + 180.0, 1.0, 0.6),
            ColorScheme::Status => {
                match (self.engine.status(edge.a), self.engine.status(edge.b)) {
                    (NodeStatus::Dead, NodeStatus::Dead) => egui::Color32::DARK_GRAY,
                    (NodeStatus::Crowded, NodeStatus::Crowded) => egui::Color32::RED,
                    _ => egui::Color32::GREEN,
                }
            }
        }
    }

    /// Helper to draw a labeled [`egui::DragValue`] for any numeric field.
    fn labeled_drag<N: egui::emath::Numeric>(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut N,
        range: std::ops::RangeInclusive<N>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, batch, display).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ui.add(
                    egui::DragValue::new(&mut self.batch_ticks)
                        .prefix("batch = ")
                        .range(1..=100_000)
                        .speed(10.0),
                );
                if ui.button("Batch").clicked() {
                    self.run_batch();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(
                    egui::Slider::new(&mut self.zoom, 10.0..=2000.0)
                        .logarithmic(true)
                        .text("Zoom"),
                );

                ui.separator();
                ui.radio_value(&mut self.color_scheme, ColorScheme::Age, "age");
                ui.radio_value(&mut self.color_scheme, ColorScheme::Status, "status");
                ui.checkbox(&mut self.show_points, "points");
            });
        });
    }

    /// Builds the bottom status bar (tick, counts, timing).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        let stats = self.engine.stats();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.label(format!(
                    "step cost = {:.1} ms",
                    self.last_step_cost.as_secs_f64() * 1000.0
                ));
                ui.separator();
                ui.label(format!("crowded = {}", stats.crowded));
                ui.label(format!("dead = {}", stats.dead));
                ui.label(format!("edges = {}", stats.edges));
                ui.label(format!("nodes = {}", stats.nodes));
                ui.label(format!("tick = {}", self.engine.ticks()));
            });
        });
    }

    /// Builds the right-hand configuration panel for simulation parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        let before = self.settings.cfg;

        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Config");
                    let cfg = &mut self.settings.cfg;

                    ui.separator();
                    ui.label("Springs");
                    Self::labeled_drag(ui, "stick_k:", &mut cfg.stick_k, 0.0..=1.0, 0.001);
                    Self::labeled_drag(ui, "tolerance:", &mut cfg.tolerance, 0.0..=0.1, 0.0001);
                    Self::labeled_drag(ui, "damping:", &mut cfg.damping, 0.01..=0.99, 0.01);

                    ui.separator();
                    ui.label("Crowding");
                    Self::labeled_drag(ui, "avoid_k:", &mut cfg.avoid_k, 0.0..=1.0, 0.001);
                    Self::labeled_drag(ui, "push_dist:", &mut cfg.push_dist, 0.001..=5.0, 0.005);
                    Self::labeled_drag(ui, "close_dist:", &mut cfg.close_dist, 0.001..=5.0, 0.005);
                    Self::labeled_drag(ui, "too_crowded:", &mut cfg.too_crowded, 1..=500, 1.0);
                    Self::labeled_drag(ui, "min_crowd:", &mut cfg.min_crowd, 0..=499, 1.0);
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut cfg.crowding, CrowdTracking::Sticky, "sticky");
                        ui.radio_value(&mut cfg.crowding, CrowdTracking::Fresh, "fresh");
                    });
                    ui.checkbox(&mut cfg.spatial_index, "spatial index");

                    ui.separator();
                    ui.label("Growth");
                    Self::labeled_drag(ui, "growth_rate:", &mut cfg.growth_rate, 0.0..=0.05, 0.00001);
                    Self::labeled_drag(
                        ui,
                        "max_growth_rate:",
                        &mut cfg.max_growth_rate,
                        0.0..=0.05,
                        0.00001,
                    );
                    Self::labeled_drag(
                        ui,
                        "growth_age_limit:",
                        &mut cfg.growth_age_limit,
                        0..=u32::MAX,
                        10.0,
                    );
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut cfg.growth, GrowthPolicy::CrowdScaled, "crowd scaled");
                        ui.radio_value(&mut cfg.growth, GrowthPolicy::Flat, "flat");
                    });

                    ui.separator();
                    ui.label("Subdivision");
                    Self::labeled_drag(ui, "max_edge_len:", &mut cfg.max_edge_len, 0.001..=5.0, 0.001);
                    Self::labeled_drag(ui, "split_parts:", &mut cfg.split_parts, 2..=8, 0.05);

                    ui.separator();
                    ui.label("Liveness");
                    Self::labeled_drag(ui, "too_dead:", &mut cfg.too_dead, 0..=10_000, 1.0);
                    Self::labeled_drag(ui, "dead_motion:", &mut cfg.dead_motion, 0.0..=0.01, 0.00001);
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut cfg.death, DeathRule::CrowdedAndMotionless, "crowded + still");
                        ui.radio_value(&mut cfg.death, DeathRule::Motionless, "still");
                    });

                    ui.separator();
                    ui.label("Initial ring (applied on reset)");
                    Self::labeled_drag(ui, "nodes:", &mut self.settings.nodes, 3..=1000, 1.0);
                    Self::labeled_drag(
                        ui,
                        "initial_rest_len:",
                        &mut self.settings.cfg.initial_rest_len,
                        0.001..=1.0,
                        0.001,
                    );
                    Self::labeled_drag(
                        ui,
                        "radius_jitter:",
                        &mut self.settings.cfg.radius_jitter,
                        0.0..=1.0,
                        0.005,
                    );
                    ui.checkbox(&mut self.settings.jitter, "jitter");

                    if let Some(err) = &self.config_error {
                        ui.separator();
                        ui.colored_label(egui::Color32::LIGHT_RED, err);
                    }

                    ui.separator();
                    if ui.button("Reset cfg to default").clicked() {
                        self.settings.cfg = Config::default();
                    }
                });
            });

        if self.settings.cfg != before {
            self.apply_config();
        }
    }

    /// Builds the central panel where the mesh is drawn and panned/zoomed.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                let delta = response.drag_delta();
                self.pan += delta;
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(10.0, 2000.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            let mesh = self.engine.mesh();
            let width = (self.zoom * 0.01).clamp(1.0, 4.0);

            for (e, edge) in mesh.edges.iter().enumerate() {
                let a = self.world_to_screen(mesh.nodes[edge.a].pos, rect);
                let b = self.world_to_screen(mesh.nodes[edge.b].pos, rect);
                painter.line_segment([a, b], egui::Stroke::new(width, self.edge_color(e)));
            }

            // Nodes: created last tick in yellow, dead in red, the rest green.
            if self.show_points {
                for (id, node) in mesh.nodes.iter().enumerate() {
                    let p = self.world_to_screen(node.pos, rect);
                    let color = if self.last_new_ids.contains(&id) {
                        egui::Color32::YELLOW
                    } else if self.engine.status(id) == NodeStatus::Dead {
                        egui::Color32::RED
                    } else {
                        egui::Color32::GREEN
                    };
                    painter.circle_filled(p, 2.0, color);
                }
            }

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
