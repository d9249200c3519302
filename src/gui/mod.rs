use std::path::PathBuf;

use eframe::egui::epaint::CubicBezierShape;
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};
use log::info;
use rfd::FileDialog;

use crate::app::AppConfig;
use crate::error::MindTreeError;
use crate::io;
use crate::tree::layout;
use crate::tree::render::RenderEngine;
use crate::tree::scene::{self, ScenePrimitive};
use crate::tree::{MapTree, NodeId};

// Canvas margins around the drawing area: top, right, bottom, left.
const MARGIN: [f32; 4] = [20.0, 40.0, 20.0, 80.0];
const BUTTON_SIZE: f32 = 24.0;
const BUTTON_ROW_OFFSET: f32 = 10.0;
const MIN_HIT_RADIUS: f32 = 10.0;

pub struct MindTreeGui {
    config: AppConfig,
    tree: MapTree,
    engine: RenderEngine,
    doc_path: Option<PathBuf>,
    status: String,
    last_error: Option<String>,
    load_warning_dialog: Option<String>,
    edit_dialog: Option<EditDialog>,
    canvas_size: Option<Vec2>,
}

struct EditDialog {
    node: NodeId,
    name: String,
    estimation: String,
    error: Option<String>,
}

/// Canvas interaction resolved during a frame, applied after painting.
#[derive(Clone, Copy)]
enum MapAction {
    Toggle(NodeId),
    Add(NodeId),
    Remove(NodeId),
    Edit(NodeId),
}

struct NodeHandle {
    id: NodeId,
    center: Pos2,
    radius: f32,
    has_subtree: bool,
}

impl MindTreeGui {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut gui = Self {
            config,
            tree: MapTree::new_document(),
            engine: RenderEngine::new(),
            doc_path: None,
            status: "New document.".to_string(),
            last_error: None,
            load_warning_dialog: None,
            edit_dialog: None,
            canvas_size: None,
        };
        if let Some(path) = gui.config.map_path.clone() {
            gui.load_from_path(path);
        }
        gui
    }

    fn load_from_path(&mut self, path: PathBuf) {
        match io::load_map(&path) {
            Ok(tree) => {
                self.status = format!(
                    "Loaded mind map with {} node(s) from {}.",
                    tree.reachable_count(),
                    path.display()
                );
                info!("Loaded map file {}", path.display());
                self.tree = tree;
                self.engine = RenderEngine::new();
                self.canvas_size = None;
                self.doc_path = Some(path);
                self.last_error = None;
                self.edit_dialog = None;
            }
            Err(err) => {
                // Replace-on-success only: the current tree stays untouched.
                self.status = "Failed to load map file.".to_string();
                self.load_warning_dialog = Some(format!(
                    "Failed to load mind map:\n{}\n\n{:#}",
                    path.display(),
                    err
                ));
            }
        }
    }

    fn new_document(&mut self) {
        self.tree = MapTree::new_document();
        self.engine = RenderEngine::new();
        self.canvas_size = None;
        self.doc_path = None;
        self.edit_dialog = None;
        self.last_error = None;
        self.status = "New document.".to_string();
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("Mind map JSON", &["json"])
            .pick_file()
        {
            self.load_from_path(path);
        }
    }

    fn save(&mut self) {
        if let Some(path) = self.doc_path.clone() {
            self.save_to_path(&path);
        } else {
            self.save_as_dialog();
        }
    }

    fn save_as_dialog(&mut self) {
        let default_name = self
            .doc_path
            .as_ref()
            .or(self.config.map_path.as_ref())
            .and_then(|p| p.file_name().and_then(|s| s.to_str()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.json", io::DEFAULT_FILE_STEM));
        if let Some(path) = FileDialog::new()
            .add_filter("Mind map JSON", &["json"])
            .set_file_name(&default_name)
            .save_file()
        {
            self.save_to_path(&path);
            self.doc_path = Some(path);
        }
    }

    fn save_to_path(&mut self, path: &std::path::Path) {
        match io::save_map(path, &self.tree) {
            Ok(()) => {
                self.status = format!("Saved mind map to {}.", path.display());
                self.last_error = None;
            }
            Err(err) => {
                self.last_error = Some(format!("Failed to save: {err:#}"));
            }
        }
    }

    /// Recomputes the layout for the visible tree and runs a reconciliation
    /// pass with `source` as the update root. Skipped until the canvas has
    /// reported its size; the resize path renders the whole tree then.
    fn render_from(&mut self, source: NodeId, now: f64) {
        if let Some(size) = self.canvas_size {
            let map = layout::build(&self.tree, size.x, size.y);
            self.engine.render(&self.tree, &map, source, now);
        }
    }

    fn apply_action(&mut self, action: MapAction, now: f64) {
        match action {
            MapAction::Toggle(id) => {
                self.tree.toggle(id);
                self.render_from(id, now);
            }
            MapAction::Add(id) => {
                let child = self.tree.add_child(id);
                self.edit_dialog = Some(EditDialog {
                    node: child,
                    name: self.tree.label(child).to_string(),
                    estimation: self.tree.nodes[child].estimation.to_string(),
                    error: None,
                });
                self.render_from(id, now);
            }
            MapAction::Remove(id) => match self.tree.remove(id) {
                Ok(parent) => {
                    self.last_error = None;
                    self.render_from(parent, now);
                }
                Err(err) => {
                    self.last_error = Some(err.to_string());
                }
            },
            MapAction::Edit(id) => {
                self.edit_dialog = Some(EditDialog {
                    node: id,
                    name: self.tree.label(id).to_string(),
                    estimation: self.tree.nodes[id].estimation.to_string(),
                    error: None,
                });
            }
        }
    }

    fn apply_edit_dialog(&mut self, now: f64) {
        let Some(dialog) = self.edit_dialog.take() else {
            return;
        };
        // An empty estimate field means "leave unchanged", mirroring a
        // cancelled prompt.
        let estimation = if dialog.estimation.trim().is_empty() {
            None
        } else {
            Some(dialog.estimation.as_str())
        };

        let result = self
            .tree
            .apply_edit(dialog.node, Some(&dialog.name), estimation);

        // The edit renders at the parent so the whole sibling group reflects
        // new aggregates; the root is its own update root.
        let source = self.tree.nodes[dialog.node].parent.unwrap_or(dialog.node);

        match result {
            Ok(()) => {
                self.last_error = None;
                self.render_from(source, now);
            }
            Err(err @ MindTreeError::InvalidEstimate(_)) => {
                // The rename half already applied; keep the dialog open for
                // a corrected estimate.
                self.render_from(source, now);
                self.edit_dialog = Some(EditDialog {
                    error: Some(err.to_string()),
                    ..dialog
                });
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
            }
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context, now: f64) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.new_document();
                        ui.close();
                    }

                    if ui.button("Open...").clicked() {
                        self.open_file_dialog();
                        ui.close();
                    }

                    ui.separator();

                    if ui.button("Save").clicked() {
                        self.save();
                        ui.close();
                    }

                    if ui.button("Save As...").clicked() {
                        self.save_as_dialog();
                        ui.close();
                    }

                    ui.separator();

                    if ui.button("Close").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Collapse All").clicked() {
                        let root = self.tree.root;
                        self.tree.collapse_all(root);
                        self.render_from(root, now);
                        ui.close();
                    }
                    if ui.button("Expand All").clicked() {
                        let root = self.tree.root;
                        self.tree.expand_all(root);
                        self.render_from(root, now);
                        ui.close();
                    }
                });
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                if let Some(err) = &self.last_error {
                    ui.colored_label(Color32::RED, err);
                }
            });
        });
    }

    fn show_edit_dialog(&mut self, ctx: &egui::Context, now: f64) {
        let Some(dialog) = &mut self.edit_dialog else {
            return;
        };

        let mut apply = false;
        let mut cancel = false;
        egui::Window::new("Edit node")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Name:");
                    ui.text_edit_singleline(&mut dialog.name);
                });
                ui.horizontal(|ui| {
                    ui.label("Estimation:");
                    ui.text_edit_singleline(&mut dialog.estimation);
                });
                if let Some(err) = &dialog.error {
                    ui.colored_label(Color32::RED, err);
                }
                ui.horizontal(|ui| {
                    if ui.button("Apply").clicked() {
                        apply = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if apply {
            self.apply_edit_dialog(now);
        } else if cancel {
            self.edit_dialog = None;
        }
    }

    fn show_load_warning(&mut self, ctx: &egui::Context) {
        let Some(message) = self.load_warning_dialog.clone() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Load warning")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(&message);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.load_warning_dialog = None;
        }
    }

    /// Edit affordances sit left of a node that has a subtree and right of a
    /// bare one, on a row just below the glyph center.
    fn button_offsets(has_subtree: bool) -> [f32; 3] {
        if has_subtree {
            [-70.0, -40.0, -10.0]
        } else {
            [0.0, 30.0, 60.0]
        }
    }

    fn button_rect(handle: &NodeHandle, index: usize) -> Rect {
        let offsets = Self::button_offsets(handle.has_subtree);
        Rect::from_min_size(
            handle.center + Vec2::new(offsets[index], BUTTON_ROW_OFFSET),
            Vec2::splat(BUTTON_SIZE),
        )
    }

    fn paint_scene(painter: &egui::Painter, origin: Pos2, primitives: &[ScenePrimitive]) {
        for primitive in primitives {
            match primitive {
                ScenePrimitive::LinkPath { points, style } => {
                    let translated = points.map(|p| origin + p.to_vec2());
                    painter.add(CubicBezierShape::from_points_stroke(
                        translated,
                        false,
                        Color32::TRANSPARENT,
                        Stroke::new(style.width, style.color),
                    ));
                }
                ScenePrimitive::NodeGlyph {
                    center,
                    radius,
                    fill,
                    stroke,
                } => {
                    painter.circle(
                        origin + center.to_vec2(),
                        radius.max(0.0),
                        *fill,
                        Stroke::new(stroke.width, stroke.color),
                    );
                }
                ScenePrimitive::Text {
                    text,
                    anchor,
                    align,
                    size,
                    color,
                } => {
                    painter.text(
                        origin + anchor.to_vec2(),
                        *align,
                        text,
                        FontId::proportional(*size),
                        *color,
                    );
                }
            }
        }
    }

    fn paint_node_buttons(
        painter: &egui::Painter,
        handles: &[NodeHandle],
        hover_pos: Option<Pos2>,
    ) {
        for handle in handles {
            for (index, glyph) in ["+", "✕", "✎"].iter().enumerate() {
                let rect = Self::button_rect(handle, index);
                let hovered = hover_pos.is_some_and(|pos| rect.contains(pos));
                let fill = if hovered {
                    Color32::from_gray(225)
                } else {
                    Color32::from_gray(243)
                };
                painter.rect_filled(rect, 4.0, fill);
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    *glyph,
                    FontId::proportional(13.0),
                    scene::STROKE_CHILDLESS,
                );
            }
        }
    }

    /// Buttons take precedence over the glyph; among overlapping glyphs the
    /// highest id (drawn last) wins.
    fn hit_test(handles: &[NodeHandle], pos: Pos2) -> Option<MapAction> {
        for handle in handles {
            for (index, action) in [
                MapAction::Add(handle.id),
                MapAction::Remove(handle.id),
                MapAction::Edit(handle.id),
            ]
            .into_iter()
            .enumerate()
            {
                if Self::button_rect(handle, index).contains(pos) {
                    return Some(action);
                }
            }
        }

        let mut hit = None;
        for handle in handles {
            let radius = handle.radius.max(MIN_HIT_RADIUS);
            if handle.center.distance(pos) <= radius {
                hit = Some(MapAction::Toggle(handle.id));
            }
        }
        hit
    }

    fn show_canvas(&mut self, ctx: &egui::Context, now: f64) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let (response, painter) = ui.allocate_painter(available, Sense::click());
            let rect = response.rect;

            let inner = Vec2::new(
                (rect.width() - MARGIN[1] - MARGIN[3]).max(1.0),
                (rect.height() - MARGIN[0] - MARGIN[2]).max(1.0),
            );
            let origin = rect.min + Vec2::new(MARGIN[3], MARGIN[0]);

            // First frame and resizes reposition the whole visible tree.
            if self.canvas_size != Some(inner) {
                self.canvas_size = Some(inner);
                let root = self.tree.root;
                self.render_from(root, now);
            }

            let animating = self.engine.advance(now);
            let primitives = scene::build_map_scene(&self.engine, now);
            Self::paint_scene(&painter, origin, &primitives);

            let mut handles: Vec<NodeHandle> = self
                .engine
                .node_sprites()
                .filter(|sprite| !sprite.exiting)
                .map(|sprite| {
                    let (x, y) = sprite.pos(now);
                    NodeHandle {
                        id: sprite.id,
                        center: origin + Vec2::new(x, y),
                        radius: sprite.radius.value(now),
                        has_subtree: !self.tree.nodes[sprite.id].children.is_empty(),
                    }
                })
                .collect();
            handles.sort_by_key(|handle| handle.id);

            Self::paint_node_buttons(&painter, &handles, response.hover_pos());

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    if let Some(action) = Self::hit_test(&handles, pos) {
                        self.apply_action(action, now);
                        // The action landed after this frame's advance; keep
                        // the new transitions ticking.
                        ctx.request_repaint();
                    }
                }
            }

            if animating {
                ctx.request_repaint();
            }
        });
    }
}

impl eframe::App for MindTreeGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);

        self.show_menu_bar(ctx, now);
        self.show_status_bar(ctx);
        self.show_edit_dialog(ctx, now);
        self.show_load_warning(ctx);
        self.show_canvas(ctx, now);
    }
}
