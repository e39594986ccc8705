// SPDX-License-Identifier: MIT OR Apache-2.0
//! Viewport panel - routes egui input into the editor and paints overlays.

use crate::card::{self, CardHit, CardLayout};
use glam::{Vec2, Vec3};
use splatstage_core::{Axis, Editor, PointerRegion, SceneGraph, Selection};
use std::time::Duration;

/// Scroll to zoom factor
const ZOOM_PER_POINT: f32 = 0.01;

/// Where a primary press should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTarget {
    /// Action button of a tooltip card
    TooltipButton(splatstage_core::EntityId),
    /// Editor pointer region
    Region(PointerRegion),
}

/// Classify a primary press. Cards sit on top of the canvas, and a host
/// sidebar rect swallows presses like the card body does.
pub fn classify_press(
    pos: egui::Pos2,
    canvas: egui::Rect,
    cards: &[CardLayout],
    sidebar: Option<egui::Rect>,
) -> PressTarget {
    match card::hit_test(cards, pos) {
        Some(CardHit::Button(entity)) => PressTarget::TooltipButton(entity),
        Some(CardHit::Body(_)) => PressTarget::Region(PointerRegion::Tooltip),
        None if sidebar.is_some_and(|s| s.contains(pos)) => PressTarget::Region(PointerRegion::Sidebar),
        None if canvas.contains(pos) => PressTarget::Region(PointerRegion::Canvas),
        None => PressTarget::Region(PointerRegion::Outside),
    }
}

fn axis_color(axis: Axis, active: bool) -> egui::Color32 {
    match (axis, active) {
        (Axis::X, false) => egui::Color32::from_rgb(255, 80, 80),
        (Axis::Y, false) => egui::Color32::from_rgb(80, 255, 80),
        (Axis::Z, false) => egui::Color32::from_rgb(80, 80, 255),
        (Axis::X, true) => egui::Color32::from_rgb(255, 200, 100),
        (Axis::Y, true) => egui::Color32::from_rgb(200, 255, 100),
        (Axis::Z, true) => egui::Color32::from_rgb(100, 200, 255),
    }
}

/// The 3D viewport panel
pub struct ViewportPanel {
    /// Host sidebar, in screen coordinates
    pub sidebar: Option<egui::Rect>,
    /// Gizmo visibility
    pub show_gizmo: bool,
    /// Camera/selection readout visibility
    pub show_stats: bool,
    /// Cards painted last frame, for hit testing
    cards: Vec<CardLayout>,
    /// Last pointer position sent to the editor
    last_pointer: Option<egui::Pos2>,
}

impl ViewportPanel {
    /// Create a new viewport panel
    pub fn new() -> Self {
        Self {
            sidebar: None,
            show_gizmo: true,
            show_stats: true,
            cards: Vec::new(),
            last_pointer: None,
        }
    }

    /// Cards laid out in the last frame
    pub fn cards(&self) -> &[CardLayout] {
        &self.cards
    }

    /// Render the viewport panel
    pub fn ui<S: SceneGraph>(&mut self, ui: &mut egui::Ui, editor: &mut Editor<S>) {
        let available_size = ui.available_size();
        let (response, painter) = ui.allocate_painter(available_size, egui::Sense::click_and_drag());
        let rect = response.rect;

        editor.set_viewport(Vec2::new(rect.width(), rect.height()));
        painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(30, 30, 30));

        self.handle_input(ui, &response, editor);

        let dt = ui.input(|i| i.stable_dt).max(0.0);
        editor.frame(Duration::from_secs_f32(dt));

        if self.show_gizmo && editor.selection() != Selection::None && editor.gizmo().is_visible() {
            Self::draw_gizmo(&painter, rect, editor);
        }
        self.draw_cards(&painter, rect, editor);
        if self.show_stats {
            Self::draw_overlay(&painter, rect, editor);
        }

        if editor.is_camera_animating() || editor.drag().is_some() {
            ui.ctx().request_repaint();
        }
    }

    fn handle_input<S: SceneGraph>(&mut self, ui: &egui::Ui, response: &egui::Response, editor: &mut Editor<S>) {
        let rect = response.rect;
        let (pointer, pressed, released, scroll) = ui.input(|i| {
            (
                i.pointer.interact_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.smooth_scroll_delta.y,
            )
        });
        let local = |pos: egui::Pos2| Vec2::new(pos.x - rect.left(), pos.y - rect.top());

        if let Some(pos) = pointer {
            if self.last_pointer != Some(pos) && (rect.contains(pos) || editor.drag().is_some()) {
                editor.pointer_move(local(pos));
            }
        }
        self.last_pointer = pointer;

        if pressed {
            if let Some(pos) = pointer {
                match classify_press(pos, rect, &self.cards, self.sidebar) {
                    PressTarget::TooltipButton(entity) => {
                        if let Err(e) = editor.press_tooltip_button(entity) {
                            tracing::warn!("Tooltip button: {}", e);
                        }
                    }
                    PressTarget::Region(region) => {
                        let outcome = editor.pointer_down(local(pos), region);
                        tracing::debug!("Press {:?} -> {:?}", region, outcome);
                    }
                }
            }
        }

        if released {
            editor.pointer_up();
        }

        // Right drag orbits, middle drag pans; both are no-ops while a
        // gizmo drag holds the controls
        if response.dragged_by(egui::PointerButton::Secondary) {
            let delta = response.drag_delta();
            editor.orbit_view(Vec2::new(delta.x, delta.y));
        }
        if response.dragged_by(egui::PointerButton::Middle) {
            let delta = response.drag_delta();
            editor.pan_view(Vec2::new(delta.x, delta.y));
        }
        if response.hovered() && scroll != 0.0 {
            editor.zoom_view(scroll * ZOOM_PER_POINT);
        }
    }

    fn draw_gizmo<S: SceneGraph>(painter: &egui::Painter, rect: egui::Rect, editor: &Editor<S>) {
        let camera = editor.camera();
        let center = editor.gizmo().position();
        let Some(origin) = camera.anchor_for(center) else {
            return;
        };
        let origin = rect.min + egui::vec2(origin.x, origin.y);
        let length = editor.settings().gizmo.handle_length;
        let dragging = editor.drag().map(|d| d.axis());

        for axis in Axis::ALL {
            let Some(tip) = camera.anchor_for(center + axis.unit() * length) else {
                continue;
            };
            let tip = rect.min + egui::vec2(tip.x, tip.y);
            let active = dragging == Some(axis);
            let color = axis_color(axis, active);
            painter.arrow(origin, tip - origin, egui::Stroke::new(if active { 4.0 } else { 2.0 }, color));
            painter.text(
                tip + (tip - origin).normalized() * 10.0,
                egui::Align2::CENTER_CENTER,
                axis.name().to_uppercase(),
                egui::FontId::proportional(12.0),
                color,
            );
        }
    }

    fn draw_cards<S: SceneGraph>(&mut self, painter: &egui::Painter, rect: egui::Rect, editor: &Editor<S>) {
        let overlays = editor.tooltip_overlays();
        self.cards = overlays.iter().map(|o| card::layout_card(o, rect.min)).collect();

        let fill = egui::Color32::from_rgba_unmultiplied(20, 20, 24, 230);
        let text = egui::Color32::from_rgb(220, 220, 220);

        for (overlay, layout) in overlays.iter().zip(&self.cards) {
            painter.rect(layout.rect, 6.0, fill, egui::Stroke::new(1.0, egui::Color32::from_gray(90)));

            // Pointer triangle down to the anchor
            let anchor = rect.min + egui::vec2(overlay.anchor.x, overlay.anchor.y);
            painter.add(egui::Shape::convex_polygon(
                vec![
                    egui::pos2(anchor.x - card::POINTER_GAP, layout.rect.bottom()),
                    egui::pos2(anchor.x + card::POINTER_GAP, layout.rect.bottom()),
                    anchor,
                ],
                fill,
                egui::Stroke::NONE,
            ));

            painter.text(
                layout.title_pos,
                egui::Align2::LEFT_TOP,
                &overlay.title,
                egui::FontId::proportional(14.0),
                egui::Color32::WHITE,
            );
            for (pos, line) in &layout.lines {
                painter.text(*pos, egui::Align2::LEFT_TOP, line, egui::FontId::proportional(12.0), text);
            }
            if let (Some(button), Some(label)) = (layout.button, &overlay.button) {
                painter.rect_filled(button, 4.0, egui::Color32::from_rgb(60, 110, 200));
                painter.text(
                    button.center(),
                    egui::Align2::CENTER_CENTER,
                    label,
                    egui::FontId::proportional(12.0),
                    egui::Color32::WHITE,
                );
            }
        }
    }

    fn draw_overlay<S: SceneGraph>(painter: &egui::Painter, rect: egui::Rect, editor: &Editor<S>) {
        let state = editor.camera_state();
        let selection = match editor.selection() {
            Selection::None => "none".to_string(),
            Selection::Entity(id) => editor.entity(&id).map_or_else(|| "?".to_string(), |e| e.name.clone()),
            Selection::Group(id) => editor
                .arena()
                .group(&id)
                .map_or_else(|| "?".to_string(), |g| format!("group {}", g.name)),
        };
        let lines = [
            format!("Pos: ({:.1}, {:.1}, {:.1})", state.position.x, state.position.y, state.position.z),
            format!("Selected: {}", selection),
            format!("Models: {}", editor.arena().len()),
        ];

        let font = egui::FontId::monospace(12.0);
        let color = egui::Color32::from_rgb(200, 200, 200);
        for (row, line) in lines.into_iter().enumerate() {
            painter.text(
                rect.left_top() + egui::vec2(10.0, 10.0 + row as f32 * 16.0),
                egui::Align2::LEFT_TOP,
                line,
                font.clone(),
                color,
            );
        }
    }

    /// World point to panel coordinates, `None` off screen
    pub fn project<S: SceneGraph>(editor: &Editor<S>, rect: egui::Rect, world: Vec3) -> Option<egui::Pos2> {
        editor
            .camera()
            .anchor_for(world)
            .map(|a| rect.min + egui::vec2(a.x, a.y))
    }
}

impl Default for ViewportPanel {
    fn default() -> Self {
        Self::new()
    }
}
