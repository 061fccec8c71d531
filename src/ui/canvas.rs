//! Canvas interaction and navigation functionality.
//!
//! This module handles canvas panning, zooming, clicks that edit the diagram,
//! curve dragging, and coordinate transformations between screen and world space.

use super::state::AutomataApp;
use crate::constants::{MAX_SCALE, MIN_SCALE, SNAP_GRID};
use crate::geometry::snap_to_grid;
use crate::types::{EditorMode, Point};
use eframe::egui;

/// Converts an egui position into a model point.
pub(crate) fn to_point(pos: egui::Pos2) -> Point {
    Point::new(pos.x, pos.y)
}

impl AutomataApp {
    /// Converts screen coordinates to world coordinates accounting for zoom and pan.
    ///
    /// # Arguments
    ///
    /// * `screen_pos` - Position in screen space (pixels)
    ///
    /// # Returns
    ///
    /// The corresponding position in world space
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - self.canvas.offset) / self.canvas.zoom_factor
    }

    /// Converts world coordinates to screen coordinates accounting for zoom and pan.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_pos * self.canvas.zoom_factor + self.canvas.offset
    }

    /// Converts a model point or coordinate to screen space.
    pub fn model_to_screen(&self, point: impl Into<Point>) -> egui::Pos2 {
        let point = point.into();
        self.world_to_screen(egui::pos2(point.x, point.y))
    }

    /// Whether the canvas shows the loaded parse tree instead of the diagram.
    pub fn showing_parse_tree(&self) -> bool {
        self.canvas.show_parse_tree && self.parse_tree.is_some()
    }

    /// Draws the main canvas area and handles all canvas interactions.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context for the canvas area
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;

        // Put the world origin in the middle of the canvas on the first frame
        if !self.canvas.centred {
            self.canvas.offset = canvas_rect.center().to_vec2();
            self.canvas.centred = true;
        }

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);

        if !self.showing_parse_tree() {
            self.track_pointer(ui, &response);
            self.handle_canvas_click(ui, &response);
        }

        painter.rect_filled(canvas_rect, 0.0, ui.visuals().extreme_bg_color);
        if self.canvas.show_grid {
            self.draw_grid(&painter, canvas_rect);
        }

        if self.showing_parse_tree() {
            self.draw_parse_tree(&painter);
        } else {
            self.render_diagram(&painter);
        }
    }

    /// Handles middle-click or Cmd/Ctrl+left-click canvas panning functionality.
    ///
    /// Uses Cmd on macOS and Ctrl on other platforms for modifier-based panning.
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let should_pan = ui.input(|i| {
            i.pointer.middle_down() || (i.pointer.primary_down() && i.modifiers.command)
        });

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.interaction.is_panning {
                    self.interaction.is_panning = true;
                    self.interaction.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.interaction.last_pan_pos {
                    self.canvas.offset += current_pos - last_pos;
                    self.interaction.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Handles scroll wheel zooming functionality.
    ///
    /// Zooms in/out while keeping the mouse cursor position fixed in world space.
    /// Zoom range is clamped between [`MIN_SCALE`] and [`MAX_SCALE`].
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }

        let mouse_pos = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos());
        let Some(mouse_pos) = mouse_pos.filter(|pos| response.rect.contains(*pos)) else {
            return;
        };

        let world_pos_before_zoom = self.screen_to_world(mouse_pos);
        let zoom_delta = if scroll_delta > 0.0 { 0.025 } else { -0.025 };
        let old_zoom = self.canvas.zoom_factor;
        self.canvas.zoom_factor = (old_zoom + zoom_delta).clamp(MIN_SCALE, MAX_SCALE);

        if (self.canvas.zoom_factor - old_zoom).abs() > f32::EPSILON {
            // Keep the world position under the cursor where it was
            let world_pos_after_zoom = self.world_to_screen(world_pos_before_zoom);
            self.canvas.offset += mouse_pos - world_pos_after_zoom;
        }
    }

    /// Follows the pointer with the pending edge or the dragged curve.
    fn track_pointer(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let hover = ui
            .input(|i| i.pointer.hover_pos())
            .filter(|pos| response.rect.contains(*pos));
        self.interaction.hover_world = hover.map(|pos| self.screen_to_world(pos));

        let Some(world) = self.interaction.hover_world else {
            return;
        };
        let target = to_point(world).round();
        match self.editor.mode() {
            EditorMode::PlacingEdgeEnd => self.editor.preview_pending_edge(target),
            EditorMode::DraggingEdge => {
                self.editor.drag_selected_curve(target);
            }
            _ => {}
        }
    }

    /// Turns a primary click on the canvas into an edit.
    fn handle_canvas_click(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        // Cmd/Ctrl+click belongs to panning
        if !response.clicked() || ui.input(|i| i.modifiers.command) {
            return;
        }
        if let Some(screen_pos) = response.interact_pointer_pos() {
            let world = self.screen_to_world(screen_pos);
            self.click_world(world);
        }
    }

    /// Applies a click at a world position.
    ///
    /// In [`EditorMode::Idle`] the click picks up the nearest curve for
    /// dragging. In every other mode the position is snapped onto the grid
    /// and handed to the editor.
    pub fn click_world(&mut self, world: egui::Pos2) {
        let point = to_point(world);
        if self.editor.mode() == EditorMode::Idle {
            match self.editor.select_curve_at(point) {
                Some(index) => log::debug!("dragging curve {index}"),
                None => log::debug!("no curve to pick up"),
            }
            return;
        }

        let coordinate = snap_to_grid(point, SNAP_GRID);
        if self.editor.handle_click(coordinate).is_ok() {
            self.clear_string_result();
        }
    }
}
