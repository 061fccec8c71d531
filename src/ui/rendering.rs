//! Rendering functionality for the diagram and the parse tree.
//!
//! Everything is drawn in world space and mapped to the screen through the
//! canvas transform, so line widths and radii scale with the zoom factor.

use super::state::AutomataApp;
use crate::constants::{
    ARROW_HEAD_SIZE, EDGE_LABEL_OFFSET, FINAL_RING_RADIUS, NODE_RADIUS, SNAP_GRID,
};
use crate::geometry::{arrow_head, label_position};
use crate::parse_tree::{layout, TokenKind};
use crate::types::{BezierCurve, Coordinate, Node};
use eframe::egui;

const START_FILL: egui::Color32 = egui::Color32::from_rgb(76, 175, 80);
const NODE_FILL: egui::Color32 = egui::Color32::from_rgb(255, 152, 0);
const HIGHLIGHT_FILL: egui::Color32 = egui::Color32::from_rgb(66, 165, 245);
const SELECTED_EDGE: egui::Color32 = egui::Color32::from_rgb(255, 235, 59);

impl AutomataApp {
    /// Draws every edge, node and the edge in progress.
    pub fn render_diagram(&self, painter: &egui::Painter) {
        let graph = self.editor.graph();
        for node in graph.nodes() {
            let highlighted = self.backend.highlighted.contains(&node.key());
            self.draw_node(painter, node, highlighted);
        }

        let selected = self.editor.selected_edge();
        for (index, edge) in graph.edges().iter().enumerate() {
            let color = if selected == Some(index) {
                SELECTED_EDGE
            } else {
                painter.ctx().style().visuals.text_color()
            };
            self.draw_curve(painter, &edge.curve, color, true);
            self.draw_edge_label(painter, &edge.curve, &edge.character, color);
        }

        self.draw_pending_edge(painter);
    }

    /// Draws the grid that clicks snap to.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let grid_size = SNAP_GRID as f32;
        let screen_grid_size = grid_size * self.canvas.zoom_factor;
        if screen_grid_size < 4.0 {
            return;
        }
        let stroke = egui::Stroke::new(
            1.0,
            egui::Color32::from_rgba_unmultiplied(128, 128, 128, 32),
        );

        let top_left = self.screen_to_world(canvas_rect.min);
        let bottom_right = self.screen_to_world(canvas_rect.max);

        let mut x = (top_left.x / grid_size).floor() * grid_size;
        while x <= bottom_right.x {
            let screen_x = self.world_to_screen(egui::pos2(x, 0.0)).x;
            painter.line_segment(
                [
                    egui::pos2(screen_x, canvas_rect.min.y),
                    egui::pos2(screen_x, canvas_rect.max.y),
                ],
                stroke,
            );
            x += grid_size;
        }

        let mut y = (top_left.y / grid_size).floor() * grid_size;
        while y <= bottom_right.y {
            let screen_y = self.world_to_screen(egui::pos2(0.0, y)).y;
            painter.line_segment(
                [
                    egui::pos2(canvas_rect.min.x, screen_y),
                    egui::pos2(canvas_rect.max.x, screen_y),
                ],
                stroke,
            );
            y += grid_size;
        }
    }

    /// Draws a node: green for the start node, orange otherwise, with an
    /// outer ring when final.
    pub fn draw_node(&self, painter: &egui::Painter, node: &Node, highlighted: bool) {
        let zoom = self.canvas.zoom_factor;
        let center = self.model_to_screen(node.position);
        let fill = if highlighted {
            HIGHLIGHT_FILL
        } else if node.is_start {
            START_FILL
        } else {
            NODE_FILL
        };
        let outline = egui::Stroke::new(2.0 * zoom, egui::Color32::BLACK);

        if node.is_final {
            painter.circle_stroke(center, FINAL_RING_RADIUS * zoom, outline);
        }
        painter.circle_filled(center, NODE_RADIUS * zoom, fill);
        painter.circle_stroke(center, NODE_RADIUS * zoom, outline);
    }

    /// Draws a curve, optionally with an arrowhead at its end.
    fn draw_curve(
        &self,
        painter: &egui::Painter,
        curve: &BezierCurve,
        color: egui::Color32,
        with_arrow: bool,
    ) {
        let stroke = egui::Stroke::new(2.0 * self.canvas.zoom_factor, color);
        let points = [
            self.model_to_screen(curve.start),
            self.model_to_screen(curve.control1),
            self.model_to_screen(curve.control2),
            self.model_to_screen(curve.end),
        ];
        painter.add(egui::epaint::CubicBezierShape::from_points_stroke(
            points,
            false,
            egui::Color32::TRANSPARENT,
            stroke,
        ));

        if with_arrow {
            let tip = self.model_to_screen(curve.end);
            for wing in arrow_head(curve, ARROW_HEAD_SIZE) {
                painter.line_segment([tip, self.model_to_screen(wing)], stroke);
            }
        }
    }

    fn draw_edge_label(
        &self,
        painter: &egui::Painter,
        curve: &BezierCurve,
        character: &str,
        color: egui::Color32,
    ) {
        painter.text(
            self.model_to_screen(label_position(curve, EDGE_LABEL_OFFSET)),
            egui::Align2::CENTER_CENTER,
            character,
            egui::FontId::proportional(20.0 * self.canvas.zoom_factor),
            color,
        );
    }

    /// Draws the edge whose end has not been placed yet, running to the pointer.
    fn draw_pending_edge(&self, painter: &egui::Painter) {
        let (Some(edge), Some(pointer)) = (self.editor.pending_edge(), self.interaction.hover_world)
        else {
            return;
        };
        let pointer = Coordinate::new(pointer.x.round() as i32, pointer.y.round() as i32);
        let preview = BezierCurve {
            control2: pointer,
            end: pointer,
            ..edge.curve
        };
        let color = painter.ctx().style().visuals.weak_text_color();
        self.draw_curve(painter, &preview, color, true);
    }

    /// Draws the loaded parse tree with its root at the world origin.
    pub fn draw_parse_tree(&self, painter: &egui::Painter) {
        let Some(tree) = &self.parse_tree else {
            return;
        };
        let zoom = self.canvas.zoom_factor;
        let tree_layout = layout(tree, Coordinate::new(0, 0));
        let text_color = painter.ctx().style().visuals.text_color();

        for link in &tree_layout.links {
            self.draw_curve(painter, link, text_color, true);
        }
        for token in &tree_layout.tokens {
            let center = self.model_to_screen(token.position);
            let fill = match token.kind {
                TokenKind::Literal => NODE_FILL,
                TokenKind::Or | TokenKind::Concatenation => START_FILL,
                TokenKind::Kleene => HIGHLIGHT_FILL,
            };
            painter.circle_filled(center, NODE_RADIUS * zoom, fill);
            painter.circle_stroke(
                center,
                NODE_RADIUS * zoom,
                egui::Stroke::new(2.0 * zoom, egui::Color32::BLACK),
            );
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                &token.label,
                egui::FontId::proportional(22.0 * zoom),
                egui::Color32::BLACK,
            );
        }
    }
}
