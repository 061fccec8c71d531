//! User interface components and rendering logic for the automata workbench.
//!
//! This module contains all the UI-related code including the main application
//! struct, the toolbar, the side panel and the canvas.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main AutomataApp
//! - `file_ops` - Workspace and parse tree files
//! - `backend_ops` - Requests to the automata backend
//! - `canvas` - Canvas navigation, zooming, panning, and clicks
//! - `rendering` - Drawing nodes, edges, the grid and parse trees

mod backend_ops;
mod canvas;
mod file_ops;
mod rendering;
mod state;

pub use state::{AutomataApp, PendingFileOperation, APP_STATE_KEY};

use crate::types::{AutomatonKind, EditorMode, Element};
use eframe::egui;

impl eframe::App for AutomataApp {
    /// Persist entire app state between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => storage.set_string(APP_STATE_KEY, json),
            Err(err) => log::error!("Failed to serialize app state: {err}"),
        }
    }

    /// Main update function called by egui for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_pending_operations(ctx);
        self.handle_backend_results();
        self.handle_undo_redo_keys(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("dialogue_bar").show(ctx, |ui| {
            self.draw_dialogue(ui);
        });

        egui::SidePanel::right("side_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_side_panel(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });
    }
}

impl AutomataApp {
    /// Handles Ctrl+Z / Ctrl+Shift+Z / Ctrl+Y, unless a text field has focus.
    fn handle_undo_redo_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Z) && i.modifiers.command && !i.modifiers.shift)
        {
            self.perform_undo();
        } else if ctx.input(|i| {
            (i.key_pressed(egui::Key::Z) && i.modifiers.command && i.modifiers.shift)
                || (i.key_pressed(egui::Key::Y) && i.modifiers.command)
        }) {
            self.perform_redo();
        }
    }

    /// Undoes the newest edit.
    pub fn perform_undo(&mut self) {
        match self.editor.undo() {
            Some(element) => log::info!("Undid {}", describe(&element)),
            None => log::debug!("Nothing to undo"),
        }
        self.clear_string_result();
    }

    /// Redoes the most recently undone edit.
    pub fn perform_redo(&mut self) {
        match self.editor.redo() {
            Some(element) => log::info!("Redid {}", describe(&element)),
            None => log::debug!("Nothing to redo"),
        }
        self.clear_string_result();
    }

    /// Clears the diagram, leaving it recoverable through redo.
    pub fn perform_discard_all(&mut self) {
        self.editor.discard_all();
        self.clear_string_result();
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open").clicked() {
                self.file.pending_operation = Some(PendingFileOperation::Open);
            }
            if ui.button("Save").clicked() {
                self.file.pending_operation = Some(PendingFileOperation::Save);
            }
            if ui.button("Save As").clicked() {
                self.file.pending_operation = Some(PendingFileOperation::SaveAs);
            }

            ui.separator();

            let current = self.editor.mode();
            for mode in EditorMode::SELECTABLE {
                if ui
                    .selectable_label(tool_is_active(current, mode), mode.label())
                    .clicked()
                {
                    self.editor.set_mode(mode);
                }
            }

            ui.separator();

            ui.add_enabled_ui(self.editor.history().can_undo(), |ui| {
                if ui.button("⟲ Undo").clicked() {
                    self.perform_undo();
                }
            });
            ui.add_enabled_ui(self.editor.history().can_redo(), |ui| {
                if ui.button("⟳ Redo").clicked() {
                    self.perform_redo();
                }
            });
            if ui
                .button("🗑 Clear")
                .on_hover_text("Remove everything; Redo brings it back one edit at a time")
                .clicked()
            {
                self.perform_discard_all();
            }

            ui.separator();

            if ui.button("Open Parse Tree").clicked() {
                self.file.pending_operation = Some(PendingFileOperation::OpenParseTree);
            }
            ui.add_enabled_ui(self.parse_tree.is_some(), |ui| {
                ui.checkbox(&mut self.canvas.show_parse_tree, "Show Tree");
            });
            ui.checkbox(&mut self.canvas.show_grid, "Grid");
            ui.checkbox(&mut self.dark_mode, "Dark Mode");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let graph = self.editor.graph();
                ui.label(format!(
                    "{} | {} states, {} edges | {:.0}%",
                    self.editor.mode().label(),
                    graph.node_count(),
                    graph.edges().len(),
                    self.canvas.zoom_factor * 100.0
                ));
            });
        });
    }

    fn draw_dialogue(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            match self.editor.dialogue() {
                Some(message) => {
                    ui.colored_label(ui.visuals().warn_fg_color, message);
                }
                None => {
                    ui.weak(hint_for(self.editor.mode()));
                }
            }
            if self.editor.dialogue().is_some() && ui.small_button("✖").clicked() {
                self.editor.clear_dialogue();
            }
            if self.backend_busy() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.spinner();
                });
            }
        });
    }

    fn draw_side_panel(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();

        ui.heading("Automaton");
        ui.horizontal(|ui| {
            for kind in [AutomatonKind::DFA, AutomatonKind::NFA] {
                if ui
                    .radio_value(
                        &mut self.editor.options.type_of_automata,
                        kind,
                        format!("{kind:?}"),
                    )
                    .changed()
                {
                    self.clear_string_result();
                }
            }
        });

        ui.separator();
        ui.heading("Test a String");
        let response = ui.text_edit_singleline(&mut self.backend.string_input);
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Test").clicked() || submitted {
            self.request_string_check(&ctx);
        }
        if let Some(checked) = &self.backend.last_check {
            match checked.is_string_accepted {
                Some(true) => {
                    ui.colored_label(egui::Color32::from_rgb(76, 175, 80), "Accepted");
                }
                Some(false) => {
                    ui.colored_label(ui.visuals().error_fg_color, "Rejected");
                }
                None => {
                    ui.weak("Not tested");
                }
            }
            if !checked.states_traversed.is_empty() {
                let path: Vec<String> = checked
                    .states_traversed
                    .iter()
                    .map(|node| format!("({})", node.key()))
                    .collect();
                ui.label(path.join(" → "));
            }
        }

        ui.separator();
        ui.heading("Options");
        ui.label("Alphabet");
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.backend.alphabet_input);
            if ui.button("Apply").clicked() {
                self.request_alphabet_update(&ctx);
            }
        });
        if ui
            .checkbox(&mut self.editor.options.should_strict_check, "Strict DFA checking")
            .changed()
        {
            self.request_strict_checking_update(&ctx);
        }
        if ui
            .checkbox(
                &mut self.editor.options.should_show_string_traversal,
                "Highlight traversal",
            )
            .changed()
        {
            self.request_traversal_update(&ctx);
        }
        ui.horizontal(|ui| {
            ui.label("Edge character");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.backend.character_input).desired_width(30.0),
            );
            if response.changed() || response.lost_focus() {
                self.commit_character_input(&ctx, response.lost_focus());
            }
        });

        ui.separator();
        ui.heading("Workspace");
        optional_text_field(ui, "Name", &mut self.session.workspace_name);
        optional_text_field(ui, "Email", &mut self.session.email);
        ui.add_enabled_ui(self.session.credentials().is_some(), |ui| {
            ui.horizontal(|ui| {
                if ui.button("Save to Workspace").clicked() {
                    self.request_save(&ctx);
                }
                if ui.button("Load from Workspace").clicked() {
                    self.request_load(&ctx);
                }
            });
        });
        if let Some(path) = &self.file.current_path {
            ui.weak(format!("File: {path}"));
        }
    }
}

/// Whether the toolbar button for `tool` should look pressed in `mode`.
fn tool_is_active(mode: EditorMode, tool: EditorMode) -> bool {
    match (mode, tool) {
        (EditorMode::PlacingEdgeEnd, EditorMode::PlacingEdgeStart) => true,
        (EditorMode::DraggingEdge, EditorMode::Idle) => true,
        (mode, tool) => mode == tool,
    }
}

fn hint_for(mode: EditorMode) -> &'static str {
    match mode {
        EditorMode::AddingNode => "Click to place a state.",
        EditorMode::AddingStartNode => "Click to place the start state.",
        EditorMode::AddingFinalNode => "Click a state to make it final.",
        EditorMode::PlacingEdgeStart | EditorMode::PlacingEpsilonEdgeStart => {
            "Click the state the transition leaves from."
        }
        EditorMode::PlacingEdgeEnd => "Click the state the transition goes to.",
        EditorMode::DraggingEdge => "Move to bend the curve, click to let go.",
        EditorMode::Idle => "Click near a transition to bend it.",
    }
}

fn describe(element: &Element) -> String {
    match element {
        Element::Node(node) => format!("state at ({})", node.key()),
        Element::Edge(edge) => format!(
            "'{}' edge from ({}) to ({})",
            edge.character,
            edge.source_key(),
            edge.destination_key()
        ),
    }
}

/// A text field editing an optional value; blank reads as `None`.
fn optional_text_field(ui: &mut egui::Ui, label: &str, value: &mut Option<String>) {
    ui.horizontal(|ui| {
        ui.label(label);
        let mut text = value.clone().unwrap_or_default();
        if ui.text_edit_singleline(&mut text).changed() {
            *value = (!text.trim().is_empty()).then_some(text);
        }
    });
}

#[cfg(test)]
mod tests;
