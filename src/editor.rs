//! The editing session: one graph, its history, and what a click means.
//!
//! [`Editor`] is the only thing that mutates a [`Graph`] in response to user
//! input. Every click goes through [`Editor::handle_click`], which consults the
//! current [`EditorMode`], applies at most one structural edit, records it, and
//! moves to the next mode. A rejected click leaves every structure untouched
//! and sets a dialogue message instead.

use crate::backend::StringCheck;
use crate::constants::{CURVE_HIT_SLICES, EPSILON_SYMBOL};
use crate::error::{EditError, WorkspaceError};
use crate::geometry::nearest_curve_index;
use crate::graph::Graph;
use crate::history::{Edit, EditHistory};
use crate::types::{Coordinate, Edge, EditorMode, Element, Point};
use crate::workspace::{WorkspaceData, WorkspaceOptions};

/// Editing state for one diagram.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    graph: Graph,
    history: EditHistory,
    mode: EditorMode,
    pending_edge: Option<Edge>,
    selected_edge: Option<usize>,
    dialogue: Option<String>,
    /// Settings of the open workspace
    pub options: WorkspaceOptions,
}

impl Editor {
    /// Creates an empty editor with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty editor with the given options.
    pub fn with_options(options: WorkspaceOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// The diagram being edited.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Recorded edits.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// What the next click will do.
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Switches tools.
    ///
    /// Leaving [`EditorMode::PlacingEdgeEnd`] abandons the edge in progress, and
    /// leaving [`EditorMode::DraggingEdge`] drops the curve selection.
    pub fn set_mode(&mut self, mode: EditorMode) {
        if mode != EditorMode::PlacingEdgeEnd {
            self.pending_edge = None;
        }
        if mode != EditorMode::DraggingEdge {
            self.selected_edge = None;
        }
        self.mode = mode;
    }

    /// The edge whose start has been placed but whose end has not.
    pub fn pending_edge(&self) -> Option<&Edge> {
        self.pending_edge.as_ref()
    }

    /// Index of the curve being dragged.
    pub fn selected_edge(&self) -> Option<usize> {
        self.selected_edge
    }

    /// Message for the user about the last click, if it needs one.
    pub fn dialogue(&self) -> Option<&str> {
        self.dialogue.as_deref()
    }

    /// Replaces the dialogue message.
    pub fn set_dialogue(&mut self, message: impl Into<String>) {
        self.dialogue = Some(message.into());
    }

    /// Clears the dialogue message.
    pub fn clear_dialogue(&mut self) {
        self.dialogue = None;
    }

    /// Handles a click at `coordinate` using the workspace's default edge
    /// character.
    pub fn handle_click(&mut self, coordinate: Coordinate) -> Result<(), EditError> {
        let character = self.options.default_connection_character.clone();
        self.handle_click_with(coordinate, &character)
    }

    /// Handles a click at `coordinate` in the current mode.
    ///
    /// On success the edit is recorded in history and the mode advances; on
    /// failure the error's message becomes the dialogue and nothing changes.
    ///
    /// # Arguments
    ///
    /// * `coordinate` - Model coordinate of the click, already snapped
    /// * `default_character` - Label for edges started in [`EditorMode::PlacingEdgeStart`]
    pub fn handle_click_with(
        &mut self,
        coordinate: Coordinate,
        default_character: &str,
    ) -> Result<(), EditError> {
        self.dialogue = None;
        let result = self.dispatch_click(coordinate, default_character);
        if let Err(err) = &result {
            log::info!("click at {} rejected: {}", coordinate, err);
            self.dialogue = Some(err.to_string());
        }
        result
    }

    fn dispatch_click(
        &mut self,
        coordinate: Coordinate,
        default_character: &str,
    ) -> Result<(), EditError> {
        match self.mode {
            EditorMode::AddingNode => self.place_node(coordinate, false),
            EditorMode::AddingStartNode => {
                self.place_node(coordinate, true)?;
                self.mode = EditorMode::AddingNode;
                Ok(())
            }
            EditorMode::AddingFinalNode => {
                let node = self.graph.mark_final(coordinate)?;
                self.history.record(Edit::MarkFinal { position: node.key() });
                Ok(())
            }
            EditorMode::PlacingEdgeStart => self.start_edge(coordinate, default_character),
            EditorMode::PlacingEpsilonEdgeStart => self.start_edge(coordinate, EPSILON_SYMBOL),
            EditorMode::PlacingEdgeEnd => {
                let Some(pending) = self.pending_edge.clone() else {
                    self.mode = EditorMode::PlacingEdgeStart;
                    return Err(EditError::NoPendingEdge);
                };
                let edge = self.graph.complete_edge(pending, coordinate)?;
                self.pending_edge = None;
                self.history.record(Edit::CompleteEdge(edge));
                self.mode = EditorMode::PlacingEdgeStart;
                Ok(())
            }
            EditorMode::DraggingEdge => {
                self.selected_edge = None;
                self.mode = EditorMode::Idle;
                Ok(())
            }
            EditorMode::Idle => Ok(()),
        }
    }

    fn place_node(&mut self, coordinate: Coordinate, is_start: bool) -> Result<(), EditError> {
        let placement = self.graph.add_node(coordinate, is_start)?;
        self.history.record(Edit::PlaceNode {
            node: placement.node,
            replaced_start: placement.replaced_start,
        });
        Ok(())
    }

    fn start_edge(&mut self, coordinate: Coordinate, character: &str) -> Result<(), EditError> {
        self.pending_edge = Some(self.graph.begin_edge(coordinate, character)?);
        self.mode = EditorMode::PlacingEdgeEnd;
        Ok(())
    }

    /// Bends the edge in progress toward `point`, so it can be drawn while
    /// the pointer moves.
    pub fn preview_pending_edge(&mut self, point: Coordinate) {
        if let Some(edge) = self.pending_edge.as_mut() {
            edge.curve.control1 = point;
        }
    }

    /// Selects the curve nearest to `point` for dragging.
    ///
    /// # Returns
    ///
    /// The selected edge's index, or `None` if there are no edges.
    pub fn select_curve_at(&mut self, point: Point) -> Option<usize> {
        let curves = self.graph.edges().iter().map(|edge| &edge.curve);
        let index = nearest_curve_index(curves, point, CURVE_HIT_SLICES)?;
        self.pending_edge = None;
        self.selected_edge = Some(index);
        self.mode = EditorMode::DraggingEdge;
        Some(index)
    }

    /// Moves the first control point of the selected curve to `point`.
    pub fn drag_selected_curve(&mut self, point: Coordinate) -> bool {
        match self.selected_edge {
            Some(index) if self.mode == EditorMode::DraggingEdge => {
                self.graph.set_edge_control(index, point)
            }
            _ => false,
        }
    }

    /// Undoes the newest edit.
    ///
    /// # Returns
    ///
    /// The element the undone edit had created, if any.
    pub fn undo(&mut self) -> Option<Element> {
        self.abandon_transient_state();
        let edit = self.history.undo(&mut self.graph)?;
        log::debug!("undid {:?}", edit);
        edit.element()
    }

    /// Redoes the most recently undone edit.
    pub fn redo(&mut self) -> Option<Element> {
        self.abandon_transient_state();
        let edit = self.history.redo(&mut self.graph)?;
        log::debug!("redid {:?}", edit);
        edit.element()
    }

    /// Clears the diagram, keeping it recoverable through redo.
    ///
    /// Leaves the editor in [`EditorMode::Idle`].
    pub fn discard_all(&mut self) {
        self.abandon_transient_state();
        self.history.discard_all(&mut self.graph);
        self.mode = EditorMode::Idle;
        log::debug!("discarded diagram");
    }

    fn abandon_transient_state(&mut self) {
        self.pending_edge = None;
        self.selected_edge = None;
        match self.mode {
            EditorMode::PlacingEdgeEnd => self.mode = EditorMode::PlacingEdgeStart,
            EditorMode::DraggingEdge => self.mode = EditorMode::Idle,
            _ => {}
        }
    }

    /// Captures the diagram and options.
    pub fn snapshot(&self) -> WorkspaceData {
        WorkspaceData::capture(&self.graph, &self.options)
    }

    /// Replaces the diagram and options with a saved workspace.
    ///
    /// History is replaced by one edit per restored node and edge, so the
    /// loaded diagram can be undone and cleared like a drawn one.
    ///
    /// # Errors
    ///
    /// Returns the validation error if `data` is inconsistent; the editor is
    /// left unchanged in that case.
    pub fn restore(&mut self, data: WorkspaceData) -> Result<(), WorkspaceError> {
        let (graph, options) = data.into_graph()?;
        self.graph = graph;
        self.options = options;
        self.history.record_contents(&self.graph);
        self.pending_edge = None;
        self.selected_edge = None;
        self.dialogue = None;
        self.mode = EditorMode::default();
        log::info!("restored workspace with {} nodes", self.graph.node_count());
        Ok(())
    }

    /// Everything needed to test `input` against the current diagram.
    pub fn string_check(&self, input: Option<String>) -> StringCheck {
        StringCheck {
            kind: self.options.type_of_automata,
            strict: self.options.should_strict_check,
            alphabet: self.options.alphabet.clone(),
            state_positions: self.graph.index().to_map(),
            start: self.graph.start_key().cloned(),
            input,
        }
    }
}
