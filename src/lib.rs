//! # Automata Workbench
//!
//! A visual editor for finite automata. States are placed by clicking on a
//! snapping canvas and joined by curved, labelled transitions:
//! - **States**: one optional start state, any number of final states
//! - **Transitions**: labelled with an input character or ϵ, bendable by dragging
//! - **Parse trees**: regular expression trees laid out for display
//!
//! ## Features
//! - Click-driven editing with undo, redo and a recoverable "clear all"
//! - DFA and NFA string testing with traversal highlighting
//! - Strict DFA validation against a configurable alphabet
//! - Workspaces saved to files or to a backend
//! - Canvas panning and zooming

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backend;
pub mod constants;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod history;
pub mod parse_tree;
pub mod spatial;
pub mod types;
pub mod workspace;
mod ui;

// Re-export public types and functions
pub use backend::{AutomataBackend, CheckedString, LocalBackend, StringCheck, StringTest};
pub use editor::Editor;
pub use error::{BackendError, EditError, WorkspaceError};
pub use graph::Graph;
pub use history::{Edit, EditHistory, Undoable};
pub use types::*;
pub use ui::AutomataApp;
pub use workspace::{Session, WorkspaceData, WorkspaceOptions};

/// Runs the workbench with default window settings.
///
/// State saved by a previous run is restored from eframe storage.
///
/// # Example
///
/// ```no_run
/// use automata_workbench::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Automata Workbench",
        options,
        Box::new(|cc| Ok(Box::new(AutomataApp::from_storage(cc.storage)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_default() {
        let editor = Editor::default();
        assert_eq!(editor.graph().node_count(), 0);
        assert!(editor.graph().edges().is_empty());
        assert_eq!(editor.mode(), EditorMode::AddingNode);
        assert_eq!(editor.options.type_of_automata, AutomatonKind::DFA);
    }

    #[test]
    fn test_app_default() {
        let app = AutomataApp::default();
        assert!(app.dark_mode);
        assert!(app.parse_tree.is_none());
        assert!(!app.backend_busy());
    }
}
