//! Application state management structures.
//!
//! This module contains the state structures that track the application's
//! current UI state: canvas navigation, pointer interaction, file operations
//! and requests in flight to the backend.

use crate::backend::{AutomataBackend, CheckedString, LocalBackend};
use crate::editor::Editor;
use crate::error::BackendError;
use crate::parse_tree::ParseTree;
use crate::types::StateKey;
use crate::workspace::{Session, WorkspaceData};
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Key the app state is stored under in eframe storage.
pub const APP_STATE_KEY: &str = "app_state";

/// State related to canvas navigation and display.
///
/// Tracks the current pan offset, zoom level, and display options for the canvas.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasState {
    /// Current canvas pan offset for navigation (in screen space)
    #[serde(skip)]
    pub offset: egui::Vec2,
    /// Current zoom level (1.0 = normal, 2.0 = 2x zoom, 0.5 = 50% zoom)
    pub zoom_factor: f32,
    /// Whether the snap grid should be displayed on the canvas
    pub show_grid: bool,
    /// Whether the loaded parse tree is shown instead of the diagram
    pub show_parse_tree: bool,
    /// Set once the origin has been centred in the canvas
    #[serde(skip)]
    pub centred: bool,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
            show_grid: true,
            show_parse_tree: false,
            centred: false,
        }
    }
}

/// State related to pointer interaction with the canvas.
#[derive(Default)]
pub struct InteractionState {
    /// Whether the user is currently panning the canvas
    pub is_panning: bool,
    /// Last mouse position during panning operation
    pub last_pan_pos: Option<egui::Pos2>,
    /// Pointer position in world space, while it is over the canvas
    pub hover_world: Option<egui::Pos2>,
}

/// State related to file operations.
///
/// Manages file paths and the channel async file dialogs report back on.
pub struct FileState {
    /// Current file path for save/load operations
    pub current_path: Option<String>,
    /// Pending file operation, started on the next frame
    pub pending_operation: Option<PendingFileOperation>,
    /// Channel for receiving file operation results from async contexts
    pub sender: Sender<FileOperationResult>,
    /// Receiving end of [`FileState::sender`]
    pub receiver: Receiver<FileOperationResult>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            pending_operation: None,
            sender,
            receiver,
        }
    }
}

/// File operations the toolbar can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingFileOperation {
    /// Write the workspace to the current path, or ask for one
    Save,
    /// Always ask where to write the workspace
    SaveAs,
    /// Pick a workspace file to open
    Open,
    /// Pick a parse tree file to display
    OpenParseTree,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path
    SaveCompleted(String),
    /// A workspace file was read: path and content
    WorkspaceLoaded(String, String),
    /// A parse tree file was read: path and content
    ParseTreeLoaded(String, String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// Answers coming back from the backend.
#[derive(Debug)]
pub enum BackendResult {
    /// A string was checked
    Checked(Result<CheckedString, BackendError>),
    /// The workspace was saved
    Saved(Result<(), BackendError>),
    /// A saved workspace was fetched
    Loaded(Result<WorkspaceData, BackendError>),
    /// The stored alphabet after sanitizing
    AlphabetUpdated(Result<Vec<String>, BackendError>),
    /// The stored strict-checking flag
    StrictCheckingUpdated(Result<bool, BackendError>),
    /// The stored traversal-highlighting flag
    TraversalUpdated(Result<bool, BackendError>),
    /// The stored default edge character
    DefaultCharacterUpdated(Result<String, BackendError>),
}

/// Requests to the backend and what they produced.
pub struct BackendState {
    /// Where requests are sent
    pub backend: Arc<dyn AutomataBackend>,
    /// Channel spawned requests report back on
    pub sender: Sender<BackendResult>,
    /// Receiving end of [`BackendState::sender`]
    pub receiver: Receiver<BackendResult>,
    /// Number of requests not yet answered
    pub in_flight: usize,
    /// String typed into the test field
    pub string_input: String,
    /// Alphabet as typed, comma separated
    pub alphabet_input: String,
    /// Default edge character as typed
    pub character_input: String,
    /// Result of the last string check
    pub last_check: Option<CheckedString>,
    /// States to highlight from the last string check
    pub highlighted: Vec<StateKey>,
}

impl BackendState {
    /// Uses `backend` for every request.
    pub fn with_backend(backend: Arc<dyn AutomataBackend>) -> Self {
        let (sender, receiver) = channel();
        Self {
            backend,
            sender,
            receiver,
            in_flight: 0,
            string_input: String::new(),
            alphabet_input: String::new(),
            character_input: String::new(),
            last_check: None,
            highlighted: Vec::new(),
        }
    }
}

impl Default for BackendState {
    fn default() -> Self {
        Self::with_backend(Arc::new(LocalBackend::new()))
    }
}

/// The main application structure containing UI state and the editor.
///
/// This struct implements the `eframe::App` trait and handles all user interface
/// rendering and interaction logic.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct AutomataApp {
    /// The diagram being edited, persisted as a workspace snapshot
    #[serde(with = "editor_snapshot")]
    pub editor: Editor,
    /// Canvas navigation and display state
    pub canvas: CanvasState,
    /// Pointer interaction state
    #[serde(skip)]
    pub interaction: InteractionState,
    /// File operations state
    #[serde(skip)]
    pub file: FileState,
    /// Backend requests state
    #[serde(skip)]
    pub backend: BackendState,
    /// Open workspace and signed-in user
    pub session: Session,
    /// Parse tree loaded for display
    #[serde(skip)]
    pub parse_tree: Option<ParseTree>,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
}

impl Default for AutomataApp {
    fn default() -> Self {
        let mut app = Self {
            editor: Editor::new(),
            canvas: CanvasState::default(),
            interaction: InteractionState::default(),
            file: FileState::default(),
            backend: BackendState::default(),
            session: Session::default(),
            parse_tree: None,
            dark_mode: true,
        };
        app.sync_option_inputs();
        app
    }
}

impl AutomataApp {
    /// Serializes the application state to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes application state from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Restores the app from eframe storage, falling back to defaults.
    ///
    /// Session values from the environment take precedence over stored ones.
    pub fn from_storage(storage: Option<&dyn eframe::Storage>) -> Self {
        let mut app = storage
            .and_then(|storage| storage.get_string(APP_STATE_KEY))
            .and_then(|json| match Self::from_json(&json) {
                Ok(app) => Some(app),
                Err(err) => {
                    log::warn!("Discarding stored app state: {err}");
                    None
                }
            })
            .unwrap_or_default();
        app.session = Session::from_env().or(std::mem::take(&mut app.session));
        app.sync_option_inputs();
        app
    }
}

/// Stores the editor as the workspace snapshot it can be rebuilt from.
mod editor_snapshot {
    use crate::editor::Editor;
    use crate::workspace::WorkspaceData;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(editor: &Editor, serializer: S) -> Result<S::Ok, S::Error> {
        editor.snapshot().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Editor, D::Error> {
        let data = WorkspaceData::deserialize(deserializer)?;
        let mut editor = Editor::new();
        editor.restore(data).map_err(serde::de::Error::custom)?;
        Ok(editor)
    }
}
