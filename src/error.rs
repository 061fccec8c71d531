//! Error types for editing, persistence and the backend boundary.
//!
//! Editing errors are never fatal: their `Display` text is the advisory
//! message shown to the user, and the rejected mutation is simply not applied.

use crate::types::StateKey;

/// Which endpoint of an action failed to find a node under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorTarget {
    /// The node being marked as final
    FinalNode,
    /// The node an edge should leave from
    EdgeStart,
    /// The node an edge should point to
    EdgeEnd,
}

/// A rejected structural edit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// A node already sits at the requested position
    #[error("You cannot place a Node on top of another Node.")]
    OccupiedPosition(StateKey),

    /// The node is already final
    #[error("The Node is already a final Node.")]
    AlreadyFinal(StateKey),

    /// No node sits at the clicked coordinate
    #[error("{}", no_node_message(.target))]
    NoNodeUnderCursor { key: StateKey, target: CursorTarget },

    /// An edge end was placed with no edge in progress
    #[error("Choose where the arrow starts before choosing where it ends.")]
    NoPendingEdge,

    /// Undo found no recorded destination for the transition
    #[error("No '{character}' transition from {source_key} to {destination} is recorded.")]
    MissingAdjacencyEntry {
        source_key: StateKey,
        destination: StateKey,
        character: String,
    },
}

fn no_node_message(target: &CursorTarget) -> &'static str {
    match target {
        CursorTarget::FinalNode => "You must make an existing Node a final Node.",
        CursorTarget::EdgeStart => "You must place an arrow on top of a Node.",
        CursorTarget::EdgeEnd => "The arrow must point to a valid Node.",
    }
}

/// A coordinate key that is not of the form `"x,y"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid coordinate key")]
pub struct CoordinateParseError(pub String);

/// A snapshot that cannot be restored into a consistent editor.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// The snapshot is not valid JSON for a workspace
    #[error("Invalid workspace JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A state map entry is filed under the wrong key
    #[error("Node key {listed} does not match its position {actual}")]
    KeyMismatch { listed: String, actual: StateKey },

    /// Two listed nodes share a position
    #[error("Two nodes occupy {0}")]
    DuplicateNode(StateKey),

    /// A transition endpoint does not resolve to a node
    #[error("Transition '{character}' from {source_key} to {destination} does not connect two nodes")]
    DanglingEdge {
        source_key: StateKey,
        destination: StateKey,
        character: String,
    },

    /// Several nodes claim to be the start node
    #[error("More than one start node ({first} and {second})")]
    MultipleStarts { first: StateKey, second: StateKey },
}

/// A failed request across the backend command boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The request never reached the backend
    #[error("Backend unavailable: {0}")]
    Transport(String),

    /// The backend refused the request
    #[error("Backend rejected {command}: {message}")]
    Rejected { command: String, message: String },

    /// The response did not have the expected shape
    #[error("Malformed response from {command}: {message}")]
    MalformedResponse { command: String, message: String },
}
