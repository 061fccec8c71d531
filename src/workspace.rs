//! Saved workspaces, their options, and the session they belong to.
//!
//! A [`WorkspaceData`] is the serialized form of a whole diagram: the shape
//! the backend stores and the JSON written to disk. Restoring one goes through
//! [`WorkspaceData::into_graph`], which rejects snapshots that would break the
//! graph's invariants instead of loading them.

use crate::constants::{DEFAULT_ALPHABET, DEFAULT_EDGE_CHARACTER};
use crate::error::WorkspaceError;
use crate::graph::Graph;
use crate::types::{AutomatonKind, Edge, Node, StateKey};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Environment variable naming the open workspace.
pub const WORKSPACE_ENV: &str = "AUTOMATA_WORKSPACE";

/// Environment variable holding the signed-in user's email.
pub const EMAIL_ENV: &str = "AUTOMATA_EMAIL";

/// Per-workspace settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceOptions {
    /// Which family of automaton is being drawn
    pub type_of_automata: AutomatonKind,
    /// Characters a DFA must have a transition for
    pub alphabet: Vec<String>,
    /// Whether strings are only tested against strictly valid DFAs
    pub should_strict_check: bool,
    /// Whether the states a tested string passes through are highlighted
    pub should_show_string_traversal: bool,
    /// Label given to newly drawn non-epsilon edges
    pub default_connection_character: String,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            type_of_automata: AutomatonKind::default(),
            alphabet: DEFAULT_ALPHABET.iter().map(|c| c.to_string()).collect(),
            should_strict_check: false,
            should_show_string_traversal: true,
            default_connection_character: DEFAULT_EDGE_CHARACTER.to_string(),
        }
    }
}

/// Drops alphabet entries that are not exactly one character, and repeats.
///
/// The first occurrence of each character keeps its position.
pub fn sanitize_alphabet<I, S>(alphabet: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    alphabet
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref().trim();
            let mut chars = entry.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if seen.insert(c) => Some(c.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Who is signed in and which workspace is open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Name of the open workspace
    pub workspace_name: Option<String>,
    /// Email of the signed-in user
    pub email: Option<String>,
}

impl Session {
    /// Reads the session from [`WORKSPACE_ENV`] and [`EMAIL_ENV`].
    ///
    /// Unset or blank variables read as `None`.
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            workspace_name: read(WORKSPACE_ENV),
            email: read(EMAIL_ENV),
        }
    }

    /// Fills any field missing here from `other`.
    pub fn or(self, other: Session) -> Self {
        Self {
            workspace_name: self.workspace_name.or(other.workspace_name),
            email: self.email.or(other.email),
        }
    }

    /// The workspace name and email, if both are known.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.workspace_name.as_deref()?, self.email.as_deref()?))
    }
}

/// Snapshot of a whole diagram and its options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceData {
    /// Position of the start node in `list_of_states`
    #[serde(default)]
    pub start_state_index: Option<usize>,
    /// Key of the start node
    #[serde(default)]
    pub start_state_position: Option<StateKey>,
    /// Every node filed under its key
    #[serde(default)]
    pub state_positions: HashMap<StateKey, Node>,
    /// Every node in creation order
    #[serde(default)]
    pub list_of_states: Vec<Node>,
    /// Every edge in creation order
    #[serde(default, rename = "list_of_regular_automata_connections")]
    pub connections: Vec<Edge>,
    /// Settings saved alongside the diagram
    #[serde(flatten)]
    pub options: WorkspaceOptions,
}

impl WorkspaceData {
    /// Captures `graph` and `options`.
    pub fn capture(graph: &Graph, options: &WorkspaceOptions) -> Self {
        Self {
            start_state_index: graph.start_index(),
            start_state_position: graph.start_key().cloned(),
            state_positions: graph.index().to_map(),
            list_of_states: graph.nodes().cloned().collect(),
            connections: graph.edges().to_vec(),
            options: options.clone(),
        }
    }

    /// Parses a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, WorkspaceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, WorkspaceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuilds the graph this snapshot describes.
    ///
    /// Nodes come from `list_of_states`; adjacency is rebuilt from the edges
    /// so that every recorded destination has a drawn edge behind it. The
    /// stored start index is ignored in favour of the nodes' own start flags.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkspaceError`] if a node is filed under the wrong key,
    /// two nodes share a position, more than one node is a start node, or an
    /// edge does not connect two listed nodes.
    pub fn into_graph(self) -> Result<(Graph, WorkspaceOptions), WorkspaceError> {
        for (listed, node) in &self.state_positions {
            if listed != &node.key() {
                return Err(WorkspaceError::KeyMismatch {
                    listed: listed.to_string(),
                    actual: node.key(),
                });
            }
        }

        let mut positions = HashSet::new();
        let mut start: Option<StateKey> = None;
        let mut nodes = Vec::with_capacity(self.list_of_states.len());
        for node in self.list_of_states {
            let key = node.key();
            if !positions.insert(key.clone()) {
                return Err(WorkspaceError::DuplicateNode(key));
            }
            if node.is_start {
                if let Some(first) = start.take() {
                    return Err(WorkspaceError::MultipleStarts { first, second: key });
                }
                start = Some(key);
            }
            nodes.push(Node {
                outgoing: HashMap::new(),
                ..node
            });
        }

        for edge in &self.connections {
            let (source, destination) = (edge.source_key(), edge.destination_key());
            if !positions.contains(&source) || !positions.contains(&destination) {
                return Err(WorkspaceError::DanglingEdge {
                    source_key: source,
                    destination,
                    character: edge.character.clone(),
                });
            }
        }

        if self.start_state_position.is_some() && self.start_state_position != start {
            log::warn!(
                "stored start {:?} disagrees with node flags; using {:?}",
                self.start_state_position,
                start
            );
        }

        let mut graph = Graph::from_parts(nodes, Vec::new());
        for edge in self.connections {
            graph.push_edge(edge);
        }
        Ok((graph, self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinate;

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node(Coordinate::new(100, 100), true).unwrap();
        graph.add_node(Coordinate::new(300, 100), false).unwrap();
        graph.mark_final(Coordinate::new(300, 100)).unwrap();
        let pending = graph.begin_edge(Coordinate::new(100, 100), "a").unwrap();
        graph.complete_edge(pending, Coordinate::new(300, 100)).unwrap();
        graph
    }

    #[test]
    fn test_sanitize_alphabet() {
        assert_eq!(
            sanitize_alphabet(["a", "bc", "", "b", "a", " c "]),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_capture_and_restore() {
        let graph = sample_graph();
        let data = WorkspaceData::capture(&graph, &WorkspaceOptions::default());
        assert_eq!(data.start_state_index, Some(0));
        assert_eq!(data.start_state_position, Some(Coordinate::new(100, 100).key()));
        assert_eq!(data.state_positions.len(), 2);

        let json = data.to_json().unwrap();
        let (restored, options) = WorkspaceData::from_json(&json).unwrap().into_graph().unwrap();
        assert_eq!(restored, graph);
        assert_eq!(options, WorkspaceOptions::default());
    }

    #[test]
    fn test_options_are_flattened_and_defaulted() {
        let data = WorkspaceData::from_json(r#"{"alphabet": ["0", "1"]}"#).unwrap();
        assert_eq!(data.options.alphabet, vec!["0", "1"]);
        assert_eq!(data.options.default_connection_character, "a");
        assert!(data.list_of_states.is_empty());

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type_of_automata"], "DFA");
        assert!(json["list_of_regular_automata_connections"].is_array());
    }

    #[test]
    fn test_restore_rejects_dangling_edge() {
        let mut data = WorkspaceData::capture(&sample_graph(), &WorkspaceOptions::default());
        data.list_of_states.pop();
        data.state_positions.remove("300,100");
        let result = data.into_graph();
        assert!(matches!(result, Err(WorkspaceError::DanglingEdge { .. })));
    }

    #[test]
    fn test_restore_rejects_two_starts() {
        let mut data = WorkspaceData::capture(&sample_graph(), &WorkspaceOptions::default());
        data.list_of_states[1].is_start = true;
        data.state_positions.clear();
        assert!(matches!(
            data.into_graph(),
            Err(WorkspaceError::MultipleStarts { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_misfiled_node() {
        let mut data = WorkspaceData::capture(&sample_graph(), &WorkspaceOptions::default());
        let node = data.list_of_states[0].clone();
        data.state_positions.insert(Coordinate::new(1, 1).key(), node);
        assert!(matches!(
            data.into_graph(),
            Err(WorkspaceError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_session_credentials_need_both_fields() {
        let partial = Session {
            workspace_name: Some("w".into()),
            email: None,
        };
        assert!(partial.credentials().is_none());
        let full = partial.or(Session {
            workspace_name: Some("ignored".into()),
            email: Some("me@example.com".into()),
        });
        assert_eq!(full.credentials(), Some(("w", "me@example.com")));
    }
}
