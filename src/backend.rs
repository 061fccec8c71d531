//! The command boundary to the automata backend.
//!
//! String testing, DFA validation and workspace persistence are requests
//! made over [`AutomataBackend`]. Every request takes owned data and returns
//! a boxed future, so the editor hands over a snapshot and keeps running while
//! the answer is computed. [`LocalBackend`] answers in-process.

use crate::constants::EPSILON_SYMBOL;
use crate::error::BackendError;
use crate::types::{AutomatonKind, Node, StateKey};
use crate::workspace::{sanitize_alphabet, Session, WorkspaceData};
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Shown when strict checking finds the diagram is not a complete DFA.
pub const INVALID_DFA_MESSAGE: &str = "Your DFA either does not specify every connection provided in the input alphabet, or specifies them more than once. Update the model or disable strict checking";

/// Nodes keyed by position, as sent to the backend.
pub type StatePositions = HashMap<StateKey, Node>;

/// Outcome of running a string through an automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTest {
    /// Whether the automaton accepts the string
    pub accepted: bool,
    /// States visited, starting with the start state
    pub states_traversed: Vec<Node>,
}

/// What the UI shows after checking a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckedString {
    /// Message for the user; empty when there is nothing to say
    pub dialogue: String,
    /// `None` when no test was run
    pub is_string_accepted: Option<bool>,
    /// States to highlight
    pub states_traversed: Vec<Node>,
}

/// Everything needed to check one string, detached from the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringCheck {
    /// Family of automaton to simulate
    pub kind: AutomatonKind,
    /// Whether to refuse DFAs that are not complete and deterministic
    pub strict: bool,
    /// Alphabet the DFA is validated against
    pub alphabet: Vec<String>,
    /// The diagram's nodes
    pub state_positions: StatePositions,
    /// Key of the start node
    pub start: Option<StateKey>,
    /// String to test
    pub input: Option<String>,
}

/// Requests the editor can make of a backend.
pub trait AutomataBackend: Send + Sync {
    /// Runs `input` through the diagram as a DFA.
    fn test_string_dfa(
        &self,
        state_positions: StatePositions,
        start: StateKey,
        input: String,
    ) -> BoxFuture<'static, Result<StringTest, BackendError>>;

    /// Runs `input` through the diagram as an NFA.
    fn test_string_nfa(
        &self,
        state_positions: StatePositions,
        start: StateKey,
        input: String,
    ) -> BoxFuture<'static, Result<StringTest, BackendError>>;

    /// Whether every node has exactly one transition per alphabet character
    /// and no others.
    fn verify_valid_dfa(
        &self,
        state_positions: StatePositions,
        alphabet: Vec<String>,
    ) -> BoxFuture<'static, Result<bool, BackendError>>;

    /// Stores the workspace under the session's name and email.
    fn save_workspace(
        &self,
        session: Session,
        data: WorkspaceData,
    ) -> BoxFuture<'static, Result<(), BackendError>>;

    /// Fetches a previously saved workspace.
    fn load_workspace(
        &self,
        session: Session,
    ) -> BoxFuture<'static, Result<WorkspaceData, BackendError>>;

    /// Replaces the alphabet, returning what was actually stored.
    fn update_workspace_alphabet(
        &self,
        session: Session,
        alphabet: Vec<String>,
    ) -> BoxFuture<'static, Result<Vec<String>, BackendError>>;

    /// Turns strict checking on or off.
    fn update_strict_checking(
        &self,
        session: Session,
        enabled: bool,
    ) -> BoxFuture<'static, Result<bool, BackendError>>;

    /// Turns traversal highlighting on or off.
    fn update_showing_string_traversal(
        &self,
        session: Session,
        enabled: bool,
    ) -> BoxFuture<'static, Result<bool, BackendError>>;

    /// Changes the label given to new edges.
    fn update_default_connection_character(
        &self,
        session: Session,
        character: String,
    ) -> BoxFuture<'static, Result<String, BackendError>>;
}

/// Validates strictly if asked to, then tests the string.
///
/// No test is run, and `is_string_accepted` is `None`, when the diagram has
/// no start node or there is no string to test.
pub async fn check_string(
    backend: &dyn AutomataBackend,
    check: StringCheck,
) -> Result<CheckedString, BackendError> {
    let StringCheck {
        kind,
        strict,
        alphabet,
        state_positions,
        start,
        input,
    } = check;

    if strict && kind == AutomatonKind::DFA {
        let valid = backend
            .verify_valid_dfa(state_positions.clone(), alphabet)
            .await?;
        if !valid {
            return Ok(CheckedString {
                dialogue: INVALID_DFA_MESSAGE.to_string(),
                ..CheckedString::default()
            });
        }
    }

    let (Some(start), Some(input)) = (start, input) else {
        return Ok(CheckedString::default());
    };

    let test = match kind {
        AutomatonKind::DFA => backend.test_string_dfa(state_positions, start, input).await?,
        AutomatonKind::NFA => backend.test_string_nfa(state_positions, start, input).await?,
    };
    Ok(CheckedString {
        dialogue: String::new(),
        is_string_accepted: Some(test.accepted),
        states_traversed: test.states_traversed,
    })
}

/// Follows the first recorded destination for each character.
///
/// The string is accepted iff every character has a transition and the last
/// state reached is final. A missing start state rejects with no states.
pub fn run_dfa(states: &StatePositions, start: &str, input: &str) -> StringTest {
    let Some(mut current) = states.get(start) else {
        return StringTest {
            accepted: false,
            states_traversed: Vec::new(),
        };
    };
    let mut traversed = vec![current.clone()];

    for c in input.chars() {
        let next = current
            .destinations(&c.to_string())
            .and_then(|keys| keys.first())
            .and_then(|key| states.get(key.as_str()));
        match next {
            Some(node) => {
                traversed.push(node.clone());
                current = node;
            }
            None => {
                return StringTest {
                    accepted: false,
                    states_traversed: traversed,
                }
            }
        }
    }

    StringTest {
        accepted: current.is_final,
        states_traversed: traversed,
    }
}

/// Searches depth-first for an accepting run, taking epsilon moves freely.
///
/// On acceptance the traversal is the accepting path; otherwise it holds only
/// the start state. Each (state, position) pair is explored at most once, so
/// epsilon cycles terminate.
pub fn run_nfa(states: &StatePositions, start: &str, input: &str) -> StringTest {
    let Some(start_node) = states.get(start) else {
        return StringTest {
            accepted: false,
            states_traversed: Vec::new(),
        };
    };
    let symbols: Vec<String> = input.chars().map(String::from).collect();
    let mut search = NfaSearch {
        states,
        symbols: &symbols,
        explored: HashSet::new(),
        path: Vec::new(),
    };
    if search.accepts(start_node, 0) {
        StringTest {
            accepted: true,
            states_traversed: search.path,
        }
    } else {
        StringTest {
            accepted: false,
            states_traversed: vec![start_node.clone()],
        }
    }
}

struct NfaSearch<'a> {
    states: &'a StatePositions,
    symbols: &'a [String],
    explored: HashSet<(StateKey, usize)>,
    path: Vec<Node>,
}

impl<'a> NfaSearch<'a> {
    fn accepts(&mut self, node: &'a Node, position: usize) -> bool {
        if !self.explored.insert((node.key(), position)) {
            return false;
        }
        self.path.push(node.clone());

        if position == self.symbols.len() && node.is_final {
            return true;
        }
        if let Some(symbol) = self.symbols.get(position) {
            for next in self.successors(node, symbol) {
                if self.accepts(next, position + 1) {
                    return true;
                }
            }
        }
        for next in self.successors(node, EPSILON_SYMBOL) {
            if self.accepts(next, position) {
                return true;
            }
        }

        self.path.pop();
        false
    }

    fn successors(&self, node: &Node, symbol: &str) -> Vec<&'a Node> {
        node.destinations(symbol)
            .unwrap_or_default()
            .iter()
            .filter_map(|key| self.states.get(key.as_str()))
            .collect()
    }
}

/// Whether every state has exactly one destination for every character of
/// `alphabet`, and no transitions on anything else.
pub fn is_valid_dfa(states: &StatePositions, alphabet: &[String]) -> bool {
    states.values().all(|node| {
        node.outgoing.len() == alphabet.len()
            && alphabet
                .iter()
                .all(|c| node.destinations(c).is_some_and(|keys| keys.len() == 1))
    })
}

/// In-process backend keeping saved workspaces in memory.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    workspaces: Arc<Mutex<HashMap<(String, String), WorkspaceData>>>,
}

impl LocalBackend {
    /// Creates a backend with no saved workspaces.
    pub fn new() -> Self {
        Self::default()
    }

    fn update<T, F>(&self, command: &str, session: &Session, apply: F) -> Result<T, BackendError>
    where
        F: FnOnce(&mut WorkspaceData) -> T,
    {
        let key = workspace_key(command, session)?;
        let mut workspaces = self.lock()?;
        let data = workspaces.get_mut(&key).ok_or_else(|| BackendError::Rejected {
            command: command.to_string(),
            message: format!("no saved workspace named '{}'", key.0),
        })?;
        Ok(apply(data))
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), WorkspaceData>>, BackendError> {
        self.workspaces
            .lock()
            .map_err(|_| BackendError::Transport("workspace store is poisoned".to_string()))
    }
}

fn workspace_key(command: &str, session: &Session) -> Result<(String, String), BackendError> {
    session
        .credentials()
        .map(|(name, email)| (name.to_string(), email.to_string()))
        .ok_or_else(|| BackendError::Rejected {
            command: command.to_string(),
            message: "no workspace is open".to_string(),
        })
}

impl AutomataBackend for LocalBackend {
    fn test_string_dfa(
        &self,
        state_positions: StatePositions,
        start: StateKey,
        input: String,
    ) -> BoxFuture<'static, Result<StringTest, BackendError>> {
        future::ready(Ok(run_dfa(&state_positions, start.as_str(), &input))).boxed()
    }

    fn test_string_nfa(
        &self,
        state_positions: StatePositions,
        start: StateKey,
        input: String,
    ) -> BoxFuture<'static, Result<StringTest, BackendError>> {
        future::ready(Ok(run_nfa(&state_positions, start.as_str(), &input))).boxed()
    }

    fn verify_valid_dfa(
        &self,
        state_positions: StatePositions,
        alphabet: Vec<String>,
    ) -> BoxFuture<'static, Result<bool, BackendError>> {
        future::ready(Ok(is_valid_dfa(&state_positions, &alphabet))).boxed()
    }

    fn save_workspace(
        &self,
        session: Session,
        data: WorkspaceData,
    ) -> BoxFuture<'static, Result<(), BackendError>> {
        let result = workspace_key("save_workspace", &session).and_then(|key| {
            log::info!("saving workspace '{}' ({} states)", key.0, data.list_of_states.len());
            self.lock()?.insert(key, data);
            Ok(())
        });
        future::ready(result).boxed()
    }

    fn load_workspace(
        &self,
        session: Session,
    ) -> BoxFuture<'static, Result<WorkspaceData, BackendError>> {
        let result = workspace_key("load_workspace", &session).and_then(|key| {
            self.lock()?
                .get(&key)
                .cloned()
                .ok_or_else(|| BackendError::Rejected {
                    command: "load_workspace".to_string(),
                    message: format!("no saved workspace named '{}'", key.0),
                })
        });
        future::ready(result).boxed()
    }

    fn update_workspace_alphabet(
        &self,
        session: Session,
        alphabet: Vec<String>,
    ) -> BoxFuture<'static, Result<Vec<String>, BackendError>> {
        let alphabet = sanitize_alphabet(alphabet);
        let result = self.update("update_workspace_alphabet", &session, |data| {
            data.options.alphabet = alphabet.clone();
            alphabet
        });
        future::ready(result).boxed()
    }

    fn update_strict_checking(
        &self,
        session: Session,
        enabled: bool,
    ) -> BoxFuture<'static, Result<bool, BackendError>> {
        let result = self.update("update_strict_checking", &session, |data| {
            data.options.should_strict_check = enabled;
            enabled
        });
        future::ready(result).boxed()
    }

    fn update_showing_string_traversal(
        &self,
        session: Session,
        enabled: bool,
    ) -> BoxFuture<'static, Result<bool, BackendError>> {
        let result = self.update("update_showing_string_traversal", &session, |data| {
            data.options.should_show_string_traversal = enabled;
            enabled
        });
        future::ready(result).boxed()
    }

    fn update_default_connection_character(
        &self,
        session: Session,
        character: String,
    ) -> BoxFuture<'static, Result<String, BackendError>> {
        let result = if character.chars().count() == 1 || character == EPSILON_SYMBOL {
            self.update("update_default_connection_character", &session, |data| {
                data.options.default_connection_character = character.clone();
                character
            })
        } else {
            Err(BackendError::Rejected {
                command: "update_default_connection_character".to_string(),
                message: format!("'{character}' is not a single character"),
            })
        };
        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Editor;
    use crate::types::{Coordinate, EditorMode};
    use futures::executor::block_on;

    fn at(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    /// Builds an editor from nodes (start first) and labelled edges.
    fn build(nodes: &[(Coordinate, bool)], edges: &[(Coordinate, Coordinate, &str)]) -> Editor {
        let mut editor = Editor::new();
        for (i, &(position, is_final)) in nodes.iter().enumerate() {
            editor.set_mode(if i == 0 {
                EditorMode::AddingStartNode
            } else {
                EditorMode::AddingNode
            });
            editor.handle_click(position).unwrap();
            if is_final {
                editor.set_mode(EditorMode::AddingFinalNode);
                editor.handle_click(position).unwrap();
            }
        }
        for &(from, to, ch) in edges {
            editor.set_mode(EditorMode::PlacingEdgeStart);
            editor.handle_click_with(from, ch).unwrap();
            editor.handle_click(to).unwrap();
        }
        editor
    }

    /// Accepts strings over {a, b} ending in `b`.
    fn ends_in_b() -> Editor {
        let (q0, q1) = (at(0, 0), at(200, 0));
        build(
            &[(q0, false), (q1, true)],
            &[(q0, q0, "a"), (q0, q1, "b"), (q1, q0, "a"), (q1, q1, "b")],
        )
    }

    fn states(editor: &Editor) -> StatePositions {
        editor.graph().index().to_map()
    }

    #[test]
    fn test_dfa_accepts_and_traces_path() {
        let editor = ends_in_b();
        let result = run_dfa(&states(&editor), "0,0", "ab");
        assert!(result.accepted);
        let path: Vec<_> = result.states_traversed.iter().map(|n| n.position).collect();
        assert_eq!(path, vec![at(0, 0), at(0, 0), at(200, 0)]);

        assert!(!run_dfa(&states(&editor), "0,0", "ba").accepted);
        assert!(!run_dfa(&states(&editor), "0,0", "").accepted);
    }

    #[test]
    fn test_dfa_stops_on_missing_transition() {
        let editor = ends_in_b();
        let result = run_dfa(&states(&editor), "0,0", "acb");
        assert!(!result.accepted);
        assert_eq!(result.states_traversed.len(), 2);

        let missing = run_dfa(&states(&editor), "9,9", "a");
        assert!(missing.states_traversed.is_empty());
    }

    #[test]
    fn test_nfa_uses_epsilon_moves() {
        let (q0, q1, q2) = (at(0, 0), at(200, 0), at(400, 0));
        let editor = build(
            &[(q0, false), (q1, false), (q2, true)],
            &[(q0, q1, EPSILON_SYMBOL), (q1, q0, EPSILON_SYMBOL), (q1, q2, "a")],
        );
        let result = run_nfa(&states(&editor), "0,0", "a");
        assert!(result.accepted);
        let path: Vec<_> = result.states_traversed.iter().map(|n| n.position).collect();
        assert_eq!(path, vec![q0, q1, q2]);

        let rejected = run_nfa(&states(&editor), "0,0", "aa");
        assert!(!rejected.accepted);
        assert_eq!(rejected.states_traversed.len(), 1);
    }

    #[test]
    fn test_nfa_tries_every_destination() {
        let (q0, q1, q2) = (at(0, 0), at(200, 0), at(200, 200));
        let editor = build(
            &[(q0, false), (q1, false), (q2, true)],
            &[(q0, q1, "a"), (q0, q2, "a")],
        );
        assert!(run_nfa(&states(&editor), "0,0", "a").accepted);
    }

    #[test]
    fn test_valid_dfa() {
        let alphabet = vec!["a".to_string(), "b".to_string()];
        assert!(is_valid_dfa(&states(&ends_in_b()), &alphabet));

        let (q0, q1) = (at(0, 0), at(200, 0));
        let partial = build(&[(q0, false), (q1, true)], &[(q0, q1, "a")]);
        assert!(!is_valid_dfa(&states(&partial), &alphabet));

        let doubled = build(
            &[(q0, false)],
            &[(q0, q0, "a"), (q0, q0, "a"), (q0, q0, "b")],
        );
        assert!(!is_valid_dfa(&states(&doubled), &alphabet));
    }

    #[test]
    fn test_check_string_strict_rejects_incomplete_dfa() {
        let (q0, q1) = (at(0, 0), at(200, 0));
        let mut editor = build(&[(q0, false), (q1, true)], &[(q0, q1, "a")]);
        editor.options.should_strict_check = true;
        let backend = LocalBackend::new();

        let check = editor.string_check(Some("a".into()));
        let checked = block_on(check_string(&backend, check)).unwrap();
        assert_eq!(checked.dialogue, INVALID_DFA_MESSAGE);
        assert_eq!(checked.is_string_accepted, None);

        editor.options.should_strict_check = false;
        let check = editor.string_check(Some("a".into()));
        let checked = block_on(check_string(&backend, check)).unwrap();
        assert_eq!(checked.is_string_accepted, Some(true));
        assert!(checked.dialogue.is_empty());
    }

    #[test]
    fn test_check_string_without_start_or_input() {
        let backend = LocalBackend::new();
        let editor = Editor::new();
        let check = editor.string_check(Some("a".into()));
        let checked = block_on(check_string(&backend, check)).unwrap();
        assert_eq!(checked, CheckedString::default());

        let editor = ends_in_b();
        let checked = block_on(check_string(&backend, editor.string_check(None))).unwrap();
        assert_eq!(checked.is_string_accepted, None);
    }

    #[test]
    fn test_workspace_commands() {
        let backend = LocalBackend::new();
        let session = Session {
            workspace_name: Some("homework".into()),
            email: Some("student@example.com".into()),
        };
        let editor = ends_in_b();

        block_on(backend.save_workspace(session.clone(), editor.snapshot())).unwrap();
        let echoed = block_on(backend.update_workspace_alphabet(
            session.clone(),
            vec!["0".into(), "01".into(), "1".into(), "0".into()],
        ))
        .unwrap();
        assert_eq!(echoed, vec!["0", "1"]);
        assert!(block_on(backend.update_strict_checking(session.clone(), true)).unwrap());

        let loaded = block_on(backend.load_workspace(session.clone())).unwrap();
        assert_eq!(loaded.options.alphabet, vec!["0", "1"]);
        assert!(loaded.options.should_strict_check);
        assert_eq!(loaded.list_of_states.len(), 2);

        let rejected = block_on(backend.update_default_connection_character(session, "ab".into()));
        assert!(matches!(rejected, Err(BackendError::Rejected { .. })));
    }

    #[test]
    fn test_commands_need_an_open_workspace() {
        let backend = LocalBackend::new();
        let result = block_on(backend.update_strict_checking(Session::default(), true));
        assert!(matches!(result, Err(BackendError::Rejected { .. })));
    }
}
