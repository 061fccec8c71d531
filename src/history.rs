//! Undo/redo history for structural edits.
//!
//! Every successful edit is recorded once, in creation order. Undo pops the
//! newest edit and reverts it against the graph; redo replays the most
//! recently undone edit. Reverting always removes the newest node or edge,
//! so list positions stay valid as long as edits are only made through the
//! history.

use crate::graph::Graph;
use crate::types::{Edge, Element, Node, StateKey};
use std::collections::HashMap;

/// One recorded structural edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// A node was placed
    PlaceNode {
        /// The node as placed
        node: Node,
        /// Start node whose flag this node took, restored on undo
        replaced_start: Option<StateKey>,
    },
    /// An edge was completed between two nodes
    CompleteEdge(Edge),
    /// An existing node was marked final
    MarkFinal {
        /// Key of the node that became final
        position: StateKey,
    },
}

impl Edit {
    /// The element this edit created, if it created one.
    pub fn element(&self) -> Option<Element> {
        match self {
            Edit::PlaceNode { node, .. } => Some(Element::Node(node.clone())),
            Edit::CompleteEdge(edge) => Some(Element::Edge(edge.clone())),
            Edit::MarkFinal { .. } => None,
        }
    }
}

/// Applied and undone edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditHistory {
    applied: Vec<Edit>,
    undone: Vec<Edit>,
}

impl EditHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an edit that has already been applied to the graph.
    ///
    /// This clears the redo stack since a new edit invalidates any previously
    /// undone ones.
    pub fn record(&mut self, edit: Edit) {
        self.applied.push(edit);
        self.undone.clear();
    }

    /// Returns true if there are edits that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Returns true if there are edits that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Edits currently applied, oldest first.
    pub fn applied(&self) -> &[Edit] {
        &self.applied
    }

    /// Reverts the newest applied edit.
    ///
    /// # Returns
    ///
    /// The reverted edit, or `None` if there was nothing to undo or the graph
    /// no longer matched the edit.
    pub fn undo(&mut self, target: &mut impl Undoable) -> Option<Edit> {
        let edit = self.applied.pop()?;
        match target.revert(&edit) {
            Some(reverted) => {
                self.undone.push(reverted.clone());
                Some(reverted)
            }
            None => {
                log::warn!("dropping edit that no longer matches the diagram: {:?}", edit);
                None
            }
        }
    }

    /// Replays the most recently undone edit.
    ///
    /// # Returns
    ///
    /// The replayed edit, or `None` if there was nothing to redo or the edit
    /// could not be replayed.
    pub fn redo(&mut self, target: &mut impl Undoable) -> Option<Edit> {
        let edit = self.undone.pop()?;
        match target.reapply(&edit) {
            Some(reapplied) => {
                self.applied.push(reapplied.clone());
                Some(reapplied)
            }
            None => {
                log::warn!("dropping edit that cannot be replayed: {:?}", edit);
                None
            }
        }
    }

    /// Clears the diagram in one step, keeping every applied edit redoable.
    ///
    /// The redo stack is replaced by the applied edits in reverse so that
    /// individual redos rebuild the diagram in its original order.
    pub fn discard_all(&mut self, graph: &mut Graph) {
        self.undone = self.applied.drain(..).rev().collect();
        graph.clear_all();
    }

    /// Replaces the history with one edit per live element of `graph`.
    ///
    /// Nodes are recorded in creation order followed by the edges, so a
    /// diagram that was loaded rather than drawn can still be undone or
    /// cleared and redone.
    pub fn record_contents(&mut self, graph: &Graph) {
        self.clear();
        self.applied.extend(graph.nodes().map(|node| Edit::PlaceNode {
            node: Node {
                outgoing: HashMap::new(),
                ..node.clone()
            },
            replaced_start: None,
        }));
        self.applied
            .extend(graph.edges().iter().cloned().map(Edit::CompleteEdge));
    }

    /// Forgets every recorded edit.
    pub fn clear(&mut self) {
        self.applied.clear();
        self.undone.clear();
    }
}

/// Something edits can be reverted against and replayed onto.
pub trait Undoable {
    /// Reverts `edit`, returning the form of it that should be replayed on redo.
    fn revert(&mut self, edit: &Edit) -> Option<Edit>;

    /// Replays `edit`, returning the form of it that should be reverted on undo.
    fn reapply(&mut self, edit: &Edit) -> Option<Edit>;
}

impl Undoable for Graph {
    fn revert(&mut self, edit: &Edit) -> Option<Edit> {
        match edit {
            Edit::PlaceNode { node, replaced_start } => {
                let removed = self.pop_node(&node.key())?;
                if let Some(previous) = replaced_start {
                    if !self.restore_start(previous) {
                        log::warn!("displaced start node {} no longer exists", previous);
                    }
                }
                Some(Edit::PlaceNode {
                    node: removed,
                    replaced_start: replaced_start.clone(),
                })
            }
            Edit::CompleteEdge(edge) => {
                let live = self.pop_edge()?;
                if live.curve.start != edge.curve.start
                    || live.curve.end != edge.curve.end
                    || live.character != edge.character
                {
                    log::warn!("newest edge does not match the recorded one");
                    self.push_edge_unlinked(live);
                    return None;
                }
                // A missing entry just means there is nothing left to unlink.
                if let Err(err) = self.unlink_newest(
                    &live.source_key(),
                    &live.destination_key(),
                    &live.character,
                ) {
                    log::debug!("{}", err);
                }
                // The live edge keeps any control point dragged since it was drawn.
                Some(Edit::CompleteEdge(live))
            }
            Edit::MarkFinal { position } => self
                .unmark_final(position)
                .then(|| edit.clone()),
        }
    }

    fn reapply(&mut self, edit: &Edit) -> Option<Edit> {
        match edit {
            Edit::PlaceNode { node, .. } => {
                if self.index().contains(node.position) {
                    return None;
                }
                let replaced_start = if node.is_start { self.take_start() } else { None };
                self.insert_node(Node {
                    outgoing: HashMap::new(),
                    ..node.clone()
                });
                Some(Edit::PlaceNode {
                    node: node.clone(),
                    replaced_start,
                })
            }
            Edit::CompleteEdge(edge) => {
                let connects = self.node(edge.source_key().as_str()).is_some()
                    && self.node(edge.destination_key().as_str()).is_some();
                if !connects {
                    return None;
                }
                self.push_edge(edge.clone());
                Some(edit.clone())
            }
            Edit::MarkFinal { position } => self.set_final(position).then(|| edit.clone()),
        }
    }
}
