//! The diagram's node and edge containers and the edits that keep them consistent.
//!
//! A [`Graph`] owns exactly one record per node, filed in the [`SpatialIndex`]
//! under its coordinate key. Creation order is kept as a list of keys, so a
//! change to a node is visible through both views without copying it around.
//!
//! Invariants maintained by every operation:
//! - the creation-order list and the index hold the same set of keys;
//! - every edge's endpoints resolve to live nodes, and the source node lists
//!   the destination key under the edge's character;
//! - at most one node has `is_start` set, and it is the one `start` points at.
//!
//! The graph records what was drawn. Whether a character leads to one
//! destination (DFA) or many (NFA) is checked elsewhere.

use crate::constants::SELF_LOOP_OFFSET;
use crate::error::{CursorTarget, EditError};
use crate::spatial::SpatialIndex;
use crate::types::{Coordinate, Edge, Node, StateKey};

/// Result of placing a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// The node as it was placed
    pub node: Node,
    /// The start node that lost its flag to this one, if any
    pub replaced_start: Option<StateKey>,
}

/// Nodes and edges of one diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    index: SpatialIndex,
    order: Vec<StateKey>,
    edges: Vec<Edge>,
    start: Option<StateKey>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.index.get_by_key(key.as_str()))
    }

    /// Edges in creation order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Coordinate lookup of live nodes.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// The node placed exactly at `coordinate`.
    pub fn node_at(&self, coordinate: Coordinate) -> Option<&Node> {
        self.index.get(coordinate)
    }

    /// The node filed under `key`.
    pub fn node(&self, key: &str) -> Option<&Node> {
        self.index.get_by_key(key)
    }

    /// Key of the start node, if one is placed.
    pub fn start_key(&self) -> Option<&StateKey> {
        self.start.as_ref()
    }

    /// The start node, if one is placed.
    pub fn start_node(&self) -> Option<&Node> {
        self.start.as_ref().and_then(|key| self.node(key.as_str()))
    }

    /// Position of the start node in creation order.
    ///
    /// Derived on every call; list positions are never stored as identities.
    pub fn start_index(&self) -> Option<usize> {
        let start = self.start.as_ref()?;
        self.order.iter().position(|key| key == start)
    }

    /// Places a new node.
    ///
    /// A start node takes the start flag away from any previous start node.
    ///
    /// # Errors
    ///
    /// [`EditError::OccupiedPosition`] if a node already sits at `position`.
    pub fn add_node(
        &mut self,
        position: Coordinate,
        is_start: bool,
    ) -> Result<Placement, EditError> {
        if self.index.contains(position) {
            return Err(EditError::OccupiedPosition(position.key()));
        }
        let node = Node::new(position, is_start);
        let replaced_start = if is_start { self.take_start() } else { None };
        self.insert_node(node.clone());
        log::debug!("placed node {}", position);
        Ok(Placement { node, replaced_start })
    }

    /// Marks the node at `position` as final.
    ///
    /// # Errors
    ///
    /// [`EditError::NoNodeUnderCursor`] if no node sits at `position`, or
    /// [`EditError::AlreadyFinal`] if it is final already.
    pub fn mark_final(&mut self, position: Coordinate) -> Result<Node, EditError> {
        let key = position.key();
        let node = self
            .index
            .get_mut_by_key(key.as_str())
            .ok_or_else(|| EditError::NoNodeUnderCursor {
                key: key.clone(),
                target: CursorTarget::FinalNode,
            })?;
        if node.is_final {
            return Err(EditError::AlreadyFinal(key));
        }
        node.is_final = true;
        Ok(node.clone())
    }

    /// Starts a transition at the node under `start`.
    ///
    /// The returned edge is not part of the graph yet; its four curve points
    /// all sit at the start node until [`Graph::complete_edge`] is called.
    ///
    /// # Errors
    ///
    /// [`EditError::NoNodeUnderCursor`] if no node sits at `start`.
    pub fn begin_edge(&self, start: Coordinate, character: &str) -> Result<Edge, EditError> {
        let node = self
            .index
            .get(start)
            .ok_or_else(|| EditError::NoNodeUnderCursor {
                key: start.key(),
                target: CursorTarget::EdgeStart,
            })?;
        Ok(Edge::new(node.position, character))
    }

    /// Finishes `pending` at the node under `end` and adds it to the graph.
    ///
    /// A self-loop gets both control points pushed out diagonally so the loop
    /// stays visible; any other edge pins its second control point to the
    /// destination and keeps the first wherever it was dragged.
    ///
    /// # Errors
    ///
    /// [`EditError::NoNodeUnderCursor`] if no node sits at `end`, or if the
    /// edge's start node no longer exists.
    pub fn complete_edge(&mut self, pending: Edge, end: Coordinate) -> Result<Edge, EditError> {
        let destination = self
            .index
            .get(end)
            .map(|node| node.position)
            .ok_or_else(|| EditError::NoNodeUnderCursor {
                key: end.key(),
                target: CursorTarget::EdgeEnd,
            })?;
        if !self.index.contains(pending.curve.start) {
            return Err(EditError::NoNodeUnderCursor {
                key: pending.source_key(),
                target: CursorTarget::EdgeStart,
            });
        }

        let mut edge = pending;
        edge.curve.end = destination;
        if edge.curve.is_loop() {
            edge.curve.control1 = destination.offset(-SELF_LOOP_OFFSET, SELF_LOOP_OFFSET);
            edge.curve.control2 = destination.offset(-SELF_LOOP_OFFSET, -SELF_LOOP_OFFSET);
        } else {
            edge.curve.control2 = destination;
        }

        self.push_edge(edge.clone());
        log::debug!(
            "completed '{}' edge {} -> {}",
            edge.character,
            edge.curve.start,
            edge.curve.end
        );
        Ok(edge)
    }

    /// Removes the first occurrence of `destination` from `source`'s
    /// destinations for `character`.
    ///
    /// A character left with no destinations is dropped from the map.
    ///
    /// # Errors
    ///
    /// [`EditError::MissingAdjacencyEntry`] if nothing matching was recorded;
    /// the graph is left unchanged.
    pub fn remove_edge_from_adjacency(
        &mut self,
        source: &StateKey,
        destination: &StateKey,
        character: &str,
    ) -> Result<(), EditError> {
        self.unlink(source, destination, character, false)
    }

    /// Like [`Graph::remove_edge_from_adjacency`], but removes the last
    /// occurrence, which is the one the newest edge added.
    pub(crate) fn unlink_newest(
        &mut self,
        source: &StateKey,
        destination: &StateKey,
        character: &str,
    ) -> Result<(), EditError> {
        self.unlink(source, destination, character, true)
    }

    fn unlink(
        &mut self,
        source: &StateKey,
        destination: &StateKey,
        character: &str,
        newest: bool,
    ) -> Result<(), EditError> {
        let missing = || EditError::MissingAdjacencyEntry {
            source_key: source.clone(),
            destination: destination.clone(),
            character: character.to_string(),
        };
        let node = self
            .index
            .get_mut_by_key(source.as_str())
            .ok_or_else(missing)?;
        let destinations = node.outgoing.get_mut(character).ok_or_else(missing)?;
        let matches = |key: &StateKey| key == destination;
        let position = if newest {
            destinations.iter().rposition(matches)
        } else {
            destinations.iter().position(matches)
        }
        .ok_or_else(missing)?;
        destinations.remove(position);
        if destinations.is_empty() {
            node.outgoing.remove(character);
        }
        Ok(())
    }

    /// Moves the first control point of the edge at `index`.
    ///
    /// Returns `false` if there is no such edge.
    pub fn set_edge_control(&mut self, index: usize, control: Coordinate) -> bool {
        match self.edges.get_mut(index) {
            Some(edge) => {
                edge.curve.control1 = control;
                true
            }
            None => false,
        }
    }

    /// Empties every container and forgets the start node.
    pub fn clear_all(&mut self) {
        self.index.clear();
        self.order.clear();
        self.edges.clear();
        self.start = None;
    }

    /// Appends `node` to creation order and files it in the index.
    ///
    /// If the node is a start node it becomes the start node; the caller is
    /// responsible for having cleared any previous start flag.
    pub(crate) fn insert_node(&mut self, node: Node) {
        let key = node.key();
        if node.is_start {
            self.start = Some(key.clone());
        }
        self.order.push(key);
        self.index.set(node.position, node);
    }

    /// Removes the most recently placed node, which must sit at `expected`.
    ///
    /// Returns `None` without touching anything if the newest node is some
    /// other node.
    pub(crate) fn pop_node(&mut self, expected: &StateKey) -> Option<Node> {
        if self.order.last() != Some(expected) {
            log::warn!(
                "refusing to remove node {}: it is not the most recently placed node",
                expected
            );
            return None;
        }
        self.order.pop();
        let node = self.index.delete(expected.coordinate().ok()?)?;
        if self.start.as_ref() == Some(expected) {
            self.start = None;
        }
        Some(node)
    }

    /// Clears the current start node's flag and returns its key.
    pub(crate) fn take_start(&mut self) -> Option<StateKey> {
        let previous = self.start.take()?;
        if let Some(node) = self.index.get_mut_by_key(previous.as_str()) {
            node.is_start = false;
        }
        Some(previous)
    }

    /// Gives the start flag to the node filed under `key`, taking it from any
    /// other node. Returns `false` if no such node exists.
    pub(crate) fn restore_start(&mut self, key: &StateKey) -> bool {
        if self.index.get_by_key(key.as_str()).is_none() {
            return false;
        }
        self.take_start();
        if let Some(node) = self.index.get_mut_by_key(key.as_str()) {
            node.is_start = true;
        }
        self.start = Some(key.clone());
        true
    }

    /// Clears the final flag of the node filed under `key`.
    pub(crate) fn unmark_final(&mut self, key: &StateKey) -> bool {
        match self.index.get_mut_by_key(key.as_str()) {
            Some(node) => {
                node.is_final = false;
                true
            }
            None => false,
        }
    }

    /// Sets the final flag of the node filed under `key`.
    pub(crate) fn set_final(&mut self, key: &StateKey) -> bool {
        match self.index.get_mut_by_key(key.as_str()) {
            Some(node) => {
                node.is_final = true;
                true
            }
            None => false,
        }
    }

    /// Appends `edge` and registers its destination with its source node.
    ///
    /// The edge is appended even if its source is missing, in which case only
    /// the adjacency update is skipped.
    pub(crate) fn push_edge(&mut self, edge: Edge) {
        let destination = edge.destination_key();
        match self.index.get_mut_by_key(edge.source_key().as_str()) {
            Some(source) => source
                .outgoing
                .entry(edge.character.clone())
                .or_default()
                .push(destination),
            None => log::warn!(
                "edge from {} has no source node; adjacency not updated",
                edge.curve.start
            ),
        }
        self.edges.push(edge);
    }

    /// Puts an edge back on the list without touching adjacency.
    pub(crate) fn push_edge_unlinked(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Removes the most recently added edge.
    pub(crate) fn pop_edge(&mut self) -> Option<Edge> {
        self.edges.pop()
    }

    /// Rebuilds a graph from nodes in creation order and edges whose
    /// adjacency is already recorded on their source nodes.
    pub(crate) fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert_node(node);
        }
        graph.edges = edges;
        graph
    }

    /// Checks every container against the others.
    ///
    /// # Returns
    ///
    /// A description of the first inconsistency found.
    pub fn verify(&self) -> Result<(), String> {
        if self.order.len() != self.index.len() {
            return Err(format!(
                "{} nodes listed but {} indexed",
                self.order.len(),
                self.index.len()
            ));
        }
        for key in &self.order {
            let node = self
                .index
                .get_by_key(key.as_str())
                .ok_or_else(|| format!("listed node {key} is not indexed"))?;
            if &node.key() != key {
                return Err(format!("node at {} filed under {key}", node.position));
            }
        }
        let starts: Vec<_> = self.nodes().filter(|n| n.is_start).map(Node::key).collect();
        match (starts.as_slice(), &self.start) {
            ([], None) => {}
            ([only], Some(start)) if only == start => {}
            _ => return Err(format!("start flags {starts:?} disagree with start {:?}", self.start)),
        }
        for edge in &self.edges {
            let source = self
                .node(edge.source_key().as_str())
                .ok_or_else(|| format!("edge source {} missing", edge.curve.start))?;
            if self.node(edge.destination_key().as_str()).is_none() {
                return Err(format!("edge destination {} missing", edge.curve.end));
            }
            let recorded = source
                .destinations(&edge.character)
                .is_some_and(|keys| keys.contains(&edge.destination_key()));
            if !recorded {
                return Err(format!(
                    "'{}' edge {} -> {} missing from adjacency",
                    edge.character, edge.curve.start, edge.curve.end
                ));
            }
        }
        Ok(())
    }
}
