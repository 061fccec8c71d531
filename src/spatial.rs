//! Coordinate-keyed lookup of placed nodes.
//!
//! Clicks are resolved by exact key match only: a click hits a node iff it
//! lands on the very coordinate the node was placed at. Callers snap pointer
//! positions to the grid first so that nearby clicks land on that coordinate.

use crate::types::{Coordinate, Node, StateKey};
use std::collections::HashMap;

/// Map from canonical coordinate key to the node placed there.
///
/// The key set is always exactly the set of positions of live nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpatialIndex {
    states: HashMap<StateKey, Node>,
}

impl SpatialIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The node placed exactly at `coordinate`, if any.
    pub fn get(&self, coordinate: Coordinate) -> Option<&Node> {
        self.states.get(coordinate.to_string().as_str())
    }

    /// The node filed under `key`, if any.
    pub fn get_by_key(&self, key: &str) -> Option<&Node> {
        self.states.get(key)
    }

    pub(crate) fn get_mut_by_key(&mut self, key: &str) -> Option<&mut Node> {
        self.states.get_mut(key)
    }

    /// Files `node` under `coordinate`, returning whatever was there before.
    pub fn set(&mut self, coordinate: Coordinate, node: Node) -> Option<Node> {
        self.states.insert(coordinate.key(), node)
    }

    /// Removes and returns the node at `coordinate`.
    pub fn delete(&mut self, coordinate: Coordinate) -> Option<Node> {
        self.states.remove(coordinate.to_string().as_str())
    }

    /// Whether a node sits at `coordinate`.
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.get(coordinate).is_some()
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the index holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates over every indexed key and node, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Node)> {
        self.states.iter()
    }

    /// Removes every node.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Owned copy of the underlying map, in the shape the backend expects.
    pub fn to_map(&self) -> HashMap<StateKey, Node> {
        self.states.clone()
    }
}
