//! Core data types and structures for the automata workbench.
//!
//! This module defines the fundamental data structures shared by the editing
//! engine and the UI: coordinates and their canonical keys, Bézier curves,
//! nodes (automaton states), edges (transitions) and the editor mode.

use crate::error::CoordinateParseError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An exact position in model space.
///
/// Coordinates double as identities: two nodes are the same node iff their
/// coordinates are equal, which is why the components are integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Coordinate {
    /// Horizontal position
    pub x: i32,
    /// Vertical position
    pub y: i32,
}

impl Coordinate {
    /// Creates a coordinate from its components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the canonical `"x,y"` key for this coordinate.
    pub fn key(&self) -> StateKey {
        StateKey(self.to_string())
    }

    /// Returns this coordinate shifted by the given offsets, saturating at
    /// the bounds of `i32`.
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| CoordinateParseError(s.to_string()))?;
        let x = x
            .trim()
            .parse()
            .map_err(|_| CoordinateParseError(s.to_string()))?;
        let y = y
            .trim()
            .parse()
            .map_err(|_| CoordinateParseError(s.to_string()))?;
        Ok(Self { x, y })
    }
}

/// Canonical string encoding of a [`Coordinate`], used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the key back into the coordinate it was built from.
    pub fn coordinate(&self) -> Result<Coordinate, CoordinateParseError> {
        self.0.parse()
    }
}

impl From<Coordinate> for StateKey {
    fn from(coordinate: Coordinate) -> Self {
        coordinate.key()
    }
}

impl Borrow<str> for StateKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for StateKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A point produced by geometric evaluation, which need not lie on the integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
}

impl Point {
    /// Creates a point from its components.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Rounds the point onto the nearest integer coordinate.
    pub fn round(self) -> Coordinate {
        Coordinate::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<Coordinate> for Point {
    fn from(c: Coordinate) -> Self {
        Self {
            x: c.x as f32,
            y: c.y as f32,
        }
    }
}

/// A cubic Bézier curve described by its end points and two control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BezierCurve {
    /// Where the curve begins
    #[serde(rename = "start_point")]
    pub start: Coordinate,
    /// First control point, pulled from the start
    #[serde(rename = "control_point_one")]
    pub control1: Coordinate,
    /// Second control point, pulled toward the end
    #[serde(rename = "control_point_two")]
    pub control2: Coordinate,
    /// Where the curve ends
    #[serde(rename = "end_point")]
    pub end: Coordinate,
}

impl BezierCurve {
    /// Creates a zero-length curve whose four points all sit at `point`.
    pub const fn degenerate(point: Coordinate) -> Self {
        Self {
            start: point,
            control1: point,
            control2: point,
            end: point,
        }
    }

    /// Whether the curve begins and ends at the same coordinate.
    pub fn is_loop(&self) -> bool {
        self.start == self.end
    }
}

/// A placed automaton state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Position of the node; also its identity
    pub position: Coordinate,
    /// Destination keys reachable from this node, grouped by transition character
    #[serde(rename = "states_connected_to", default)]
    pub outgoing: HashMap<String, Vec<StateKey>>,
    /// Whether the automaton starts in this node
    pub is_start: bool,
    /// Whether this node accepts
    pub is_final: bool,
}

impl Node {
    /// Creates a node at `position` with no outgoing transitions.
    ///
    /// # Arguments
    ///
    /// * `position` - Where the node is placed
    /// * `is_start` - Whether the node is the start node
    pub fn new(position: Coordinate, is_start: bool) -> Self {
        Self {
            position,
            outgoing: HashMap::new(),
            is_start,
            is_final: false,
        }
    }

    /// Canonical key of this node's position.
    pub fn key(&self) -> StateKey {
        self.position.key()
    }

    /// Destinations reachable from this node by `character`, if any were drawn.
    pub fn destinations(&self, character: &str) -> Option<&[StateKey]> {
        self.outgoing.get(character).map(Vec::as_slice)
    }
}

/// A drawn transition between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Curve used to draw the transition; its end points are the logical endpoints
    pub curve: BezierCurve,
    /// Label of the transition (an input character or the epsilon symbol)
    #[serde(rename = "connection_character")]
    pub character: String,
}

impl Edge {
    /// Creates a zero-length edge anchored at `start`.
    pub fn new(start: Coordinate, character: impl Into<String>) -> Self {
        Self {
            curve: BezierCurve::degenerate(start),
            character: character.into(),
        }
    }

    /// Key of the node the edge leaves from.
    pub fn source_key(&self) -> StateKey {
        self.curve.start.key()
    }

    /// Key of the node the edge points to.
    pub fn destination_key(&self) -> StateKey {
        self.curve.end.key()
    }

    /// Whether the edge is labelled with the epsilon symbol.
    pub fn is_epsilon(&self) -> bool {
        self.character == crate::constants::EPSILON_SYMBOL
    }
}

/// Either kind of placed diagram element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Element {
    /// A placed state
    Node(Node),
    /// A drawn transition
    Edge(Edge),
}

/// What a click on the canvas currently means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EditorMode {
    /// Clicking places a regular node
    #[default]
    AddingNode,
    /// Clicking marks an existing node as final
    AddingFinalNode,
    /// Clicking places the start node
    AddingStartNode,
    /// Clicking on a node begins an edge labelled with the default character
    PlacingEdgeStart,
    /// Clicking on a node begins an epsilon edge
    PlacingEpsilonEdgeStart,
    /// Clicking on a node completes the pending edge
    PlacingEdgeEnd,
    /// A curve is selected and follows the pointer
    DraggingEdge,
    /// Clicks have no effect
    Idle,
}

impl EditorMode {
    /// Modes a user can pick from the toolbar.
    pub const SELECTABLE: [EditorMode; 6] = [
        EditorMode::AddingNode,
        EditorMode::AddingStartNode,
        EditorMode::AddingFinalNode,
        EditorMode::PlacingEdgeStart,
        EditorMode::PlacingEpsilonEdgeStart,
        EditorMode::Idle,
    ];

    /// Short label shown in the toolbar.
    pub fn label(&self) -> &'static str {
        match self {
            EditorMode::AddingNode => "Node",
            EditorMode::AddingFinalNode => "Final",
            EditorMode::AddingStartNode => "Start",
            EditorMode::PlacingEdgeStart | EditorMode::PlacingEdgeEnd => "Edge",
            EditorMode::PlacingEpsilonEdgeStart => "ϵ Edge",
            EditorMode::DraggingEdge => "Drag",
            EditorMode::Idle => "Select",
        }
    }
}

/// Family of automaton being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AutomatonKind {
    /// Deterministic finite automaton
    #[default]
    DFA,
    /// Nondeterministic finite automaton (epsilon transitions allowed)
    NFA,
}
