//! Shared application-wide constants.
//! Centralizes tweakable values used across geometry, editing and rendering.

// Editing
/// Symbol used to label empty (epsilon) transitions.
pub const EPSILON_SYMBOL: &str = "ϵ";
/// Character assigned to new edges when no other default is configured.
pub const DEFAULT_EDGE_CHARACTER: &str = "a";
/// Input alphabet used by a fresh workspace.
pub const DEFAULT_ALPHABET: [&str; 2] = ["a", "b"];
/// Diagonal offset (in world units) applied to both control points of a self-loop.
pub const SELF_LOOP_OFFSET: i32 = 200;

// Geometry
/// Number of slices used when approximating the distance from a point to a curve.
pub const CURVE_HIT_SLICES: usize = 10;
/// Curve parameter sampled to approximate the direction at the end of a curve.
pub const END_TANGENT_SAMPLE: f32 = 0.99;

// Canvas
/// Grid that pointer positions snap to before they reach the editor.
pub const SNAP_GRID: i32 = 50;
/// Radius of a rendered node in world units.
pub const NODE_RADIUS: f32 = 35.0;
/// Radius of the outer ring drawn around final nodes.
pub const FINAL_RING_RADIUS: f32 = 42.0;
/// Length of the arrowhead strokes in world units.
pub const ARROW_HEAD_SIZE: f32 = 30.0;
/// Distance between an edge's midpoint and its label.
pub const EDGE_LABEL_OFFSET: f32 = 50.0;
/// Smallest allowed view scale factor.
pub const MIN_SCALE: f32 = 0.25;
/// Largest allowed view scale factor.
pub const MAX_SCALE: f32 = 4.0;

// Parse tree
/// Horizontal distance between a parse-tree node and its children at the root.
pub const PARSE_TREE_X_SPACING: f32 = 250.0;
/// Vertical distance between a parse-tree node and its children.
pub const PARSE_TREE_Y_SPACING: f32 = 175.0;
/// Factor the horizontal spacing is divided by at each level of depth.
pub const PARSE_TREE_SHRINK_FACTOR: f32 = 1.5;
/// Gap left between a link's arrow tip and the child node's outline.
pub const PARSE_TREE_ARROW_GAP: f32 = 6.0;
