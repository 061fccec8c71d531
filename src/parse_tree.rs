//! Regular expression parse trees and their layout on the canvas.
//!
//! Trees arrive from the backend already parsed. Laying one out places each
//! token under its parent, with horizontal spread shrinking at every level
//! so that subtrees stay apart, and joins parent to child with the same kind
//! of curve used for edges.

use crate::constants::{
    NODE_RADIUS, PARSE_TREE_ARROW_GAP, PARSE_TREE_SHRINK_FACTOR, PARSE_TREE_X_SPACING,
    PARSE_TREE_Y_SPACING,
};
use crate::types::{BezierCurve, Coordinate, Point};
use serde::{Deserialize, Serialize};

/// Operator with a left and a right operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryOperator {
    /// Symbol drawn inside the operator's circle
    pub operator_character: String,
    /// Human-readable operator name
    #[serde(default)]
    pub operator_name: String,
    /// Left operand
    pub left_argument: Option<ParseTree>,
    /// Right operand
    pub right_argument: Option<ParseTree>,
}

/// Operator with a single operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnaryOperator {
    /// Symbol drawn inside the operator's circle
    pub operator_character: String,
    /// Human-readable operator name
    #[serde(default)]
    pub operator_name: String,
    /// The operand
    pub inner_argument: Option<ParseTree>,
}

/// One token of a parsed regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseTree {
    /// A single character
    Literal(String),
    /// `left + right`
    #[serde(rename = "OrOperator")]
    Or(Box<BinaryOperator>),
    /// `left ⋅ right`
    #[serde(rename = "ConcatenatedExpression")]
    Concatenation(Box<BinaryOperator>),
    /// `inner*`
    #[serde(rename = "KleeneOperator")]
    Kleene(Box<UnaryOperator>),
}

impl ParseTree {
    /// A literal leaf.
    pub fn literal(character: impl Into<String>) -> Self {
        Self::Literal(character.into())
    }

    /// `left + right`.
    pub fn or(left: ParseTree, right: ParseTree) -> Self {
        Self::Or(Box::new(BinaryOperator {
            operator_character: "+".to_string(),
            operator_name: "Or".to_string(),
            left_argument: Some(left),
            right_argument: Some(right),
        }))
    }

    /// `left ⋅ right`.
    pub fn concat(left: ParseTree, right: ParseTree) -> Self {
        Self::Concatenation(Box::new(BinaryOperator {
            operator_character: "⋅".to_string(),
            operator_name: "Concatenated Expressions".to_string(),
            left_argument: Some(left),
            right_argument: Some(right),
        }))
    }

    /// `inner*`.
    pub fn kleene(inner: ParseTree) -> Self {
        Self::Kleene(Box::new(UnaryOperator {
            operator_character: "*".to_string(),
            operator_name: "Kleene Star".to_string(),
            inner_argument: Some(inner),
        }))
    }

    /// Number of tokens in the tree.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(|child| child.size()).sum::<usize>()
    }

    /// Text drawn inside this token's circle.
    pub fn label(&self) -> &str {
        match self {
            ParseTree::Literal(character) => character.as_str(),
            ParseTree::Or(op) | ParseTree::Concatenation(op) => op.operator_character.as_str(),
            ParseTree::Kleene(op) => op.operator_character.as_str(),
        }
    }

    /// Which kind of token this is.
    pub fn kind(&self) -> TokenKind {
        match self {
            ParseTree::Literal(_) => TokenKind::Literal,
            ParseTree::Or(_) => TokenKind::Or,
            ParseTree::Concatenation(_) => TokenKind::Concatenation,
            ParseTree::Kleene(_) => TokenKind::Kleene,
        }
    }

    /// Operands, left to right. Missing operands are skipped.
    pub fn children(&self) -> Vec<&ParseTree> {
        match self {
            ParseTree::Literal(_) => Vec::new(),
            ParseTree::Or(op) | ParseTree::Concatenation(op) => op
                .left_argument
                .iter()
                .chain(op.right_argument.iter())
                .collect(),
            ParseTree::Kleene(op) => op.inner_argument.iter().collect(),
        }
    }
}

/// Token kinds, used to pick a colour when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A character
    Literal,
    /// Alternation
    Or,
    /// Concatenation
    Concatenation,
    /// Kleene star
    Kleene,
}

/// A token placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedToken {
    /// Centre of the token's circle
    pub position: Point,
    /// Text inside the circle
    pub label: String,
    /// Kind of token
    pub kind: TokenKind,
    /// Distance from the root
    pub depth: usize,
}

/// A laid-out tree: every token and the links joining parents to children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    /// Tokens in pre-order
    pub tokens: Vec<PlacedToken>,
    /// Unlabelled curves from each parent to each child
    pub links: Vec<BezierCurve>,
}

/// Horizontal distance from a token at `depth` to each of its children.
pub fn horizontal_spacing(depth: usize) -> f32 {
    PARSE_TREE_X_SPACING / PARSE_TREE_SHRINK_FACTOR.powi(depth as i32)
}

/// Lays out `tree` with its root at `root`.
pub fn layout(tree: &ParseTree, root: Coordinate) -> TreeLayout {
    let mut result = TreeLayout::default();
    place(tree, Point::from(root), 0, &mut result);
    result
}

fn place(tree: &ParseTree, position: Point, depth: usize, out: &mut TreeLayout) {
    out.tokens.push(PlacedToken {
        position,
        label: tree.label().to_string(),
        kind: tree.kind(),
        depth,
    });

    let children = tree.children();
    let spread = horizontal_spacing(depth);
    let offsets: &[f32] = match children.len() {
        0 => &[],
        1 => &[0.0],
        _ => &[-1.0, 1.0],
    };
    for (child, offset) in children.into_iter().zip(offsets) {
        let child_position = Point::new(
            position.x + offset * spread,
            position.y + PARSE_TREE_Y_SPACING,
        );
        out.links.push(link(position, child_position));
        place(child, child_position, depth + 1, out);
    }
}

/// Curve from the bottom of a parent's circle to just above its child.
fn link(parent: Point, child: Point) -> BezierCurve {
    let arrow_end = PARSE_TREE_Y_SPACING - NODE_RADIUS - PARSE_TREE_ARROW_GAP;
    let start = Point::new(parent.x, parent.y + NODE_RADIUS).round();
    let end = Point::new(child.x, parent.y + arrow_end).round();
    BezierCurve {
        start,
        control1: start,
        control2: end,
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParseTree {
        // (a + b)* ⋅ c
        ParseTree::concat(
            ParseTree::kleene(ParseTree::or(ParseTree::literal("a"), ParseTree::literal("b"))),
            ParseTree::literal("c"),
        )
    }

    #[test]
    fn test_size_counts_every_token() {
        assert_eq!(ParseTree::literal("a").size(), 1);
        assert_eq!(sample().size(), 6);
    }

    #[test]
    fn test_layout_positions() {
        let layout = layout(&sample(), Coordinate::new(500, 100));
        assert_eq!(layout.tokens.len(), 6);
        assert_eq!(layout.links.len(), 5);

        let root = &layout.tokens[0];
        assert_eq!(root.kind, TokenKind::Concatenation);
        assert_eq!(root.position, Point::new(500.0, 100.0));

        let kleene = &layout.tokens[1];
        assert_eq!(kleene.position, Point::new(250.0, 275.0));
        assert_eq!(kleene.depth, 1);

        // The star's only child sits straight below it.
        let or = &layout.tokens[2];
        assert_eq!(or.position.x, kleene.position.x);
        assert_eq!(or.label, "+");

        let a = &layout.tokens[3];
        let expected = or.position.x - horizontal_spacing(2);
        assert!((a.position.x - expected).abs() < 1e-3);
    }

    #[test]
    fn test_spacing_shrinks_with_depth() {
        assert_eq!(horizontal_spacing(0), 250.0);
        assert!(horizontal_spacing(3) < horizontal_spacing(2));
    }

    #[test]
    fn test_links_run_from_circle_to_child() {
        let layout = layout(&sample(), Coordinate::new(0, 0));
        let first = layout.links[0];
        assert_eq!(first.start, Coordinate::new(0, 35));
        assert_eq!(first.control1, first.start);
        assert_eq!(first.end, Coordinate::new(-250, 134));
        assert_eq!(first.control2, first.end);
    }

    #[test]
    fn test_backend_json_shape() {
        let json = r#"{"OrOperator": {
            "operator_character": "+",
            "operator_name": "Or",
            "left_argument": {"Literal": "a"},
            "right_argument": {"KleeneOperator": {
                "operator_character": "*",
                "operator_name": "Kleene Star",
                "inner_argument": {"Literal": "b"}
            }}
        }}"#;
        let tree: ParseTree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.kind(), TokenKind::Or);
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.children()[1].kind(), TokenKind::Kleene);
    }
}
