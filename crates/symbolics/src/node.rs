//! Symbolic expression nodes.
//!
//! A closed algebra: every expression a generated kernel can contain is
//! one of these variants. Equality is structural, which is exactly the
//! equivalence the persistence roundtrip guarantees.

use serde::{Deserialize, Serialize};

/// A symbolic expression node.
///
/// Arithmetic follows the generated C dialect: `IntDiv` and `Mod`
/// truncate toward zero on integer operands, `Indexed` is linear array
/// access, `PointerCall` is an indirect call spelled `p->f(a, b)`, and
/// `ListInit` is a C brace initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A free symbol referenced by name.
    Symbol(String),
    /// Integer literal.
    Int(i64),
    /// Floating literal.
    Real(f64),
    Add(Box<Node>, Box<Node>),
    Sub(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
    /// Unary negation.
    Neg(Box<Node>),
    /// Truncating integer division.
    IntDiv(Box<Node>, Box<Node>),
    /// Remainder, C semantics.
    Mod(Box<Node>, Box<Node>),
    /// Linear array element access, `base[index]`.
    Indexed { base: String, index: Box<Node> },
    /// Call through a pointer, `pointer->function(params...)`.
    PointerCall {
        function: String,
        pointer: Box<Node>,
        params: Vec<String>,
    },
    /// Brace initializer, `{a, b, c}`.
    ListInit(Vec<Node>),
}

/// Fieldless kind register for [`Node`].
///
/// Doubles as the index into the reconstruction registry, so the
/// discriminant order here is load-bearing for [`ALL`](NodeKind::ALL)
/// completeness checks but not for any serialized byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Symbol,
    Int,
    Real,
    Add,
    Sub,
    Mul,
    Neg,
    IntDiv,
    Mod,
    Indexed,
    PointerCall,
    ListInit,
}

impl NodeKind {
    /// Every node kind, in declaration order.
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Symbol,
        NodeKind::Int,
        NodeKind::Real,
        NodeKind::Add,
        NodeKind::Sub,
        NodeKind::Mul,
        NodeKind::Neg,
        NodeKind::IntDiv,
        NodeKind::Mod,
        NodeKind::Indexed,
        NodeKind::PointerCall,
        NodeKind::ListInit,
    ];
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Symbol(_) => NodeKind::Symbol,
            Node::Int(_) => NodeKind::Int,
            Node::Real(_) => NodeKind::Real,
            Node::Add(..) => NodeKind::Add,
            Node::Sub(..) => NodeKind::Sub,
            Node::Mul(..) => NodeKind::Mul,
            Node::Neg(_) => NodeKind::Neg,
            Node::IntDiv(..) => NodeKind::IntDiv,
            Node::Mod(..) => NodeKind::Mod,
            Node::Indexed { .. } => NodeKind::Indexed,
            Node::PointerCall { .. } => NodeKind::PointerCall,
            Node::ListInit(_) => NodeKind::ListInit,
        }
    }

    /// Symbol node from anything string-like.
    pub fn sym(name: impl Into<String>) -> Node {
        Node::Symbol(name.into())
    }

    pub fn add(lhs: Node, rhs: Node) -> Node {
        Node::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: Node, rhs: Node) -> Node {
        Node::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: Node, rhs: Node) -> Node {
        Node::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn neg(operand: Node) -> Node {
        Node::Neg(Box::new(operand))
    }

    pub fn int_div(lhs: Node, rhs: Node) -> Node {
        Node::IntDiv(Box::new(lhs), Box::new(rhs))
    }

    pub fn modulo(lhs: Node, rhs: Node) -> Node {
        Node::Mod(Box::new(lhs), Box::new(rhs))
    }

    pub fn indexed(base: impl Into<String>, index: Node) -> Node {
        Node::Indexed {
            base: base.into(),
            index: Box::new(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_covers_every_variant() {
        let samples = [
            Node::sym("a"),
            Node::Int(1),
            Node::Real(1.5),
            Node::add(Node::sym("a"), Node::Int(1)),
            Node::sub(Node::sym("a"), Node::Int(1)),
            Node::mul(Node::sym("a"), Node::Int(1)),
            Node::neg(Node::sym("a")),
            Node::int_div(Node::sym("a"), Node::Int(3)),
            Node::modulo(Node::sym("t"), Node::Int(2)),
            Node::indexed("f", Node::sym("x")),
            Node::PointerCall {
                function: "foo".into(),
                pointer: Box::new(Node::sym("a")),
                params: vec!["b".into()],
            },
            Node::ListInit(vec![Node::sym("a")]),
        ];
        let kinds: Vec<NodeKind> = samples.iter().map(Node::kind).collect();
        assert_eq!(kinds, NodeKind::ALL);
    }

    #[test]
    fn equality_is_structural() {
        let a = Node::int_div(Node::sym("a"), Node::Int(3));
        let b = Node::int_div(Node::sym("a"), Node::Int(3));
        assert_eq!(a, b);
        assert_ne!(a, Node::int_div(Node::sym("a"), Node::Int(4)));
    }
}
