//! Node reconstruction registry.
//!
//! Each node kind registers a [`NodeSpec`]: a stable string tag plus a
//! destructure/construct pair over a small argument vector. Envelopes
//! store `(tag, args)`; decoding looks the tag up here and rebuilds the
//! node through its `construct` function. A kind without a spec cannot
//! be captured, and a tag without a spec cannot be decoded; both surface
//! as errors instead of falling back to type inspection.
//!
//! Registration happens at link time through a distributed slice, the
//! same mechanism the kernel function registry uses. Lookup tables by
//! kind and by tag are built once on first use and are O(1) after that.

use std::collections::HashMap;
use std::sync::OnceLock;

use linkme::distributed_slice;

use crate::node::{Node, NodeKind};

/// Reconstruction argument.
///
/// The closed vocabulary node envelopes are written in. `Node` arguments
/// recurse; the rest are leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Node(Node),
    Name(String),
    Int(i64),
    Real(f64),
    NameList(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A node kind with no registered spec reached capture.
    #[error("no registered codec for node kind {0:?}")]
    Unregistered(NodeKind),
    /// An envelope named a tag this build does not know.
    #[error("unknown node tag `{0}`")]
    UnknownTag(String),
    /// Argument vector does not match the tag's shape.
    #[error("malformed arguments for node tag `{tag}`")]
    BadArgs { tag: &'static str },
}

/// Codec for one node kind.
pub struct NodeSpec {
    pub kind: NodeKind,
    /// Stable envelope tag. Never reuse or rename a tag once released.
    pub tag: &'static str,
    /// Break a node of this kind into reconstruction arguments.
    /// Returns `None` when handed a node of a different kind.
    pub destructure: fn(&Node) -> Option<Vec<Arg>>,
    /// Rebuild the node from reconstruction arguments.
    pub construct: fn(Vec<Arg>) -> Result<Node, RegistryError>,
}

/// All node codecs, collected at link time.
#[distributed_slice]
pub static NODE_SPECS: [NodeSpec];

const KIND_COUNT: usize = NodeKind::ALL.len();

fn kind_table() -> &'static [Option<&'static NodeSpec>; KIND_COUNT] {
    static TABLE: OnceLock<[Option<&'static NodeSpec>; KIND_COUNT]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [None; KIND_COUNT];
        for spec in NODE_SPECS {
            table[spec.kind as usize] = Some(spec);
        }
        table
    })
}

fn tag_table() -> &'static HashMap<&'static str, &'static NodeSpec> {
    static TABLE: OnceLock<HashMap<&'static str, &'static NodeSpec>> = OnceLock::new();
    TABLE.get_or_init(|| NODE_SPECS.iter().map(|spec| (spec.tag, spec)).collect())
}

/// Look up the codec for a node kind.
pub fn spec_for(kind: NodeKind) -> Option<&'static NodeSpec> {
    kind_table()[kind as usize]
}

/// Look up the codec for an envelope tag.
pub fn spec_for_tag(tag: &str) -> Option<&'static NodeSpec> {
    tag_table().get(tag).copied()
}

fn one_node(mut args: Vec<Arg>) -> Option<Node> {
    match (args.pop()?, args.pop()) {
        (Arg::Node(a), None) => Some(a),
        _ => None,
    }
}

fn two_nodes(mut args: Vec<Arg>) -> Option<(Node, Node)> {
    let b = args.pop()?;
    let a = args.pop()?;
    match (a, b, args.pop()) {
        (Arg::Node(a), Arg::Node(b), None) => Some((a, b)),
        _ => None,
    }
}

macro_rules! binary_spec {
    ($registration:ident, $kind:ident, $tag:literal, $variant:ident) => {
        #[distributed_slice(NODE_SPECS)]
        static $registration: NodeSpec = NodeSpec {
            kind: NodeKind::$kind,
            tag: $tag,
            destructure: |node| match node {
                Node::$variant(a, b) => {
                    Some(vec![Arg::Node((**a).clone()), Arg::Node((**b).clone())])
                }
                _ => None,
            },
            construct: |args| match two_nodes(args) {
                Some((a, b)) => Ok(Node::$variant(Box::new(a), Box::new(b))),
                None => Err(RegistryError::BadArgs { tag: $tag }),
            },
        };
    };
}

binary_spec!(SPEC_ADD, Add, "add", Add);
binary_spec!(SPEC_SUB, Sub, "sub", Sub);
binary_spec!(SPEC_MUL, Mul, "mul", Mul);
binary_spec!(SPEC_INT_DIV, IntDiv, "int_div", IntDiv);
binary_spec!(SPEC_MOD, Mod, "mod", Mod);

#[distributed_slice(NODE_SPECS)]
static SPEC_SYMBOL: NodeSpec = NodeSpec {
    kind: NodeKind::Symbol,
    tag: "symbol",
    destructure: |node| match node {
        Node::Symbol(name) => Some(vec![Arg::Name(name.clone())]),
        _ => None,
    },
    construct: |mut args| match (args.pop(), args.pop()) {
        (Some(Arg::Name(name)), None) => Ok(Node::Symbol(name)),
        _ => Err(RegistryError::BadArgs { tag: "symbol" }),
    },
};

#[distributed_slice(NODE_SPECS)]
static SPEC_INT: NodeSpec = NodeSpec {
    kind: NodeKind::Int,
    tag: "int",
    destructure: |node| match node {
        Node::Int(v) => Some(vec![Arg::Int(*v)]),
        _ => None,
    },
    construct: |mut args| match (args.pop(), args.pop()) {
        (Some(Arg::Int(v)), None) => Ok(Node::Int(v)),
        _ => Err(RegistryError::BadArgs { tag: "int" }),
    },
};

#[distributed_slice(NODE_SPECS)]
static SPEC_REAL: NodeSpec = NodeSpec {
    kind: NodeKind::Real,
    tag: "real",
    destructure: |node| match node {
        Node::Real(v) => Some(vec![Arg::Real(*v)]),
        _ => None,
    },
    construct: |mut args| match (args.pop(), args.pop()) {
        (Some(Arg::Real(v)), None) => Ok(Node::Real(v)),
        _ => Err(RegistryError::BadArgs { tag: "real" }),
    },
};

#[distributed_slice(NODE_SPECS)]
static SPEC_NEG: NodeSpec = NodeSpec {
    kind: NodeKind::Neg,
    tag: "neg",
    destructure: |node| match node {
        Node::Neg(a) => Some(vec![Arg::Node((**a).clone())]),
        _ => None,
    },
    construct: |args| match one_node(args) {
        Some(a) => Ok(Node::Neg(Box::new(a))),
        None => Err(RegistryError::BadArgs { tag: "neg" }),
    },
};

#[distributed_slice(NODE_SPECS)]
static SPEC_INDEXED: NodeSpec = NodeSpec {
    kind: NodeKind::Indexed,
    tag: "indexed",
    destructure: |node| match node {
        Node::Indexed { base, index } => Some(vec![
            Arg::Name(base.clone()),
            Arg::Node((**index).clone()),
        ]),
        _ => None,
    },
    construct: |mut args| {
        let index = args.pop();
        let base = args.pop();
        match (base, index, args.pop()) {
            (Some(Arg::Name(base)), Some(Arg::Node(index)), None) => Ok(Node::Indexed {
                base,
                index: Box::new(index),
            }),
            _ => Err(RegistryError::BadArgs { tag: "indexed" }),
        }
    },
};

#[distributed_slice(NODE_SPECS)]
static SPEC_POINTER_CALL: NodeSpec = NodeSpec {
    kind: NodeKind::PointerCall,
    tag: "pointer_call",
    destructure: |node| match node {
        Node::PointerCall {
            function,
            pointer,
            params,
        } => Some(vec![
            Arg::Name(function.clone()),
            Arg::Node((**pointer).clone()),
            Arg::NameList(params.clone()),
        ]),
        _ => None,
    },
    construct: |mut args| {
        let params = args.pop();
        let pointer = args.pop();
        let function = args.pop();
        match (function, pointer, params, args.pop()) {
            (
                Some(Arg::Name(function)),
                Some(Arg::Node(pointer)),
                Some(Arg::NameList(params)),
                None,
            ) => Ok(Node::PointerCall {
                function,
                pointer: Box::new(pointer),
                params,
            }),
            _ => Err(RegistryError::BadArgs {
                tag: "pointer_call",
            }),
        }
    },
};

#[distributed_slice(NODE_SPECS)]
static SPEC_LIST_INIT: NodeSpec = NodeSpec {
    kind: NodeKind::ListInit,
    tag: "list_init",
    destructure: |node| match node {
        Node::ListInit(items) => Some(items.iter().cloned().map(Arg::Node).collect()),
        _ => None,
    },
    construct: |args| {
        let mut items = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Node(item) => items.push(item),
                _ => return Err(RegistryError::BadArgs { tag: "list_init" }),
            }
        }
        Ok(Node::ListInit(items))
    },
};
