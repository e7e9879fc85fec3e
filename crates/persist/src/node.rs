//! Symbolic node envelopes.
//!
//! Nodes are encoded through the reconstruction registry: the envelope
//! stores the kind's stable tag and its argument vector, with child
//! nodes recursively inlined. A kind the registry does not know cannot
//! be captured, and a tag this build does not know cannot be decoded;
//! both are serialization errors rather than guesses.

use serde::{Deserialize, Serialize};

use mantle_symbolics::registry::{self, Arg};
use mantle_symbolics::Node;

use crate::envelope::{ObjectKind, Persistable};
use crate::error::{Error, Result};

/// One reconstruction argument, with children as envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgEnvelope {
    Node(NodeEnvelope),
    Name(String),
    Int(i64),
    Real(f64),
    NameList(Vec<String>),
}

/// A self-contained node tree keyed by registry tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEnvelope {
    pub tag: String,
    pub args: Vec<ArgEnvelope>,
}

pub(crate) fn encode_node(node: &Node) -> Result<NodeEnvelope> {
    let spec = registry::spec_for(node.kind()).ok_or_else(|| {
        Error::Serialization(format!("no registered codec for node kind {:?}", node.kind()))
    })?;
    let args = (spec.destructure)(node)
        .ok_or_else(|| Error::Serialization(format!("codec `{}` refused its node", spec.tag)))?;
    let mut encoded = Vec::with_capacity(args.len());
    for arg in args {
        encoded.push(match arg {
            Arg::Node(child) => ArgEnvelope::Node(encode_node(&child)?),
            Arg::Name(name) => ArgEnvelope::Name(name),
            Arg::Int(v) => ArgEnvelope::Int(v),
            Arg::Real(v) => ArgEnvelope::Real(v),
            Arg::NameList(names) => ArgEnvelope::NameList(names),
        });
    }
    Ok(NodeEnvelope {
        tag: spec.tag.to_string(),
        args: encoded,
    })
}

pub(crate) fn decode_node(envelope: NodeEnvelope) -> Result<Node> {
    let spec = registry::spec_for_tag(&envelope.tag)
        .ok_or_else(|| Error::Serialization(format!("unknown node tag `{}`", envelope.tag)))?;
    let mut args = Vec::with_capacity(envelope.args.len());
    for arg in envelope.args {
        args.push(match arg {
            ArgEnvelope::Node(child) => Arg::Node(decode_node(child)?),
            ArgEnvelope::Name(name) => Arg::Name(name),
            ArgEnvelope::Int(v) => Arg::Int(v),
            ArgEnvelope::Real(v) => Arg::Real(v),
            ArgEnvelope::NameList(names) => Arg::NameList(names),
        });
    }
    (spec.construct)(args).map_err(|e| Error::Serialization(e.to_string()))
}

impl Persistable for Node {
    const KIND: ObjectKind = ObjectKind::Node;
    type Envelope = NodeEnvelope;

    fn capture(&self) -> Result<NodeEnvelope> {
        encode_node(self)
    }

    fn restore(envelope: NodeEnvelope) -> Result<Node> {
        decode_node(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{from_bytes, to_bytes};

    #[test]
    fn nested_tree_roundtrips_structurally() {
        let node = Node::indexed(
            "f",
            Node::add(
                Node::mul(
                    Node::add(Node::sym("x"), Node::Int(1)),
                    Node::sym("f_size1"),
                ),
                Node::add(Node::sym("y"), Node::Int(1)),
            ),
        );
        let restored: Node = from_bytes(&to_bytes(&node).unwrap()).unwrap();
        assert_eq!(restored, node);
    }

    #[test]
    fn unknown_tag_is_a_serialization_error() {
        let envelope = NodeEnvelope {
            tag: "frobnicate".into(),
            args: vec![],
        };
        let err = decode_node(envelope).unwrap_err();
        assert!(matches!(err, Error::Serialization(msg) if msg.contains("frobnicate")));
    }

    #[test]
    fn malformed_args_are_a_serialization_error() {
        let envelope = NodeEnvelope {
            tag: "add".into(),
            args: vec![ArgEnvelope::Int(1)],
        };
        assert!(matches!(
            decode_node(envelope),
            Err(Error::Serialization(_))
        ));
    }
}
