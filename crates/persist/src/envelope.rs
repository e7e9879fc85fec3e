//! The outer envelope and the capture/restore protocol.
//!
//! Every persisted object travels as `(kind, version, check, payload)`:
//! a stable u16 kind tag, the protocol version, an FNV-1a 64 fingerprint
//! of the payload, and the bincode-encoded typed envelope. Decoding
//! checks run strictly in that order, so a version mismatch is reported
//! before a single payload byte is interpreted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use mantle_foundation::fingerprint;

use crate::error::{Error, Result};

/// Protocol version stamped on every envelope. Increment on any change
/// to an envelope layout or kind tag.
pub const ENVELOPE_VERSION: u32 = 1;

/// Stable object kind tags. Never reuse or renumber a tag once written
/// envelopes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Node,
    Dimension,
    Constant,
    Grid,
    Function,
    SparseFunction,
    Operator,
    Descriptor,
    Timer,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 9] = [
        ObjectKind::Node,
        ObjectKind::Dimension,
        ObjectKind::Constant,
        ObjectKind::Grid,
        ObjectKind::Function,
        ObjectKind::SparseFunction,
        ObjectKind::Operator,
        ObjectKind::Descriptor,
        ObjectKind::Timer,
    ];

    pub fn tag(self) -> u16 {
        match self {
            ObjectKind::Node => 1,
            ObjectKind::Dimension => 2,
            ObjectKind::Constant => 3,
            ObjectKind::Grid => 4,
            ObjectKind::Function => 5,
            ObjectKind::SparseFunction => 6,
            ObjectKind::Operator => 7,
            ObjectKind::Descriptor => 8,
            ObjectKind::Timer => 9,
        }
    }

    pub fn from_tag(tag: u16) -> Option<ObjectKind> {
        ObjectKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// Wire layout around every payload.
#[derive(Debug, Serialize, Deserialize)]
struct RawEnvelope {
    kind: u16,
    version: u32,
    check: u64,
    payload: Vec<u8>,
}

/// Capture/restore protocol every persisted type implements.
///
/// `capture` lifts the live object into its serde envelope. `restore`
/// rebuilds a live object by feeding the envelope through the same
/// public constructors ordinary code uses, so a restored object passes
/// exactly the validation a fresh one does.
pub trait Persistable: Sized {
    const KIND: ObjectKind;
    type Envelope: Serialize + DeserializeOwned;

    fn capture(&self) -> Result<Self::Envelope>;
    fn restore(envelope: Self::Envelope) -> Result<Self>;
}

/// Encode `value` into a self-describing versioned envelope.
pub fn to_bytes<T: Persistable>(value: &T) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(&value.capture()?).map_err(|e| Error::Serialization(e.to_string()))?;
    let raw = RawEnvelope {
        kind: T::KIND.tag(),
        version: ENVELOPE_VERSION,
        check: fingerprint(&payload),
        payload,
    };
    bincode::serialize(&raw).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode an envelope produced by [`to_bytes`].
pub fn from_bytes<T: Persistable>(bytes: &[u8]) -> Result<T> {
    let raw: RawEnvelope =
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
    if raw.version != ENVELOPE_VERSION {
        return Err(Error::IncompatibleVersion {
            found: raw.version,
            supported: ENVELOPE_VERSION,
        });
    }
    let kind = ObjectKind::from_tag(raw.kind)
        .ok_or_else(|| Error::Serialization(format!("unknown object kind tag {}", raw.kind)))?;
    if kind != T::KIND {
        return Err(Error::Serialization(format!(
            "expected {:?} envelope, found {kind:?}",
            T::KIND
        )));
    }
    let check = fingerprint(&raw.payload);
    if check != raw.check {
        return Err(Error::Serialization(format!(
            "payload checksum mismatch: stored {:016x}, computed {check:016x}",
            raw.check
        )));
    }
    let envelope: T::Envelope =
        bincode::deserialize(&raw.payload).map_err(|e| Error::Serialization(e.to_string()))?;
    T::restore(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_stable() {
        // Wire compatibility: these numbers are load-bearing.
        let expected: [(ObjectKind, u16); 9] = [
            (ObjectKind::Node, 1),
            (ObjectKind::Dimension, 2),
            (ObjectKind::Constant, 3),
            (ObjectKind::Grid, 4),
            (ObjectKind::Function, 5),
            (ObjectKind::SparseFunction, 6),
            (ObjectKind::Operator, 7),
            (ObjectKind::Descriptor, 8),
            (ObjectKind::Timer, 9),
        ];
        for (kind, tag) in expected {
            assert_eq!(kind.tag(), tag);
            assert_eq!(ObjectKind::from_tag(tag), Some(kind));
        }
        assert_eq!(ObjectKind::from_tag(0), None);
        assert_eq!(ObjectKind::from_tag(999), None);
    }
}
