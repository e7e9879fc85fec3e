//! Dimension envelopes.
//!
//! A dimension envelope carries the whole parent chain inline, so a
//! stepping dimension restores with its time parent and the parent's
//! spacing constant in one decode. Restored dimensions are fresh `Arc`s;
//! equivalence with their ancestors is structural, through
//! [`Dimension::compare`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mantle_grid::{Dimension, DimensionKind};

use crate::carrier::{decode_constant, encode_constant, ConstantEnvelope};
use crate::envelope::{ObjectKind, Persistable};
use crate::error::{Error, Result};

/// Wire form of [`DimensionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionKindTag {
    Space,
    Time,
    Stepping,
}

impl From<DimensionKind> for DimensionKindTag {
    fn from(kind: DimensionKind) -> DimensionKindTag {
        match kind {
            DimensionKind::Space => DimensionKindTag::Space,
            DimensionKind::Time => DimensionKindTag::Time,
            DimensionKind::Stepping => DimensionKindTag::Stepping,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionEnvelope {
    pub name: String,
    pub kind: DimensionKindTag,
    pub spacing: Option<ConstantEnvelope>,
    pub parent: Option<Box<DimensionEnvelope>>,
}

pub(crate) fn encode_dimension(dim: &Dimension) -> DimensionEnvelope {
    DimensionEnvelope {
        name: dim.name().to_string(),
        kind: dim.kind().into(),
        spacing: dim.spacing().map(encode_constant),
        parent: dim.parent().map(|p| Box::new(encode_dimension(p))),
    }
}

/// Rebuild through the public constructors, parent first. The stepping
/// constructor re-runs its parent validation, so a tampered envelope
/// cannot produce a dimension a fresh build could not.
pub(crate) fn decode_dimension(envelope: DimensionEnvelope) -> Result<Arc<Dimension>> {
    match envelope.kind {
        DimensionKindTag::Space => Ok(Dimension::space(envelope.name)),
        DimensionKindTag::Time => {
            let spacing = envelope.spacing.ok_or_else(|| {
                Error::Serialization(format!("time dimension `{}` has no spacing", envelope.name))
            })?;
            Ok(Dimension::time(envelope.name, decode_constant(spacing)))
        }
        DimensionKindTag::Stepping => {
            let parent = envelope.parent.ok_or_else(|| {
                Error::Serialization(format!(
                    "stepping dimension `{}` has no parent",
                    envelope.name
                ))
            })?;
            let parent = decode_dimension(*parent)?;
            Dimension::stepping(envelope.name, &parent)
                .map_err(|e| Error::Serialization(e.to_string()))
        }
    }
}

impl Persistable for Arc<Dimension> {
    const KIND: ObjectKind = ObjectKind::Dimension;
    type Envelope = DimensionEnvelope;

    fn capture(&self) -> Result<DimensionEnvelope> {
        Ok(encode_dimension(self))
    }

    fn restore(envelope: DimensionEnvelope) -> Result<Arc<Dimension>> {
        decode_dimension(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{from_bytes, to_bytes};
    use mantle_grid::Constant;

    #[test]
    fn stepping_chain_restores_structurally_equal() {
        let time = Dimension::time("time", Constant::new("dt"));
        let t = Dimension::stepping("t", &time).unwrap();

        let bytes = to_bytes(&t).unwrap();
        let restored: Arc<Dimension> = from_bytes(&bytes).unwrap();

        assert_eq!(restored.compare(&t), std::cmp::Ordering::Equal);
        let parent = restored.parent().unwrap();
        assert_eq!(parent.name(), "time");
        assert_eq!(parent.spacing().unwrap().name(), "dt");
    }

    #[test]
    fn tampered_stepping_parent_kind_is_rejected() {
        let time = Dimension::time("time", Constant::new("dt"));
        let t = Dimension::stepping("t", &time).unwrap();

        let mut envelope = encode_dimension(&t);
        if let Some(parent) = envelope.parent.as_deref_mut() {
            parent.kind = DimensionKindTag::Space;
            parent.spacing = None;
        }
        assert!(matches!(
            decode_dimension(envelope),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn time_without_spacing_is_rejected() {
        let envelope = DimensionEnvelope {
            name: "time".into(),
            kind: DimensionKindTag::Time,
            spacing: None,
            parent: None,
        };
        assert!(matches!(
            decode_dimension(envelope),
            Err(Error::Serialization(_))
        ));
    }
}
