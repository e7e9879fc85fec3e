//! Iteration dimensions.
//!
//! Dimensions form a small graph: space and time dimensions stand alone,
//! stepping dimensions derive from a time parent and index a rotating
//! slot buffer instead of real time. Identity is structural, which is
//! what lets a dimension restored in another process compare equal to
//! its ancestor.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::constant::Constant;
use crate::error::{GridError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DimensionKind {
    Space,
    Time,
    Stepping,
}

#[derive(Debug)]
pub struct Dimension {
    name: String,
    kind: DimensionKind,
    /// Time dimensions carry their step size as a symbolic constant.
    spacing: Option<Constant>,
    parent: Option<Arc<Dimension>>,
}

impl Dimension {
    /// A plain space dimension.
    pub fn space(name: impl Into<String>) -> Arc<Dimension> {
        Arc::new(Dimension {
            name: name.into(),
            kind: DimensionKind::Space,
            spacing: None,
            parent: None,
        })
    }

    /// A time dimension with its spacing constant.
    pub fn time(name: impl Into<String>, spacing: Constant) -> Arc<Dimension> {
        Arc::new(Dimension {
            name: name.into(),
            kind: DimensionKind::Time,
            spacing: Some(spacing),
            parent: None,
        })
    }

    /// A stepping dimension over a time parent.
    ///
    /// Stepping over anything that is not time is rejected; modulo slot
    /// indexing only makes sense along the time axis.
    pub fn stepping(name: impl Into<String>, parent: &Arc<Dimension>) -> Result<Arc<Dimension>> {
        let name = name.into();
        if !parent.is_time() {
            return Err(GridError::InvalidParent {
                dimension: name,
                parent: parent.name.clone(),
            });
        }
        Ok(Arc::new(Dimension {
            name,
            kind: DimensionKind::Stepping,
            spacing: None,
            parent: Some(Arc::clone(parent)),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DimensionKind {
        self.kind
    }

    pub fn spacing(&self) -> Option<&Constant> {
        self.spacing.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<Dimension>> {
        self.parent.as_ref()
    }

    /// True for time dimensions and anything stepping over one.
    pub fn is_time(&self) -> bool {
        match self.kind {
            DimensionKind::Time => true,
            DimensionKind::Stepping => self.parent.as_deref().is_some_and(Dimension::is_time),
            DimensionKind::Space => false,
        }
    }

    /// Lower iteration bound symbol, `{name}_m`.
    pub fn min_name(&self) -> String {
        format!("{}_m", self.name)
    }

    /// Upper iteration bound symbol, `{name}_M`.
    pub fn max_name(&self) -> String {
        format!("{}_M", self.name)
    }

    /// Total deterministic order over the dimension graph.
    ///
    /// Name, then kind, then spacing, then parent recursively. Equal
    /// means structurally identical all the way up the parent chain;
    /// that is the equivalence persistence restores.
    pub fn compare(&self, other: &Dimension) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| match (&self.spacing, &other.spacing) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.compare(b),
            })
            .then_with(|| match (&self.parent, &other.parent) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.compare(b),
            })
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_requires_time_parent() {
        let x = Dimension::space("x");
        let err = Dimension::stepping("t", &x).unwrap_err();
        assert!(matches!(err, GridError::InvalidParent { .. }));

        let time = Dimension::time("time", Constant::new("dt"));
        let t = Dimension::stepping("t", &time).unwrap();
        assert_eq!(t.kind(), DimensionKind::Stepping);
        assert!(t.is_time());
    }

    #[test]
    fn compare_recurses_through_parents() {
        let time_a = Dimension::time("time", Constant::new("dt"));
        let time_b = Dimension::time("time", Constant::new("dt"));
        let ta = Dimension::stepping("t", &time_a).unwrap();
        let tb = Dimension::stepping("t", &time_b).unwrap();
        assert_eq!(ta.compare(&tb), Ordering::Equal);

        let other_time = Dimension::time("tau", Constant::new("dt"));
        let tc = Dimension::stepping("t", &other_time).unwrap();
        assert_ne!(ta.compare(&tc), Ordering::Equal);
    }

    #[test]
    fn bound_names() {
        let x = Dimension::space("x");
        assert_eq!(x.min_name(), "x_m");
        assert_eq!(x.max_name(), "x_M");
    }
}
