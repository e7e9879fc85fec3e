//! Dimension graph persistence.

use std::cmp::Ordering;
use std::sync::Arc;

use mantle_grid::{Constant, Dimension, DimensionKind};
use mantle_persist::{from_bytes, to_bytes};

#[test]
fn space_dimension_roundtrips() {
    let x = Dimension::space("x");
    let restored: Arc<Dimension> = from_bytes(&to_bytes(&x).unwrap()).unwrap();
    assert_eq!(restored.kind(), DimensionKind::Space);
    assert_eq!(restored.name(), "x");
    assert_eq!(restored.compare(&x), Ordering::Equal);
    assert_eq!(restored.min_name(), "x_m");
    assert_eq!(restored.max_name(), "x_M");
}

#[test]
fn stepping_chain_restores_with_its_ancestry() {
    let dt = Constant::new("dt");
    dt.set_value(0.001);
    let time = Dimension::time("time", dt);
    let t = Dimension::stepping("t", &time).unwrap();

    let restored: Arc<Dimension> = from_bytes(&to_bytes(&t).unwrap()).unwrap();
    assert_eq!(restored.kind(), DimensionKind::Stepping);
    assert!(restored.is_time());
    assert_eq!(restored.compare(&t), Ordering::Equal);

    let parent = restored.parent().unwrap();
    assert_eq!(parent.kind(), DimensionKind::Time);
    assert_eq!(parent.spacing().unwrap().name(), "dt");
    assert_eq!(parent.spacing().unwrap().value(), 0.001);
}

#[test]
fn two_restores_of_one_envelope_compare_equal() {
    let time = Dimension::time("time", Constant::new("dt"));
    let t = Dimension::stepping("t", &time).unwrap();
    let bytes = to_bytes(&t).unwrap();

    let a: Arc<Dimension> = from_bytes(&bytes).unwrap();
    let b: Arc<Dimension> = from_bytes(&bytes).unwrap();
    // Distinct objects, one structural identity.
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.compare(&b), Ordering::Equal);
}

#[test]
fn compare_distinguishes_spacing() {
    let time = Dimension::time("time", Constant::new("dt"));
    let bytes = to_bytes(&time).unwrap();
    let restored: Arc<Dimension> = from_bytes(&bytes).unwrap();

    restored.spacing().unwrap().set_value(0.5);
    assert_ne!(restored.compare(&time), Ordering::Equal);
}
