//! Named scalar constants.

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;

use mantle_foundation::DType;

#[derive(Debug)]
struct Inner {
    name: String,
    dtype: DType,
    value: RwLock<f64>,
}

/// A named scalar with an interior-mutable value.
///
/// Cheap-clone handle: clones share the same value cell, so a constant
/// bound into an operator and the one the caller holds are the same
/// object, exactly like the carriers.
#[derive(Debug, Clone)]
pub struct Constant(Arc<Inner>);

impl Constant {
    /// New f32 constant with value zero.
    pub fn new(name: impl Into<String>) -> Constant {
        Constant::with_dtype(name, DType::F32)
    }

    pub fn with_dtype(name: impl Into<String>, dtype: DType) -> Constant {
        Constant(Arc::new(Inner {
            name: name.into(),
            dtype,
            value: RwLock::new(0.0),
        }))
    }

    /// Rebuild from captured parts.
    pub fn from_parts(name: impl Into<String>, dtype: DType, value: f64) -> Constant {
        let constant = Constant::with_dtype(name, dtype);
        constant.set_value(value);
        constant
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn dtype(&self) -> DType {
        self.0.dtype
    }

    pub fn value(&self) -> f64 {
        *self.0.value.read()
    }

    /// Whether two handles share the same value cell.
    pub fn same(&self, other: &Constant) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn set_value(&self, value: f64) {
        *self.0.value.write() = value;
    }

    /// Total deterministic order: name, then dtype, then value.
    pub fn compare(&self, other: &Constant) -> Ordering {
        self.0
            .name
            .cmp(&other.0.name)
            .then_with(|| self.0.dtype.c_name().cmp(other.0.dtype.c_name()))
            .then_with(|| self.value().total_cmp(&other.value()))
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}
