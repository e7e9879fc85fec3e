//! Carrier storage.
//!
//! [`Buffer`] is dtype-erased row-major storage over a padded shape.
//! [`LazyStore`] wraps one in `RwLock<Option<..>>` to give carriers
//! their allocation discipline: nothing is allocated until first data
//! access, and persistence can observe and restore the allocated state
//! without ever forcing it.

use parking_lot::{MappedRwLockWriteGuard, RwLock, RwLockWriteGuard};
use tracing::debug;

use mantle_foundation::DType;

use crate::error::{GridError, Result};

/// Row-major element storage.
///
/// Indexing is over the stored (padded) shape; halo translation is the
/// carrier's business, not the buffer's. Out-of-range indices panic the
/// same way slice indexing does.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    dtype: DType,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl Buffer {
    /// Zero-filled buffer. Zero is the default fill for every dtype.
    pub fn zeroed(dtype: DType, shape: &[usize]) -> Buffer {
        let len: usize = shape.iter().product();
        Buffer {
            dtype,
            shape: shape.to_vec(),
            bytes: vec![0u8; len * dtype.size_of()],
        }
    }

    /// Adopt captured bytes. Length must match the shape exactly.
    pub fn from_bytes(dtype: DType, shape: &[usize], bytes: Vec<u8>) -> Result<Buffer> {
        let len: usize = shape.iter().product();
        let expected = len * dtype.size_of();
        if bytes.len() != expected {
            return Err(GridError::ByteLengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Buffer {
            dtype,
            shape: shape.to_vec(),
            bytes,
        })
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn linear(&self, index: &[usize]) -> usize {
        debug_assert_eq!(index.len(), self.shape.len(), "index rank mismatch");
        let mut acc = 0usize;
        for (axis, &i) in index.iter().enumerate() {
            debug_assert!(
                i < self.shape[axis],
                "index {i} out of range for axis {axis} of extent {}",
                self.shape[axis]
            );
            acc = acc * self.shape[axis] + i;
        }
        acc
    }

    pub fn get(&self, index: &[usize]) -> f64 {
        self.get_linear(self.linear(index))
    }

    pub fn set(&mut self, index: &[usize], value: f64) {
        self.set_linear(self.linear(index), value);
    }

    pub fn get_linear(&self, i: usize) -> f64 {
        let w = self.dtype.size_of();
        self.dtype.read_scalar(&self.bytes[i * w..(i + 1) * w])
    }

    pub fn set_linear(&mut self, i: usize, value: f64) {
        let w = self.dtype.size_of();
        self.dtype.write_scalar(&mut self.bytes[i * w..(i + 1) * w], value);
    }

    pub fn fill(&mut self, value: f64) {
        for i in 0..self.len() {
            self.set_linear(i, value);
        }
    }
}

/// Lazily allocated buffer slot.
///
/// The label only feeds logs, so allocation events name the carrier
/// they belong to.
#[derive(Debug)]
pub struct LazyStore {
    label: String,
    dtype: DType,
    shape: Vec<usize>,
    slot: RwLock<Option<Buffer>>,
}

impl LazyStore {
    pub fn new(label: impl Into<String>, dtype: DType, shape: Vec<usize>) -> LazyStore {
        LazyStore {
            label: label.into(),
            dtype,
            shape,
            slot: RwLock::new(None),
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Stored (padded) shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Whether the buffer has materialized. Never forces it.
    pub fn is_allocated(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Materialize the zero-filled buffer if it has not been yet.
    pub fn ensure_allocated(&self) {
        let mut slot = self.slot.write();
        if slot.is_none() {
            debug!(
                carrier = %self.label,
                shape = ?self.shape,
                bytes = self.shape.iter().product::<usize>() * self.dtype.size_of(),
                "allocating carrier buffer"
            );
            *slot = Some(Buffer::zeroed(self.dtype, &self.shape));
        }
    }

    /// Write access to the buffer, allocating on first use.
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, Buffer> {
        let mut slot = self.slot.write();
        if slot.is_none() {
            debug!(
                carrier = %self.label,
                shape = ?self.shape,
                bytes = self.shape.iter().product::<usize>() * self.dtype.size_of(),
                "allocating carrier buffer"
            );
            *slot = Some(Buffer::zeroed(self.dtype, &self.shape));
        }
        RwLockWriteGuard::map(slot, |slot| match slot {
            Some(buffer) => buffer,
            None => unreachable!("slot filled above"),
        })
    }

    /// Copy of the raw bytes, or `None` if nothing has materialized.
    ///
    /// This is the capture path: a single read lock, no forcing, and the
    /// allocated flag and bytes come from the same observation.
    pub fn snapshot_bytes(&self) -> Option<Vec<u8>> {
        self.slot.read().as_ref().map(|b| b.as_bytes().to_vec())
    }

    /// Restore captured bytes. The buffer is validated against the
    /// store's dtype and shape before anything is replaced, so a failed
    /// restore leaves the store untouched.
    pub fn restore_bytes(&self, bytes: Vec<u8>) -> Result<()> {
        let buffer = Buffer::from_bytes(self.dtype, &self.shape, bytes)?;
        let mut slot = self.slot.write();
        if slot.is_none() {
            debug!(
                carrier = %self.label,
                shape = ?self.shape,
                bytes = buffer.as_bytes().len(),
                "allocating carrier buffer from captured bytes"
            );
        }
        *slot = Some(buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_layout() {
        let mut b = Buffer::zeroed(DType::F32, &[2, 3]);
        b.set(&[1, 2], 5.0);
        assert_eq!(b.get_linear(5), 5.0);
        assert_eq!(b.get(&[1, 2]), 5.0);
        assert_eq!(b.get(&[0, 0]), 0.0);
    }

    #[test]
    fn store_stays_lazy_until_touched() {
        let store = LazyStore::new("f", DType::F32, vec![4, 4]);
        assert!(!store.is_allocated());
        assert_eq!(store.snapshot_bytes(), None);

        store.write().set(&[0, 0], 1.0);
        assert!(store.is_allocated());
        let bytes = store.snapshot_bytes().unwrap();
        assert_eq!(bytes.len(), 16 * 4);
    }

    #[test]
    fn restore_reproduces_bytes_exactly() {
        let store = LazyStore::new("f", DType::F64, vec![3]);
        store.write().fill(2.0);
        let bytes = store.snapshot_bytes().unwrap();

        let fresh = LazyStore::new("f", DType::F64, vec![3]);
        fresh.restore_bytes(bytes.clone()).unwrap();
        assert_eq!(fresh.snapshot_bytes().unwrap(), bytes);
        assert_eq!(fresh.write().get(&[1]), 2.0);
    }

    #[test]
    fn restore_rejects_wrong_length() {
        let store = LazyStore::new("f", DType::F32, vec![2]);
        let err = store.restore_bytes(vec![0u8; 3]).unwrap_err();
        assert!(matches!(err, GridError::ByteLengthMismatch { .. }));
    }
}
