//! Sparse point carriers.

use std::sync::Arc;

use mantle_foundation::DType;

use crate::buffer::LazyStore;
use crate::error::{GridError, Result};
use crate::grid::Grid;

#[derive(Debug)]
struct Inner {
    name: String,
    grid: Grid,
    dtype: DType,
    npoint: usize,
    data: LazyStore,
    coordinates: LazyStore,
}

/// A carrier over scattered points instead of the grid lattice.
///
/// Holds two independent lazy buffers: one value per point, and one
/// physical coordinate tuple per point. Either can be allocated without
/// the other, and persistence tracks each on its own.
#[derive(Debug, Clone)]
pub struct SparseFunction(Arc<Inner>);

impl SparseFunction {
    pub fn new(name: impl Into<String>, grid: &Grid, npoint: usize) -> SparseFunction {
        SparseFunction::from_parts(name, grid.clone(), DType::F32, npoint)
    }

    /// Rebuild from captured parts. Both stores start unallocated.
    pub fn from_parts(
        name: impl Into<String>,
        grid: Grid,
        dtype: DType,
        npoint: usize,
    ) -> SparseFunction {
        let name = name.into();
        let data = LazyStore::new(name.clone(), dtype, vec![npoint]);
        let coordinates = LazyStore::new(
            format!("{name}.coordinates"),
            dtype,
            vec![npoint, grid.ndim()],
        );
        SparseFunction(Arc::new(Inner {
            name,
            grid,
            dtype,
            npoint,
            data,
            coordinates,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn grid(&self) -> &Grid {
        &self.0.grid
    }

    pub fn dtype(&self) -> DType {
        self.0.dtype
    }

    pub fn npoint(&self) -> usize {
        self.0.npoint
    }

    pub fn data_store(&self) -> &LazyStore {
        &self.0.data
    }

    pub fn coordinates_store(&self) -> &LazyStore {
        &self.0.coordinates
    }

    /// Read the value at one point. Forces the data buffer.
    pub fn get(&self, point: usize) -> f64 {
        self.0.data.write().get(&[point])
    }

    /// Write the value at one point. Forces the data buffer.
    pub fn set(&self, point: usize, value: f64) {
        self.0.data.write().set(&[point], value);
    }

    /// Set every coordinate from a flat `npoint * ndim` slice.
    pub fn set_coordinates(&self, flat: &[f64]) -> Result<()> {
        let expected = self.0.npoint * self.0.grid.ndim();
        if flat.len() != expected {
            return Err(GridError::CoordinateCount {
                expected,
                actual: flat.len(),
            });
        }
        let mut coords = self.0.coordinates.write();
        for (i, &v) in flat.iter().enumerate() {
            coords.set_linear(i, v);
        }
        Ok(())
    }

    /// Physical coordinates of one point. Forces the coordinate buffer.
    pub fn coordinate(&self, point: usize) -> Vec<f64> {
        let ndim = self.0.grid.ndim();
        let coords = self.0.coordinates.write();
        (0..ndim).map(|axis| coords.get(&[point, axis])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_are_independent() {
        let grid = Grid::new(&[10, 10]).unwrap();
        let p = SparseFunction::new("p", &grid, 3);
        assert!(!p.data_store().is_allocated());
        assert!(!p.coordinates_store().is_allocated());

        p.set_coordinates(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        assert!(p.coordinates_store().is_allocated());
        assert!(!p.data_store().is_allocated());
        assert_eq!(p.coordinate(1), vec![0.3, 0.4]);
    }

    #[test]
    fn coordinate_count_is_checked() {
        let grid = Grid::new(&[10]).unwrap();
        let p = SparseFunction::new("p", &grid, 2);
        let err = p.set_coordinates(&[1.0]).unwrap_err();
        assert!(matches!(err, GridError::CoordinateCount { .. }));
    }
}
