//! Carrier envelopes: constants, grids, dense and sparse functions.
//!
//! Carrier data follows the allocation rule: `snapshot_bytes` returns
//! `None` for a store that never materialized, and the envelope keeps
//! that `None`, so an unallocated carrier restores unallocated and the
//! zero-fill-on-first-access behavior carries over. Captured bytes are
//! the full padded buffer, halo included, byte for byte.

use serde::{Deserialize, Serialize};

use mantle_foundation::DType;
use mantle_grid::{Constant, Function, Grid, SparseFunction, TimeConfig};

use crate::dimension::{decode_dimension, encode_dimension, DimensionEnvelope};
use crate::envelope::{ObjectKind, Persistable};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantEnvelope {
    pub name: String,
    pub dtype: DType,
    pub value: f64,
}

pub(crate) fn encode_constant(constant: &Constant) -> ConstantEnvelope {
    ConstantEnvelope {
        name: constant.name().to_string(),
        dtype: constant.dtype(),
        value: constant.value(),
    }
}

pub(crate) fn decode_constant(envelope: ConstantEnvelope) -> Constant {
    Constant::from_parts(envelope.name, envelope.dtype, envelope.value)
}

impl Persistable for Constant {
    const KIND: ObjectKind = ObjectKind::Constant;
    type Envelope = ConstantEnvelope;

    fn capture(&self) -> Result<ConstantEnvelope> {
        Ok(encode_constant(self))
    }

    fn restore(envelope: ConstantEnvelope) -> Result<Constant> {
        Ok(decode_constant(envelope))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridEnvelope {
    pub shape: Vec<usize>,
    pub extent: Vec<f64>,
    pub dimensions: Vec<DimensionEnvelope>,
    pub time_dim: DimensionEnvelope,
    pub stepping_dim: DimensionEnvelope,
}

pub(crate) fn encode_grid(grid: &Grid) -> GridEnvelope {
    GridEnvelope {
        shape: grid.shape().to_vec(),
        extent: grid.extent().to_vec(),
        dimensions: grid.dimensions().iter().map(|d| encode_dimension(d)).collect(),
        time_dim: encode_dimension(grid.time_dim()),
        stepping_dim: encode_dimension(grid.stepping_dim()),
    }
}

pub(crate) fn decode_grid(envelope: GridEnvelope) -> Result<Grid> {
    let dimensions = envelope
        .dimensions
        .into_iter()
        .map(decode_dimension)
        .collect::<Result<Vec<_>>>()?;
    let time_dim = decode_dimension(envelope.time_dim)?;
    let stepping_dim = decode_dimension(envelope.stepping_dim)?;
    Grid::from_parts(
        envelope.shape,
        envelope.extent,
        dimensions,
        time_dim,
        stepping_dim,
    )
    .map_err(|e| Error::Serialization(e.to_string()))
}

impl Persistable for Grid {
    const KIND: ObjectKind = ObjectKind::Grid;
    type Envelope = GridEnvelope;

    fn capture(&self) -> Result<GridEnvelope> {
        Ok(encode_grid(self))
    }

    fn restore(envelope: GridEnvelope) -> Result<Grid> {
        decode_grid(envelope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConfigEnvelope {
    pub save: Option<usize>,
    pub time_order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionEnvelope {
    pub name: String,
    pub dtype: DType,
    pub space_order: usize,
    pub time: Option<TimeConfigEnvelope>,
    pub grid: GridEnvelope,
    /// Padded buffer bytes, or `None` for a store that never allocated.
    pub data: Option<Vec<u8>>,
}

impl Persistable for Function {
    const KIND: ObjectKind = ObjectKind::Function;
    type Envelope = FunctionEnvelope;

    fn capture(&self) -> Result<FunctionEnvelope> {
        Ok(FunctionEnvelope {
            name: self.name().to_string(),
            dtype: self.dtype(),
            space_order: self.space_order(),
            time: self.time().map(|cfg| TimeConfigEnvelope {
                save: cfg.save,
                time_order: cfg.time_order,
            }),
            grid: encode_grid(self.grid()),
            data: self.store().snapshot_bytes(),
        })
    }

    fn restore(envelope: FunctionEnvelope) -> Result<Function> {
        let grid = decode_grid(envelope.grid)?;
        let time = envelope.time.map(|cfg| TimeConfig {
            save: cfg.save,
            time_order: cfg.time_order,
        });
        let function = Function::from_parts(
            envelope.name,
            grid,
            envelope.dtype,
            envelope.space_order,
            time,
        );
        if let Some(bytes) = envelope.data {
            function
                .store()
                .restore_bytes(bytes)
                .map_err(|e| Error::Serialization(e.to_string()))?;
        }
        Ok(function)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseFunctionEnvelope {
    pub name: String,
    pub dtype: DType,
    pub npoint: usize,
    pub grid: GridEnvelope,
    pub data: Option<Vec<u8>>,
    pub coordinates: Option<Vec<u8>>,
}

impl Persistable for SparseFunction {
    const KIND: ObjectKind = ObjectKind::SparseFunction;
    type Envelope = SparseFunctionEnvelope;

    fn capture(&self) -> Result<SparseFunctionEnvelope> {
        Ok(SparseFunctionEnvelope {
            name: self.name().to_string(),
            dtype: self.dtype(),
            npoint: self.npoint(),
            grid: encode_grid(self.grid()),
            data: self.data_store().snapshot_bytes(),
            coordinates: self.coordinates_store().snapshot_bytes(),
        })
    }

    fn restore(envelope: SparseFunctionEnvelope) -> Result<SparseFunction> {
        let grid = decode_grid(envelope.grid)?;
        let sparse =
            SparseFunction::from_parts(envelope.name, grid, envelope.dtype, envelope.npoint);
        if let Some(bytes) = envelope.data {
            sparse
                .data_store()
                .restore_bytes(bytes)
                .map_err(|e| Error::Serialization(e.to_string()))?;
        }
        if let Some(bytes) = envelope.coordinates {
            sparse
                .coordinates_store()
                .restore_bytes(bytes)
                .map_err(|e| Error::Serialization(e.to_string()))?;
        }
        Ok(sparse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{from_bytes, to_bytes};

    #[test]
    fn unallocated_function_stays_lazy_across_roundtrip() {
        let grid = Grid::new(&[3, 3]).unwrap();
        let f = Function::new("f", &grid, 1);
        assert!(!f.is_allocated());

        let restored: Function = from_bytes(&to_bytes(&f).unwrap()).unwrap();
        assert!(!f.is_allocated());
        assert!(!restored.is_allocated());
        assert_eq!(restored.padded_shape(), f.padded_shape());
        assert_eq!(restored.grid(), f.grid());
    }

    #[test]
    fn allocated_function_restores_exact_bytes() {
        let grid = Grid::new(&[3, 3]).unwrap();
        let f = Function::new("f", &grid, 1);
        f.set(&[1, 2], 4.5);

        let restored: Function = from_bytes(&to_bytes(&f).unwrap()).unwrap();
        assert!(restored.is_allocated());
        assert_eq!(
            restored.store().snapshot_bytes(),
            f.store().snapshot_bytes()
        );
        assert_eq!(restored.get(&[1, 2]), 4.5);
    }

    #[test]
    fn wrong_byte_length_fails_restore() {
        let grid = Grid::new(&[3]).unwrap();
        let f = Function::new("f", &grid, 0);
        f.fill(1.0);
        let mut envelope = f.capture().unwrap();
        if let Some(data) = envelope.data.as_mut() {
            data.pop();
        }
        assert!(matches!(
            Function::restore(envelope),
            Err(Error::Serialization(_))
        ));
    }
}
