//! Rectangular computational domains.

use std::sync::Arc;

use crate::constant::Constant;
use crate::dimension::Dimension;
use crate::error::{GridError, Result};

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

/// A rectangular domain of one to three space axes.
///
/// Every grid also owns a `time` dimension (with spacing constant `dt`)
/// and a stepping dimension `t` over it, so time-stepped carriers on the
/// same grid share one time axis identity.
#[derive(Debug, Clone)]
pub struct Grid {
    shape: Vec<usize>,
    extent: Vec<f64>,
    dimensions: Vec<Arc<Dimension>>,
    time_dim: Arc<Dimension>,
    stepping_dim: Arc<Dimension>,
}

impl Grid {
    /// Unit-extent grid over `shape` points per axis.
    pub fn new(shape: &[usize]) -> Result<Grid> {
        Grid::with_extent(shape, &vec![1.0; shape.len()])
    }

    pub fn with_extent(shape: &[usize], extent: &[f64]) -> Result<Grid> {
        if shape.is_empty() || shape.len() > AXIS_NAMES.len() {
            return Err(GridError::UnsupportedRank(shape.len()));
        }
        let dimensions = shape
            .iter()
            .enumerate()
            .map(|(i, _)| Dimension::space(AXIS_NAMES[i]))
            .collect();
        let time_dim = Dimension::time("time", Constant::new("dt"));
        let stepping_dim = Dimension::stepping("t", &time_dim)?;
        Ok(Grid {
            shape: shape.to_vec(),
            extent: extent.to_vec(),
            dimensions,
            time_dim,
            stepping_dim,
        })
    }

    /// Rebuild from captured parts.
    pub fn from_parts(
        shape: Vec<usize>,
        extent: Vec<f64>,
        dimensions: Vec<Arc<Dimension>>,
        time_dim: Arc<Dimension>,
        stepping_dim: Arc<Dimension>,
    ) -> Result<Grid> {
        if shape.is_empty() || shape.len() > AXIS_NAMES.len() {
            return Err(GridError::UnsupportedRank(shape.len()));
        }
        if dimensions.len() != shape.len() {
            return Err(GridError::DimensionCount {
                dims: dimensions.len(),
                axes: shape.len(),
            });
        }
        Ok(Grid {
            shape,
            extent,
            dimensions,
            time_dim,
            stepping_dim,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn extent(&self) -> &[f64] {
        &self.extent
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn dimensions(&self) -> &[Arc<Dimension>] {
        &self.dimensions
    }

    pub fn time_dim(&self) -> &Arc<Dimension> {
        &self.time_dim
    }

    pub fn stepping_dim(&self) -> &Arc<Dimension> {
        &self.stepping_dim
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self.extent == other.extent
            && self.dimensions.len() == other.dimensions.len()
            && self
                .dimensions
                .iter()
                .zip(&other.dimensions)
                .all(|(a, b)| a.as_ref() == b.as_ref())
            && self.time_dim.as_ref() == other.time_dim.as_ref()
            && self.stepping_dim.as_ref() == other.stepping_dim.as_ref()
    }
}
