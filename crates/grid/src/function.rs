//! Dense data carriers.

use std::sync::Arc;

use mantle_foundation::DType;

use crate::buffer::LazyStore;
use crate::dimension::Dimension;
use crate::grid::Grid;

/// Time axis configuration for a dense carrier.
///
/// `save: Some(n)` keeps the full `n`-step history and indexes it with
/// real time. `save: None` keeps `time_order + 1` rotating slots indexed
/// modulo the slot count through the grid's stepping dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeConfig {
    pub save: Option<usize>,
    pub time_order: usize,
}

impl TimeConfig {
    /// Buffer slots along the time axis.
    pub fn slots(&self) -> usize {
        self.save.unwrap_or(self.time_order + 1)
    }

    pub fn is_saved(&self) -> bool {
        self.save.is_some()
    }
}

#[derive(Debug)]
struct Inner {
    name: String,
    grid: Grid,
    dtype: DType,
    space_order: usize,
    time: Option<TimeConfig>,
    store: LazyStore,
}

/// A dense carrier over a grid.
///
/// `space_order` is the halo width on every space axis; storage covers
/// the domain plus halo, zero-filled on first access. Element accessors
/// take domain indices (time slot first for time-stepped carriers) and
/// translate the halo internally. Cheap-clone handle: clones share the
/// same storage.
#[derive(Debug, Clone)]
pub struct Function(Arc<Inner>);

impl Function {
    /// Plain f32 carrier with no time axis.
    pub fn new(name: impl Into<String>, grid: &Grid, space_order: usize) -> Function {
        Function::from_parts(name, grid.clone(), DType::F32, space_order, None)
    }

    pub fn with_dtype(
        name: impl Into<String>,
        grid: &Grid,
        space_order: usize,
        dtype: DType,
    ) -> Function {
        Function::from_parts(name, grid.clone(), dtype, space_order, None)
    }

    /// Time-stepped carrier with `time_order + 1` rotating slots.
    pub fn time_stepped(
        name: impl Into<String>,
        grid: &Grid,
        space_order: usize,
        time_order: usize,
    ) -> Function {
        Function::from_parts(
            name,
            grid.clone(),
            DType::F32,
            space_order,
            Some(TimeConfig {
                save: None,
                time_order,
            }),
        )
    }

    /// Carrier saving its full `save`-step time history.
    pub fn saved(
        name: impl Into<String>,
        grid: &Grid,
        space_order: usize,
        save: usize,
    ) -> Function {
        Function::from_parts(
            name,
            grid.clone(),
            DType::F32,
            space_order,
            Some(TimeConfig {
                save: Some(save),
                time_order: 1,
            }),
        )
    }

    /// Rebuild from captured parts. The store starts unallocated.
    pub fn from_parts(
        name: impl Into<String>,
        grid: Grid,
        dtype: DType,
        space_order: usize,
        time: Option<TimeConfig>,
    ) -> Function {
        let name = name.into();
        let mut padded: Vec<usize> = Vec::with_capacity(grid.ndim() + 1);
        if let Some(cfg) = &time {
            padded.push(cfg.slots());
        }
        padded.extend(grid.shape().iter().map(|&n| n + 2 * space_order));
        let store = LazyStore::new(name.clone(), dtype, padded);
        Function(Arc::new(Inner {
            name,
            grid,
            dtype,
            space_order,
            time,
            store,
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

    /// Halo width on every space axis.
    pub fn space_order(&self) -> usize {
        self.0.space_order
    }

    pub fn time(&self) -> Option<&TimeConfig> {
        self.0.time.as_ref()
    }

    pub fn time_slots(&self) -> Option<usize> {
        self.0.time.as_ref().map(TimeConfig::slots)
    }

    /// Domain shape: time slots first (when present), then grid axes.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(self.0.grid.ndim() + 1);
        if let Some(cfg) = &self.0.time {
            shape.push(cfg.slots());
        }
        shape.extend_from_slice(self.0.grid.shape());
        shape
    }

    /// Stored shape including halo padding.
    pub fn padded_shape(&self) -> &[usize] {
        self.0.store.shape()
    }

    /// Iteration dimensions: the time axis (stepping or saved) first,
    /// then the grid's space dimensions.
    pub fn dimensions(&self) -> Vec<Arc<Dimension>> {
        let mut dims = Vec::with_capacity(self.0.grid.ndim() + 1);
        if let Some(dim) = self.time_dimension() {
            dims.push(dim);
        }
        dims.extend(self.0.grid.dimensions().iter().cloned());
        dims
    }

    /// The dimension indexing the time axis, if the carrier has one.
    /// Saved carriers index with real time, stepping carriers with the
    /// grid's rotating stepping dimension.
    pub fn time_dimension(&self) -> Option<Arc<Dimension>> {
        self.0.time.as_ref().map(|cfg| {
            if cfg.is_saved() {
                Arc::clone(self.0.grid.time_dim())
            } else {
                Arc::clone(self.0.grid.stepping_dim())
            }
        })
    }

    /// Backing store. Capture and kernel execution go through this.
    pub fn store(&self) -> &LazyStore {
        &self.0.store
    }

    /// Whether two handles share the same underlying carrier.
    pub fn same(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_allocated(&self) -> bool {
        self.0.store.is_allocated()
    }

    fn padded_index(&self, index: &[usize]) -> Vec<usize> {
        let h = self.0.space_order;
        match &self.0.time {
            Some(_) => {
                let mut padded = Vec::with_capacity(index.len());
                padded.push(index[0]);
                padded.extend(index[1..].iter().map(|&i| i + h));
                padded
            }
            None => index.iter().map(|&i| i + h).collect(),
        }
    }

    /// Read one element by domain index. Forces allocation.
    pub fn get(&self, index: &[usize]) -> f64 {
        let padded = self.padded_index(index);
        self.0.store.write().get(&padded)
    }

    /// Write one element by domain index. Forces allocation.
    pub fn set(&self, index: &[usize], value: f64) {
        let padded = self.padded_index(index);
        self.0.store.write().set(&padded, value);
    }

    /// Fill the whole padded buffer, halo included.
    pub fn fill(&self, value: f64) {
        self.0.store.write().fill(value);
    }
}
