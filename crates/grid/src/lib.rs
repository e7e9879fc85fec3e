//! Mantle Grid
//!
//! Dimensions, grids, and the data carriers that stencil kernels read
//! and write. Carriers allocate lazily: constructing one records shape
//! and dtype only, and the zero-filled buffer appears on first data
//! access. Persistence leans on that split: an unallocated carrier
//! captures as metadata alone, an allocated one captures its exact
//! bytes, and nothing about capture forces materialization.
//!
//! # Key Types
//!
//! - [`Dimension`]: named iteration axis (space, time, or stepping over
//!   time), ordered by [`Dimension::compare`]
//! - [`Grid`]: rectangular domain with `x`/`y`/`z` space dimensions plus
//!   a `time` dimension and a stepping dimension `t` over it
//! - [`Function`]: dense carrier, optionally time-stepped
//! - [`SparseFunction`]: point carrier with independent value and
//!   coordinate buffers
//! - [`Constant`]: named scalar with interior-mutable value

pub mod buffer;
pub mod constant;
pub mod dimension;
pub mod error;
pub mod function;
pub mod grid;
pub mod sparse;

pub use buffer::{Buffer, LazyStore};
pub use constant::Constant;
pub use dimension::{Dimension, DimensionKind};
pub use error::{GridError, Result};
pub use function::{Function, TimeConfig};
pub use grid::Grid;
pub use sparse::SparseFunction;
