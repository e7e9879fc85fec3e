//! Mantle ABI
//!
//! Descriptions of foreign-ABI objects that cross the persistence
//! boundary as plain data. Generated kernels can name communicator
//! handles, request tables, and profiling blocks; what persists is the
//! shape of those objects, never a live handle or pointer. The foreign
//! library itself is never touched here.

pub mod descriptor;
pub mod timer;

pub use descriptor::{FieldSpec, NativeDescriptor};
pub use timer::Timer;
