//! Mantle Persist
//!
//! Capture and restore for the live compiler object graph: symbolic
//! nodes, dimensions, carriers, operators, foreign-ABI descriptors, and
//! timers move between processes as versioned byte envelopes.
//!
//! # Architecture
//!
//! Every type implements [`Persistable`]: `capture` lifts it into a
//! serde envelope struct, `restore` rebuilds it through the same public
//! constructors fresh code uses. [`to_bytes`] wraps the payload in a
//! `(kind, version, checksum)` frame; [`from_bytes`] checks the frame
//! strictly outside-in, version first. [`file::save`] and [`file::load`]
//! add zstd compression around the same bytes.
//!
//! Three rules shape the envelopes:
//!
//! - **Allocation is preserved, not forced.** Capture observes a
//!   carrier's buffer once; unallocated stays unallocated through any
//!   number of roundtrips.
//! - **Identity does not travel.** Restored handles are fresh objects;
//!   equivalence with their ancestors is structural. Within one
//!   envelope, references restore as a consistent graph.
//! - **Native state is derived, never stored.** An operator envelope
//!   carries source, signature, and parameters; the compiled kernel and
//!   timer counters are rebuilt on demand in the restoring process.

pub mod abi;
pub mod carrier;
pub mod dimension;
pub mod envelope;
pub mod error;
pub mod file;
pub mod node;
pub mod operator;

pub use envelope::{from_bytes, to_bytes, ObjectKind, Persistable, ENVELOPE_VERSION};
pub use error::{Error, Result};
