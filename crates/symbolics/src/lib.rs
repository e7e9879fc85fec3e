//! Mantle Symbolics
//!
//! The closed symbolic node algebra that generated kernels are written
//! in, plus the two things persistence needs from it:
//!
//! 1. A reconstruction registry ([`registry`]) mapping each node kind to
//!    a stable string tag and a destructure/construct pair, so envelopes
//!    can rebuild nodes without any runtime type inspection.
//! 2. A deterministic C printer ([`printer`]) whose output is both the
//!    generated-source surface and the input to the kernel parser, so
//!    printing then parsing is total over printable nodes.
//!
//! # Architecture
//!
//! Node kinds register themselves into a [`linkme::distributed_slice`]
//! at link time; lookup tables by kind and by tag are built once on
//! first use. Adding a node kind means adding the enum variant, a
//! registration static, and printer coverage. Nothing reflects.

pub mod node;
pub mod printer;
pub mod registry;

pub use node::{Node, NodeKind};
pub use printer::render;
pub use registry::{spec_for, spec_for_tag, Arg, NodeSpec, RegistryError};
