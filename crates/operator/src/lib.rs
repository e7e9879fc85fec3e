//! Mantle Operator
//!
//! From stencil equations to a running kernel, and everything
//! persistence needs to reason about along the way.
//!
//! # Architecture
//!
//! Building an [`Operator`] lowers its equations to a loop nest with
//! linearized indexing, renders that nest as C source through the
//! symbolic printer, and records the post-elimination parameter list.
//! Nothing compiles yet.
//!
//! First [`Operator::apply`] hands the source and compiler signature to
//! the process-wide [`CompilationCache`], which lexes and parses the
//! source into a [`jit::program::KernelProgram`] and executes it with a
//! small numeric interpreter using C arithmetic semantics. The source
//! text is the only input to compilation, so an operator restored from
//! an envelope takes exactly the same path as a fresh one and produces
//! identical results.
//!
//! The compiled program lives in a `OnceLock` and is never serialized;
//! a restored operator is uncompiled until its first apply.

pub mod args;
pub mod cache;
pub mod error;
pub mod expr;
pub mod jit;
pub mod operator;
pub mod signature;

mod lower;
mod source;

pub use args::Args;
pub use cache::CompilationCache;
pub use error::{Error, Result};
pub use expr::{Eq, FieldAccess, Stencil, StencilExpr};
pub use operator::{ApplySummary, Operator, Parameter};
pub use signature::CompilerSignature;
