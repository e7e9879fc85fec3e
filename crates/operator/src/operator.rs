//! Operator construction, compilation, and execution.
//!
//! An operator is built from equations in one shot: lowering fixes the
//! parameter list and the generated source, and both stay immutable for
//! the operator's life. Compilation is deferred until the first apply
//! and goes through the process-wide [`CompilationCache`], so the
//! compiled kernel is shared state, never per-operator state. That
//! split is what makes operators persistable: source, signature, and
//! parameters travel; the compiled program is re-derived.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::debug;

use mantle_abi::Timer;
use mantle_grid::{Constant, Dimension, DimensionKind, Function, TimeConfig};

use crate::args::Args;
use crate::cache::CompilationCache;
use crate::error::{Error, Result};
use crate::expr::Eq;
use crate::jit::executor::{self, Env, Num};
use crate::jit::program::{KernelProgram, ParamKind};
use crate::signature::CompilerSignature;
use crate::{lower, source};

/// The one profiled section the generated loop nest runs under.
const SECTION: &str = "section0";

/// One entry of an operator's parameter list, in signature order.
#[derive(Debug, Clone)]
pub enum Parameter {
    Function(Function),
    Scalar(Constant),
    Dimension(Arc<Dimension>),
}

impl Parameter {
    pub fn name(&self) -> &str {
        match self {
            Parameter::Function(f) => f.name(),
            Parameter::Scalar(c) => c.name(),
            Parameter::Dimension(d) => d.name(),
        }
    }
}

/// What one apply did: which section ran and for how long.
#[derive(Debug, Clone)]
pub struct ApplySummary {
    pub section: String,
    pub elapsed: Duration,
}

/// A compiled stencil kernel over its default carriers.
#[derive(Debug)]
pub struct Operator {
    source: String,
    signature: CompilerSignature,
    parameters: Vec<Parameter>,
    program: OnceLock<Arc<KernelProgram>>,
    timer: Timer,
}

impl Operator {
    /// Lower `eqs` under the default compiler signature.
    pub fn new(eqs: &[Eq]) -> Result<Operator> {
        Operator::with_signature(eqs, CompilerSignature::default())
    }

    pub fn with_signature(eqs: &[Eq], signature: CompilerSignature) -> Result<Operator> {
        let lowered = lower::lower(eqs)?;
        let source = source::render(&lowered.ir);
        Ok(Operator {
            source,
            signature,
            parameters: lowered.parameters,
            program: OnceLock::new(),
            timer: Timer::new("timers", vec![SECTION.to_string()]),
        })
    }

    /// Rebuild from captured state. No compilation happens here; the
    /// kernel is re-derived from the source on first apply, exactly as
    /// for a freshly built operator.
    pub fn from_captured(
        source: impl Into<String>,
        signature: CompilerSignature,
        parameters: Vec<Parameter>,
    ) -> Operator {
        Operator {
            source: source.into(),
            signature,
            parameters,
            program: OnceLock::new(),
            timer: Timer::new("timers", vec![SECTION.to_string()]),
        }
    }

    /// The generated kernel source. Deterministic for a given set of
    /// equations, which is what keeps the compilation cache effective
    /// across capture and restore.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn signature(&self) -> &CompilerSignature {
        &self.signature
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Whether this operator has resolved its compiled kernel yet.
    pub fn is_compiled(&self) -> bool {
        self.program.get().is_some()
    }

    pub fn compiled(&self) -> Option<&Arc<KernelProgram>> {
        self.program.get()
    }

    fn ensure_compiled(&self) -> Result<&Arc<KernelProgram>> {
        if let Some(program) = self.program.get() {
            return Ok(program);
        }
        let program = CompilationCache::global().get_or_build(&self.source, &self.signature)?;
        Ok(self.program.get_or_init(|| program))
    }

    /// Run the kernel over the default carriers, with `args` overrides.
    ///
    /// Substituted carriers must match the original's dtype and padded
    /// shape. Every buffer is write-locked for the duration of the run,
    /// so binding the same carrier under two parameter names is refused
    /// up front rather than deadlocking.
    pub fn apply(&self, args: &Args) -> Result<ApplySummary> {
        let program = self.ensure_compiled()?;

        // Effective carrier bindings, originals unless overridden.
        let mut bindings: IndexMap<String, Function> = IndexMap::new();
        let mut constants: Vec<&Constant> = Vec::new();
        let mut dims: Vec<&Arc<Dimension>> = Vec::new();
        for parameter in &self.parameters {
            match parameter {
                Parameter::Function(f) => {
                    let chosen = match args.functions.get(f.name()) {
                        Some(substitute) => {
                            if substitute.dtype() != f.dtype() {
                                return Err(Error::DTypeMismatch {
                                    name: f.name().to_string(),
                                    expected: f.dtype().c_name(),
                                    actual: substitute.dtype().c_name(),
                                });
                            }
                            if substitute.padded_shape() != f.padded_shape() {
                                return Err(Error::ShapeMismatch {
                                    name: f.name().to_string(),
                                    expected: f.padded_shape().to_vec(),
                                    actual: substitute.padded_shape().to_vec(),
                                });
                            }
                            substitute.clone()
                        }
                        None => f.clone(),
                    };
                    bindings.insert(f.name().to_string(), chosen);
                }
                Parameter::Scalar(c) => constants.push(c),
                Parameter::Dimension(d) => dims.push(d),
            }
        }

        let names: Vec<String> = bindings.keys().cloned().collect();
        for i in 0..bindings.len() {
            for j in (i + 1)..bindings.len() {
                if bindings[i].same(&bindings[j]) {
                    return Err(Error::AliasedBinding(names[j].clone()));
                }
            }
        }

        let grid = match bindings.values().next() {
            Some(f) => f.grid().clone(),
            None => return Err(Error::EmptyOperator),
        };
        if bindings.values().any(|f| f.grid() != &grid) {
            return Err(Error::IncompatibleGrids);
        }

        // Scalar environment: strides, constants, then loop bounds.
        // Stride symbols go by parameter name, not by whatever carrier
        // ended up bound to it.
        let mut scalars: IndexMap<String, Num> = IndexMap::new();
        for (name, f) in &bindings {
            for (j, &n) in f.padded_shape().iter().enumerate().skip(1) {
                scalars.insert(format!("{name}_size{j}"), Num::Int(n as i64));
            }
        }
        for c in &constants {
            let value = if c.dtype().is_float() {
                Num::Real(c.value())
            } else {
                Num::Int(c.value() as i64)
            };
            scalars.insert(c.name().to_string(), value);
        }
        for (axis, dim) in grid.dimensions().iter().enumerate() {
            scalars.insert(dim.min_name(), Num::Int(0));
            scalars.insert(dim.max_name(), Num::Int(grid.shape()[axis] as i64 - 1));
        }
        if let Some(axis) = dims.iter().find(|d| d.is_time()) {
            let (time_m, time_max) = match args.time {
                Some(range) => range,
                // Rotating slots carry no intrinsic range; a saved
                // history defaults to filling every slot after the
                // initial condition.
                None if axis.kind() == DimensionKind::Stepping => {
                    return Err(Error::MissingBinding("time".into()));
                }
                None => {
                    let slots = bindings
                        .values()
                        .find_map(|f| f.time().filter(|cfg| cfg.is_saved()).map(TimeConfig::slots))
                        .unwrap_or(1);
                    (0, slots as i64 - 2)
                }
            };
            scalars.insert("time_m".into(), Num::Int(time_m));
            scalars.insert("time_M".into(), Num::Int(time_max));
        }
        for (name, value) in &args.scalars {
            let num = match scalars.get(name) {
                Some(Num::Int(_)) => Num::Int(*value as i64),
                _ => Num::Real(*value),
            };
            scalars.insert(name.clone(), num);
        }

        // Validate the signature and take the buffer locks.
        let mut guards = IndexMap::new();
        for decl in &program.params {
            match decl.kind {
                ParamKind::Buffer => {
                    let binding = bindings
                        .get(&decl.name)
                        .ok_or_else(|| Error::MissingBinding(decl.name.clone()))?;
                    if binding.dtype() != decl.dtype {
                        return Err(Error::DTypeMismatch {
                            name: decl.name.clone(),
                            expected: decl.dtype.c_name(),
                            actual: binding.dtype().c_name(),
                        });
                    }
                    guards.insert(decl.name.clone(), binding.store().write());
                }
                ParamKind::Scalar => {
                    if !scalars.contains_key(&decl.name) {
                        return Err(Error::MissingBinding(decl.name.clone()));
                    }
                }
            }
        }

        let mut env = Env::new(guards, scalars);
        let started = Instant::now();
        executor::run(program, &mut env)?;
        let elapsed = started.elapsed();
        drop(env);

        self.timer.record(SECTION, elapsed);
        debug!(
            section = SECTION,
            elapsed_us = elapsed.as_micros() as u64,
            "kernel section complete"
        );
        Ok(ApplySummary {
            section: SECTION.to_string(),
            elapsed,
        })
    }
}

impl fmt::Display for Operator {
    /// Displays as the generated source.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Stencil;
    use mantle_grid::Grid;

    #[test]
    fn apply_increments_every_domain_point() {
        let grid = Grid::new(&[3, 3, 3]).unwrap();
        let f = Function::new("f", &grid, 1);
        let op = Operator::new(&[Eq::new(f.center(), f.center() + 1.0)]).unwrap();

        assert!(!op.is_compiled());
        let summary = op.apply(&Args::new()).unwrap();
        assert_eq!(summary.section, "section0");
        assert!(op.is_compiled());
        op.apply(&Args::new()).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    assert_eq!(f.get(&[i, j, k]), 2.0);
                }
            }
        }
        // Halo points stay untouched.
        assert_eq!(f.store().write().get(&[0, 0, 0]), 0.0);
        assert!(op.timer().value("section0").is_some());
    }

    #[test]
    fn display_is_the_generated_source() {
        let grid = Grid::new(&[3]).unwrap();
        let f = Function::new("f", &grid, 1);
        let op = Operator::new(&[Eq::new(f.center(), f.center() + 1.0)]).unwrap();
        assert_eq!(op.to_string(), op.source());
        assert!(op.source().starts_with("int Kernel("));
    }

    #[test]
    fn source_is_deterministic_per_equation_set() {
        let grid = Grid::new(&[4, 4]).unwrap();
        let f = Function::new("f", &grid, 1);
        let a = Operator::new(&[Eq::new(f.center(), f.center() + 1.0)]).unwrap();
        let b = Operator::new(&[Eq::new(f.center(), f.center() + 1.0)]).unwrap();
        assert_eq!(a.source(), b.source());
    }

    #[test]
    fn stepping_without_time_range_is_refused() {
        let grid = Grid::new(&[4]).unwrap();
        let g = Function::time_stepped("g", &grid, 1, 1);
        let op = Operator::new(&[Eq::new(g.forward(), g.center() + 1.0)]).unwrap();
        let err = op.apply(&Args::new()).unwrap_err();
        assert!(matches!(err, Error::MissingBinding(name) if name == "time"));
    }

    #[test]
    fn stepping_rotates_slots() {
        let grid = Grid::new(&[4]).unwrap();
        let g = Function::time_stepped("g", &grid, 1, 1);
        let op = Operator::new(&[Eq::new(g.forward(), g.center() + 1.0)]).unwrap();

        // Three steps starting from zeros: slot(time+1) = slot(time) + 1.
        op.apply(&Args::new().time(0, 2)).unwrap();
        // time=0: g[1] = g[0]+1 = 1; time=1: g[0] = g[1]+1 = 2;
        // time=2: g[1] = g[0]+1 = 3.
        assert_eq!(g.get(&[0, 0]), 2.0);
        assert_eq!(g.get(&[1, 0]), 3.0);
    }

    #[test]
    fn saved_history_defaults_to_full_range() {
        let grid = Grid::new(&[4]).unwrap();
        let g = Function::saved("g", &grid, 1, 3);
        let op = Operator::new(&[Eq::new(g.forward(), g.center() + 1.0)]).unwrap();
        op.apply(&Args::new()).unwrap();

        // time runs 0..=1: g[1] = g[0]+1, g[2] = g[1]+1.
        assert_eq!(g.get(&[0, 0]), 0.0);
        assert_eq!(g.get(&[1, 0]), 1.0);
        assert_eq!(g.get(&[2, 0]), 2.0);
    }

    #[test]
    fn substitute_carrier_receives_the_writes() {
        let grid = Grid::new(&[3]).unwrap();
        let f = Function::new("f", &grid, 1);
        let op = Operator::new(&[Eq::new(f.center(), f.center() + 1.0)]).unwrap();

        let other = Function::new("other", &grid, 1);
        op.apply(&Args::new().bind("f", &other)).unwrap();
        assert_eq!(other.get(&[0]), 1.0);
        assert!(!f.is_allocated());
    }

    #[test]
    fn substitute_must_match_dtype_and_shape() {
        let grid = Grid::new(&[3]).unwrap();
        let f = Function::new("f", &grid, 1);
        let op = Operator::new(&[Eq::new(f.center(), f.center() + 1.0)]).unwrap();

        let wrong_dtype = Function::with_dtype("w", &grid, 1, mantle_foundation::DType::F64);
        assert!(matches!(
            op.apply(&Args::new().bind("f", &wrong_dtype)),
            Err(Error::DTypeMismatch { .. })
        ));

        let bigger = Grid::new(&[5]).unwrap();
        let wrong_shape = Function::new("w", &bigger, 1);
        assert!(matches!(
            op.apply(&Args::new().bind("f", &wrong_shape)),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn aliased_bindings_are_refused() {
        let grid = Grid::new(&[3]).unwrap();
        let a = Function::new("a", &grid, 1);
        let b = Function::new("b", &grid, 1);
        let op = Operator::new(&[Eq::new(a.center(), b.center() + 1.0)]).unwrap();

        let err = op.apply(&Args::new().bind("b", &a)).unwrap_err();
        assert!(matches!(err, Error::AliasedBinding(name) if name == "b"));
    }

    #[test]
    fn scalar_override_reaches_the_kernel() {
        let grid = Grid::new(&[3]).unwrap();
        let f = Function::new("f", &grid, 1);
        let c = Constant::new("alpha");
        c.set_value(1.0);
        let op = Operator::new(&[Eq::new(f.center(), f.center() + &c)]).unwrap();

        op.apply(&Args::new().scalar("alpha", 4.0)).unwrap();
        assert_eq!(f.get(&[0]), 4.0);
        // The constant itself is untouched by the override.
        assert_eq!(c.value(), 1.0);
    }
}
