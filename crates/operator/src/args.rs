//! Runtime argument overrides for [`Operator::apply`].
//!
//! An operator derives default bindings from the carriers it was built
//! over; `Args` lets a call substitute compatible carriers, override
//! scalars, and set the time range.
//!
//! [`Operator::apply`]: crate::Operator::apply

use indexmap::IndexMap;

use mantle_grid::Function;

/// Per-apply overrides, built up method-chaining style.
#[derive(Debug, Default)]
pub struct Args {
    pub(crate) functions: IndexMap<String, Function>,
    pub(crate) scalars: IndexMap<String, f64>,
    pub(crate) time: Option<(i64, i64)>,
}

impl Args {
    pub fn new() -> Args {
        Args::default()
    }

    /// Run against `function` instead of the carrier the operator was
    /// built over. Keyed by the built-over carrier's name; the
    /// substitute must match its dtype and padded shape.
    pub fn bind(mut self, name: impl Into<String>, function: &Function) -> Args {
        self.functions.insert(name.into(), function.clone());
        self
    }

    /// Override a scalar parameter, bound or derived.
    pub fn scalar(mut self, name: impl Into<String>, value: f64) -> Args {
        self.scalars.insert(name.into(), value);
        self
    }

    /// Inclusive time range to run over.
    pub fn time(mut self, time_m: i64, time_max: i64) -> Args {
        self.time = Some((time_m, time_max));
        self
    }
}
