//! Stencil equations.
//!
//! The small expression surface operators are built from. A
//! [`FieldAccess`] names one carrier element relative to the iteration
//! point (time shift plus per-axis space shifts); [`StencilExpr`] closes
//! accesses, constants, and literals under `+ - *`. Operator overloads
//! keep equations readable:
//!
//! ```ignore
//! let step = Eq::new(g.forward(), g.center() + 1.0);
//! ```

use std::ops;

use mantle_grid::{Constant, Function};

/// One carrier element relative to the iteration point.
#[derive(Debug, Clone)]
pub struct FieldAccess {
    pub(crate) function: Function,
    /// -1, 0, or +1 steps along the time axis.
    pub(crate) time_shift: i64,
    /// One entry per space axis.
    pub(crate) space_shifts: Vec<i64>,
}

impl FieldAccess {
    fn at(function: &Function, time_shift: i64) -> FieldAccess {
        FieldAccess {
            function: function.clone(),
            time_shift,
            space_shifts: vec![0; function.grid().ndim()],
        }
    }

    /// Shift this access along one space axis.
    pub fn shifted(mut self, axis: usize, offset: i64) -> FieldAccess {
        self.space_shifts[axis] += offset;
        self
    }
}

/// Access builders on dense carriers.
pub trait Stencil {
    /// The element at the iteration point.
    fn center(&self) -> FieldAccess;
    /// One step ahead in time.
    fn forward(&self) -> FieldAccess;
    /// One step back in time.
    fn backward(&self) -> FieldAccess;
}

impl Stencil for Function {
    fn center(&self) -> FieldAccess {
        FieldAccess::at(self, 0)
    }

    fn forward(&self) -> FieldAccess {
        FieldAccess::at(self, 1)
    }

    fn backward(&self) -> FieldAccess {
        FieldAccess::at(self, -1)
    }
}

/// Right-hand-side expression of a stencil equation.
#[derive(Debug, Clone)]
pub enum StencilExpr {
    Access(FieldAccess),
    Scalar(Constant),
    Literal(f64),
    Add(Box<StencilExpr>, Box<StencilExpr>),
    Sub(Box<StencilExpr>, Box<StencilExpr>),
    Mul(Box<StencilExpr>, Box<StencilExpr>),
}

impl From<FieldAccess> for StencilExpr {
    fn from(access: FieldAccess) -> StencilExpr {
        StencilExpr::Access(access)
    }
}

impl From<f64> for StencilExpr {
    fn from(value: f64) -> StencilExpr {
        StencilExpr::Literal(value)
    }
}

impl From<&Constant> for StencilExpr {
    fn from(constant: &Constant) -> StencilExpr {
        StencilExpr::Scalar(constant.clone())
    }
}

impl From<Constant> for StencilExpr {
    fn from(constant: Constant) -> StencilExpr {
        StencilExpr::Scalar(constant)
    }
}

macro_rules! expr_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl<T: Into<StencilExpr>> ops::$trait<T> for StencilExpr {
            type Output = StencilExpr;
            fn $method(self, rhs: T) -> StencilExpr {
                StencilExpr::$variant(Box::new(self), Box::new(rhs.into()))
            }
        }

        impl<T: Into<StencilExpr>> ops::$trait<T> for FieldAccess {
            type Output = StencilExpr;
            fn $method(self, rhs: T) -> StencilExpr {
                StencilExpr::$variant(Box::new(self.into()), Box::new(rhs.into()))
            }
        }
    };
}

expr_op!(Add, add, Add);
expr_op!(Sub, sub, Sub);
expr_op!(Mul, mul, Mul);

/// One assignment: left-hand carrier element gets the right-hand value.
#[derive(Debug, Clone)]
pub struct Eq {
    pub(crate) lhs: FieldAccess,
    pub(crate) rhs: StencilExpr,
}

impl Eq {
    pub fn new(lhs: FieldAccess, rhs: impl Into<StencilExpr>) -> Eq {
        Eq {
            lhs,
            rhs: rhs.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mantle_grid::Grid;

    #[test]
    fn overloads_compose() {
        let grid = Grid::new(&[4, 4]).unwrap();
        let f = Function::new("f", &grid, 1);
        let nu = Constant::new("nu");

        let eq = Eq::new(f.center(), f.center().shifted(0, 1) * &nu + 1.0);
        match &eq.rhs {
            StencilExpr::Add(lhs, rhs) => {
                assert!(matches!(**lhs, StencilExpr::Mul(..)));
                assert!(matches!(**rhs, StencilExpr::Literal(v) if v == 1.0));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn shifts_accumulate_per_axis() {
        let grid = Grid::new(&[4, 4]).unwrap();
        let f = Function::new("f", &grid, 2);
        let access = f.center().shifted(1, -1).shifted(1, -1);
        assert_eq!(access.space_shifts, vec![0, -2]);
    }
}
