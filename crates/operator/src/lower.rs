//! Lowering: equations to a loop nest.
//!
//! Resolves every field access to a linearized index expression, decides
//! the time indexing scheme, and collects the parameter list. Only
//! objects the equations actually reference become parameters, so
//! dead-argument elimination falls out of construction rather than being
//! a pass.
//!
//! Index expressions are Horner form over the padded storage shape:
//! `((t)*f_size1 + (x + h))*f_size2 + (y + h)` for a halo of `h`. Size
//! symbols are per-carrier (`f_size1`, ...) and bound at apply time from
//! whatever carrier ends up in the slot, so a restored operator works
//! against any compatibly-shaped binding.

use std::sync::Arc;

use indexmap::IndexMap;

use mantle_foundation::DType;
use mantle_grid::{Constant, Function};
use mantle_symbolics::Node;

use crate::error::{Error, Result};
use crate::expr::{Eq, FieldAccess, StencilExpr};
use crate::operator::Parameter;

/// Time indexing scheme shared by every time carrier in one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeMode {
    NoTime,
    /// Direct indexing into a saved history of `slots` steps.
    Saved { slots: usize },
    /// Modulo indexing into `slots` rotating slots.
    Stepping { slots: usize },
}

/// One C-signature entry.
#[derive(Debug, Clone)]
pub(crate) struct CParam {
    pub name: String,
    pub dtype: DType,
    pub pointer: bool,
}

/// One assignment statement in the innermost loop body.
#[derive(Debug, Clone)]
pub(crate) struct StoreIr {
    pub base: String,
    pub index: Node,
    pub value: Node,
}

/// Everything source rendering needs.
#[derive(Debug, Clone)]
pub(crate) struct KernelIr {
    pub params: Vec<CParam>,
    /// Slot declarations at the top of the time loop, stepping only.
    pub time_decls: Vec<(String, Node)>,
    pub has_time_loop: bool,
    /// Space loop variables, outermost first.
    pub space_dims: Vec<String>,
    pub stores: Vec<StoreIr>,
}

#[derive(Debug)]
pub(crate) struct Lowered {
    pub parameters: Vec<Parameter>,
    pub ir: KernelIr,
}

fn collect_accesses<'a>(expr: &'a StencilExpr, out: &mut Vec<&'a FieldAccess>) {
    match expr {
        StencilExpr::Access(access) => out.push(access),
        StencilExpr::Scalar(_) | StencilExpr::Literal(_) => {}
        StencilExpr::Add(a, b) | StencilExpr::Sub(a, b) | StencilExpr::Mul(a, b) => {
            collect_accesses(a, out);
            collect_accesses(b, out);
        }
    }
}

fn collect_constants<'a>(expr: &'a StencilExpr, out: &mut Vec<&'a Constant>) {
    match expr {
        StencilExpr::Scalar(constant) => out.push(constant),
        StencilExpr::Access(_) | StencilExpr::Literal(_) => {}
        StencilExpr::Add(a, b) | StencilExpr::Sub(a, b) | StencilExpr::Mul(a, b) => {
            collect_constants(a, out);
            collect_constants(b, out);
        }
    }
}

/// Slot symbol for a stepping-mode time shift.
fn slot_symbol(shift: i64) -> &'static str {
    match shift {
        0 => "t0",
        1 => "t1",
        _ => "t2",
    }
}

fn time_index_node(mode: TimeMode, shift: i64) -> Node {
    match mode {
        TimeMode::Stepping { .. } => Node::sym(slot_symbol(shift)),
        _ => match shift {
            0 => Node::sym("time"),
            s if s > 0 => Node::add(Node::sym("time"), Node::Int(s)),
            s => Node::sub(Node::sym("time"), Node::Int(-s)),
        },
    }
}

/// Space index along one axis: loop variable plus halo plus shift.
fn space_index_node(dim: &str, offset: i64) -> Node {
    match offset {
        0 => Node::sym(dim),
        o if o > 0 => Node::add(Node::sym(dim), Node::Int(o)),
        o => Node::sub(Node::sym(dim), Node::Int(-o)),
    }
}

/// Linearize axis expressions over a carrier's padded shape.
fn horner_index(function: &str, axes: Vec<Node>) -> Node {
    let mut iter = axes.into_iter();
    let mut acc = match iter.next() {
        Some(first) => first,
        None => return Node::Int(0),
    };
    for (j, axis) in iter.enumerate() {
        let size = Node::sym(format!("{function}_size{}", j + 1));
        acc = Node::add(Node::mul(acc, size), axis);
    }
    acc
}

fn access_node(access: &FieldAccess, mode: TimeMode, space_dims: &[String]) -> Result<Node> {
    let function = &access.function;
    let name = function.name();
    let halo = function.space_order() as i64;

    let mut axes = Vec::with_capacity(space_dims.len() + 1);
    if function.time().is_some() {
        axes.push(time_index_node(mode, access.time_shift));
    } else if access.time_shift != 0 {
        return Err(Error::TimeShiftWithoutAxis(name.to_string()));
    }
    for (axis, dim) in space_dims.iter().enumerate() {
        let shift = access.space_shifts[axis];
        if shift.unsigned_abs() as usize > function.space_order() {
            return Err(Error::HaloExceeded {
                function: name.to_string(),
                axis,
                shift,
                halo: function.space_order(),
            });
        }
        axes.push(space_index_node(dim, halo + shift));
    }
    Ok(Node::indexed(name, horner_index(name, axes)))
}

fn expr_node(expr: &StencilExpr, mode: TimeMode, space_dims: &[String]) -> Result<Node> {
    Ok(match expr {
        StencilExpr::Access(access) => access_node(access, mode, space_dims)?,
        StencilExpr::Scalar(constant) => Node::sym(constant.name()),
        StencilExpr::Literal(value) => Node::Real(*value),
        StencilExpr::Add(a, b) => Node::add(
            expr_node(a, mode, space_dims)?,
            expr_node(b, mode, space_dims)?,
        ),
        StencilExpr::Sub(a, b) => Node::sub(
            expr_node(a, mode, space_dims)?,
            expr_node(b, mode, space_dims)?,
        ),
        StencilExpr::Mul(a, b) => Node::mul(
            expr_node(a, mode, space_dims)?,
            expr_node(b, mode, space_dims)?,
        ),
    })
}

pub(crate) fn lower(eqs: &[Eq]) -> Result<Lowered> {
    if eqs.is_empty() {
        return Err(Error::EmptyOperator);
    }

    // Carriers and constants in first-use order, lhs before rhs.
    let mut functions: IndexMap<String, Function> = IndexMap::new();
    let mut constants: IndexMap<String, Constant> = IndexMap::new();
    let mut accesses: Vec<FieldAccess> = Vec::new();

    for eq in eqs {
        let mut eq_accesses: Vec<&FieldAccess> = vec![&eq.lhs];
        collect_accesses(&eq.rhs, &mut eq_accesses);
        for access in eq_accesses {
            let f = &access.function;
            match functions.get(f.name()) {
                Some(existing) if !existing.same(f) => {
                    return Err(Error::DuplicateCarrier(f.name().to_string()))
                }
                Some(_) => {}
                None => {
                    functions.insert(f.name().to_string(), f.clone());
                }
            }
            accesses.push(access.clone());
        }
        let mut eq_constants = Vec::new();
        collect_constants(&eq.rhs, &mut eq_constants);
        for c in eq_constants {
            match constants.get(c.name()) {
                Some(existing) if !existing.same(c) => {
                    return Err(Error::DuplicateCarrier(c.name().to_string()))
                }
                Some(_) => {}
                None => {
                    constants.insert(c.name().to_string(), c.clone());
                }
            }
        }
    }

    // Single shared grid.
    let grid = functions[0].grid().clone();
    if functions.values().any(|f| f.grid() != &grid) {
        return Err(Error::IncompatibleGrids);
    }

    // One time history scheme across every time carrier.
    let mut mode = TimeMode::NoTime;
    for f in functions.values() {
        if let Some(cfg) = f.time() {
            let this = if cfg.is_saved() {
                TimeMode::Saved { slots: cfg.slots() }
            } else {
                TimeMode::Stepping { slots: cfg.slots() }
            };
            match mode {
                TimeMode::NoTime => mode = this,
                m if m != this => return Err(Error::MixedTimeModes),
                _ => {}
            }
        }
    }

    let space_dims: Vec<String> = grid
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();

    // Slot locals for the stepping shifts that actually occur.
    let mut time_decls = Vec::new();
    if let TimeMode::Stepping { slots } = mode {
        let slots = slots as i64;
        let used: Vec<i64> = [0i64, 1, -1]
            .into_iter()
            .filter(|s| {
                accesses
                    .iter()
                    .any(|a| a.function.time().is_some() && a.time_shift == *s)
            })
            .collect();
        for shift in used {
            let node = match shift {
                0 => Node::modulo(Node::sym("time"), Node::Int(slots)),
                1 => Node::modulo(Node::add(Node::sym("time"), Node::Int(1)), Node::Int(slots)),
                _ => Node::modulo(
                    Node::add(Node::sym("time"), Node::Int(slots - 1)),
                    Node::Int(slots),
                ),
            };
            time_decls.push((slot_symbol(shift).to_string(), node));
        }
    }

    // Assignment statements in equation order.
    let mut stores = Vec::with_capacity(eqs.len());
    for eq in eqs {
        let lhs = access_node(&eq.lhs, mode, &space_dims)?;
        let value = expr_node(&eq.rhs, mode, &space_dims)?;
        match lhs {
            Node::Indexed { base, index } => stores.push(StoreIr {
                base,
                index: *index,
                value,
            }),
            _ => unreachable!("access lowering yields Indexed"),
        }
    }

    // C signature: carriers with their stride sizes, scalars, bounds.
    let mut params = Vec::new();
    for f in functions.values() {
        params.push(CParam {
            name: f.name().to_string(),
            dtype: f.dtype(),
            pointer: true,
        });
        for j in 1..f.padded_shape().len() {
            params.push(CParam {
                name: format!("{}_size{j}", f.name()),
                dtype: DType::I64,
                pointer: false,
            });
        }
    }
    for c in constants.values() {
        params.push(CParam {
            name: c.name().to_string(),
            dtype: c.dtype(),
            pointer: false,
        });
    }
    let has_time_loop = mode != TimeMode::NoTime;
    if has_time_loop {
        for bound in ["time_m", "time_M"] {
            params.push(CParam {
                name: bound.into(),
                dtype: DType::I64,
                pointer: false,
            });
        }
    }
    for dim in &space_dims {
        for suffix in ["m", "M"] {
            params.push(CParam {
                name: format!("{dim}_{suffix}"),
                dtype: DType::I64,
                pointer: false,
            });
        }
    }

    // Parameter list: carriers, scalars, then the loop dimensions.
    let mut parameters: Vec<Parameter> = Vec::new();
    for f in functions.values() {
        parameters.push(Parameter::Function(f.clone()));
    }
    for c in constants.values() {
        parameters.push(Parameter::Scalar(c.clone()));
    }
    match mode {
        TimeMode::Saved { .. } => {
            parameters.push(Parameter::Dimension(grid.time_dim().clone()));
        }
        TimeMode::Stepping { .. } => {
            parameters.push(Parameter::Dimension(grid.stepping_dim().clone()));
        }
        TimeMode::NoTime => {}
    }
    for dim in grid.dimensions() {
        parameters.push(Parameter::Dimension(Arc::clone(dim)));
    }

    Ok(Lowered {
        parameters,
        ir: KernelIr {
            params,
            time_decls,
            has_time_loop,
            space_dims,
            stores,
        },
    })
}
