//! Kernel interpreter.
//!
//! Executes a [`KernelProgram`] against bound carrier buffers with C
//! arithmetic semantics: integer/real promotion, truncating `/` and `%`
//! on integers, and assignment narrowing to the target buffer's dtype.
//! Single-threaded by design; the environment owns write guards on
//! every buffer for the whole run.

use indexmap::IndexMap;
use parking_lot::MappedRwLockWriteGuard;

use mantle_grid::Buffer;
use mantle_symbolics::Node;

use crate::error::{Error, Result};

use super::program::{KernelProgram, Stmt};

/// A value in flight: C int or C floating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Real(f64),
}

impl Num {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Real(v) => v,
        }
    }

    fn as_int(self) -> i64 {
        match self {
            Num::Int(v) => v,
            Num::Real(v) => v as i64,
        }
    }

    fn add(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a.wrapping_add(b)),
            (a, b) => Num::Real(a.as_f64() + b.as_f64()),
        }
    }

    fn sub(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a.wrapping_sub(b)),
            (a, b) => Num::Real(a.as_f64() - b.as_f64()),
        }
    }

    fn mul(self, other: Num) -> Num {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Num::Int(a.wrapping_mul(b)),
            (a, b) => Num::Real(a.as_f64() * b.as_f64()),
        }
    }

    fn div(self, other: Num) -> Result<Num> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => {
                if b == 0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(Num::Int(a.wrapping_div(b)))
                }
            }
            (a, b) => Ok(Num::Real(a.as_f64() / b.as_f64())),
        }
    }

    fn rem(self, other: Num) -> Result<Num> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => {
                if b == 0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(Num::Int(a.wrapping_rem(b)))
                }
            }
            (a, b) => Ok(Num::Real(a.as_f64() % b.as_f64())),
        }
    }

    fn neg(self) -> Num {
        match self {
            Num::Int(v) => Num::Int(v.wrapping_neg()),
            Num::Real(v) => Num::Real(-v),
        }
    }
}

/// Execution environment: buffers, scalar bindings, and block locals.
pub(crate) struct Env<'a> {
    buffers: IndexMap<String, MappedRwLockWriteGuard<'a, Buffer>>,
    scalars: IndexMap<String, Num>,
    locals: Vec<(String, i64)>,
}

impl<'a> Env<'a> {
    pub(crate) fn new(
        buffers: IndexMap<String, MappedRwLockWriteGuard<'a, Buffer>>,
        scalars: IndexMap<String, Num>,
    ) -> Self {
        Env {
            buffers,
            scalars,
            locals: Vec::new(),
        }
    }

    fn lookup(&self, name: &str) -> Result<Num> {
        // Innermost binding wins; locals shadow parameters.
        if let Some((_, v)) = self.locals.iter().rev().find(|(n, _)| n == name) {
            return Ok(Num::Int(*v));
        }
        self.scalars
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSymbol(name.to_string()))
    }
}

pub(crate) fn run(program: &KernelProgram, env: &mut Env) -> Result<()> {
    exec_block(&program.body, env)
}

fn exec_block(stmts: &[Stmt], env: &mut Env) -> Result<()> {
    let mark = env.locals.len();
    for stmt in stmts {
        exec_stmt(stmt, env)?;
    }
    env.locals.truncate(mark);
    Ok(())
}

fn exec_stmt(stmt: &Stmt, env: &mut Env) -> Result<()> {
    match stmt {
        Stmt::Let { name, expr } => {
            let value = eval(expr, env)?.as_int();
            env.locals.push((name.clone(), value));
            Ok(())
        }
        Stmt::Loop { var, lo, hi, body } => {
            let lo = eval(lo, env)?.as_int();
            let hi = eval(hi, env)?.as_int();
            env.locals.push((var.clone(), lo));
            let slot = env.locals.len() - 1;
            let mut v = lo;
            while v <= hi {
                env.locals[slot].1 = v;
                exec_block(body, env)?;
                v += 1;
            }
            env.locals.truncate(slot);
            Ok(())
        }
        Stmt::Store { base, index, value } => {
            let value = eval(value, env)?;
            let index = eval(index, env)?.as_int();
            let buffer = env
                .buffers
                .get_mut(base)
                .ok_or_else(|| Error::MissingBinding(base.clone()))?;
            if index < 0 || index as usize >= buffer.len() {
                return Err(Error::OutOfBounds {
                    buffer: base.clone(),
                    index,
                    len: buffer.len(),
                });
            }
            buffer.set_linear(index as usize, value.as_f64());
            Ok(())
        }
    }
}

fn eval(node: &Node, env: &Env) -> Result<Num> {
    match node {
        Node::Symbol(name) => env.lookup(name),
        Node::Int(v) => Ok(Num::Int(*v)),
        Node::Real(v) => Ok(Num::Real(*v)),
        Node::Add(a, b) => Ok(eval(a, env)?.add(eval(b, env)?)),
        Node::Sub(a, b) => Ok(eval(a, env)?.sub(eval(b, env)?)),
        Node::Mul(a, b) => Ok(eval(a, env)?.mul(eval(b, env)?)),
        Node::Neg(a) => Ok(eval(a, env)?.neg()),
        Node::IntDiv(a, b) => eval(a, env)?.div(eval(b, env)?),
        Node::Mod(a, b) => eval(a, env)?.rem(eval(b, env)?),
        Node::Indexed { base, index } => {
            let index = eval(index, env)?.as_int();
            let buffer = env
                .buffers
                .get(base)
                .ok_or_else(|| Error::MissingBinding(base.clone()))?;
            if index < 0 || index as usize >= buffer.len() {
                return Err(Error::OutOfBounds {
                    buffer: base.clone(),
                    index,
                    len: buffer.len(),
                });
            }
            let value = buffer.get_linear(index as usize);
            Ok(if buffer.dtype().is_float() {
                Num::Real(value)
            } else {
                Num::Int(value as i64)
            })
        }
        // The kernel grammar cannot produce these.
        Node::PointerCall { .. } | Node::ListInit(_) => {
            unreachable!("non-arithmetic node in kernel body")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mantle_foundation::DType;
    use mantle_grid::LazyStore;

    fn scalar_env(pairs: &[(&str, i64)]) -> IndexMap<String, Num> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), Num::Int(*v)))
            .collect()
    }

    #[test]
    fn loop_accumulates_into_buffer() {
        let store = LazyStore::new("f", DType::F32, vec![4]);
        let mut buffers = IndexMap::new();
        buffers.insert("f".to_string(), store.write());
        let mut env = Env::new(buffers, scalar_env(&[("x_m", 0), ("x_M", 3)]));

        // for (x) f[x] = f[x] + 1.0
        let body = Stmt::Loop {
            var: "x".into(),
            lo: Node::sym("x_m"),
            hi: Node::sym("x_M"),
            body: vec![Stmt::Store {
                base: "f".into(),
                index: Node::sym("x"),
                value: Node::add(
                    Node::indexed("f", Node::sym("x")),
                    Node::Real(1.0),
                ),
            }],
        };
        exec_stmt(&body, &mut env).unwrap();
        exec_stmt(&body, &mut env).unwrap();
        drop(env);

        let buffer = store.write();
        for i in 0..4 {
            assert_eq!(buffer.get_linear(i), 2.0);
        }
    }

    #[test]
    fn let_binds_slot_index() {
        let store = LazyStore::new("g", DType::F32, vec![2]);
        let mut buffers = IndexMap::new();
        buffers.insert("g".to_string(), store.write());
        let mut env = Env::new(buffers, scalar_env(&[("time", 3)]));

        // const long t0 = time%2; g[t0] = 7.0;
        let stmts = [
            Stmt::Let {
                name: "t0".into(),
                expr: Node::modulo(Node::sym("time"), Node::Int(2)),
            },
            Stmt::Store {
                base: "g".into(),
                index: Node::sym("t0"),
                value: Node::Real(7.0),
            },
        ];
        exec_block(&stmts, &mut env).unwrap();
        drop(env);
        assert_eq!(store.write().get_linear(1), 7.0);
    }

    #[test]
    fn int_arithmetic_truncates_like_c() {
        let env = Env::new(IndexMap::new(), scalar_env(&[]));
        let div = Node::int_div(Node::Int(7), Node::Int(2));
        assert_eq!(eval(&div, &env).unwrap(), Num::Int(3));
        let neg_div = Node::int_div(Node::Int(-7), Node::Int(2));
        assert_eq!(eval(&neg_div, &env).unwrap(), Num::Int(-3));
        let promoted = Node::int_div(Node::Real(7.0), Node::Int(2));
        assert_eq!(eval(&promoted, &env).unwrap(), Num::Real(3.5));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let env = Env::new(IndexMap::new(), scalar_env(&[]));
        let div = Node::int_div(Node::Int(1), Node::Int(0));
        assert!(matches!(eval(&div, &env), Err(Error::DivisionByZero)));
    }

    #[test]
    fn out_of_bounds_is_reported_with_context() {
        let store = LazyStore::new("f", DType::F32, vec![2]);
        let mut buffers = IndexMap::new();
        buffers.insert("f".to_string(), store.write());
        let mut env = Env::new(buffers, scalar_env(&[]));

        let stmt = Stmt::Store {
            base: "f".into(),
            index: Node::Int(5),
            value: Node::Real(1.0),
        };
        match exec_stmt(&stmt, &mut env) {
            Err(Error::OutOfBounds { buffer, index, len }) => {
                assert_eq!(buffer, "f");
                assert_eq!(index, 5);
                assert_eq!(len, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let env = Env::new(IndexMap::new(), scalar_env(&[]));
        assert!(matches!(
            eval(&Node::sym("ghost"), &env),
            Err(Error::UnknownSymbol(name)) if name == "ghost"
        ));
    }
}
