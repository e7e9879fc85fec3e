//! Executable kernel form.
//!
//! What compilation produces and the cache shares: the parameter list
//! with C types resolved, and the statement tree with every expression
//! as a symbolic node. Programs are immutable once built; execution
//! state lives entirely in the environment passed to the interpreter.

use mantle_foundation::DType;
use mantle_symbolics::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Pointer parameter backed by a carrier buffer.
    Buffer,
    /// By-value scalar: bounds, strides, constants.
    Scalar,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    pub dtype: DType,
    pub kind: ParamKind,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `for (long var = lo; var <= hi; var += 1) { body }`
    Loop {
        var: String,
        lo: Node,
        hi: Node,
        body: Vec<Stmt>,
    },
    /// `const long name = expr;`
    Let { name: String, expr: Node },
    /// `base[index] = value;`
    Store {
        base: String,
        index: Node,
        value: Node,
    },
}

#[derive(Debug, Clone)]
pub struct KernelProgram {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub body: Vec<Stmt>,
}
