//! Kernel source rendering.
//!
//! Turns lowered IR into the one C translation unit an operator owns.
//! Output is fully deterministic: no timestamps, no environment, nothing
//! but the IR reaches the text. That makes the source usable as a cache
//! key and lets a restored operator prove it regenerated the exact
//! kernel its ancestor had.

use mantle_symbolics::render as render_node;

use crate::lower::{KernelIr, StoreIr};

const INDENT: &str = "  ";

pub(crate) fn render(ir: &KernelIr) -> String {
    let mut out = String::new();

    out.push_str("int Kernel(");
    for (i, param) in ir.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if param.pointer {
            out.push_str(&format!("{} *restrict {}", param.dtype.c_name(), param.name));
        } else {
            out.push_str(&format!("const {} {}", param.dtype.c_name(), param.name));
        }
    }
    out.push_str(")\n{\n");

    let mut depth = 1;
    if ir.has_time_loop {
        push_loop_open(&mut out, depth, "time", "time_m", "time_M");
        depth += 1;
        for (name, node) in &ir.time_decls {
            push_line(
                &mut out,
                depth,
                &format!("const long {name} = {};", render_node(node)),
            );
        }
    }
    for dim in &ir.space_dims {
        push_loop_open(
            &mut out,
            depth,
            dim,
            &format!("{dim}_m"),
            &format!("{dim}_M"),
        );
        depth += 1;
    }

    for StoreIr { base, index, value } in &ir.stores {
        push_line(
            &mut out,
            depth,
            &format!("{base}[{}] = {};", render_node(index), render_node(value)),
        );
    }

    while depth > 1 {
        depth -= 1;
        push_line(&mut out, depth, "}");
    }
    push_line(&mut out, 1, "return 0;");
    out.push_str("}\n");
    out
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(line);
    out.push('\n');
}

fn push_loop_open(out: &mut String, depth: usize, var: &str, lo: &str, hi: &str) {
    push_line(
        out,
        depth,
        &format!("for (long {var} = {lo}; {var} <= {hi}; {var} += 1)"),
    );
    push_line(out, depth, "{");
}
