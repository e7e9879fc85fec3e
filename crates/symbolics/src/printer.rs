//! Deterministic C renderer for nodes.
//!
//! The printer defines the generated-source dialect: whatever it emits,
//! the kernel parser must accept. Output is canonical, so rendering the
//! same tree always yields the same bytes, which is what makes generated
//! source comparable across processes and usable as a cache key.
//!
//! Precedence: `+ -` bind loosest, then `* / %`, then unary minus, then
//! atoms. Operands are parenthesized only when required, with the usual
//! left-associative asymmetry (`a - (b - c)` keeps its parens, the left
//! spelling does not).

use crate::node::Node;

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_NEG: u8 = 3;
const PREC_ATOM: u8 = 4;

/// Render a node to C source text.
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    render_into(node, &mut out, 0);
    out
}

fn precedence(node: &Node) -> u8 {
    match node {
        Node::Add(..) | Node::Sub(..) => PREC_ADD,
        Node::Mul(..) | Node::IntDiv(..) | Node::Mod(..) => PREC_MUL,
        Node::Neg(_) => PREC_NEG,
        Node::Symbol(_)
        | Node::Int(_)
        | Node::Real(_)
        | Node::Indexed { .. }
        | Node::PointerCall { .. }
        | Node::ListInit(_) => PREC_ATOM,
    }
}

fn render_into(node: &Node, out: &mut String, parent_prec: u8) {
    let prec = precedence(node);
    let parens = prec < parent_prec;
    if parens {
        out.push('(');
    }
    match node {
        Node::Symbol(name) => out.push_str(name),
        Node::Int(v) => out.push_str(&v.to_string()),
        // {:?} is the shortest representation that reparses to the same
        // bits, so literal formatting is stable across processes.
        Node::Real(v) => out.push_str(&format!("{v:?}")),
        Node::Add(a, b) => {
            render_into(a, out, prec);
            out.push_str(" + ");
            render_into(b, out, prec + 1);
        }
        Node::Sub(a, b) => {
            render_into(a, out, prec);
            out.push_str(" - ");
            render_into(b, out, prec + 1);
        }
        Node::Mul(a, b) => {
            render_into(a, out, prec);
            out.push('*');
            render_into(b, out, prec + 1);
        }
        Node::IntDiv(a, b) => {
            render_into(a, out, prec);
            out.push('/');
            render_into(b, out, prec + 1);
        }
        Node::Mod(a, b) => {
            render_into(a, out, prec);
            out.push('%');
            render_into(b, out, prec + 1);
        }
        Node::Neg(a) => {
            out.push('-');
            render_into(a, out, prec + 1);
        }
        Node::Indexed { base, index } => {
            out.push_str(base);
            out.push('[');
            render_into(index, out, 0);
            out.push(']');
        }
        Node::PointerCall {
            function,
            pointer,
            params,
        } => {
            render_into(pointer, out, PREC_ATOM);
            out.push_str("->");
            out.push_str(function);
            out.push('(');
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(param);
            }
            out.push(')');
        }
        Node::ListInit(items) => {
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_into(item, out, 0);
            }
            out.push('}');
        }
    }
    if parens {
        out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(render(&Node::Int(-3)), "-3");
        assert_eq!(render(&Node::Real(1.0)), "1.0");
        assert_eq!(render(&Node::Real(0.25)), "0.25");
        assert_eq!(render(&Node::sym("x_m")), "x_m");
    }

    #[test]
    fn precedence_parens() {
        let sum_times = Node::mul(
            Node::add(Node::sym("x"), Node::Int(1)),
            Node::sym("f_size1"),
        );
        assert_eq!(render(&sum_times), "(x + 1)*f_size1");

        let nested_sub = Node::sub(
            Node::sym("a"),
            Node::sub(Node::sym("b"), Node::sym("c")),
        );
        assert_eq!(render(&nested_sub), "a - (b - c)");

        let left_sub = Node::sub(
            Node::sub(Node::sym("a"), Node::sym("b")),
            Node::sym("c"),
        );
        assert_eq!(render(&left_sub), "a - b - c");
    }

    #[test]
    fn modulo_of_sum() {
        let slot = Node::modulo(Node::add(Node::sym("time"), Node::Int(1)), Node::Int(2));
        assert_eq!(render(&slot), "(time + 1)%2");
    }

    #[test]
    fn linear_index_form() {
        // ((x + 1)*f_size1 + (y + 1))*f_size2 + (z + 1)
        let x = Node::add(Node::sym("x"), Node::Int(1));
        let y = Node::add(Node::sym("y"), Node::Int(1));
        let z = Node::add(Node::sym("z"), Node::Int(1));
        let idx = Node::add(
            Node::mul(
                Node::add(Node::mul(x, Node::sym("f_size1")), y),
                Node::sym("f_size2"),
            ),
            z,
        );
        assert_eq!(
            render(&Node::indexed("f", idx)),
            "f[((x + 1)*f_size1 + (y + 1))*f_size2 + (z + 1)]"
        );
    }

    #[test]
    fn pointer_call_and_list_init() {
        let call = Node::PointerCall {
            function: "foo".into(),
            pointer: Box::new(Node::sym("a")),
            params: vec!["b".into(), "c".into()],
        };
        assert_eq!(render(&call), "a->foo(b, c)");

        let init = Node::ListInit(vec![Node::sym("a"), Node::sym("b")]);
        assert_eq!(render(&init), "{a, b}");
    }

    #[test]
    fn negation() {
        assert_eq!(render(&Node::neg(Node::sym("a"))), "-a");
        assert_eq!(
            render(&Node::neg(Node::add(Node::sym("a"), Node::Int(1)))),
            "-(a + 1)"
        );
    }
}
