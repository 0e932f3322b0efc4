//! Expression lowering (spec §4.E).
//!
//! Converts an `Expr` tree into the stack-machine opcode sequence that
//! computes it, one-to-one with `original_source/compiler.py`'s
//! `linearize_expr`. Evaluation order is rightmost-operand-first so the
//! first operand ends up on top of stack when the operator opcode fires
//! (spec §4.E, "Evaluation order").

use crate::expr::{BinOp, Expr};
use crate::kind::Literal;
use crate::opcode::Instr;

/// Lower a single expression node into the instructions that compute it.
pub fn lower_expr(expr: &Expr) -> Vec<Instr> {
    match expr {
        Expr::Lit(Literal::Int(v)) => vec![Instr::PushInt(*v)],
        Expr::Lit(Literal::Str(s)) => vec![Instr::PushStr(s.clone())],
        Expr::Lit(Literal::Bool(b)) => vec![Instr::PushStr(if *b { "True" } else { "False" }.to_string())],

        Expr::Lookup(name) => vec![Instr::Lookup(name.clone())],

        Expr::IndirectLookup(name_expr) => {
            // Mirrors the `indirect_lookup` case in `linearize_expr`: the
            // name expression is known (by construction, §4.E) to be a bare
            // `lookup`, so its variable name is read directly rather than
            // lowered and then resolved at runtime.
            let mut out = match name_expr.as_ref() {
                Expr::Lookup(name) => vec![Instr::Lookup(name.clone())],
                other => lower_expr(other),
            };
            out.push(Instr::IndirectLookup);
            out
        }

        Expr::BinOp(op, l, r) => lower_binop(*op, l, r),

        Expr::Not(inner) => {
            let mut out = lower_expr(inner);
            out.push(Instr::BooleanNot);
            out
        }

        Expr::Mod2(inner) => {
            let mut out = lower_expr(inner);
            out.push(Instr::ToUnary);
            out.push(Instr::Mod2Unary);
            out
        }

        Expr::IsAny(inner, options) => {
            let mut out = lower_expr(inner);
            out.push(Instr::IsAny(options.clone()));
            out
        }

        Expr::Fen(inner) => {
            let mut out = lower_expr(inner);
            out.push(Instr::Fen);
            out
        }
    }
}

fn lower_binop(op: BinOp, l: &Expr, r: &Expr) -> Vec<Instr> {
    match op {
        BinOp::Eq => rightmost_first(r, l, Instr::Eq),
        BinOp::Neq => rightmost_first(r, l, Instr::Neq),
        BinOp::And => rightmost_first(r, l, Instr::BooleanAnd),
        BinOp::Or => rightmost_first(r, l, Instr::BooleanOr),
        BinOp::StrCat => rightmost_first(r, l, Instr::StringCat),

        BinOp::Lt => ordered_compare(l, r, Instr::LessThan),
        BinOp::Gt => ordered_compare(l, r, Instr::GreaterThan),
        BinOp::Le => ordered_compare(l, r, Instr::LessEqualThan),
        BinOp::Ge => ordered_compare(l, r, Instr::GreaterEqualThan),

        // `+`/`-` are checked before the `unary_ops` table in
        // `linearize_expr` (`compiler.py:254-264`), so they always go
        // through `binary_add`/`binary_subtract` on the fixed-width binary
        // literal, never `add_unary`/`sub_unary`. The operand order is also
        // asymmetric in the original: `+` is left-then-right, `-` is
        // right-then-left.
        BinOp::Add => leftmost_first(l, r, Instr::BinaryAdd),
        BinOp::Sub => rightmost_first(r, l, Instr::BinarySubtract),
    }
}

/// `lookup`/`eq`-style ops: push the right operand, then the left, then the
/// opcode (`[*linearize_expr(value[2]), *linearize_expr(value[1]), (op,)]`).
fn rightmost_first(r: &Expr, l: &Expr, op: Instr) -> Vec<Instr> {
    let mut out = lower_expr(r);
    out.extend(lower_expr(l));
    out.push(op);
    out
}

/// `+`-style ops: push the left operand, then the right, then the opcode
/// (`[*linearize_expr(value[1]), *linearize_expr(value[2]), (op,)]`).
fn leftmost_first(l: &Expr, r: &Expr, op: Instr) -> Vec<Instr> {
    let mut out = lower_expr(l);
    out.extend(lower_expr(r));
    out.push(op);
    out
}

/// Ordered comparisons convert both operands to unary before comparing.
fn ordered_compare(l: &Expr, r: &Expr, op: Instr) -> Vec<Instr> {
    let mut out = lower_expr(r);
    out.push(Instr::ToUnary);
    out.extend(lower_expr(l));
    out.push(Instr::ToUnary);
    out.push(op);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Traced;

    #[test]
    fn equality_pushes_rightmost_operand_first() {
        let a = Traced::str("x");
        let b = Traced::str("y");
        let eq = a.eq(&b);
        let instrs = lower_expr(&eq.expr);
        assert_eq!(
            instrs,
            vec![Instr::PushStr("y".into()), Instr::PushStr("x".into()), Instr::Eq]
        );
    }

    #[test]
    fn addition_pushes_left_then_right_then_binary_add() {
        let a = Traced::int(2);
        let b = Traced::int(3);
        let sum = &a + &b;
        let instrs = lower_expr(&sum.expr);
        assert_eq!(instrs, vec![Instr::PushInt(2), Instr::PushInt(3), Instr::BinaryAdd]);
    }

    #[test]
    fn subtraction_pushes_right_then_left_then_binary_subtract() {
        let a = Traced::int(5);
        let b = Traced::int(2);
        let diff = &a - &b;
        let instrs = lower_expr(&diff.expr);
        assert_eq!(instrs, vec![Instr::PushInt(2), Instr::PushInt(5), Instr::BinarySubtract]);
    }
}
