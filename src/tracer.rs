//! The tracing environment and DSL surface (spec §4.C, §6 "DSL surface",
//! §9 Design Notes).
//!
//! `VarTracer` plays the role of the Python `VarTracer`: it is the handle a
//! traced program threads through to read/write variables, branch, and emit
//! opcodes. Per the Design Notes, attribute interception is replaced with an
//! explicit builder exposing one method per opcode.

use crate::callnode::{AssignSource, CallNode, CallTree, OpArg};
use crate::error::{CompileError, CompileResult};
use crate::expr::{Expr, Traced};
use crate::kind::Kind;
use std::collections::HashMap;
use std::rc::Rc;

/// The tracing environment threaded through a traced program.
///
/// Kept deliberately thin: all recording happens through `CallTree`, this
/// struct only adds the per-variable kind table (`types`, mirroring
/// `VarTracer.types` in the original) needed to give freshly-read variables
/// a default kind.
pub struct VarTracer {
    pub tree: CallTree,
    types: HashMap<String, Kind>,
}

impl Default for VarTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl VarTracer {
    pub fn new() -> Self {
        VarTracer { tree: CallTree::new(), types: HashMap::new() }
    }

    /// Record the kind of a variable for future lookups, without recording
    /// an access (mirrors `VarTracer.settype`).
    pub fn settype(&mut self, name: &str, kind: Kind) {
        self.types.insert(name.to_string(), kind);
    }

    /// Read a variable (`VarTracer.__getitem__` with a plain string key).
    /// Defaults to `Kind::Str` when the variable's kind is not yet known,
    /// matching `self.types.get(key) or 'str'`.
    pub fn get(&mut self, name: &str) -> Traced {
        let kind = self.types.get(name).copied().unwrap_or(Kind::Str);
        self.tree.append(CallNode::Lookup(name.to_string()));
        Traced::new(Expr::Lookup(name.to_string()), kind)
    }

    /// Read the variable whose name is itself a traced expression
    /// (`VarTracer.__getitem__` with a `Tracer` key → `indirect_lookup`).
    pub fn get_indirect(&mut self, name_expr: &Traced) -> Traced {
        Traced::new(Expr::IndirectLookup(name_expr.expr.clone()), Kind::Str)
    }

    /// Assign a traced expression to a variable (`VarTracer.__setitem__`).
    pub fn set(&mut self, name: &str, value: &Traced) {
        self.types.insert(name.to_string(), value.kind);
        self.tree.append(CallNode::Assign(name.to_string(), AssignSource::Expr(value.expr.clone())));
    }

    /// Assign an integer literal directly, without building a `Traced`.
    pub fn set_int(&mut self, name: &str, value: u32) {
        self.types.insert(name.to_string(), Kind::Int);
        self.tree.append(CallNode::Assign(name.to_string(), AssignSource::IntLit(value)));
    }

    /// Assign a string literal directly.
    pub fn set_str(&mut self, name: &str, value: impl Into<String>) {
        self.types.insert(name.to_string(), Kind::Str);
        self.tree.append(CallNode::Assign(name.to_string(), AssignSource::StrLit(value.into())));
    }

    /// Two-phase branch replay entry point (`Tracer.ite`). Write ordinary
    /// Rust `if tracer.branch(&cond) { ... } else { ... }`, then call
    /// `tracer.merge()` once after the `if`/`else` — this is the structural
    /// equivalent of the Python `if x.ite(): ... else: ...` pattern, since
    /// Rust has no operator to intercept for `if`.
    pub fn branch(&mut self, cond: &Traced) -> bool {
        self.tree.branch(&cond.expr)
    }

    /// Rejoin sibling subtrees after an `if`/`else` driven by `branch`
    /// (`VarTracer.merge`).
    pub fn merge(&mut self) {
        self.tree.merge();
    }

    /// Emit an opaque opcode node directly (`VarTracer.__getattr__` for any
    /// name registered in the instruction set).
    pub fn op(&mut self, name: &str, args: Vec<OpArg>) {
        self.tree.append(CallNode::Op(name.to_string(), args));
    }

    /// Reset the replay cursor; called once at the top of every trace pass.
    pub fn restart(&mut self) {
        self.tree.restart();
    }

    pub fn is_complete(&self) -> bool {
        self.tree.is_complete()
    }
}

/// Opcode wrapper methods — one per entry in the SPEC_FULL §4 opcode ledger,
/// generalizing `VarTracer.__getattr__`'s dynamic dispatch into explicit,
/// statically-typed calls (spec §9 Design Notes).
impl VarTracer {
    fn op0(&mut self, name: &str) {
        self.op(name, Vec::new());
    }

    pub fn push_int(&mut self, v: u32) {
        self.op("push_int", vec![OpArg::Int(v)]);
    }
    pub fn push_str(&mut self, v: impl Into<String>) {
        self.op("push_str", vec![OpArg::Str(v.into())]);
    }
    pub fn pop(&mut self) {
        self.op0("pop");
    }
    pub fn peek(&mut self) {
        self.op0("peek");
    }
    pub fn dup(&mut self) {
        self.op0("dup");
    }
    pub fn swap(&mut self) {
        self.op0("swap");
    }
    pub fn is_stack_empty(&mut self) {
        self.op0("is_stack_empty");
    }
    pub fn indirect_assign(&mut self) {
        self.op0("indirect_assign");
    }
    pub fn lit_assign(&mut self, var: &str, value: &str) {
        self.op("lit_assign", vec![OpArg::Str(var.to_string()), OpArg::Str(value.to_string())]);
    }
    pub fn assign_var(&mut self, src: &str, dst: &str) {
        self.op("assign_var", vec![OpArg::Str(src.to_string()), OpArg::Str(dst.to_string())]);
    }
    pub fn delete_var(&mut self, var: &str) {
        self.op("delete_var", vec![OpArg::Str(var.to_string())]);
    }

    pub fn cond(&mut self, tag: &str) {
        self.op("cond", vec![OpArg::Str(tag.to_string())]);
    }
    pub fn pause(&mut self, tag: &str) {
        self.op("pause", vec![OpArg::Str(tag.to_string())]);
    }
    pub fn reactivate(&mut self, tag: &str) {
        self.op("reactivate", vec![OpArg::Str(tag.to_string())]);
    }
    pub fn fork_bool(&mut self, var: &str) {
        self.op("fork_bool", vec![OpArg::Str(var.to_string())]);
    }
    pub fn fork_inactive(&mut self, tag: &str) {
        self.op("fork_inactive", vec![OpArg::Str(tag.to_string())]);
    }
    pub fn fork_with_new_var(&mut self, tag: &str, vars: &[(&str, &str)]) {
        let pairs = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.op("fork_with_new_var", vec![OpArg::Str(tag.to_string()), OpArg::Pairs(pairs)]);
    }
    pub fn fork_list_pop(&mut self, src_list_var: &str, dst_var: &str, tag: &str) {
        self.op(
            "fork_list_pop",
            vec![OpArg::Str(src_list_var.to_string()), OpArg::Str(dst_var.to_string()), OpArg::Str(tag.to_string())],
        );
    }
    pub fn destroy_active_threads(&mut self) {
        self.op0("destroy_active_threads");
    }
    pub fn join_pop(&mut self, tag: &str) {
        self.op("join_pop", vec![OpArg::Str(tag.to_string())]);
    }

    pub fn list_pop(&mut self, src_list_var: &str, dst_var: Option<&str>) {
        let mut args = vec![OpArg::Str(src_list_var.to_string())];
        args.push(OpArg::Str(dst_var.unwrap_or("").to_string()));
        self.op("list_pop", args);
    }
    pub fn variable_uniq(&mut self, var: &str) {
        self.op("variable_uniq", vec![OpArg::Str(var.to_string())]);
    }
    pub fn fix_double_list(&mut self) {
        self.op0("fix_double_list");
    }
    pub fn assign_stack_to(&mut self, var: &str, max_repeats: u32) {
        self.op("assign_stack_to", vec![OpArg::Str(var.to_string()), OpArg::Int(max_repeats)]);
    }

    pub fn expand_chess(&mut self) {
        self.op0("expand_chess");
    }
    pub fn contract_chess(&mut self) {
        self.op0("contract_chess");
    }
    pub fn fen(&mut self) {
        self.op0("fen");
    }
    pub fn intxy_to_location(&mut self, var1: &str, var2: &str) {
        self.op("intxy_to_location", vec![OpArg::Str(var1.to_string()), OpArg::Str(var2.to_string())]);
    }
    pub fn square_to_xy(&mut self) {
        self.op0("square_to_xy");
    }
    pub fn make_pretty(&mut self, has_move: bool) {
        self.op("make_pretty", vec![OpArg::List(vec![has_move.to_string()])]);
    }
    pub fn unpretty(&mut self, has_move: bool) {
        self.op("unpretty", vec![OpArg::List(vec![has_move.to_string()])]);
    }
    pub fn piece_value(&mut self) {
        self.op0("piece_value");
    }
    pub fn check_king_alive(&mut self) {
        self.op0("check_king_alive");
    }
    pub fn promote_to_queen(&mut self) {
        self.op0("promote_to_queen");
    }
    pub fn keep_only_first_thread(&mut self) {
        self.op0("keep_only_first_thread");
    }
    pub fn keep_only_last_thread(&mut self) {
        self.op0("keep_only_last_thread");
    }
    pub fn keep_only_max_thread(&mut self) {
        self.op0("keep_only_max_thread");
    }
    pub fn keep_only_min_thread(&mut self) {
        self.op0("keep_only_min_thread");
    }
    pub fn is_same_kind(&mut self) {
        self.op0("is_same_kind");
    }
    pub fn do_piece_assign(&mut self, piece_chr: &str, piece: &str, x: &str, y: &str, pos: &str) {
        self.op(
            "do_piece_assign",
            vec![
                OpArg::Str(piece_chr.to_string()),
                OpArg::Str(piece.to_string()),
                OpArg::Str(x.to_string()),
                OpArg::Str(y.to_string()),
                OpArg::Str(pos.to_string()),
            ],
        );
    }
    pub fn illegal_move(&mut self) {
        self.op0("illegal_move");
    }
    pub fn test_checkmate(&mut self) {
        self.op0("test_checkmate");
    }
}

/// Re-run `program` against a fresh `VarTracer` until the call tree is
/// complete or `max_iterations` is exhausted (spec §4.C, §4.G `K`).
pub fn trace(program: impl Fn(&mut VarTracer), max_iterations: usize) -> CompileResult<CallTree> {
    let mut tracer = VarTracer::new();
    for iteration in 1..=max_iterations {
        tracer.restart();
        program(&mut tracer);
        if tracer.is_complete() {
            tracing::debug!(iteration, "call tree converged");
            return Ok(tracer.tree);
        }
    }
    Err(CompileError::TraceDidNotConverge { iterations: max_iterations, max: max_iterations })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_converges_on_simple_branch() {
        let program = |vars: &mut VarTracer| {
            let b = vars.get("b");
            if vars.branch(&b) {
                vars.set_str("r", "yes");
            } else {
                vars.set_str("r", "no");
            }
            vars.merge();
        };

        let tree = trace(program, 10).expect("should converge");
        assert!(tree.is_complete());
        assert_eq!(tree.root.len(), 2); // lookup(b), branch
    }

    #[test]
    fn linear_program_converges_in_one_pass() {
        let program = |vars: &mut VarTracer| {
            vars.set_int("x", 1);
            let _ = vars.get("x");
        };
        let tree = trace(program, 10).expect("should converge");
        assert_eq!(tree.root.len(), 2);
    }
}
