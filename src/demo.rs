//! A built-in demo traced program, used by the `compile` CLI subcommand and
//! by the end-to-end tests in `tests/`.
//!
//! This is deliberately *not* the chess reply-move generator (spec §1: the
//! chess rules are out of scope, an external collaborator). It is grounded
//! on the same DSL shapes `examples/original_source/chess_engine.py` uses —
//! branch on a side-to-move variable, check membership with `isany`, do
//! unary-backed arithmetic, fork a sub-thread and join its result back, and
//! finish by running the board through the pretty-printer opcode — so the
//! compiled rule list exercises a representative cross-section of the
//! instruction library (spec §4.B) without pulling in the legality/move
//! generation logic that belongs to the chess program itself.

use crate::expr::Traced;
use crate::tracer::VarTracer;

/// Exercise: variable branch, `isany`, unary arithmetic, fork/pause/join,
/// indirect lookup, and a board-rendering opcode — one representative use
/// of each compiler component named in spec §2's table.
pub fn demo_program(vars: &mut VarTracer) {
    // §4.C/§4.D: a variable read feeding a two-arm branch.
    let turn = vars.get("turn");
    let is_white = turn.eq(&Traced::str("w"));
    if vars.branch(&is_white) {
        vars.set_str("side_name", "white");
    } else {
        vars.set_str("side_name", "black");
    }
    vars.merge();

    // §4.B `isany`: membership test against a literal option set.
    let piece = vars.get("moving_piece");
    let is_officer = piece.isany(&["K", "Q", "R", "k", "q", "r"]);
    vars.set("is_officer", &is_officer);

    // §4.E unary-backed arithmetic: a material delta.
    let material = &Traced::int(9) - &Traced::int(3);
    vars.set("material_delta", &material);

    // §4.B indirect lookup/assign: resolve a variable whose name is itself
    // a traced value (mirrors `variables[variables['which_side']]`-style
    // accesses scattered through `chess_engine.py`).
    let side_name = vars.get("side_name");
    let resolved = vars.get_indirect(&side_name);
    vars.set("resolved_side_value", &resolved);

    // §4.B/§5 fork + pause + join: compute a candidate move on a side
    // thread, then rejoin it into the main thread's stack as a list.
    vars.fork_inactive("candidate");
    vars.push_str("e2e4");
    vars.pause("main");
    vars.reactivate("candidate");
    vars.push_str("e2e3");
    vars.pause("joined");
    vars.reactivate("main");
    vars.join_pop("joined");
    vars.assign_pop("candidate_moves");

    // §4.B board domain opcodes: render the current board.
    vars.lookup("initial_board");
    vars.expand_chess();
    vars.make_pretty(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{compile, DEFAULT_MAX_ITERATIONS};

    #[test]
    fn demo_program_compiles() {
        let compiled = compile(demo_program, DEFAULT_MAX_ITERATIONS).expect("demo program should compile");
        assert!(!compiled.rules.is_empty());
    }
}
