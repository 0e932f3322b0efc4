//! The Driver (spec §4.H): runs the full pipeline — trace → linearize →
//! assemble → serialize — and owns the compilation state machine
//!
//! ```text
//! INIT → TRACING (repeat up to K iterations) → TREE_COMPLETE
//!      → LINEARIZING → ASSEMBLED → SERIALIZED
//! ```
//!
//! Each transition is logged at `debug` level via `tracing`, the way
//! `freddiehaddad-oxidized` and `colinrozzi-runtime_v2` instrument their own
//! multi-stage pipelines. A malformed call tree, unknown opcode, or bad
//! regex at any stage aborts the whole compilation (spec §7): there is no
//! partial rule list, only a complete one or a `CompileError`.

use crate::assemble::assemble;
use crate::error::CompileResult;
use crate::linearize::linearize;
use crate::opcode::Instr;
use crate::rule::RuleList;
use crate::tracer::{trace, VarTracer};

/// The compilation phases named in spec §4.G, in the order they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Tracing,
    TreeComplete,
    Linearizing,
    Assembled,
    Serialized,
}

/// Default tracer iteration bound `K` (spec §4.G, §9 "Open question").
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// The product of a completed compilation: the linear opcode stream (kept
/// around for diagnostics/tests) and the final, assembled rule list.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub instructions: Vec<Instr>,
    pub rules: RuleList,
}

/// Run the full pipeline against a traced program.
///
/// `program` is re-invoked against a fresh `VarTracer` up to
/// `max_iterations` times (spec §4.C/§4.G); once the call tree is complete it
/// is linearized (§4.D, lowering expressions per §4.E as it goes) and
/// assembled (§4.F) into the final `RuleList`. This function covers
/// `INIT` through `ASSEMBLED`; callers reach `SERIALIZED` themselves via
/// `crate::serialize`, since serialization format (JSON vs JS) is a
/// presentation choice outside the compiler proper.
pub fn compile(program: impl Fn(&mut VarTracer), max_iterations: usize) -> CompileResult<CompiledProgram> {
    tracing::debug!(phase = ?Phase::Init, "starting compilation");

    tracing::debug!(phase = ?Phase::Tracing, max_iterations, "tracing program");
    let tree = trace(program, max_iterations)?;
    tracing::debug!(phase = ?Phase::TreeComplete, nodes = tree.root.len(), "call tree complete");

    tracing::debug!(phase = ?Phase::Linearizing, "linearizing call tree");
    let instructions = linearize(&tree.root)?;
    tracing::debug!(instruction_count = instructions.len(), "linearization produced opcode stream");

    tracing::debug!(phase = ?Phase::Assembled, "assembling rule list");
    let rules = assemble(&instructions)?;
    tracing::debug!(rule_count = rules.len(), "assembly complete");

    Ok(CompiledProgram { instructions, rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_simple_branching_program() {
        let program = |vars: &mut VarTracer| {
            let b = vars.get("b");
            if vars.branch(&b) {
                vars.set_str("r", "yes");
            } else {
                vars.set_str("r", "no");
            }
            vars.merge();
        };

        let compiled = compile(program, DEFAULT_MAX_ITERATIONS).expect("should compile");
        assert!(!compiled.rules.is_empty());
        assert!(compiled.instructions.iter().any(|i| matches!(i, Instr::Cond(_))));
    }
}
