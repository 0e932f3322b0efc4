//! The Linearizer (spec §4.D).
//!
//! Walks the completed call tree in order, lowering expressions via §4.E and
//! assigning fresh, globally-unique branch tags, producing the flat
//! `Instr` stream the Assembler (§4.F) consumes. One-to-one with
//! `original_source/compiler.py`'s `linearize_tree`.

use crate::callnode::{AssignSource, CallNode, OpArg};
use crate::error::{CompileError, CompileResult};
use crate::lower::lower_expr;
use crate::opcode::Instr;

/// Assigns monotonically increasing branch tags (`UID0`, `UID1`, ...).
struct TagCounter(usize);

impl TagCounter {
    fn next(&mut self) -> String {
        let tag = format!("UID{}", self.0);
        self.0 += 1;
        tag
    }
}

/// Linearize a completed call tree into an ordered opcode stream.
///
/// Returns `CompileError::IncompleteBranch` if a branch node still has a
/// `None` child (spec §4.G: "a branch node with a `None` child at assembly
/// time is fatal" — checked here too since linearization is the first place
/// that would try to walk into it).
pub fn linearize(root: &[CallNode]) -> CompileResult<Vec<Instr>> {
    let mut tags = TagCounter(0);
    linearize_block(root, &mut tags)
}

fn linearize_block(nodes: &[CallNode], tags: &mut TagCounter) -> CompileResult<Vec<Instr>> {
    let mut out = Vec::new();
    for node in nodes {
        linearize_node(node, tags, &mut out)?;
    }
    Ok(out)
}

fn linearize_node(node: &CallNode, tags: &mut TagCounter, out: &mut Vec<Instr>) -> CompileResult<()> {
    match node {
        CallNode::Assign(name, value) => {
            match value {
                AssignSource::Expr(expr) => out.extend(lower_expr(expr)),
                AssignSource::IntLit(v) => out.push(Instr::PushInt(*v)),
                AssignSource::StrLit(s) => out.push(Instr::PushStr(s.clone())),
            }
            out.push(Instr::AssignPop(name.clone()));
        }

        CallNode::Lookup(name) => out.push(Instr::Lookup(name.clone())),

        CallNode::Branch { cond, left, right } => {
            let left = left
                .as_ref()
                .ok_or_else(|| CompileError::IncompleteBranch { context: "branch left arm".to_string() })?;
            let right_opt = right.as_ref();

            let tag1 = tags.next();
            let tag2 = tags.next();

            out.extend(lower_expr(cond));
            out.push(Instr::Cond(tag1.clone()));
            out.extend(linearize_block(left, tags)?);

            match right_opt {
                Some(right) if !right.is_empty() => {
                    out.push(Instr::Pause(tag2.clone()));
                    out.push(Instr::Reactivate(tag1));
                    out.extend(linearize_block(right, tags)?);
                    out.push(Instr::Reactivate(tag2));
                }
                Some(_) => out.push(Instr::Reactivate(tag1)),
                None => {
                    return Err(CompileError::IncompleteBranch { context: "branch right arm".to_string() })
                }
            }
        }

        CallNode::Op(name, args) => out.push(opaque_instr(name, args)),
    }
    Ok(())
}

/// A handful of control-flow opcodes get dedicated `Instr` variants so the
/// Assembler can pattern-match on them directly; every other opcode name
/// (the bulk of the instruction library — list utilities and the
/// domain/FEN/board family) passes through as `Instr::Opaque`.
fn opaque_instr(name: &str, args: &[OpArg]) -> Instr {
    match (name, args) {
        ("cond", [OpArg::Str(tag)]) => Instr::Cond(tag.clone()),
        ("pause", [OpArg::Str(tag)]) => Instr::Pause(tag.clone()),
        ("reactivate", [OpArg::Str(tag)]) => Instr::Reactivate(tag.clone()),
        ("push_int", [OpArg::Int(v)]) => Instr::PushInt(*v),
        ("push_str", [OpArg::Str(s)]) => Instr::PushStr(s.clone()),
        ("isany", [OpArg::List(opts)]) => Instr::IsAny(opts.clone()),
        _ => Instr::Opaque(name.to_string(), args.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::{trace, VarTracer};

    #[test]
    fn branch_linearizes_with_pause_reactivate_sequence() {
        let program = |vars: &mut VarTracer| {
            let b = vars.get("b");
            if vars.branch(&b) {
                vars.set_str("r", "yes");
            } else {
                vars.set_str("r", "no");
            }
            vars.merge();
        };
        let tree = trace(program, 10).unwrap();
        let instrs = linearize(&tree.root).unwrap();

        // lookup(b), cond(UID0), push("yes"), assign_pop(r), pause(UID1),
        // reactivate(UID0), push("no"), assign_pop(r), reactivate(UID1)
        assert_eq!(instrs[0], Instr::Lookup("b".into()));
        assert!(matches!(instrs[1], Instr::Cond(_)));
        assert_eq!(instrs[2], Instr::PushStr("yes".into()));
        assert_eq!(instrs[3], Instr::AssignPop("r".into()));
        assert!(matches!(instrs[4], Instr::Pause(_)));
        assert!(matches!(instrs[5], Instr::Reactivate(_)));
        assert_eq!(instrs[6], Instr::PushStr("no".into()));
        assert_eq!(instrs[7], Instr::AssignPop("r".into()));
        assert!(matches!(instrs[8], Instr::Reactivate(_)));
        assert_eq!(instrs.len(), 9);
    }
}
