//! The Assembler (spec §4.F).
//!
//! Walks the linear `Instr` stream produced by the Linearizer and expands
//! each instruction into its `Rule`s via the Instruction Library, in order.
//! The full program rule list is the in-order concatenation of every
//! instruction's expansion — nothing is deduplicated or reordered.

use crate::callnode::OpArg;
use crate::error::{CompileError, CompileResult};
use crate::instructions as lib;
use crate::opcode::Instr;
use crate::rule::{Rule, RuleList};

/// Assemble a linear opcode stream into the final ordered `RuleList`.
pub fn assemble(instrs: &[Instr]) -> CompileResult<RuleList> {
    let mut rules = Vec::new();
    for instr in instrs {
        rules.extend(assemble_one(instr)?);
    }
    Ok(RuleList(rules))
}

fn assemble_one(instr: &Instr) -> CompileResult<Vec<Rule>> {
    match instr {
        Instr::PushInt(v) => lib::push_int(*v),
        Instr::PushStr(s) => lib::push_str(s),
        Instr::Lookup(name) => lib::lookup(name),
        Instr::IndirectLookup => lib::indirect_lookup(),
        Instr::AssignPop(name) => lib::assign_pop(name),

        Instr::Eq => lib::eq(),
        Instr::Neq => lib::neq(),
        Instr::IsAny(opts) => lib::isany(opts),

        Instr::BooleanNot => lib::boolean_not(),
        Instr::BooleanAnd => lib::boolean_and(),
        Instr::BooleanOr => lib::boolean_or(),

        Instr::ToUnary => lib::to_unary(),
        Instr::FromUnary => lib::from_unary(),
        Instr::AddUnary => lib::add_unary(),
        Instr::SubUnary => lib::sub_unary(),
        Instr::Mod2Unary => lib::mod2_unary(),
        Instr::GreaterThan => lib::greater_than(),
        Instr::LessThan => lib::less_than(),
        Instr::GreaterEqualThan => lib::greater_equal_than(),
        Instr::LessEqualThan => lib::less_equal_than(),

        Instr::BinaryAdd => lib::binary_add(),
        Instr::BinarySubtract => lib::binary_subtract(),
        Instr::StringCat => lib::string_cat(),

        Instr::Fen => lib::fen(),

        Instr::Cond(tag) => lib::cond(tag),
        Instr::Pause(tag) => lib::pause(tag),
        Instr::Reactivate(tag) => lib::reactivate(tag),

        Instr::Opaque(name, args) => assemble_opaque(name, args),
    }
}

fn str_arg(name: &str, args: &[OpArg], i: usize) -> CompileResult<String> {
    match args.get(i) {
        Some(OpArg::Str(s)) => Ok(s.clone()),
        _ => Err(CompileError::UnknownOpcode(format!("{name}: expected string arg at position {i}"))),
    }
}

fn int_arg(name: &str, args: &[OpArg], i: usize) -> CompileResult<u32> {
    match args.get(i) {
        Some(OpArg::Int(v)) => Ok(*v),
        _ => Err(CompileError::UnknownOpcode(format!("{name}: expected int arg at position {i}"))),
    }
}

fn bool_flag_arg(name: &str, args: &[OpArg], i: usize) -> CompileResult<bool> {
    match args.get(i) {
        Some(OpArg::List(items)) if items.len() == 1 => Ok(items[0] == "true"),
        _ => Err(CompileError::UnknownOpcode(format!("{name}: expected a one-element flag list at position {i}"))),
    }
}

fn pairs_arg(name: &str, args: &[OpArg], i: usize) -> CompileResult<Vec<(String, String)>> {
    match args.get(i) {
        Some(OpArg::Pairs(pairs)) => Ok(pairs.clone()),
        _ => Err(CompileError::UnknownOpcode(format!("{name}: expected pairs arg at position {i}"))),
    }
}

/// Dispatch an opcode that passed through the Linearizer as `Instr::Opaque`:
/// every list/stack utility and the whole domain/FEN/board family.
fn assemble_opaque(name: &str, args: &[OpArg]) -> CompileResult<Vec<Rule>> {
    match name {
        "pop" => lib::pop(),
        "peek" => lib::peek(),
        "dup" => lib::dup(),
        "swap" => lib::swap(),
        "is_stack_empty" => lib::is_stack_empty(),
        "indirect_assign" => lib::indirect_assign(),

        "lit_assign" => lib::lit_assign(&str_arg(name, args, 0)?, &str_arg(name, args, 1)?),
        "assign_var" => lib::assign_var(&str_arg(name, args, 0)?, &str_arg(name, args, 1)?),
        "delete_var" => lib::delete_var(&str_arg(name, args, 0)?),

        "fork_bool" => lib::fork_bool(&str_arg(name, args, 0)?),
        "fork_inactive" => lib::fork_inactive(&str_arg(name, args, 0)?),
        "fork_with_new_var" => {
            let tag = str_arg(name, args, 0)?;
            let pairs = pairs_arg(name, args, 1)?;
            lib::fork_with_new_var(&tag, &pairs)
        }
        "fork_list_pop" => {
            let src = str_arg(name, args, 0)?;
            let dst = str_arg(name, args, 1)?;
            let tag = str_arg(name, args, 2)?;
            lib::fork_list_pop(&src, &dst, &tag)
        }
        "destroy_active_threads" => lib::destroy_active_threads(),
        "join_pop" => lib::join_pop(&str_arg(name, args, 0)?),

        "list_pop" => {
            let src = str_arg(name, args, 0)?;
            let dst = str_arg(name, args, 1)?;
            let dst = if dst.is_empty() { None } else { Some(dst.as_str()) };
            lib::list_pop(&src, dst)
        }
        "variable_uniq" => lib::variable_uniq(&str_arg(name, args, 0)?),
        "fix_double_list" => lib::fix_double_list(),
        "assign_stack_to" => lib::assign_stack_to(&str_arg(name, args, 0)?, int_arg(name, args, 1)?),

        "expand_chess" => lib::expand_chess(),
        "contract_chess" => lib::contract_chess(),
        "fen" => lib::fen(),
        "intxy_to_location" => lib::intxy_to_location(&str_arg(name, args, 0)?, &str_arg(name, args, 1)?),
        "square_to_xy" => lib::square_to_xy(),
        "make_pretty" => lib::make_pretty(bool_flag_arg(name, args, 0)?),
        "unpretty" => lib::unpretty(bool_flag_arg(name, args, 0)?),
        "piece_value" => lib::piece_value(),
        "check_king_alive" => lib::check_king_alive(),
        "promote_to_queen" => lib::promote_to_queen(),
        "keep_only_first_thread" => lib::keep_only_first_thread(),
        "keep_only_last_thread" => lib::keep_only_last_thread(),
        "keep_only_max_thread" => lib::keep_only_max_thread(),
        "keep_only_min_thread" => lib::keep_only_min_thread(),
        "is_same_kind" => lib::is_same_kind(),
        "do_piece_assign" => lib::do_piece_assign(
            &str_arg(name, args, 0)?,
            &str_arg(name, args, 1)?,
            &str_arg(name, args, 2)?,
            &str_arg(name, args, 3)?,
            &str_arg(name, args, 4)?,
        ),
        "illegal_move" => lib::illegal_move(),
        "test_checkmate" => lib::test_checkmate(),

        other => Err(CompileError::UnknownOpcode(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleList;

    #[test]
    fn assembles_push_and_lookup_in_order() {
        let instrs = vec![Instr::PushInt(3), Instr::AssignPop("x".into()), Instr::Lookup("x".into())];
        let rules = assemble(&instrs).unwrap();
        assert!(!rules.is_empty());
        let out = RuleList(rules.0).apply_all("%%\n#stack:\n".to_string());
        assert!(out.contains("#x: "));
    }

    #[test]
    fn rejects_unknown_opaque_opcode() {
        let instrs = vec![Instr::Opaque("not_a_real_opcode".into(), vec![])];
        assert!(matches!(assemble(&instrs), Err(CompileError::UnknownOpcode(_))));
    }

    #[test]
    fn dispatches_list_pop_with_empty_dst_sentinel() {
        let instrs = vec![Instr::Opaque("list_pop".into(), vec![OpArg::Str("lst".into()), OpArg::Str(String::new())])];
        assert!(assemble(&instrs).is_ok());
    }
}
