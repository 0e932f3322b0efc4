//! The six concrete scenarios from `spec.md` §8 ("Concrete scenarios"),
//! each driving the Instruction Library (and, for S6, the full compiler
//! pipeline) against hand-built text states and checking the exact
//! resulting state.

use pretty_assertions::assert_eq;
use regex_chess_compiler::driver::{compile, DEFAULT_MAX_ITERATIONS};
use regex_chess_compiler::instructions;
use regex_chess_compiler::rule::{Rule, RuleList};
use regex_chess_compiler::tracer::VarTracer;

fn apply(rules: Vec<Rule>, state: &str) -> String {
    RuleList(rules).apply_all(state.to_string())
}

fn concat(groups: Vec<Vec<Rule>>) -> Vec<Rule> {
    groups.into_iter().flatten().collect()
}

/// S1 — push "x"; push "x"; eq -> stack `["True"]`.
#[test]
fn s1_push_and_eq_equal() {
    let rules = concat(vec![instructions::push_str("x").unwrap(), instructions::push_str("x").unwrap(), instructions::eq().unwrap()]);
    let out = apply(rules, "%%\n#stack:\n");
    assert_eq!(out, "%%\n#stack:\nTrue\n");
}

/// S2 — push "a"; push "b"; eq -> stack `["False"]`.
#[test]
fn s2_push_and_eq_unequal() {
    let rules = concat(vec![instructions::push_str("a").unwrap(), instructions::push_str("b").unwrap(), instructions::eq().unwrap()]);
    let out = apply(rules, "%%\n#stack:\n");
    assert_eq!(out, "%%\n#stack:\nFalse\n");
}

/// S3 — indirect assign: stack `["v", "p"]`, `p="old"` -> stack `[]`, `p="v"`.
#[test]
fn s3_indirect_assign_overwrites_named_variable() {
    let out = apply(instructions::indirect_assign().unwrap(), "%%\n#stack:\nv\np\n#p: old\n");
    assert_eq!(out, "%%\n#stack:\n#p: v\n");
}

/// S4 — unary subtraction, `next - top` floored at zero: push 5 then 6
/// yields 0; push 5 then 4 yields 1 (`"A"`).
#[test]
fn s4_unary_subtraction_floors_at_zero() {
    // push 5 then 6: top = 6 A's, next (pushed first) = 5 A's.
    let out = apply(instructions::sub_unary().unwrap(), "%%\n#stack:\nAAAAAA\nAAAAA\n");
    assert_eq!(out, "%%\n#stack:\n\n");

    // push 5 then 4: top = 4 A's, next (pushed first) = 5 A's.
    let out = apply(instructions::sub_unary().unwrap(), "%%\n#stack:\nAAAA\nAAAAA\n");
    assert_eq!(out, "%%\n#stack:\nA\n");
}

/// S5 — fork + join: a candidate thread computes "x", the original thread
/// computes "y", and joining pulls both onto one stack.
#[test]
fn s5_fork_and_join_combine_both_threads_values() {
    let rules = concat(vec![
        instructions::fork_inactive("T").unwrap(),
        instructions::push_str("x").unwrap(),
        instructions::pause("MAIN").unwrap(),
        instructions::reactivate("T").unwrap(),
        instructions::push_str("y").unwrap(),
        instructions::pause("DONE").unwrap(),
        instructions::reactivate("MAIN").unwrap(),
        instructions::join_pop("DONE").unwrap(),
    ]);
    let out = apply(rules, "%%\n#stack:\n");
    assert_eq!(out, "%%\n#stack:\nx\ny\n");
}

/// S6 — branch linearization: tracing a program that tests boolean `b` and
/// assigns `r` differently in each arm must produce `r` correctly set for
/// both `b=True` and `b=False` initial states.
#[test]
fn s6_branch_sets_variable_correctly_in_both_arms() {
    let program = |vars: &mut VarTracer| {
        let b = vars.get("b");
        if vars.branch(&b) {
            vars.set_str("r", "yes");
        } else {
            vars.set_str("r", "no");
        }
        vars.merge();
    };
    let compiled = compile(program, DEFAULT_MAX_ITERATIONS).expect("branch program should compile");

    let true_out = compiled.rules.apply_all("%%\n#stack:\n#b: True\n".to_string());
    assert_eq!(true_out, "%%\n#stack:\n#b: True\n#r: yes\n");

    let false_out = compiled.rules.apply_all("%%\n#stack:\n#b: False\n".to_string());
    assert_eq!(false_out, "%%\n#stack:\n#b: False\n#r: no\n");
}
